// Copyright 2022-2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Components decoded from the first frame of an MPEG audio stream.
//!
//! The records are nested as follows: [`AudioHeader`] owns a
//! [`XingHeader`], which may own a [`LameHeader`], which owns a
//! [`ReplayGain`].

mod audio;
mod lame;
pub(crate) mod parser;
mod replay_gain;
mod xing;

pub use audio::*;
pub use lame::*;
pub use replay_gain::*;
pub use xing::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_close;
    use crate::source::MemSource;
    use crate::test_helper::LameRecordBuilder;
    use crate::test_helper::XingFrameBuilder;

    #[test]
    fn nested_records_from_single_frame() {
        let mut gain = [0u8; 8];
        gain[..4].copy_from_slice(&0.75f32.to_be_bytes());
        gain[4] = 0b0010_1100; // radio, RMS average, positive
        gain[5] = 42;
        gain[6] = 0b0100_0110; // audiophile, set by artist, negative
        gain[7] = 12;
        let record = LameRecordBuilder::new()
            .revision_and_method(0x03)
            .replay_gain(gain)
            .build();
        let frame = XingFrameBuilder::new(MpegVersion::Version1, ChannelMode::JointStereo)
            .frames(100)
            .quality(100)
            .lame(b"3.100", &record)
            .build();

        let mut src = MemSource::from_bytes(frame);
        let header =
            AudioHeader::read(&mut src, 0, MpegVersion::Version1, ChannelMode::JointStereo)
                .unwrap();
        let lame = header
            .xing_header()
            .and_then(XingHeader::lame_header)
            .expect("LAME header not found");
        assert_eq!(lame.vbr_method(), VbrMethod::FullVbr1);
        assert_eq!(lame.lame_vbr_method(), LameVbrMethod::VbrOldRh);
        assert_eq!(lame.vbr_quality_value(), Some(0));
        assert_eq!(lame.q_value(), Some(0));

        let gain = lame.replay_gain();
        assert!(gain.is_present());
        assert_eq!(gain.peak_signal_amplitude(), 0.75);
        assert_eq!(gain.radio_name(), AdjustmentName::Radio);
        assert_eq!(gain.radio_originator(), AdjustmentOriginator::SetBySimpleRmsAverage);
        assert_close!(gain.radio_adjustment(), 4.2f32);
        assert_eq!(gain.audiophile_name(), AdjustmentName::Audiophile);
        assert_eq!(gain.audiophile_originator(), AdjustmentOriginator::SetByArtist);
        assert_close!(gain.audiophile_adjustment(), -1.2f32);
    }
}
