// Copyright 2024 Google LLC
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

//! Top-level entry point that decodes and checks a VBR header at once.

#[cfg(feature = "log")]
use log::debug;
#[cfg(feature = "log")]
use log::info;
#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

use super::checksum::music_crc_range;
use super::checksum::verify_info_tag_crc;
use super::checksum::verify_music_crc;
use super::component::AudioHeader;
use super::component::ChannelMode;
use super::component::LameHeader;
use super::component::MpegVersion;
use super::config;
use super::error::DecodeError;
use super::error::Verified;
use super::source::ByteSource;

/// Result of [`inspect_audio_header`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Inspection {
    audio_header: AudioHeader,
    music_crc: Option<bool>,
    info_tag_crc: Option<bool>,
}

impl Inspection {
    /// Returns the decoded header.
    #[inline]
    pub fn audio_header(&self) -> &AudioHeader {
        &self.audio_header
    }

    /// Consumes `self` and returns the decoded header.
    #[inline]
    pub fn into_audio_header(self) -> AudioHeader {
        self.audio_header
    }

    /// Returns the LAME header if it is present.
    pub fn lame_header(&self) -> Option<&LameHeader> {
        self.audio_header.xing().lame_header()
    }

    /// Returns the result of the music CRC check.
    ///
    /// `None` if the check is disabled, skipped, or there's no LAME header.
    #[inline]
    pub fn music_crc(&self) -> Option<bool> {
        self.music_crc
    }

    /// Returns the result of the info tag CRC check.
    ///
    /// `None` if the check is disabled or there's no LAME header.
    #[inline]
    pub fn info_tag_crc(&self) -> Option<bool> {
        self.info_tag_crc
    }

    /// Returns true if none of the performed checks failed.
    pub fn is_consistent(&self) -> bool {
        self.music_crc != Some(false) && self.info_tag_crc != Some(false)
    }
}

/// Decodes the VBR header of the frame at `position` and verifies its CRCs.
///
/// CRC checks are performed only when the LAME header is present and the
/// check is enabled in `config`.
///
/// # Errors
///
/// Returns an error if decoding fails or a CRC check fails to read its
/// range. CRC mismatches are not errors; they are reported in the returned
/// [`Inspection`].
///
/// # Examples
///
/// ```
/// # use mpegvbr::*;
/// # use mpegvbr::component::*;
/// # use mpegvbr::error::Verify;
/// # #[path = "doctest_helper.rs"]
/// # mod doctest_helper;
/// # use doctest_helper::*;
/// let config = config::Inspector::default().into_verified().unwrap();
/// let mut src = make_example_source();
/// let inspection = inspect_audio_header(
///     &config, &mut src, 0, MpegVersion::Version1, ChannelMode::JointStereo
/// ).unwrap();
/// assert_eq!(inspection.music_crc(), Some(true));
/// assert_eq!(inspection.info_tag_crc(), Some(true));
/// assert!(inspection.is_consistent());
/// ```
pub fn inspect_audio_header<S: ByteSource + ?Sized>(
    config: &Verified<config::Inspector>,
    source: &mut S,
    position: u64,
    version: MpegVersion,
    channel_mode: ChannelMode,
) -> Result<Inspection, DecodeError> {
    let audio_header = AudioHeader::read(source, position, version, channel_mode)?;
    let mut music_crc = None;
    let mut info_tag_crc = None;

    if let Some(lame) = audio_header.xing().lame_header() {
        #[cfg(feature = "log")]
        debug!(
            "LAME header found (encoder version: {}).",
            lame.encoder_version()
        );
        if config.crc.info_tag {
            info_tag_crc = Some(verify_info_tag_crc(source, lame)?);
        }
        if config.crc.music {
            let (_, len) = music_crc_range(lame)?;
            if len <= config.crc.max_music_bytes {
                music_crc = Some(verify_music_crc(source, lame)?);
            } else {
                #[cfg(feature = "log")]
                info!(
                    "Music CRC skipped: {len} bytes exceeds the limit ({} bytes).",
                    config.crc.max_music_bytes
                );
            }
        }
    } else {
        #[cfg(feature = "log")]
        debug!("No LAME header at position {position}.");
    }

    Ok(Inspection {
        audio_header,
        music_crc,
        info_tag_crc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Verify;
    use crate::source::MemSource;
    use crate::test_helper::make_stream_with_crcs;
    use crate::test_helper::TrackingSource;
    use crate::test_helper::XingFrameBuilder;
    use crate::test_helper::LAME_CRC_FIELD_POS;

    use rstest::rstest;

    fn inspect_bytes(config: config::Inspector, bytes: Vec<u8>) -> Result<Inspection, DecodeError> {
        let config = config.into_verified().expect("config value error");
        let mut src = MemSource::from_bytes(bytes);
        inspect_audio_header(
            &config,
            &mut src,
            0,
            MpegVersion::Version1,
            ChannelMode::JointStereo,
        )
    }

    #[rstest]
    fn valid_stream_passes_all_checks(#[values(0, 1, 5000)] audio_len: usize) {
        let inspection =
            inspect_bytes(config::Inspector::default(), make_stream_with_crcs(audio_len, 7))
                .unwrap();
        assert!(inspection.lame_header().is_some());
        assert_eq!(inspection.music_crc(), Some(true));
        assert_eq!(inspection.info_tag_crc(), Some(true));
        assert!(inspection.is_consistent());
    }

    #[test]
    fn corrupted_audio_fails_music_crc_only() {
        let mut bytes = make_stream_with_crcs(1000, 3);
        *bytes.last_mut().unwrap() ^= 0x01;
        let inspection = inspect_bytes(config::Inspector::default(), bytes).unwrap();
        assert_eq!(inspection.music_crc(), Some(false));
        assert_eq!(inspection.info_tag_crc(), Some(true));
        assert!(!inspection.is_consistent());
    }

    #[test]
    fn corrupted_music_crc_field_fails_both_checks() {
        let mut bytes = make_stream_with_crcs(1000, 3);
        bytes[LAME_CRC_FIELD_POS] ^= 0xFF;
        let inspection = inspect_bytes(config::Inspector::default(), bytes).unwrap();
        assert_eq!(inspection.music_crc(), Some(false));
        assert_eq!(inspection.info_tag_crc(), Some(false));
    }

    #[test]
    fn disabled_checks_are_not_performed() {
        let mut config = config::Inspector::default();
        config.crc.music = false;
        config.crc.info_tag = false;
        let config = config.into_verified().unwrap();
        let mut src =
            TrackingSource::new(MemSource::from_bytes(make_stream_with_crcs(100, 1)));
        let inspection = inspect_audio_header(
            &config,
            &mut src,
            0,
            MpegVersion::Version1,
            ChannelMode::JointStereo,
        )
        .unwrap();
        assert_eq!(inspection.music_crc(), None);
        assert_eq!(inspection.info_tag_crc(), None);
        assert_eq!(src.acquire_count(), src.release_count());
    }

    #[test]
    fn music_crc_is_skipped_over_the_limit() {
        let mut config = config::Inspector::default();
        config.crc.max_music_bytes = 100;
        let inspection = inspect_bytes(config, make_stream_with_crcs(1000, 5)).unwrap();
        assert_eq!(inspection.music_crc(), None);
        assert_eq!(inspection.info_tag_crc(), Some(true));
    }

    #[test]
    fn no_checks_without_lame_header() {
        let frame = XingFrameBuilder::new(MpegVersion::Version1, ChannelMode::JointStereo)
            .frames(10)
            .build();
        let inspection = inspect_bytes(config::Inspector::default(), frame).unwrap();
        assert!(inspection.audio_header().xing().is_present());
        assert!(inspection.lame_header().is_none());
        assert_eq!(inspection.music_crc(), None);
        assert_eq!(inspection.info_tag_crc(), None);
        assert!(inspection.is_consistent());
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let mut bytes = make_stream_with_crcs(1000, 9);
        bytes.truncate(bytes.len() - 10);
        let err = inspect_bytes(config::Inspector::default(), bytes).unwrap_err();
        assert!(err.is_corrupt_data());
    }
}
