// Copyright 2022 Google LLC
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

#![allow(clippy::missing_panics_doc)]

use rand::Rng;
use rand::SeedableRng;

use super::checksum::crc16;
use super::component::ChannelMode;
use super::component::MpegVersion;
use super::component::XingHeader;
use super::constant::lame::MUSIC_CRC_START;
use super::constant::lame::RECORD_LEN;
use super::constant::lame::INFO_TAG_CRC_LEN;
use super::constant::xing::FLAG_BYTES;
use super::constant::xing::FLAG_FRAMES;
use super::constant::xing::FLAG_QUALITY;
use super::constant::xing::FLAG_TOC;
use super::error::SourceError;
use super::source::ByteSource;

#[macro_export]
macro_rules! assert_close {
    ($actual:expr, $expected:expr, rtol = $rtol:expr, atol = $atol:expr) => {{
        let err = ($actual - $expected).abs();
        #[allow(clippy::suboptimal_flops)]
        let tol = $rtol * ($expected).abs() + $atol;
        assert!(err < tol, "{} is not close to {}", $actual, $expected);
    }};
    ($actual:expr, $expected:expr) => {{
        assert_close!($actual, $expected, rtol = 0.00001, atol = 0.00001);
    }};
}

/// Size of the frames made by `XingFrameBuilder`.
///
/// This is the size of an MPEG-1 Layer III frame at 128 kbit/s, 44.1 kHz.
pub const FRAME_LEN: usize = 417;

/// Position of the music CRC field in streams made by `make_stream_with_crcs`.
pub const LAME_CRC_FIELD_POS: usize = 0x24 + 4 + 4 + 4 + 4 + 100 + 4 + 9 + 23;

/// Builder for the 27-byte LAME record.
///
/// All the fields are zero unless set.
#[derive(Clone, Debug)]
pub struct LameRecordBuilder {
    bytes: [u8; RECORD_LEN],
}

impl LameRecordBuilder {
    pub const fn new() -> Self {
        Self {
            bytes: [0u8; RECORD_LEN],
        }
    }

    #[must_use]
    pub const fn revision_and_method(mut self, value: u8) -> Self {
        self.bytes[0] = value;
        self
    }

    #[must_use]
    pub const fn lowpass(mut self, value: u8) -> Self {
        self.bytes[1] = value;
        self
    }

    #[must_use]
    pub fn replay_gain(mut self, value: [u8; 8]) -> Self {
        self.bytes[2..10].copy_from_slice(&value);
        self
    }

    #[must_use]
    pub const fn flags_and_ath(mut self, value: u8) -> Self {
        self.bytes[10] = value;
        self
    }

    #[must_use]
    pub const fn bitrate(mut self, value: u8) -> Self {
        self.bytes[11] = value;
        self
    }

    #[must_use]
    pub fn delay_and_padding(mut self, value: [u8; 3]) -> Self {
        self.bytes[12..15].copy_from_slice(&value);
        self
    }

    /// Sets byte 15 (source frequency, unwise flag, stereo mode, noise shaping).
    #[must_use]
    pub const fn misc(mut self, value: u8) -> Self {
        self.bytes[15] = value;
        self
    }

    #[must_use]
    pub const fn mp3_gain(mut self, value: u8) -> Self {
        self.bytes[16] = value;
        self
    }

    #[must_use]
    pub fn surround_and_preset(mut self, value: [u8; 2]) -> Self {
        self.bytes[17..19].copy_from_slice(&value);
        self
    }

    #[must_use]
    pub fn music_length(mut self, value: u32) -> Self {
        self.bytes[19..23].copy_from_slice(&value.to_be_bytes());
        self
    }

    #[must_use]
    pub fn music_crc(mut self, value: u16) -> Self {
        self.bytes[23..25].copy_from_slice(&value.to_be_bytes());
        self
    }

    #[must_use]
    pub fn info_tag_crc(mut self, value: u16) -> Self {
        self.bytes[25..27].copy_from_slice(&value.to_be_bytes());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }
}

/// Builder for an MPEG audio frame carrying a Xing/Info header.
///
/// The frame starts with a 4-byte frame header for the given version and
/// channel mode, and is zero-padded to at least [`FRAME_LEN`] bytes.
#[derive(Clone, Debug)]
pub struct XingFrameBuilder {
    version: MpegVersion,
    channel_mode: ChannelMode,
    id: &'static [u8; 4],
    frames: Option<u32>,
    bytes: Option<u32>,
    toc: Option<Vec<u8>>,
    quality: Option<u32>,
    lame: Option<Vec<u8>>,
}

impl XingFrameBuilder {
    pub const fn new(version: MpegVersion, channel_mode: ChannelMode) -> Self {
        Self {
            version,
            channel_mode,
            id: b"Xing",
            frames: None,
            bytes: None,
            toc: None,
            quality: None,
            lame: None,
        }
    }

    #[must_use]
    pub const fn info(mut self) -> Self {
        self.id = b"Info";
        self
    }

    #[must_use]
    pub const fn frames(mut self, value: u32) -> Self {
        self.frames = Some(value);
        self
    }

    #[must_use]
    pub const fn bytes(mut self, value: u32) -> Self {
        self.bytes = Some(value);
        self
    }

    #[must_use]
    pub fn toc(mut self, value: &[u8]) -> Self {
        assert_eq!(value.len(), 100);
        self.toc = Some(value.to_vec());
        self
    }

    #[must_use]
    pub const fn quality(mut self, value: u32) -> Self {
        self.quality = Some(value);
        self
    }

    /// Appends the LAME signature with `version` and the 27-byte `record`.
    #[must_use]
    pub fn lame(mut self, version: &[u8; 5], record: &[u8]) -> Self {
        let mut bytes = b"LAME".to_vec();
        bytes.extend_from_slice(version);
        bytes.extend_from_slice(record);
        self.lame = Some(bytes);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let version_bits: u8 = match self.version {
            MpegVersion::Version1 => 0b11,
            MpegVersion::Version2 => 0b10,
            MpegVersion::Version25 => 0b00,
        };
        let mode_bits: u8 = match self.channel_mode {
            ChannelMode::Stereo => 0b00,
            ChannelMode::JointStereo => 0b01,
            ChannelMode::DualChannel => 0b10,
            ChannelMode::SingleChannel => 0b11,
        };
        // sync, version, layer III, no CRC / bitrate index 9, sample rate index 0.
        let mut ret = vec![0xFF, 0xE3 | (version_bits << 3), 0x90, mode_bits << 6];
        ret.resize(
            XingHeader::offset(self.version, self.channel_mode) as usize,
            0u8,
        );

        let mut flags = 0u8;
        let mut fields = vec![];
        if let Some(v) = self.frames {
            flags |= FLAG_FRAMES;
            fields.extend_from_slice(&v.to_be_bytes());
        }
        if let Some(v) = self.bytes {
            flags |= FLAG_BYTES;
            fields.extend_from_slice(&v.to_be_bytes());
        }
        if let Some(v) = &self.toc {
            flags |= FLAG_TOC;
            fields.extend_from_slice(v);
        }
        if let Some(v) = self.quality {
            flags |= FLAG_QUALITY;
            fields.extend_from_slice(&v.to_be_bytes());
        }
        ret.extend_from_slice(self.id);
        ret.extend_from_slice(&[0, 0, 0, flags]);
        ret.extend_from_slice(&fields);
        if let Some(lame) = &self.lame {
            ret.extend_from_slice(lame);
        }
        if ret.len() < FRAME_LEN {
            ret.resize(FRAME_LEN, 0u8);
        }
        ret
    }
}

/// Makes an MPEG-1 joint-stereo stream with a Xing header, a LAME header,
/// and valid CRCs.
///
/// The stream consists of a [`FRAME_LEN`]-byte frame followed by
/// `audio_len` random bytes. The stored music length covers the whole
/// stream.
pub fn make_stream_with_crcs(audio_len: usize, seed: u64) -> Vec<u8> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let total_len = (FRAME_LEN + audio_len) as u32;
    let toc: Vec<u8> = (0..100).map(|i| (i * 256 / 100) as u8).collect();
    let record = LameRecordBuilder::new()
        .revision_and_method(0x14)
        .lowpass(190)
        .bitrate(32)
        .delay_and_padding([0x24, 0x02, 0x40])
        .misc(0b01_0_0_01_00)
        .music_length(total_len)
        .build();
    let mut ret = XingFrameBuilder::new(MpegVersion::Version1, ChannelMode::JointStereo)
        .frames(rng.gen_range(1..10000))
        .bytes(total_len)
        .toc(&toc)
        .quality(78)
        .lame(b"3.100", &record)
        .build();
    assert_eq!(ret.len(), FRAME_LEN);
    ret.extend((0..audio_len).map(|_| rng.gen::<u8>()));

    let music_crc = crc16(&ret[MUSIC_CRC_START as usize..]);
    ret[LAME_CRC_FIELD_POS..LAME_CRC_FIELD_POS + 2].copy_from_slice(&music_crc.to_be_bytes());
    let info_tag_crc = crc16(&ret[..INFO_TAG_CRC_LEN]);
    ret[LAME_CRC_FIELD_POS + 2..LAME_CRC_FIELD_POS + 4]
        .copy_from_slice(&info_tag_crc.to_be_bytes());
    ret
}

/// `ByteSource` wrapper that counts acquisitions and releases.
#[derive(Debug)]
pub struct TrackingSource<S> {
    inner: S,
    acquire_count: usize,
    release_count: usize,
    fail_reads: bool,
}

impl<S: ByteSource> TrackingSource<S> {
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            acquire_count: 0,
            release_count: 0,
            fail_reads: false,
        }
    }

    /// Makes all the subsequent reads fail.
    #[must_use]
    pub fn failing_reads(self) -> Self {
        Self {
            fail_reads: true,
            ..self
        }
    }

    pub const fn acquire_count(&self) -> usize {
        self.acquire_count
    }

    pub const fn release_count(&self) -> usize {
        self.release_count
    }
}

impl<S: ByteSource> ByteSource for TrackingSource<S> {
    fn seek(&mut self, position: u64) -> Result<(), SourceError> {
        self.inner.seek(position)
    }

    fn read_block(&mut self, len: usize) -> Result<Vec<u8>, SourceError> {
        if self.fail_reads {
            return Err(SourceError::from_unknown());
        }
        self.inner.read_block(len)
    }

    fn acquire(&mut self) -> Result<(), SourceError> {
        self.acquire_count += 1;
        self.inner.acquire()
    }

    fn release(&mut self) {
        self.release_count += 1;
        self.inner.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_with_crcs_has_consistent_layout() {
        let bytes = make_stream_with_crcs(100, 0);
        assert_eq!(bytes.len(), FRAME_LEN + 100);
        assert_eq!(&bytes[0x24..0x28], b"Xing");
        assert_eq!(&bytes[LAME_CRC_FIELD_POS - 23 - 9..LAME_CRC_FIELD_POS - 23 - 5], b"LAME");
        let music_length = u32::from_be_bytes(
            bytes[LAME_CRC_FIELD_POS - 4..LAME_CRC_FIELD_POS]
                .try_into()
                .unwrap(),
        );
        assert_eq!(music_length as usize, bytes.len());
    }
}
