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

//! Locates the first MPEG audio frame in a file.

use std::fmt;

use mpegvbr::component::ChannelMode;
use mpegvbr::component::MpegVersion;
use mpegvbr::source::ByteSource;
use mpegvbr::source::ReadAccess;

use crate::error::Error;
use crate::error::FormatError;

/// Length of an ID3v2 tag header (and footer).
const ID3V2_HEADER_LEN: usize = 10;

/// Number of bytes scanned for the frame sync after the ID3v2 tag.
const SCAN_LEN: usize = 64 * 1024;

/// Length of an MPEG audio frame header.
pub const FRAME_HEADER_LEN: usize = 4;

/// Bitrates in kbit/s indexed by the 4-bit bitrate field. Zero means free
/// format and the last entry is reserved.
const BITRATES_V1: [[u32; 15]; 3] = [
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
];
const BITRATES_V2: [[u32; 15]; 2] = [
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
];

/// MPEG audio layer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Layer {
    Layer1,
    Layer2,
    Layer3,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layer1 => write!(f, "Layer I"),
            Self::Layer2 => write!(f, "Layer II"),
            Self::Layer3 => write!(f, "Layer III"),
        }
    }
}

/// Decoded 4-byte MPEG audio frame header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FrameHeader {
    version: MpegVersion,
    layer: Layer,
    bitrate: u32,
    sample_rate: u32,
    padding: bool,
    channel_mode: ChannelMode,
}

impl FrameHeader {
    /// Parses a frame header from the first four bytes of `bytes`.
    ///
    /// Returns `None` if the sync word is missing or any of the version,
    /// layer, bitrate, and sample-rate fields holds a reserved (or free
    /// format) value.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let header: [u8; FRAME_HEADER_LEN] = bytes.get(..FRAME_HEADER_LEN)?.try_into().ok()?;
        let header = u32::from_be_bytes(header);
        if header >> 21 != 0x7FF {
            return None;
        }
        let version = MpegVersion::from_tag(((header >> 19) & 0b11) as u8)?;
        let layer = match (header >> 17) & 0b11 {
            0b11 => Layer::Layer1,
            0b10 => Layer::Layer2,
            0b01 => Layer::Layer3,
            _ => return None,
        };
        let bitrate_index = ((header >> 12) & 0x0F) as usize;
        let bitrate = match version {
            MpegVersion::Version1 => BITRATES_V1[layer as usize].get(bitrate_index),
            MpegVersion::Version2 | MpegVersion::Version25 => {
                BITRATES_V2[usize::from(layer != Layer::Layer1)].get(bitrate_index)
            }
        }
        .copied()
        .filter(|br| *br != 0)?;
        let base_rate = match (header >> 10) & 0b11 {
            0b00 => 44100,
            0b01 => 48000,
            0b10 => 32000,
            _ => return None,
        };
        let sample_rate = match version {
            MpegVersion::Version1 => base_rate,
            MpegVersion::Version2 => base_rate / 2,
            MpegVersion::Version25 => base_rate / 4,
        };
        Some(Self {
            version,
            layer,
            bitrate,
            sample_rate,
            padding: (header >> 9) & 1 == 1,
            channel_mode: ChannelMode::from_tag(((header >> 6) & 0b11) as u8),
        })
    }

    #[inline]
    pub const fn version(&self) -> MpegVersion {
        self.version
    }

    #[inline]
    pub const fn layer(&self) -> Layer {
        self.layer
    }

    /// Returns the bitrate in kbit/s.
    #[inline]
    pub const fn bitrate(&self) -> u32 {
        self.bitrate
    }

    #[inline]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub const fn channel_mode(&self) -> ChannelMode {
        self.channel_mode
    }

    pub const fn samples_per_frame(&self) -> u32 {
        match (self.layer, self.version) {
            (Layer::Layer1, _) => 384,
            (Layer::Layer2, _) | (Layer::Layer3, MpegVersion::Version1) => 1152,
            (Layer::Layer3, MpegVersion::Version2 | MpegVersion::Version25) => 576,
        }
    }

    /// Returns the frame length in bytes including the header.
    pub const fn frame_len(&self) -> usize {
        let padding = self.padding as usize;
        let bytes_per_frame =
            (self.samples_per_frame() / 8) as usize * self.bitrate as usize * 1000;
        match self.layer {
            Layer::Layer1 => (bytes_per_frame / 4 / self.sample_rate as usize + padding) * 4,
            Layer::Layer2 | Layer::Layer3 => bytes_per_frame / self.sample_rate as usize + padding,
        }
    }
}

impl fmt::Display for FrameHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = match self.version {
            MpegVersion::Version1 => "MPEG-1",
            MpegVersion::Version2 => "MPEG-2",
            MpegVersion::Version25 => "MPEG-2.5",
        };
        write!(
            f,
            "{version} {}, {} kbit/s, {} Hz, {:?}",
            self.layer, self.bitrate, self.sample_rate, self.channel_mode
        )
    }
}

/// Returns the total length of the ID3v2 tag at the beginning of `bytes`.
///
/// Returns 0 if `bytes` does not start with an ID3v2 tag.
pub fn id3v2_len(bytes: &[u8]) -> usize {
    let Some(header) = bytes.get(..ID3V2_HEADER_LEN) else {
        return 0;
    };
    if &header[..3] != b"ID3" || header[6..].iter().any(|b| b & 0x80 != 0) {
        return 0;
    }
    let size = header[6..]
        .iter()
        .fold(0usize, |acc, b| (acc << 7) | usize::from(*b));
    let footer = if header[5] & 0x10 != 0 {
        ID3V2_HEADER_LEN
    } else {
        0
    };
    ID3V2_HEADER_LEN + size + footer
}

/// Finds the first valid frame header in `bytes`.
///
/// If the following frame lies within `bytes`, it must also be a valid
/// frame header of the same version and layer.
pub fn find_frame(bytes: &[u8]) -> Option<(usize, FrameHeader)> {
    (0..bytes.len().saturating_sub(FRAME_HEADER_LEN - 1)).find_map(|offset| {
        let header = FrameHeader::parse(&bytes[offset..])?;
        let next = offset + header.frame_len();
        if next + FRAME_HEADER_LEN <= bytes.len() {
            let next_header = FrameHeader::parse(&bytes[next..])?;
            if next_header.version != header.version || next_header.layer != header.layer {
                return None;
            }
        }
        Some((offset, header))
    })
}

/// Locates the first MPEG audio frame in `source`.
///
/// Returns the absolute position and the header of the frame.
pub fn locate_first_frame<S: ByteSource + ?Sized>(
    source: &mut S,
) -> Result<(u64, FrameHeader), Error> {
    let mut access = ReadAccess::acquire(source)?;
    let head = access.read_block_at(0, ID3V2_HEADER_LEN)?;
    let start = id3v2_len(&head);
    if start > 0 {
        log::info!("Skipped an ID3v2 tag of {start} bytes.");
    }
    let bytes = access.read_block_at(start as u64, SCAN_LEN)?;
    let (offset, header) = find_frame(&bytes)
        .ok_or_else(|| FormatError::new(start as u64, "MPEG audio frame not found"))?;
    Ok(((start + offset) as u64, header))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpegvbr::source::MemSource;

    use rstest::rstest;

    #[rstest]
    #[case([0xFF, 0xFB, 0x90, 0x44], MpegVersion::Version1, Layer::Layer3, 128, 44100, 417)]
    #[case([0xFF, 0xFB, 0x92, 0x44], MpegVersion::Version1, Layer::Layer3, 128, 44100, 418)]
    #[case([0xFF, 0xFB, 0x94, 0x44], MpegVersion::Version1, Layer::Layer3, 128, 48000, 384)]
    #[case([0xFF, 0xF3, 0x90, 0xC4], MpegVersion::Version2, Layer::Layer3, 80, 22050, 261)]
    #[case([0xFF, 0xE3, 0x18, 0xC4], MpegVersion::Version25, Layer::Layer3, 8, 8000, 72)]
    #[case([0xFF, 0xFD, 0x90, 0x04], MpegVersion::Version1, Layer::Layer2, 160, 44100, 522)]
    #[case([0xFF, 0xFF, 0x90, 0x04], MpegVersion::Version1, Layer::Layer1, 288, 44100, 312)]
    fn valid_frame_headers(
        #[case] bytes: [u8; 4],
        #[case] version: MpegVersion,
        #[case] layer: Layer,
        #[case] bitrate: u32,
        #[case] sample_rate: u32,
        #[case] frame_len: usize,
    ) {
        let header = FrameHeader::parse(&bytes).expect("valid header rejected");
        assert_eq!(header.version(), version);
        assert_eq!(header.layer(), layer);
        assert_eq!(header.bitrate(), bitrate);
        assert_eq!(header.sample_rate(), sample_rate);
        assert_eq!(header.frame_len(), frame_len);
    }

    #[rstest]
    #[case::no_sync([0xFF, 0x1B, 0x90, 0x44])]
    #[case::reserved_version([0xFF, 0xEB, 0x90, 0x44])]
    #[case::reserved_layer([0xFF, 0xF9, 0x90, 0x44])]
    #[case::free_format([0xFF, 0xFB, 0x00, 0x44])]
    #[case::bad_bitrate([0xFF, 0xFB, 0xF0, 0x44])]
    #[case::bad_sample_rate([0xFF, 0xFB, 0x9C, 0x44])]
    fn invalid_frame_headers(#[case] bytes: [u8; 4]) {
        assert!(FrameHeader::parse(&bytes).is_none());
    }

    #[test]
    fn channel_mode_is_decoded() {
        let header = FrameHeader::parse(&[0xFF, 0xFB, 0x90, 0xC0]).unwrap();
        assert_eq!(header.channel_mode(), ChannelMode::SingleChannel);
        assert_eq!(header.samples_per_frame(), 1152);
    }

    #[test]
    fn id3v2_length() {
        assert_eq!(id3v2_len(b"ID3\x04\x00\x00\x00\x00\x02\x01"), 10 + 257);
        assert_eq!(id3v2_len(b"ID3\x04\x00\x10\x00\x00\x00\x05"), 10 + 5 + 10);
        assert_eq!(id3v2_len(b"ID3\x04\x00\x00\x00\x00\x80\x01"), 0);
        assert_eq!(id3v2_len(b"\xFF\xFB\x90\x44"), 0);
        assert_eq!(id3v2_len(b"ID3"), 0);
    }

    fn make_frames(count: usize) -> Vec<u8> {
        let mut ret = vec![];
        for _ in 0..count {
            let start = ret.len();
            ret.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x44]);
            ret.resize(start + 417, 0u8);
        }
        ret
    }

    #[test]
    fn false_sync_is_skipped() {
        let mut bytes = vec![0x00, 0xFF, 0xFB, 0x90, 0x44, 0x00];
        let frames = make_frames(3);
        bytes.extend_from_slice(&frames);
        let (offset, header) = find_frame(&bytes).unwrap();
        assert_eq!(offset, 6);
        assert_eq!(header.frame_len(), 417);
    }

    #[test]
    fn frame_is_located_after_id3v2_tag() {
        let mut bytes = b"ID3\x04\x00\x00\x00\x00\x00\x20".to_vec();
        bytes.resize(10 + 32, 0xFF);
        bytes.extend_from_slice(&make_frames(2));
        let mut src = MemSource::from_bytes(bytes);
        let (position, header) = locate_first_frame(&mut src).unwrap();
        assert_eq!(position, 42);
        assert_eq!(header.version(), MpegVersion::Version1);
        assert_eq!(header.channel_mode(), ChannelMode::JointStereo);
    }

    #[test]
    fn missing_frame_is_an_error() {
        let mut src = MemSource::from_bytes(vec![0u8; 1000]);
        assert!(locate_first_frame(&mut src).is_err());
    }
}
