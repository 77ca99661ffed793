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

use std::time::Duration;

#[cfg(feature = "log")]
use log::debug;
#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

use super::audio::ChannelMode;
use super::audio::MpegVersion;
use super::lame::LameHeader;
use crate::constant::xing::FIELD_LEN;
use crate::constant::xing::FLAGS_BYTE_INDEX;
use crate::constant::xing::FLAGS_LEN;
use crate::constant::xing::FLAG_BYTES;
use crate::constant::xing::FLAG_FRAMES;
use crate::constant::xing::FLAG_QUALITY;
use crate::constant::xing::FLAG_TOC;
use crate::constant::xing::ID_LEN;
use crate::constant::xing::INFO_ID;
use crate::constant::xing::OFFSET_V1_MULTI_CHANNEL;
use crate::constant::xing::OFFSET_V1_SINGLE_CHANNEL;
use crate::constant::xing::OFFSET_V2_MULTI_CHANNEL;
use crate::constant::xing::OFFSET_V2_SINGLE_CHANNEL;
use crate::constant::xing::TOC_LEN;
use crate::constant::xing::TOC_SCALE;
use crate::constant::xing::XING_ID;
use crate::error::CorruptDataError;
use crate::error::DecodeError;
use crate::source::advance;
use crate::source::ByteSource;

/// Magic bytes that identified the header.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VbrHeaderId {
    /// `Xing`, written for VBR streams.
    Xing,
    /// `Info`, written for CBR streams.
    Info,
}

/// Xing/Info header stored in the first MPEG audio frame.
///
/// A value returned for a frame without the header is a sentinel where
/// [`is_present`](Self::is_present) returns `false` and all the other
/// fields hold their defaults.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct XingHeader {
    header_id: Option<VbrHeaderId>,
    total_frames: u32,
    total_size: u32,
    toc: Option<heapless::Vec<u8, TOC_LEN>>,
    quality_indicator: Option<u32>,
    lame: Option<LameHeader>,
}

/// Reads a big-endian `u32` field that must be present.
fn read_u32_field<S: ByteSource + ?Sized>(
    source: &mut S,
    position: u64,
    name: &str,
) -> Result<u32, DecodeError> {
    let bytes = source.read_block_at(position, FIELD_LEN)?;
    let (_, value) = nom::number::complete::be_u32::<_, nom::error::Error<&[u8]>>(
        bytes.as_slice(),
    )
    .map_err(|_e| CorruptDataError::new(name, "unexpected end of stream"))?;
    Ok(value)
}

impl XingHeader {
    /// Returns the sentinel value for frames without the header.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::component::*;
    /// let header = XingHeader::unknown();
    /// assert!(!header.is_present());
    /// assert_eq!(header.total_frames(), 0);
    /// assert!(header.lame_header().is_none());
    /// ```
    pub const fn unknown() -> Self {
        Self {
            header_id: None,
            total_frames: 0,
            total_size: 0,
            toc: None,
            quality_indicator: None,
            lame: None,
        }
    }

    /// Returns the offset of the header from the start of the frame.
    ///
    /// The header is placed right after the side information, whose size
    /// depends on the MPEG version and the number of channels.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::component::*;
    /// assert_eq!(XingHeader::offset(MpegVersion::Version1, ChannelMode::Stereo), 0x24);
    /// assert_eq!(XingHeader::offset(MpegVersion::Version2, ChannelMode::SingleChannel), 0x0D);
    /// ```
    pub const fn offset(version: MpegVersion, channel_mode: ChannelMode) -> u64 {
        let single_channel = matches!(channel_mode, ChannelMode::SingleChannel);
        match (version, single_channel) {
            (MpegVersion::Version1, false) => OFFSET_V1_MULTI_CHANNEL,
            (MpegVersion::Version1, true) => OFFSET_V1_SINGLE_CHANNEL,
            (MpegVersion::Version2 | MpegVersion::Version25, false) => OFFSET_V2_MULTI_CHANNEL,
            (MpegVersion::Version2 | MpegVersion::Version25, true) => OFFSET_V2_SINGLE_CHANNEL,
        }
    }

    /// Reads the header from the frame starting at `audio_header_position`.
    ///
    /// If the magic bytes are not found, this returns the sentinel value
    /// ([`XingHeader::unknown`]) instead of an error.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::CorruptData`] if the magic bytes are found but
    /// a field (including the LAME extension) is truncated or inconsistent,
    /// and [`DecodeError::Source`] if the source fails.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::component::*;
    /// # #[path = "../doctest_helper.rs"]
    /// # mod doctest_helper;
    /// # use doctest_helper::*;
    /// let mut src = make_example_source();
    /// let header = XingHeader::read(
    ///     &mut src, 0, MpegVersion::Version1, ChannelMode::JointStereo
    /// ).unwrap();
    /// assert!(header.is_present());
    /// assert_eq!(header.header_id(), Some(VbrHeaderId::Xing));
    /// assert_eq!(header.total_frames(), EXAMPLE_FRAMES);
    /// assert_eq!(header.lame_header().unwrap().encoder_version(), "3.100");
    /// ```
    pub fn read<S: ByteSource + ?Sized>(
        source: &mut S,
        audio_header_position: u64,
        version: MpegVersion,
        channel_mode: ChannelMode,
    ) -> Result<Self, DecodeError> {
        let mut cursor = advance(audio_header_position, Self::offset(version, channel_mode))?;

        let id = source.read_block_at(cursor, ID_LEN)?;
        let header_id = if id.as_slice() == XING_ID {
            VbrHeaderId::Xing
        } else if id.as_slice() == INFO_ID {
            VbrHeaderId::Info
        } else {
            #[cfg(feature = "log")]
            debug!("Xing/Info header not found at {cursor}.");
            return Ok(Self::unknown());
        };
        cursor = advance(cursor, ID_LEN as u64)?;

        let flags = source.read_block_at(cursor, FLAGS_LEN)?;
        if flags.len() != FLAGS_LEN {
            return Err(CorruptDataError::new("flags", "unexpected end of stream").into());
        }
        let flags = flags[FLAGS_BYTE_INDEX];
        cursor = advance(cursor, FLAGS_LEN as u64)?;
        #[cfg(feature = "log")]
        debug!("{header_id:?} header found with flags={flags:#04x}.");

        let mut total_frames = 0;
        if flags & FLAG_FRAMES != 0 {
            total_frames = read_u32_field(source, cursor, "total_frames")?;
            cursor = advance(cursor, FIELD_LEN as u64)?;
        }

        let mut total_size = 0;
        if flags & FLAG_BYTES != 0 {
            total_size = read_u32_field(source, cursor, "total_size")?;
            cursor = advance(cursor, FIELD_LEN as u64)?;
        }

        let mut toc = None;
        if flags & FLAG_TOC != 0 {
            let bytes = source.read_block_at(cursor, TOC_LEN)?;
            let entries = heapless::Vec::from_slice(&bytes)
                .ok()
                .filter(|entries: &heapless::Vec<u8, TOC_LEN>| entries.len() == TOC_LEN)
                .ok_or_else(|| CorruptDataError::new("toc", "unexpected end of stream"))?;
            toc = Some(entries);
            cursor = advance(cursor, TOC_LEN as u64)?;
        }

        let mut quality_indicator = None;
        if flags & FLAG_QUALITY != 0 {
            quality_indicator = Some(read_u32_field(source, cursor, "quality_indicator")?);
            cursor = advance(cursor, FIELD_LEN as u64)?;
        }

        let lame = LameHeader::read(source, audio_header_position, cursor, quality_indicator)
            .map_err(|e| e.within("lame"))?;

        Ok(Self {
            header_id: Some(header_id),
            total_frames,
            total_size,
            toc,
            quality_indicator,
            lame,
        })
    }

    /// Returns `false` if this is the sentinel for frames without the header.
    #[inline]
    pub fn is_present(&self) -> bool {
        self.header_id.is_some()
    }

    /// Returns which magic bytes were found.
    #[inline]
    pub fn header_id(&self) -> Option<VbrHeaderId> {
        self.header_id
    }

    /// Returns `true` if the header is a `Xing` header (i.e. the stream is VBR).
    pub fn is_vbr(&self) -> bool {
        self.header_id == Some(VbrHeaderId::Xing)
    }

    /// Returns the number of frames in the stream, or 0 if not stored.
    #[inline]
    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// Returns the size of the stream in bytes, or 0 if not stored.
    #[inline]
    pub fn total_size(&self) -> u32 {
        self.total_size
    }

    /// Returns the table of contents.
    ///
    /// Entry `i` is the position of `i` percent of the duration, scaled so
    /// that 256 corresponds to [`total_size`](Self::total_size).
    pub fn toc(&self) -> Option<&[u8]> {
        self.toc.as_deref()
    }

    #[inline]
    pub fn quality_indicator(&self) -> Option<u32> {
        self.quality_indicator
    }

    /// Returns the LAME extension if found after this header.
    pub fn lame_header(&self) -> Option<&LameHeader> {
        self.lame.as_ref()
    }

    /// Computes the duration of the stream.
    ///
    /// Returns `None` if the number of frames is not stored, or if
    /// `samples_per_frame` or `sample_rate` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::component::*;
    /// # #[path = "../doctest_helper.rs"]
    /// # mod doctest_helper;
    /// # use doctest_helper::*;
    /// # use std::time::Duration;
    /// let mut src = make_example_source();
    /// let header = XingHeader::read(
    ///     &mut src, 0, MpegVersion::Version1, ChannelMode::JointStereo
    /// ).unwrap();
    /// // 1000 frames of 1152 samples at 48 kHz
    /// assert_eq!(header.duration(1152, 48000), Some(Duration::from_millis(24000)));
    /// ```
    pub fn duration(&self, samples_per_frame: u32, sample_rate: u32) -> Option<Duration> {
        let samples = u64::from(self.total_frames) * u64::from(samples_per_frame);
        if samples == 0 || sample_rate == 0 {
            return None;
        }
        let rate = u64::from(sample_rate);
        let secs = samples / rate;
        let nanos = (samples % rate) * 1_000_000_000 / rate;
        Some(Duration::new(secs, nanos as u32))
    }

    /// Computes the average bitrate of the stream in bit/s.
    ///
    /// Returns `None` if the size or the number of frames is not stored, or
    /// if `samples_per_frame` or `sample_rate` is zero.
    pub fn average_bitrate(&self, samples_per_frame: u32, sample_rate: u32) -> Option<u32> {
        let samples = u64::from(self.total_frames) * u64::from(samples_per_frame);
        if samples == 0 || sample_rate == 0 || self.total_size == 0 {
            return None;
        }
        let bits = u64::from(self.total_size) * 8;
        u32::try_from(bits * u64::from(sample_rate) / samples).ok()
    }

    /// Estimates the byte position of `percent` of the duration using the TOC.
    ///
    /// `percent` is clamped to `[0, 100]`. Positions between the entries are
    /// linearly interpolated. Returns `None` if the TOC or the total size
    /// is not stored.
    pub fn toc_seek_position(&self, percent: f64) -> Option<u64> {
        let toc = self.toc.as_ref()?;
        if self.total_size == 0 || percent.is_nan() {
            return None;
        }
        let percent = percent.clamp(0.0, 100.0);
        let index = (percent.floor() as usize).min(TOC_LEN - 1);
        let lower = f64::from(toc[index]);
        let upper = if index + 1 < TOC_LEN {
            f64::from(toc[index + 1])
        } else {
            TOC_SCALE
        };
        let scaled = (upper - lower).mul_add(percent - index as f64, lower);
        Some((scaled / TOC_SCALE * f64::from(self.total_size)) as u64)
    }
}
