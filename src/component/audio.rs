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

#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

use super::xing::XingHeader;
use crate::error::DecodeError;
use crate::source::ByteSource;
use crate::source::ReadAccess;

/// MPEG audio version.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MpegVersion {
    /// MPEG-1.
    Version1,
    /// MPEG-2 (LSF).
    Version2,
    /// MPEG-2.5.
    Version25,
}

impl MpegVersion {
    /// Constructs `MpegVersion` from the 2-bit version field of a frame header.
    ///
    /// Returns `None` for the reserved value.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::component::*;
    /// assert_eq!(MpegVersion::from_tag(0b11), Some(MpegVersion::Version1));
    /// assert_eq!(MpegVersion::from_tag(0b01), None);
    /// ```
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0b11 => Some(Self::Version1),
            0b10 => Some(Self::Version2),
            0b00 => Some(Self::Version25),
            _ => None,
        }
    }
}

/// Channel mode of an MPEG audio frame.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    /// Mono.
    SingleChannel,
}

impl ChannelMode {
    /// Constructs `ChannelMode` from the 2-bit mode field of a frame header.
    pub const fn from_tag(tag: u8) -> Self {
        match tag & 0b11 {
            0b00 => Self::Stereo,
            0b01 => Self::JointStereo,
            0b10 => Self::DualChannel,
            _ => Self::SingleChannel,
        }
    }

    /// Returns the number of channels.
    pub const fn channels(self) -> usize {
        match self {
            Self::SingleChannel => 1,
            Self::Stereo | Self::JointStereo | Self::DualChannel => 2,
        }
    }
}

/// Trait for audio streams that may carry a Xing/Info header.
///
/// A host that enumerates several codecs of a file implements this for its
/// codec type, and returns `None` for codecs that are not MPEG audio.
/// [`find_lame_header`] searches a collection of such streams.
///
/// [`find_lame_header`]: crate::checksum::find_lame_header
pub trait AudioStream {
    /// Returns the Xing/Info header if it is present in this stream.
    fn xing_header(&self) -> Option<&XingHeader>;
}

impl<T: AudioStream + ?Sized> AudioStream for &T {
    fn xing_header(&self) -> Option<&XingHeader> {
        (**self).xing_header()
    }
}

/// The first frame of an MPEG audio stream with its decoded VBR header.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AudioHeader {
    position: u64,
    version: MpegVersion,
    channel_mode: ChannelMode,
    xing: XingHeader,
}

impl AudioHeader {
    /// Reads the VBR header of the frame at `position`.
    ///
    /// `version` and `channel_mode` are the fields of the frame header that
    /// is parsed by the caller. All the reads are done within a single
    /// [`ReadAccess`] scope.
    ///
    /// # Errors
    ///
    /// Same as [`XingHeader::read`], plus the error from acquiring the
    /// source. The error path of
    /// [`DecodeError::CorruptData`] is prefixed by `xing`.
    pub fn read<S: ByteSource + ?Sized>(
        source: &mut S,
        position: u64,
        version: MpegVersion,
        channel_mode: ChannelMode,
    ) -> Result<Self, DecodeError> {
        let xing = {
            let mut access = ReadAccess::acquire(source)?;
            XingHeader::read(&mut *access, position, version, channel_mode)
        }
        .map_err(|e| e.within("xing"))?;
        Ok(Self {
            position,
            version,
            channel_mode,
            xing,
        })
    }

    /// Returns the absolute position of the frame.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    #[inline]
    pub fn version(&self) -> MpegVersion {
        self.version
    }

    #[inline]
    pub fn channel_mode(&self) -> ChannelMode {
        self.channel_mode
    }

    /// Returns the decoded header (may be the "not present" sentinel).
    #[inline]
    pub fn xing(&self) -> &XingHeader {
        &self.xing
    }
}

impl AudioStream for AudioHeader {
    fn xing_header(&self) -> Option<&XingHeader> {
        self.xing.is_present().then_some(&self.xing)
    }
}
