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

//! Inspector configuration structs.

#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

use super::error::verify_range;
use super::error::verify_true;
use super::error::Verify;
use super::error::VerifyError;

/// Default upper limit of the byte range covered by the music CRC check.
const DEFAULT_MAX_MUSIC_BYTES: usize = 1 << 30;

/// Configuration for [`inspect_audio_header`].
///
/// [`inspect_audio_header`]: crate::inspect::inspect_audio_header
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Inspector {
    /// Configuration for CRC verification.
    pub crc: CrcCheck,
}

impl Verify for Inspector {
    fn verify(&self) -> Result<(), VerifyError> {
        self.crc.verify().map_err(|e| e.within("crc"))
    }
}

/// Configuration for CRC verification.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CrcCheck {
    /// If set to false, the music CRC is not computed.
    pub music: bool,
    /// If set to false, the info tag CRC is not computed.
    pub info_tag: bool,
    /// The music CRC is skipped when it covers more bytes than this.
    ///
    /// The check reads the whole covered range into memory.
    pub max_music_bytes: usize,
}

impl Default for CrcCheck {
    fn default() -> Self {
        Self {
            music: true,
            info_tag: true,
            max_music_bytes: DEFAULT_MAX_MUSIC_BYTES,
        }
    }
}

impl Verify for CrcCheck {
    fn verify(&self) -> Result<(), VerifyError> {
        verify_range!("max_music_bytes", self.max_music_bytes, 1..)?;
        Ok(())
    }
}
