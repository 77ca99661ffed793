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

//! Format constants

#![allow(dead_code)] // it's okay if some format constants are not used.

// Top-level constants first, and then sub-modules. Constants that are used
// only in a specific sub-module or its caller should be placed in the
// corresponding submodule.

/// Sub-module containing constants related to build-time information.
pub mod build_info {
    pub const CRATE_VERSION: &str = match option_env!("CARGO_PKG_VERSION") {
        Some(v) => v,
        None => "unknown",
    };

    /// Comma-separated list of the enabled cargo features.
    #[cfg(all(feature = "log", feature = "serde"))]
    pub const FEATURES: &str = "log,serde";
    /// Comma-separated list of the enabled cargo features.
    #[cfg(all(feature = "log", not(feature = "serde")))]
    pub const FEATURES: &str = "log";
    /// Comma-separated list of the enabled cargo features.
    #[cfg(all(not(feature = "log"), feature = "serde"))]
    pub const FEATURES: &str = "serde";
    /// Comma-separated list of the enabled cargo features.
    #[cfg(not(any(feature = "log", feature = "serde")))]
    pub const FEATURES: &str = "";
}

/// Constants related to the Xing/Info header.
pub mod xing {
    /// Magic bytes of a Xing header (written for VBR streams).
    pub const XING_ID: &[u8; 4] = b"Xing";

    /// Magic bytes of an Info header (written for CBR streams).
    pub const INFO_ID: &[u8; 4] = b"Info";

    /// Length of the header id.
    pub const ID_LEN: usize = 4;

    /// Length of the flags word that follows the header id.
    pub const FLAGS_LEN: usize = 4;

    /// Index of the byte in the flags word that holds the field flags.
    pub const FLAGS_BYTE_INDEX: usize = 3;

    /// Flag bit for the total frame count field.
    pub const FLAG_FRAMES: u8 = 0x01;

    /// Flag bit for the total byte size field.
    pub const FLAG_BYTES: u8 = 0x02;

    /// Flag bit for the table of contents.
    pub const FLAG_TOC: u8 = 0x04;

    /// Flag bit for the quality indicator field.
    pub const FLAG_QUALITY: u8 = 0x08;

    /// Length of the frame count, byte size, and quality fields.
    pub const FIELD_LEN: usize = 4;

    /// Number of entries in the table of contents.
    pub const TOC_LEN: usize = 100;

    /// Offset of the header id for MPEG-1 multi-channel frames.
    pub const OFFSET_V1_MULTI_CHANNEL: u64 = 0x24;

    /// Offset of the header id for MPEG-1 single-channel frames.
    pub const OFFSET_V1_SINGLE_CHANNEL: u64 = 0x15;

    /// Offset of the header id for MPEG-2/2.5 multi-channel frames.
    pub const OFFSET_V2_MULTI_CHANNEL: u64 = 0x15;

    /// Offset of the header id for MPEG-2/2.5 single-channel frames.
    pub const OFFSET_V2_SINGLE_CHANNEL: u64 = 0x0D;

    /// Denominator of the TOC entries (each entry is `offset / size * 256`).
    pub const TOC_SCALE: f64 = 256.0;
}

/// Constants related to the LAME extension.
pub mod lame {
    /// Magic bytes at the start of the LAME extension.
    pub const LAME_ID: &[u8; 4] = b"LAME";

    /// Length of the signature block (magic + encoder version).
    pub const SIGNATURE_LEN: usize = 9;

    /// Length of the encoder version tag in the signature block.
    pub const ENCODER_VERSION_LEN: usize = 5;

    /// Length of the fixed record that follows the signature block.
    pub const RECORD_LEN: usize = 27;

    /// Offset from the frame start where the music CRC range begins.
    pub const MUSIC_CRC_START: u64 = 0xC0;

    /// Number of bytes from the frame start covered by the info tag CRC.
    pub const INFO_TAG_CRC_LEN: usize = 190;

    /// Lowest preset value reserved for ABR bitrates.
    pub const PRESET_ABR_MIN: u16 = 8;

    /// Highest preset value reserved for ABR bitrates.
    pub const PRESET_ABR_MAX: u16 = 320;

    /// Preset value of `V9` (also known as `VBR_10`).
    pub const PRESET_V9: u16 = 410;

    /// Preset value of `V0` (also known as `VBR_100`).
    pub const PRESET_V0: u16 = 500;
}

/// Constants related to the replay gain record.
pub mod replay_gain {
    /// Length of the replay gain record.
    pub const RECORD_LEN: usize = 8;

    /// Divisor that converts a stored adjustment to decibels.
    pub const ADJUSTMENT_SCALE: f32 = 10.0;
}
