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

use std::fmt;

#[cfg(feature = "log")]
use log::debug;
#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

use super::parser;
use super::replay_gain::ReplayGain;
use crate::constant::lame::ENCODER_VERSION_LEN;
use crate::constant::lame::LAME_ID;
use crate::constant::lame::PRESET_ABR_MAX;
use crate::constant::lame::PRESET_ABR_MIN;
use crate::constant::lame::PRESET_V0;
use crate::constant::lame::PRESET_V9;
use crate::constant::lame::RECORD_LEN;
use crate::constant::lame::SIGNATURE_LEN;
use crate::error::CorruptDataError;
use crate::error::DecodeError;
use crate::source::advance;
use crate::source::ByteSource;

/// VBR method stored in the low nibble of the first record byte.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VbrMethod {
    /// Unknown or reserved method.
    #[default]
    Unknown,
    /// Constant bitrate.
    Cbr,
    /// Average bitrate.
    Abr,
    /// Full VBR method 1 (`--vbr-old`).
    FullVbr1,
    /// Full VBR method 2 (`--vbr-mtrh`).
    FullVbr2,
    /// Full VBR method 3 (`--vbr-mt`).
    FullVbr3,
    /// Full VBR method 4.
    FullVbr4,
    /// Constant bitrate, two-pass.
    Cbr2Pass,
    /// Average bitrate, two-pass.
    Abr2Pass,
}

impl VbrMethod {
    /// Constructs `VbrMethod` from the 4-bit tag.
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            1 => Self::Cbr,
            2 => Self::Abr,
            3 => Self::FullVbr1,
            4 => Self::FullVbr2,
            5 => Self::FullVbr3,
            6 => Self::FullVbr4,
            8 => Self::Cbr2Pass,
            9 => Self::Abr2Pass,
            _ => Self::Unknown,
        }
    }
}

/// LAME's name of the VBR algorithm.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LameVbrMethod {
    /// Not a VBR method known to LAME.
    #[default]
    Unknown,
    /// Average bitrate.
    Abr,
    /// `vbr_rh` (old VBR).
    VbrOldRh,
    /// `vbr_mtrh`.
    VbrMtRh,
    /// `vbr_mt`.
    VbrMt,
}

impl LameVbrMethod {
    /// Maps the stored VBR method to the LAME algorithm.
    ///
    /// `FullVbr4` has no algorithm counterpart and maps to `Unknown`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::component::*;
    /// assert_eq!(LameVbrMethod::from_vbr_method(VbrMethod::FullVbr2), LameVbrMethod::VbrMtRh);
    /// assert_eq!(LameVbrMethod::from_vbr_method(VbrMethod::FullVbr4), LameVbrMethod::Unknown);
    /// ```
    pub const fn from_vbr_method(method: VbrMethod) -> Self {
        match method {
            VbrMethod::Abr => Self::Abr,
            VbrMethod::FullVbr1 => Self::VbrOldRh,
            VbrMethod::FullVbr2 => Self::VbrMtRh,
            VbrMethod::FullVbr3 => Self::VbrMt,
            VbrMethod::Unknown
            | VbrMethod::Cbr
            | VbrMethod::FullVbr4
            | VbrMethod::Cbr2Pass
            | VbrMethod::Abr2Pass => Self::Unknown,
        }
    }
}

/// Stereo mode recorded by the encoder.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LameStereoMode {
    /// Mono.
    #[default]
    Mono,
    /// Simple stereo.
    Stereo,
    /// Dual channel.
    Dual,
    /// Joint stereo.
    Joint,
    /// Forced joint stereo.
    Force,
    /// Automatic mode switching.
    Auto,
    /// Intensity stereo.
    Intensity,
    /// Undefined, or different modes across frames.
    UndefinedOrDifferent,
}

impl LameStereoMode {
    /// Constructs `LameStereoMode` from the tag.
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            0 => Self::Mono,
            1 => Self::Stereo,
            2 => Self::Dual,
            3 => Self::Joint,
            4 => Self::Force,
            5 => Self::Auto,
            6 => Self::Intensity,
            _ => Self::UndefinedOrDifferent,
        }
    }
}

/// Sampling frequency of the encoder input.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SourceSampleFrequency {
    /// 32 kHz or lower.
    #[default]
    UpTo32kHz,
    /// 44.1 kHz.
    Hz44100,
    /// 48 kHz.
    Hz48000,
    /// Higher than 48 kHz.
    Above48kHz,
    /// Unrecognized value.
    Unknown,
}

impl SourceSampleFrequency {
    /// Constructs `SourceSampleFrequency` from the 2-bit tag.
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            0 => Self::UpTo32kHz,
            1 => Self::Hz44100,
            2 => Self::Hz48000,
            3 => Self::Above48kHz,
            _ => Self::Unknown,
        }
    }
}

/// Surround encoding information.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SurroundInfo {
    /// No surround information.
    #[default]
    NoSurround,
    /// Dolby Pro Logic.
    Dpl,
    /// Dolby Pro Logic II.
    Dpl2,
    /// Ambisonic.
    Ambisonic,
    /// Reserved value.
    Unknown,
}

impl SurroundInfo {
    /// Constructs `SurroundInfo` from the 3-bit tag.
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            0 => Self::NoSurround,
            1 => Self::Dpl,
            2 => Self::Dpl2,
            3 => Self::Ambisonic,
            _ => Self::Unknown,
        }
    }
}

/// Encoder preset stored in the 11-bit preset field.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "value"))]
pub enum LamePreset {
    /// ABR preset with the target bitrate in kbit/s (8 to 320).
    Abr(u16),
    /// VBR preset `V0` to `V9` (also known as `VBR_100` to `VBR_10`).
    ///
    /// The field holds the level; `Vbr(0)` is `V0`.
    Vbr(u8),
    /// `--r3mix`.
    R3mix,
    /// `--preset standard`.
    Standard,
    /// `--preset extreme`.
    Extreme,
    /// `--preset insane`.
    Insane,
    /// `--preset fast standard`.
    StandardFast,
    /// `--preset fast extreme`.
    ExtremeFast,
    /// `--preset medium`.
    Medium,
    /// `--preset fast medium`.
    MediumFast,
    /// Value that is not in the preset table (including 0, "no preset").
    Other(u16),
}

impl LamePreset {
    /// Interprets the 11-bit preset value.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::component::*;
    /// assert_eq!(LamePreset::from_value(128), LamePreset::Abr(128));
    /// assert_eq!(LamePreset::from_value(480), LamePreset::Vbr(2));
    /// assert_eq!(LamePreset::from_value(1001), LamePreset::Standard);
    /// assert_eq!(LamePreset::from_value(415), LamePreset::Other(415));
    /// ```
    pub const fn from_value(value: u16) -> Self {
        match value {
            PRESET_ABR_MIN..=PRESET_ABR_MAX => Self::Abr(value),
            PRESET_V9..=PRESET_V0 if (value - PRESET_V9) % 10 == 0 => {
                Self::Vbr(((PRESET_V0 - value) / 10) as u8)
            }
            1000 => Self::R3mix,
            1001 => Self::Standard,
            1002 => Self::Extreme,
            1003 => Self::Insane,
            1004 => Self::StandardFast,
            1005 => Self::ExtremeFast,
            1006 => Self::Medium,
            1007 => Self::MediumFast,
            _ => Self::Other(value),
        }
    }

    /// Returns the stored 11-bit value.
    pub const fn value(&self) -> u16 {
        match *self {
            Self::Abr(v) | Self::Other(v) => v,
            Self::Vbr(level) => PRESET_V0 - (level as u16) * 10,
            Self::R3mix => 1000,
            Self::Standard => 1001,
            Self::Extreme => 1002,
            Self::Insane => 1003,
            Self::StandardFast => 1004,
            Self::ExtremeFast => 1005,
            Self::Medium => 1006,
            Self::MediumFast => 1007,
        }
    }
}

impl Default for LamePreset {
    fn default() -> Self {
        Self::Other(0)
    }
}

impl fmt::Display for LamePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Abr(kbps) => write!(f, "ABR {kbps}"),
            Self::Vbr(level) => write!(f, "V{level}"),
            Self::R3mix => write!(f, "r3mix"),
            Self::Standard => write!(f, "standard"),
            Self::Extreme => write!(f, "extreme"),
            Self::Insane => write!(f, "insane"),
            Self::StandardFast => write!(f, "fast standard"),
            Self::ExtremeFast => write!(f, "fast extreme"),
            Self::Medium => write!(f, "medium"),
            Self::MediumFast => write!(f, "fast medium"),
            Self::Other(0) => write!(f, "none"),
            Self::Other(v) => write!(f, "unknown ({v})"),
        }
    }
}

/// Splits the Xing quality indicator into the VBR level and the q value.
///
/// LAME writes `100 - 10 * vbr_level - q` as the quality indicator. This
/// function inverts it; the result is `(None, None)` when the indicator is
/// absent, zero, or larger than 100.
///
/// # Examples
///
/// ```
/// # use mpegvbr::component::*;
/// assert_eq!(decompose_quality_indicator(Some(100)), (Some(0), Some(0)));
/// assert_eq!(decompose_quality_indicator(Some(55)), (Some(4), Some(5)));
/// assert_eq!(decompose_quality_indicator(Some(50)), (Some(5), Some(0)));
/// assert_eq!(decompose_quality_indicator(Some(5)), (Some(9), Some(5)));
/// assert_eq!(decompose_quality_indicator(Some(0)), (None, None));
/// assert_eq!(decompose_quality_indicator(None), (None, None));
/// ```
pub const fn decompose_quality_indicator(indicator: Option<u32>) -> (Option<u32>, Option<u32>) {
    match indicator {
        Some(100) => (Some(0), Some(0)),
        Some(value @ 10..=99) => {
            let tens = (value / 10) % 10;
            let ones = value % 10;
            let q_value = if ones == 0 { 0 } else { 10 - ones };
            let mut vbr_value = 10 - tens;
            if q_value > 0 {
                vbr_value -= 1;
            }
            (Some(vbr_value), Some(q_value))
        }
        Some(value @ 1..=9) => {
            let ones = value % 10;
            let q_value = if ones == 0 { 0 } else { 10 - ones };
            (Some(9), Some(q_value))
        }
        Some(_) | None => (None, None),
    }
}

/// LAME extension that follows the Xing/Info header.
///
/// The extension consists of a 9-byte signature block (`LAME` followed by a
/// 5-byte encoder version) and a 27-byte record describing the encoder
/// settings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LameHeader {
    audio_header_position: u64,
    encoder_version: [u8; ENCODER_VERSION_LEN],
    vbr_quality_value: Option<u32>,
    q_value: Option<u32>,
    tag_revision: u8,
    vbr_method: VbrMethod,
    lame_vbr_method: LameVbrMethod,
    lowpass_filter: u32,
    replay_gain: ReplayGain,
    ns_psytune_used: bool,
    ns_safejoint_used: bool,
    no_gap_continued: bool,
    no_gap_continuation: bool,
    ath_type: u8,
    bitrate: u8,
    encoder_delay: u16,
    encoder_padding: u16,
    noise_shaping: u8,
    stereo_mode: LameStereoMode,
    unwise_settings_used: bool,
    source_sample_frequency: SourceSampleFrequency,
    mp3_gain: i8,
    surround_info: SurroundInfo,
    preset: LamePreset,
    music_length: u32,
    music_crc: u16,
    info_tag_crc: u16,
}

impl LameHeader {
    /// Reads the LAME extension at `position`.
    ///
    /// `audio_header_position` is the absolute position of the MPEG frame
    /// that contains the extension, and `quality_indicator` is the quality
    /// field of the enclosing Xing header (if any).
    ///
    /// Returns `Ok(None)` if the `LAME` signature is not found at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::CorruptData`] if the signature is found but the
    /// record that follows is truncated or inconsistent, and
    /// [`DecodeError::Source`] if the source fails.
    pub fn read<S: ByteSource + ?Sized>(
        source: &mut S,
        audio_header_position: u64,
        position: u64,
        quality_indicator: Option<u32>,
    ) -> Result<Option<Self>, DecodeError> {
        let signature = source.read_block_at(position, SIGNATURE_LEN)?;
        if signature.len() < SIGNATURE_LEN || &signature[..LAME_ID.len()] != LAME_ID {
            #[cfg(feature = "log")]
            debug!("LAME signature not found at {position}.");
            return Ok(None);
        }
        let mut encoder_version = [0u8; ENCODER_VERSION_LEN];
        encoder_version.copy_from_slice(&signature[LAME_ID.len()..SIGNATURE_LEN]);

        let (vbr_quality_value, q_value) = decompose_quality_indicator(quality_indicator);

        let record_position = advance(position, SIGNATURE_LEN as u64)?;
        let record = source.read_block_at(record_position, RECORD_LEN)?;
        if record.len() != RECORD_LEN {
            return Err(CorruptDataError::new("record", "unexpected end of stream").into());
        }
        let (_, fields) = parser::lame_record::<nom::error::Error<&[u8]>>(&record)
            .map_err(|_e| CorruptDataError::new("record", "unexpected end of stream"))?;
        let replay_gain =
            ReplayGain::from_bytes(fields.replay_gain).map_err(|e| e.within("replay_gain"))?;

        let mp3_gain = if fields.mp3_gain_negative {
            -(fields.mp3_gain_magnitude as i8)
        } else {
            fields.mp3_gain_magnitude as i8
        };
        let vbr_method = VbrMethod::from_tag(fields.vbr_method);

        Ok(Some(Self {
            audio_header_position,
            encoder_version,
            vbr_quality_value,
            q_value,
            tag_revision: fields.tag_revision,
            vbr_method,
            lame_vbr_method: LameVbrMethod::from_vbr_method(vbr_method),
            lowpass_filter: u32::from(fields.lowpass) * 100,
            replay_gain,
            ns_psytune_used: fields.ns_psytune,
            ns_safejoint_used: fields.ns_safejoint,
            no_gap_continued: fields.no_gap_continued,
            no_gap_continuation: fields.no_gap_continuation,
            ath_type: fields.ath_type,
            bitrate: fields.bitrate,
            encoder_delay: fields.encoder_delay,
            encoder_padding: fields.encoder_padding,
            noise_shaping: fields.noise_shaping,
            stereo_mode: LameStereoMode::from_tag(fields.stereo_mode),
            unwise_settings_used: fields.unwise_settings,
            source_sample_frequency: SourceSampleFrequency::from_tag(fields.source_frequency),
            mp3_gain,
            surround_info: SurroundInfo::from_tag(fields.surround),
            preset: LamePreset::from_value(fields.preset),
            music_length: fields.music_length,
            music_crc: fields.music_crc,
            info_tag_crc: fields.info_tag_crc,
        }))
    }

    /// Returns the absolute position of the MPEG frame containing this header.
    #[inline]
    pub fn audio_header_position(&self) -> u64 {
        self.audio_header_position
    }

    /// Returns the encoder version tag (e.g. `3.99r`) as text.
    ///
    /// Invalid UTF-8 sequences are replaced, and trailing NUL bytes are
    /// removed.
    pub fn encoder_version(&self) -> String {
        String::from_utf8_lossy(&self.encoder_version)
            .trim_end_matches('\0')
            .to_owned()
    }

    /// Returns the raw encoder version tag.
    #[inline]
    pub fn encoder_version_bytes(&self) -> &[u8; ENCODER_VERSION_LEN] {
        &self.encoder_version
    }

    /// Returns the VBR level derived from the Xing quality indicator.
    #[inline]
    pub fn vbr_quality_value(&self) -> Option<u32> {
        self.vbr_quality_value
    }

    /// Returns the q value derived from the Xing quality indicator.
    #[inline]
    pub fn q_value(&self) -> Option<u32> {
        self.q_value
    }

    /// Returns the tag revision (high nibble of the first byte, unshifted).
    #[inline]
    pub fn tag_revision(&self) -> u8 {
        self.tag_revision
    }

    #[inline]
    pub fn vbr_method(&self) -> VbrMethod {
        self.vbr_method
    }

    #[inline]
    pub fn lame_vbr_method(&self) -> LameVbrMethod {
        self.lame_vbr_method
    }

    /// Returns the lowpass filter frequency in Hz.
    #[inline]
    pub fn lowpass_filter(&self) -> u32 {
        self.lowpass_filter
    }

    #[inline]
    pub fn replay_gain(&self) -> &ReplayGain {
        &self.replay_gain
    }

    /// Returns `true` if `--nspsytune` was used.
    #[inline]
    pub fn ns_psytune_used(&self) -> bool {
        self.ns_psytune_used
    }

    /// Returns `true` if `--nssafejoint` was used.
    #[inline]
    pub fn ns_safejoint_used(&self) -> bool {
        self.ns_safejoint_used
    }

    /// Returns `true` if the next track is encoded as a gapless continuation.
    #[inline]
    pub fn no_gap_continued(&self) -> bool {
        self.no_gap_continued
    }

    /// Returns `true` if this track is a gapless continuation of the previous one.
    #[inline]
    pub fn no_gap_continuation(&self) -> bool {
        self.no_gap_continuation
    }

    #[inline]
    pub fn ath_type(&self) -> u8 {
        self.ath_type
    }

    /// Returns the bitrate field in kbit/s.
    ///
    /// The meaning depends on [`vbr_method`](Self::vbr_method); see
    /// [`bitrate_description`](Self::bitrate_description).
    #[inline]
    pub fn bitrate(&self) -> u8 {
        self.bitrate
    }

    /// Describes the bitrate field according to the VBR method.
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
    /// let lame = header.lame_header().unwrap();
    /// assert_eq!(lame.bitrate_description(), "Minimal VBR bitrate: 32 kbit/s");
    /// ```
    pub fn bitrate_description(&self) -> String {
        let bitrate = self.bitrate;
        match self.vbr_method {
            VbrMethod::Unknown => "unknown, no description".to_owned(),
            VbrMethod::Cbr | VbrMethod::Cbr2Pass => format!("CBR bitrate: {bitrate} kbit/s"),
            VbrMethod::Abr | VbrMethod::Abr2Pass => {
                if bitrate == 0 {
                    "ABR bitrate unknown".to_owned()
                } else {
                    format!("Specified bitrate (--abr): {bitrate} kbit/s")
                }
            }
            VbrMethod::FullVbr1
            | VbrMethod::FullVbr2
            | VbrMethod::FullVbr3
            | VbrMethod::FullVbr4 => format!("Minimal VBR bitrate: {bitrate} kbit/s"),
        }
    }

    /// Returns the encoder delay in samples.
    #[inline]
    pub fn encoder_delay(&self) -> u16 {
        self.encoder_delay
    }

    /// Returns the padding at the end of the stream in samples.
    #[inline]
    pub fn encoder_padding(&self) -> u16 {
        self.encoder_padding
    }

    #[inline]
    pub fn noise_shaping(&self) -> u8 {
        self.noise_shaping
    }

    #[inline]
    pub fn stereo_mode(&self) -> LameStereoMode {
        self.stereo_mode
    }

    #[inline]
    pub fn unwise_settings_used(&self) -> bool {
        self.unwise_settings_used
    }

    #[inline]
    pub fn source_sample_frequency(&self) -> SourceSampleFrequency {
        self.source_sample_frequency
    }

    /// Returns the MP3Gain adjustment in 1.5 dB steps.
    #[inline]
    pub fn mp3_gain(&self) -> i8 {
        self.mp3_gain
    }

    /// Returns the amplitude factor applied by MP3Gain (`2^(gain / 4)`).
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
    /// let lame = header.lame_header().unwrap();
    /// assert_eq!(lame.mp3_gain(), -4);
    /// assert_eq!(lame.mp3_gain_amplification_factor(), 0.5f64);
    /// assert_eq!(lame.mp3_gain_decibel_change(), -6.0f64);
    /// ```
    pub fn mp3_gain_amplification_factor(&self) -> f64 {
        2.0f64.powf(f64::from(self.mp3_gain) * 0.25)
    }

    /// Returns the gain change applied by MP3Gain in dB.
    pub fn mp3_gain_decibel_change(&self) -> f64 {
        f64::from(self.mp3_gain) * 1.5
    }

    #[inline]
    pub fn surround_info(&self) -> SurroundInfo {
        self.surround_info
    }

    #[inline]
    pub fn preset(&self) -> LamePreset {
        self.preset
    }

    /// Returns the stored length of the stream in bytes.
    ///
    /// This is counted from the start of the frame containing this header.
    #[inline]
    pub fn music_length(&self) -> u32 {
        self.music_length
    }

    /// Returns the stored CRC-16 of the audio data.
    #[inline]
    pub fn music_crc(&self) -> u16 {
        self.music_crc
    }

    /// Returns the stored CRC-16 of the first 190 bytes of the frame.
    #[inline]
    pub fn info_tag_crc(&self) -> u16 {
        self.info_tag_crc
    }
}
