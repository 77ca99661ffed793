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

use super::parser;
use super::parser::GainAdjustmentFields;
use crate::constant::replay_gain::ADJUSTMENT_SCALE;
use crate::constant::replay_gain::RECORD_LEN;
use crate::error::CorruptDataError;
use crate::error::DecodeError;
use crate::error::InvalidArgumentError;

/// Name field of a replay gain adjustment.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AdjustmentName {
    /// The adjustment is not set.
    #[default]
    NotSet,
    /// Radio (track) gain.
    Radio,
    /// Audiophile (album) gain.
    Audiophile,
    /// Reserved value.
    Unknown,
}

impl AdjustmentName {
    /// Constructs `AdjustmentName` from the 3-bit tag.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::component::*;
    /// assert_eq!(AdjustmentName::from_tag(1), AdjustmentName::Radio);
    /// assert_eq!(AdjustmentName::from_tag(7), AdjustmentName::Unknown);
    /// ```
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            0 => Self::NotSet,
            1 => Self::Radio,
            2 => Self::Audiophile,
            _ => Self::Unknown,
        }
    }
}

/// Originator field of a replay gain adjustment.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AdjustmentOriginator {
    /// The originator is not set.
    #[default]
    NotSet,
    /// Set by the artist.
    SetByArtist,
    /// Set by the user.
    SetByUser,
    /// Set automatically from a simple RMS average.
    SetBySimpleRmsAverage,
    /// Reserved value.
    Unknown,
}

impl AdjustmentOriginator {
    /// Constructs `AdjustmentOriginator` from the 3-bit tag.
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            0 => Self::NotSet,
            1 => Self::SetByArtist,
            2 => Self::SetByUser,
            3 => Self::SetBySimpleRmsAverage,
            _ => Self::Unknown,
        }
    }
}

/// Replay gain record embedded in the LAME header.
///
/// The record consists of the peak signal amplitude and two gain
/// adjustments. The first adjustment slot is reserved for radio gain and
/// the second one for audiophile gain.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReplayGain {
    peak_signal_amplitude: f32,
    radio_name: AdjustmentName,
    radio_originator: AdjustmentOriginator,
    radio_adjustment: f32,
    audiophile_name: AdjustmentName,
    audiophile_originator: AdjustmentOriginator,
    audiophile_adjustment: f32,
}

/// Converts a sign-magnitude adjustment to decibels.
fn adjustment_db(fields: &GainAdjustmentFields) -> f32 {
    let magnitude = f32::from(fields.magnitude) / ADJUSTMENT_SCALE;
    if fields.negative {
        -magnitude
    } else {
        magnitude
    }
}

impl ReplayGain {
    /// Decodes the 8-byte replay gain record.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidArgument`] if `data` is not exactly 8
    /// bytes long, and [`DecodeError::CorruptData`] if an adjustment is
    /// stored in the slot for the other kind.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::component::*;
    /// // peak = 1.0, radio gain set by user: -3.5 dB, no audiophile gain.
    /// let data = [0x3F, 0x80, 0x00, 0x00, 0b0010_1010, 35, 0x00, 0x00];
    /// let gain = ReplayGain::from_bytes(&data).unwrap();
    /// assert_eq!(gain.peak_signal_amplitude(), 1.0);
    /// assert_eq!(gain.radio_name(), AdjustmentName::Radio);
    /// assert_eq!(gain.radio_originator(), AdjustmentOriginator::SetByUser);
    /// assert_eq!(gain.radio_adjustment(), -3.5);
    /// assert_eq!(gain.audiophile_name(), AdjustmentName::NotSet);
    /// assert!(gain.is_present());
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() != RECORD_LEN {
            return Err(InvalidArgumentError::from_display(
                "data",
                "replay gain record must be 8 bytes long",
                &data.len(),
            )
            .into());
        }
        let (_, fields) = parser::replay_gain::<nom::error::Error<&[u8]>>(data)
            .map_err(|_e| CorruptDataError::new("replay_gain", "unexpected end of data"))?;

        let radio_name = AdjustmentName::from_tag(fields.radio.name);
        if !matches!(radio_name, AdjustmentName::NotSet | AdjustmentName::Radio) {
            return Err(
                CorruptDataError::new("radio_name", "expected radio adjustment data").into(),
            );
        }
        let audiophile_name = AdjustmentName::from_tag(fields.audiophile.name);
        if !matches!(
            audiophile_name,
            AdjustmentName::NotSet | AdjustmentName::Audiophile
        ) {
            return Err(CorruptDataError::new(
                "audiophile_name",
                "expected audiophile adjustment data",
            )
            .into());
        }

        Ok(Self {
            peak_signal_amplitude: fields.peak_signal_amplitude,
            radio_name,
            radio_originator: AdjustmentOriginator::from_tag(fields.radio.originator),
            radio_adjustment: adjustment_db(&fields.radio),
            audiophile_name,
            audiophile_originator: AdjustmentOriginator::from_tag(fields.audiophile.originator),
            audiophile_adjustment: adjustment_db(&fields.audiophile),
        })
    }

    /// Returns the peak signal amplitude (1.0 is the full scale).
    #[inline]
    pub fn peak_signal_amplitude(&self) -> f32 {
        self.peak_signal_amplitude
    }

    /// Returns the name field of the radio adjustment slot.
    #[inline]
    pub fn radio_name(&self) -> AdjustmentName {
        self.radio_name
    }

    /// Returns the originator of the radio adjustment.
    #[inline]
    pub fn radio_originator(&self) -> AdjustmentOriginator {
        self.radio_originator
    }

    /// Returns the radio gain adjustment in dB.
    #[inline]
    pub fn radio_adjustment(&self) -> f32 {
        self.radio_adjustment
    }

    /// Returns the name field of the audiophile adjustment slot.
    #[inline]
    pub fn audiophile_name(&self) -> AdjustmentName {
        self.audiophile_name
    }

    /// Returns the originator of the audiophile adjustment.
    #[inline]
    pub fn audiophile_originator(&self) -> AdjustmentOriginator {
        self.audiophile_originator
    }

    /// Returns the audiophile gain adjustment in dB.
    #[inline]
    pub fn audiophile_adjustment(&self) -> f32 {
        self.audiophile_adjustment
    }

    /// Returns `true` if any of the fields is set to a non-default value.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mpegvbr::component::*;
    /// let gain = ReplayGain::from_bytes(&[0u8; 8]).unwrap();
    /// assert!(!gain.is_present());
    /// ```
    pub fn is_present(&self) -> bool {
        self.peak_signal_amplitude != 0.0
            || self.radio_name != AdjustmentName::NotSet
            || self.radio_originator != AdjustmentOriginator::NotSet
            || self.radio_adjustment != 0.0
            || self.audiophile_name != AdjustmentName::NotSet
            || self.audiophile_originator != AdjustmentOriginator::NotSet
            || self.audiophile_adjustment != 0.0
    }
}
