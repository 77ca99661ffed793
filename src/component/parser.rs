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

//! `nom` recognizers for the fixed-layout records.
//!
//! Recognizers here only split bytes into bit fields. Interpretation of the
//! fields (enum mapping, sign handling, consistency checks) is done by the
//! component types.

use nom::bits::bits;
use nom::bits::complete::take as bit_take;
use nom::bytes::complete::take as byte_take;
use nom::error::ParseError;
use nom::number::complete::be_f32;
use nom::number::complete::be_u16;
use nom::number::complete::be_u32;
use nom::number::complete::be_u8;
use nom::IResult;

use crate::constant::replay_gain::RECORD_LEN as REPLAY_GAIN_RECORD_LEN;

type BitInput<'a> = (&'a [u8], usize);

/// Raw fields of one half of the replay gain record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct GainAdjustmentFields {
    pub name: u8,       // 3 bits
    pub originator: u8, // 3 bits
    pub negative: bool, // 1 bit
    pub magnitude: u16, // 9 bits
}

/// Raw fields of the replay gain record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ReplayGainFields {
    pub peak_signal_amplitude: f32,
    pub radio: GainAdjustmentFields,
    pub audiophile: GainAdjustmentFields,
}

/// Raw fields of the 27-byte LAME record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct LameRecordFields<'a> {
    pub tag_revision: u8,         // byte 0, high nibble (kept in place)
    pub vbr_method: u8,           // byte 0, low nibble
    pub lowpass: u8,              // byte 1
    pub replay_gain: &'a [u8],    // bytes 2-9
    pub no_gap_continuation: bool, // byte 10, bit 7
    pub no_gap_continued: bool,   // byte 10, bit 6
    pub ns_safejoint: bool,       // byte 10, bit 5
    pub ns_psytune: bool,         // byte 10, bit 4
    pub ath_type: u8,             // byte 10, low nibble
    pub bitrate: u8,              // byte 11
    pub encoder_delay: u16,       // (b12 << 4) + (b13 & 0xF0)
    pub encoder_padding: u16,     // 12 bits
    pub source_frequency: u8,     // byte 15, bits 6-7
    pub unwise_settings: bool,    // byte 15, bit 5
    pub stereo_mode: u8,          // byte 15, bits 2-3
    pub noise_shaping: u8,        // byte 15, bits 0-1
    pub mp3_gain_negative: bool,  // byte 16, bit 7
    pub mp3_gain_magnitude: u8,   // byte 16, bits 0-6
    pub surround: u8,             // byte 17, bits 3-5
    pub preset: u16,              // 11 bits
    pub music_length: u32,
    pub music_crc: u16,
    pub info_tag_crc: u16,
}

fn convert_bits_err<'a, E>(e: nom::Err<(&'a [u8], nom::error::ErrorKind)>) -> nom::Err<E>
where
    E: ParseError<&'a [u8]>,
{
    e.map(|(inp, kind)| E::from_error_kind(inp, kind))
}

/// Recognizes the replay gain record (8 bytes).
///
/// # Errors
///
/// Same as other nom parsers, this returns [`nom::Err`] if `input` is too short.
pub(crate) fn replay_gain<'a, E>(input: &'a [u8]) -> IResult<&'a [u8], ReplayGainFields, E>
where
    E: ParseError<&'a [u8]>,
{
    let remaining_input = input;
    let (remaining_input, peak_signal_amplitude) = be_f32(remaining_input)?;
    let (remaining_input, radio) = gain_adjustment(remaining_input)?;
    let (remaining_input, audiophile) = gain_adjustment(remaining_input)?;
    Ok((
        remaining_input,
        ReplayGainFields {
            peak_signal_amplitude,
            radio,
            audiophile,
        },
    ))
}

/// Recognizes a 16-bit gain adjustment (name, originator, sign, magnitude).
fn gain_adjustment<'a, E>(input: &'a [u8]) -> IResult<&'a [u8], GainAdjustmentFields, E>
where
    E: ParseError<&'a [u8]>,
{
    bits(|input| {
        let remaining_input = input;
        let (remaining_input, name): (_, u8) = bit_take(3usize)(remaining_input)?;
        let (remaining_input, originator): (_, u8) = bit_take(3usize)(remaining_input)?;
        let (remaining_input, sign): (_, u8) = bit_take(1usize)(remaining_input)?;
        let (remaining_input, magnitude): (_, u16) = bit_take(9usize)(remaining_input)?;
        let ret: IResult<_, _, (BitInput<'a>, nom::error::ErrorKind)> = Ok((
            remaining_input,
            GainAdjustmentFields {
                name,
                originator,
                negative: sign != 0,
                magnitude,
            },
        ));
        ret
    })(input)
    .map_err(convert_bits_err)
}

/// Recognizes a byte as a pair of nibbles (high, low).
fn nibbles<'a, E>(input: &'a [u8]) -> IResult<&'a [u8], (u8, u8), E>
where
    E: ParseError<&'a [u8]>,
{
    bits(|input| {
        let remaining_input = input;
        let (remaining_input, high): (_, u8) = bit_take(4usize)(remaining_input)?;
        let (remaining_input, low): (_, u8) = bit_take(4usize)(remaining_input)?;
        let ret: IResult<_, _, (BitInput<'a>, nom::error::ErrorKind)> =
            Ok((remaining_input, (high, low)));
        ret
    })(input)
    .map_err(convert_bits_err)
}

/// Recognizes the 27-byte LAME record that follows the signature block.
///
/// # Errors
///
/// Same as other nom parsers, this returns [`nom::Err`] if `input` is too short.
pub(crate) fn lame_record<'a, E>(input: &'a [u8]) -> IResult<&'a [u8], LameRecordFields<'a>, E>
where
    E: ParseError<&'a [u8]>,
{
    let remaining_input = input;
    let (remaining_input, (revision, vbr_method)) = nibbles(remaining_input)?;
    let (remaining_input, lowpass) = be_u8(remaining_input)?;
    let (remaining_input, replay_gain) = byte_take(REPLAY_GAIN_RECORD_LEN)(remaining_input)?;
    let (remaining_input, (encoding_flags, ath_type)) = nibbles(remaining_input)?;
    let (remaining_input, bitrate) = be_u8(remaining_input)?;
    let (remaining_input, (encoder_delay, encoder_padding)) = bits(|input| {
        let remaining_input = input;
        let (remaining_input, delay_high): (_, u16) = bit_take(8usize)(remaining_input)?;
        let (remaining_input, delay_low): (_, u16) = bit_take(4usize)(remaining_input)?;
        let (remaining_input, padding): (_, u16) = bit_take(12usize)(remaining_input)?;
        // Byte 13 contributes its upper nibble in place.
        let delay = (delay_high << 4) + (delay_low << 4);
        let ret: IResult<_, _, (BitInput<'a>, nom::error::ErrorKind)> =
            Ok((remaining_input, (delay, padding)));
        ret
    })(remaining_input)
    .map_err(convert_bits_err)?;
    let (remaining_input, (source_frequency, unwise, stereo_mode, noise_shaping)) =
        bits(|input| {
            let remaining_input = input;
            let (remaining_input, freq): (_, u8) = bit_take(2usize)(remaining_input)?;
            let (remaining_input, unwise): (_, u8) = bit_take(1usize)(remaining_input)?;
            let (remaining_input, _unused): (_, u8) = bit_take(1usize)(remaining_input)?;
            let (remaining_input, stereo): (_, u8) = bit_take(2usize)(remaining_input)?;
            let (remaining_input, shaping): (_, u8) = bit_take(2usize)(remaining_input)?;
            let ret: IResult<_, _, (BitInput<'a>, nom::error::ErrorKind)> =
                Ok((remaining_input, (freq, unwise != 0, stereo, shaping)));
            ret
        })(remaining_input)
        .map_err(convert_bits_err)?;
    let (remaining_input, (mp3_gain_negative, mp3_gain_magnitude)) = bits(|input| {
        let remaining_input = input;
        let (remaining_input, sign): (_, u8) = bit_take(1usize)(remaining_input)?;
        let (remaining_input, magnitude): (_, u8) = bit_take(7usize)(remaining_input)?;
        let ret: IResult<_, _, (BitInput<'a>, nom::error::ErrorKind)> =
            Ok((remaining_input, (sign != 0, magnitude)));
        ret
    })(remaining_input)
    .map_err(convert_bits_err)?;
    let (remaining_input, (surround, preset)) = bits(|input| {
        let remaining_input = input;
        let (remaining_input, _unused): (_, u8) = bit_take(2usize)(remaining_input)?;
        let (remaining_input, surround): (_, u8) = bit_take(3usize)(remaining_input)?;
        let (remaining_input, preset): (_, u16) = bit_take(11usize)(remaining_input)?;
        let ret: IResult<_, _, (BitInput<'a>, nom::error::ErrorKind)> =
            Ok((remaining_input, (surround, preset)));
        ret
    })(remaining_input)
    .map_err(convert_bits_err)?;
    let (remaining_input, music_length) = be_u32(remaining_input)?;
    let (remaining_input, music_crc) = be_u16(remaining_input)?;
    let (remaining_input, info_tag_crc) = be_u16(remaining_input)?;

    Ok((
        remaining_input,
        LameRecordFields {
            tag_revision: revision << 4,
            vbr_method,
            lowpass,
            replay_gain,
            no_gap_continuation: encoding_flags & 0x8 != 0,
            no_gap_continued: encoding_flags & 0x4 != 0,
            ns_safejoint: encoding_flags & 0x2 != 0,
            ns_psytune: encoding_flags & 0x1 != 0,
            ath_type,
            bitrate,
            encoder_delay,
            encoder_padding,
            source_frequency,
            unwise_settings: unwise,
            stereo_mode,
            noise_shaping,
            mp3_gain_negative,
            mp3_gain_magnitude,
            surround,
            preset,
            music_length,
            music_crc,
            info_tag_crc,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    use nom::error::VerboseError;

    #[test]
    fn recognizing_gain_adjustment_bits() {
        // name=1, originator=3, sign=1, magnitude=0x1_2C
        let bytes = [0b001_011_1_1, 0x2C];
        let (rest, adj) = gain_adjustment::<VerboseError<&[u8]>>(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(
            adj,
            GainAdjustmentFields {
                name: 1,
                originator: 3,
                negative: true,
                magnitude: 0x12C,
            }
        );
    }

    #[test]
    fn recognizing_replay_gain_requires_eight_bytes() {
        let bytes = [0u8; 7];
        assert!(replay_gain::<VerboseError<&[u8]>>(&bytes).is_err());

        let bytes = [0x3F, 0x80, 0x00, 0x00, 0x20, 0x00, 0x40, 0x00];
        let (rest, fields) = replay_gain::<VerboseError<&[u8]>>(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(fields.peak_signal_amplitude, 1.0);
        assert_eq!(fields.radio.name, 1);
        assert_eq!(fields.audiophile.name, 2);
    }

    #[test]
    fn recognizing_lame_record_fields() {
        let mut bytes = [0u8; 27];
        bytes[0] = 0x21;
        bytes[10] = 0b1010_0011;
        bytes[12] = 0xAB;
        bytes[13] = 0xC5;
        bytes[14] = 0x12;
        bytes[15] = 0b10_1_0_11_01;
        bytes[16] = 0x84;
        bytes[17] = 0b00_010_001;
        bytes[18] = 0xF4;
        bytes[19..23].copy_from_slice(&0x0102_0304u32.to_be_bytes());
        bytes[23..25].copy_from_slice(&0xBEEFu16.to_be_bytes());
        bytes[25..27].copy_from_slice(&0xCAFEu16.to_be_bytes());

        let (rest, fields) = lame_record::<VerboseError<&[u8]>>(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(fields.tag_revision, 0x20);
        assert_eq!(fields.vbr_method, 1);
        assert!(fields.no_gap_continuation);
        assert!(!fields.no_gap_continued);
        assert!(fields.ns_safejoint);
        assert!(!fields.ns_psytune);
        assert_eq!(fields.ath_type, 3);
        assert_eq!(fields.encoder_delay, 0xAC0);
        assert_eq!(fields.encoder_padding, 0x512);
        assert_eq!(fields.source_frequency, 2);
        assert!(fields.unwise_settings);
        assert_eq!(fields.stereo_mode, 3);
        assert_eq!(fields.noise_shaping, 1);
        assert!(fields.mp3_gain_negative);
        assert_eq!(fields.mp3_gain_magnitude, 4);
        assert_eq!(fields.surround, 2);
        assert_eq!(fields.preset, 0x1F4);
        assert_eq!(fields.music_length, 0x0102_0304);
        assert_eq!(fields.music_crc, 0xBEEF);
        assert_eq!(fields.info_tag_crc, 0xCAFE);
    }

    #[test]
    fn recognizing_truncated_lame_record_fails() {
        let bytes = [0u8; 26];
        assert!(lame_record::<VerboseError<&[u8]>>(&bytes).is_err());
    }
}
