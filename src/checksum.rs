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

//! CRC verification for streams with a LAME header.
//!
//! A LAME header stores two CRC-16 values: one over the audio data
//! ("music CRC") and one over the first 190 bytes of the frame carrying the
//! header ("info tag CRC").

#[cfg(feature = "log")]
use log::info;

use super::component::AudioStream;
use super::component::LameHeader;
use super::component::XingHeader;
use super::constant::lame::INFO_TAG_CRC_LEN;
use super::constant::lame::MUSIC_CRC_START;
use super::error::CorruptDataError;
use super::error::DecodeError;
use super::error::InvalidArgumentError;
use super::source::advance;
use super::source::ByteSource;
use super::source::ReadAccess;

const CRC_16_LAME: crc::Algorithm<u16> = crc::CRC_16_ARC;

/// CRC-16 used in LAME headers (CRC-16/ARC).
pub static LAME_CRC: crc::Crc<u16, crc::Table<16>> =
    crc::Crc::<u16, crc::Table<16>>::new(&CRC_16_LAME);

/// Computes the CRC-16 of `bytes` with the algorithm used by LAME.
///
/// # Examples
///
/// ```
/// # use mpegvbr::checksum::*;
/// assert_eq!(crc16(b"123456789"), 0xBB3D);
/// ```
pub fn crc16(bytes: &[u8]) -> u16 {
    LAME_CRC.checksum(bytes)
}

/// Finds the LAME header in the first stream that carries one.
///
/// Streams without a Xing/Info header, and streams whose header has no LAME
/// extension, are skipped.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidArgument`] if none of `streams` carries a
/// LAME header.
pub fn find_lame_header<'a, I, A>(streams: I) -> Result<&'a LameHeader, DecodeError>
where
    I: IntoIterator<Item = &'a A>,
    A: AudioStream + ?Sized + 'a,
{
    let mut count = 0usize;
    for stream in streams {
        count += 1;
        if let Some(lame) = stream.xing_header().and_then(XingHeader::lame_header) {
            return Ok(lame);
        }
    }
    Err(InvalidArgumentError::from_display(
        "streams",
        "no stream carries a LAME header",
        &format!("{count} stream(s)"),
    )
    .into())
}

/// Returns the start position and the length of the range covered by the
/// music CRC.
///
/// # Errors
///
/// Returns [`DecodeError::CorruptData`] if the stored music length is
/// shorter than the range covered by the info tag, and
/// [`DecodeError::Source`] if the range start is not addressable.
pub fn music_crc_range(lame: &LameHeader) -> Result<(u64, usize), DecodeError> {
    let len = u64::from(lame.music_length())
        .checked_sub(MUSIC_CRC_START)
        .ok_or_else(|| CorruptDataError::new("music_length", "shorter than the LAME tag"))?;
    let len = usize::try_from(len)
        .map_err(|_| CorruptDataError::new("music_length", "exceeds the addressable range"))?;
    let position = advance(lame.audio_header_position(), MUSIC_CRC_START)?;
    Ok((position, len))
}

/// Reads exactly `len` bytes at `position` under scoped read access.
fn read_checked_range<S: ByteSource + ?Sized>(
    source: &mut S,
    position: u64,
    len: usize,
    component: &str,
) -> Result<Vec<u8>, DecodeError> {
    let bytes = {
        let mut access = ReadAccess::acquire(source)?;
        access.read_block_at(position, len)?
    };
    if bytes.len() != len {
        return Err(CorruptDataError::new(component, "unexpected end of stream").into());
    }
    Ok(bytes)
}

/// Verifies the music CRC stored in `lame`.
///
/// Returns `Ok(false)` if the computed CRC does not match the stored one.
///
/// # Errors
///
/// Returns [`DecodeError::CorruptData`] if the stored music length is
/// invalid or the stream is shorter than the stored length, and
/// [`DecodeError::Source`] if the source fails.
pub fn verify_music_crc<S: ByteSource + ?Sized>(
    source: &mut S,
    lame: &LameHeader,
) -> Result<bool, DecodeError> {
    let (position, len) = music_crc_range(lame)?;
    let bytes = read_checked_range(source, position, len, "music")?;
    let computed = crc16(&bytes);
    #[cfg(feature = "log")]
    info!(
        "Music CRC: stored={:#06x}, computed={computed:#06x} over {len} bytes.",
        lame.music_crc()
    );
    Ok(computed == lame.music_crc())
}

/// Verifies the info tag CRC stored in `lame`.
///
/// Returns `Ok(false)` if the computed CRC does not match the stored one.
///
/// # Errors
///
/// Returns [`DecodeError::CorruptData`] if the frame is shorter than the
/// covered range, and [`DecodeError::Source`] if the source fails.
pub fn verify_info_tag_crc<S: ByteSource + ?Sized>(
    source: &mut S,
    lame: &LameHeader,
) -> Result<bool, DecodeError> {
    let bytes = read_checked_range(
        source,
        lame.audio_header_position(),
        INFO_TAG_CRC_LEN,
        "info_tag",
    )?;
    let computed = crc16(&bytes);
    #[cfg(feature = "log")]
    info!(
        "Info tag CRC: stored={:#06x}, computed={computed:#06x}.",
        lame.info_tag_crc()
    );
    Ok(computed == lame.info_tag_crc())
}

/// Verifies the music CRC of the first stream in `streams` with a LAME header.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidArgument`] if no stream carries a LAME
/// header, and errors from [`verify_music_crc`] otherwise.
///
/// # Examples
///
/// ```
/// # use mpegvbr::component::*;
/// # use mpegvbr::checksum::*;
/// # #[path = "doctest_helper.rs"]
/// # mod doctest_helper;
/// # use doctest_helper::*;
/// let mut src = make_example_source();
/// let header = AudioHeader::read(
///     &mut src, 0, MpegVersion::Version1, ChannelMode::JointStereo
/// ).unwrap();
/// assert!(check_music_crc(&mut src, [&header]).unwrap());
/// assert!(check_info_tag_crc(&mut src, [&header]).unwrap());
/// ```
pub fn check_music_crc<'a, S, I, A>(source: &mut S, streams: I) -> Result<bool, DecodeError>
where
    S: ByteSource + ?Sized,
    I: IntoIterator<Item = &'a A>,
    A: AudioStream + ?Sized + 'a,
{
    let lame = find_lame_header(streams)?;
    verify_music_crc(source, lame)
}

/// Verifies the info tag CRC of the first stream in `streams` with a LAME
/// header.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidArgument`] if no stream carries a LAME
/// header, and errors from [`verify_info_tag_crc`] otherwise.
pub fn check_info_tag_crc<'a, S, I, A>(source: &mut S, streams: I) -> Result<bool, DecodeError>
where
    S: ByteSource + ?Sized,
    I: IntoIterator<Item = &'a A>,
    A: AudioStream + ?Sized + 'a,
{
    let lame = find_lame_header(streams)?;
    verify_info_tag_crc(source, lame)
}
