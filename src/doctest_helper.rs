// Copyright 2023 Google LLC
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

#![allow(dead_code)]

// mimic clippy. This file acts as a part of the crate when checked by clippy.
// but it is outside of the crate when it is actually used by doctests.
#[cfg(clippy)]
use crate as mpegvbr;

use mpegvbr::checksum::crc16;
use mpegvbr::source::MemSource;

/// Number of frames stored in the example Xing header.
pub const EXAMPLE_FRAMES: u32 = 1000;

/// Length of the example stream in bytes.
pub const EXAMPLE_LEN: usize = 1152;

/// Makes the bytes of an MPEG-1 joint-stereo stream for doctest.
///
/// The first frame (128 kbit/s, 48 kHz) carries a Xing header with all the
/// fields and a LAME header with valid CRCs.
pub fn make_example_bytes() -> Vec<u8> {
    let mut ret = vec![0u8; EXAMPLE_LEN];
    ret[..4].copy_from_slice(&[0xFF, 0xFB, 0x94, 0x44]);

    ret[0x24..0x28].copy_from_slice(b"Xing");
    ret[0x2B] = 0x0F;
    ret[0x2C..0x30].copy_from_slice(&EXAMPLE_FRAMES.to_be_bytes());
    ret[0x30..0x34].copy_from_slice(&(EXAMPLE_LEN as u32).to_be_bytes());
    for (i, v) in ret[0x34..0x98].iter_mut().enumerate() {
        *v = (i * 256 / 100) as u8;
    }
    ret[0x98..0x9C].copy_from_slice(&57u32.to_be_bytes());

    ret[0x9C..0xA5].copy_from_slice(b"LAME3.100");
    ret[165] = 0x04; // revision 0, full VBR method 2
    ret[166] = 190; // lowpass 19 kHz
    ret[176] = 32; // minimal bitrate
    ret[177..180].copy_from_slice(&[0x24, 0x02, 0x40]);
    ret[181] = 0x84; // mp3 gain -4
    ret[184..188].copy_from_slice(&(EXAMPLE_LEN as u32).to_be_bytes());

    for (i, v) in ret[384..].iter_mut().enumerate() {
        *v = (i % 251) as u8;
    }
    let music_crc = crc16(&ret[0xC0..]);
    ret[188..190].copy_from_slice(&music_crc.to_be_bytes());
    let info_tag_crc = crc16(&ret[..190]);
    ret[190..192].copy_from_slice(&info_tag_crc.to_be_bytes());
    ret
}

/// Makes a `MemSource` of the example stream for doctest.
pub fn make_example_source() -> MemSource {
    MemSource::from_bytes(make_example_bytes())
}
