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

#![no_main]

use arbitrary::Arbitrary;
use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;

use mpegvbr::checksum;
use mpegvbr::component::AudioHeader;
use mpegvbr::component::ChannelMode;
use mpegvbr::component::MpegVersion;
use mpegvbr::component::ReplayGain;
use mpegvbr::component::XingHeader;
use mpegvbr::source::MemSource;

fn arbitrary_version(u: &mut Unstructured) -> Result<MpegVersion, arbitrary::Error> {
    match u.int_in_range(0..=2usize)? {
        0 => Ok(MpegVersion::Version1),
        1 => Ok(MpegVersion::Version2),
        2 => Ok(MpegVersion::Version25),
        _ => unreachable!(),
    }
}

#[derive(Debug)]
struct Input {
    version: MpegVersion,
    channel_mode: ChannelMode,
    bytes: Vec<u8>,
}

impl<'a> Arbitrary<'a> for Input {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self, arbitrary::Error> {
        let version = arbitrary_version(u)?;
        let channel_mode = ChannelMode::from_tag(u.int_in_range(0..=3u8)?);

        // Most of the inputs carry the magic bytes so that the fuzzer reaches
        // the field decoders.
        let mut bytes = vec![0u8; XingHeader::offset(version, channel_mode) as usize];
        match u.int_in_range(0..=3usize)? {
            0 => bytes.extend_from_slice(b"Info"),
            1 => {}
            _ => bytes.extend_from_slice(b"Xing"),
        }
        let flags = u.int_in_range(0..=0x0Fu8)?;
        bytes.extend_from_slice(&[0, 0, 0, flags]);
        let body: Vec<u8> = Vec::arbitrary(u)?;
        if bool::arbitrary(u)? {
            let lame_at = u.int_in_range(0..=body.len())?;
            bytes.extend_from_slice(&body[..lame_at]);
            bytes.extend_from_slice(b"LAME");
            bytes.extend_from_slice(&body[lame_at..]);
        } else {
            bytes.extend_from_slice(&body);
        }

        Ok(Self {
            version,
            channel_mode,
            bytes,
        })
    }
}

fuzz_target!(|input: Input| {
    let mut src = MemSource::from_bytes(input.bytes.clone());
    let Ok(header) = AudioHeader::read(&mut src, 0, input.version, input.channel_mode) else {
        return;
    };

    let mut src2 = MemSource::from_bytes(input.bytes.clone());
    let header2 = AudioHeader::read(&mut src2, 0, input.version, input.channel_mode).unwrap();
    assert_eq!(header, header2);

    let xing = header.xing();
    if !xing.is_present() {
        assert_eq!(xing, &XingHeader::unknown());
        return;
    }
    for percent in [0.0, 33.3, 100.0] {
        if let (Some(pos), Some(_)) = (xing.toc_seek_position(percent), xing.toc()) {
            assert!(pos <= u64::from(xing.total_size()));
        }
    }
    if let Some(lame) = xing.lame_header() {
        let gain = lame.replay_gain();
        assert_eq!(gain.is_present(), gain != &ReplayGain::default());
        // Errors are fine; only panics are failures.
        let _ = checksum::check_music_crc(&mut src, [&header]);
        let _ = checksum::check_info_tag_crc(&mut src, [&header]);
    }
});
