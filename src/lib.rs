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

#![doc = include_str!("../README.md")]
// Note that clippy attributes should be in sync with those declared in
// "mpegvbr-bin/src/main.rs"
#![warn(clippy::all, clippy::nursery, clippy::pedantic, clippy::cargo)]
// Some of clippy::pedantic rules are actually useful, so use it with a lot of
// ad-hoc exceptions.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_const_for_fn,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::wildcard_dependencies
)]
// Some from restriction lint-group
#![warn(
    clippy::clone_on_ref_ptr,
    clippy::create_dir,
    clippy::dbg_macro,
    clippy::empty_structs_with_brackets,
    clippy::exit,
    clippy::if_then_some_else_none,
    clippy::impl_trait_in_params,
    clippy::let_underscore_must_use,
    clippy::lossy_float_literal,
    clippy::multiple_inherent_impl,
    clippy::print_stdout,
    clippy::rc_buffer,
    clippy::rc_mutex,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::separated_literal_suffix,
    clippy::str_to_string,
    clippy::string_add,
    clippy::string_to_string,
    clippy::try_err,
    clippy::unnecessary_self_imports,
    clippy::wildcard_enum_match_arm
)]

pub mod checksum;
pub mod component;
pub mod config;
pub mod constant;
pub mod error;
pub mod inspect;
pub mod source;

#[cfg(test)]
pub mod test_helper;

// import global entry points
pub use inspect::inspect_audio_header;

#[cfg(test)]
mod test {
    // end-to-end, but transparent test.
    use super::*;
    use component::ChannelMode;
    use component::MpegVersion;
    use error::Verify;
    use rstest::rstest;

    const INSPECTOR_CONFIGS: [&str; 4] = [
        "",
        r"
[crc]
music = false
        ",
        r"
[crc]
info_tag = false
        ",
        r"
[crc]
max_music_bytes = 1
        ",
    ];

    #[rstest]
    fn e2e_with_file_source(
        #[values(0, 100, 4000)] audio_len: usize,
        #[values(INSPECTOR_CONFIGS[0],
                 INSPECTOR_CONFIGS[1],
                 INSPECTOR_CONFIGS[2],
                 INSPECTOR_CONFIGS[3])]
        config: &str,
    ) {
        let bytes = test_helper::make_stream_with_crcs(audio_len, 123);
        let mut file = tempfile::NamedTempFile::new().expect("failed to create temp file");
        std::io::Write::write_all(&mut file, &bytes).expect("write error");

        let config: config::Inspector = toml::from_str(config).expect("config parsing error");
        let expected_music = config.crc.music.then_some(true);
        let expected_music =
            expected_music.filter(|_| bytes.len() - 0xC0 <= config.crc.max_music_bytes);
        let expected_info_tag = config.crc.info_tag.then_some(true);
        let config = config.into_verified().expect("config value error");

        let mut source = source::FileSource::new(file.path());
        let inspection = inspect_audio_header(
            &config,
            &mut source,
            0,
            MpegVersion::Version1,
            ChannelMode::JointStereo,
        )
        .expect("inspection error");
        assert!(!source.is_open());

        assert_eq!(inspection.music_crc(), expected_music);
        assert_eq!(inspection.info_tag_crc(), expected_info_tag);
        let lame = inspection.lame_header().expect("LAME header not found");
        assert_eq!(lame.encoder_version(), "3.100");
        assert_eq!(lame.music_length() as usize, bytes.len());

        let from_memory = inspect_audio_header(
            &config,
            &mut source::MemSource::from_bytes(bytes),
            0,
            MpegVersion::Version1,
            ChannelMode::JointStereo,
        )
        .expect("inspection error");
        assert_eq!(inspection, from_memory);
    }
}
