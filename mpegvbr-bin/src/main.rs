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

#![doc = include_str!("../README.md")]
// Note that clippy attributes should be in sync with those declared in "lib.rs"
#![warn(clippy::all, clippy::nursery, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate
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

use std::fs::File;
use std::io::Write;

use clap::Parser;
use log::info;

use mpegvbr::config;
use mpegvbr::error::Verified;
use mpegvbr::error::Verify;
use mpegvbr::inspect::Inspection;
use mpegvbr::source::FileSource;

mod display;
mod error;
mod frame;

use error::Error;
use frame::FrameHeader;

/// Xing/Info and LAME header inspector.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path for the input MP3 file.
    source: String,
    /// If set, load config from the specified file.
    #[clap(short, long)]
    config: Option<String>,
    /// If set, dump the config used to the specified path.
    #[clap(long)]
    dump_config: Option<String>,
    /// If set, dump the decoded headers to the specified path.
    #[clap(short, long)]
    dump_struct: Option<String>,
    /// If set, CRCs are not verified.
    #[clap(long)]
    no_crc: bool,
}

/// Exit codes of the inspector process.
enum ExitCode {
    #[allow(dead_code)]
    Normal = 0,
    InvalidConfig = -1,
    InvalidInput = -2,
    CrcMismatch = -3,
}

fn log_build_constants() {
    info!(
        target: "mpegvbr-bin::build_info::jsonl",
        "{{ version: \"{}\", features: \"{}\" }}",
        mpegvbr::constant::build_info::CRATE_VERSION,
        mpegvbr::constant::build_info::FEATURES,
    );
}

/// Loads the inspector config and applies the command-line overrides.
#[allow(clippy::expect_used)]
fn load_config(args: &Args) -> config::Inspector {
    let mut inspector_config =
        args.config
            .as_ref()
            .map_or_else(config::Inspector::default, |path| {
                let conf_str = std::fs::read_to_string(path).expect("Config file read error.");
                toml::from_str(&conf_str).expect("Config file syntax error.")
            });
    if args.no_crc {
        inspector_config.crc.music = false;
        inspector_config.crc.info_tag = false;
    }
    inspector_config
}

/// Locates the first frame in `source` and decodes its headers.
fn run_inspector(
    inspector_config: &Verified<config::Inspector>,
    source: &mut FileSource,
) -> Result<(u64, FrameHeader, Inspection), Error> {
    let (position, frame) = frame::locate_first_frame(source)?;
    info!("Found {frame} at byte {position}.");
    let inspection = mpegvbr::inspect_audio_header(
        inspector_config,
        source,
        position,
        frame.version(),
        frame.channel_mode(),
    )?;
    Ok((position, frame, inspection))
}

#[allow(clippy::let_underscore_must_use)]
fn main_body(args: Args) -> Result<(), i32> {
    let _ = display::show_banner();
    log_build_constants();

    let inspector_config = load_config(&args);
    if let Some(path) = &args.dump_config {
        let mut file = File::create(path).expect("Failed to create a file.");
        file.write_all(
            toml::to_string(&inspector_config)
                .expect("Config serialization failed.")
                .as_bytes(),
        )
        .expect("File write failed.");
    }
    let inspector_config = match inspector_config.into_verified() {
        Ok(c) => c,
        Err((_, e)) => {
            eprintln!("Error: {}", e.within("inspector_config"));
            return Err(ExitCode::InvalidConfig as i32);
        }
    };

    let mut source = FileSource::new(&args.source);
    let (position, frame, inspection) = match run_inspector(&inspector_config, &mut source) {
        Ok(ret) => ret,
        Err(e) => {
            eprintln!("Error: {e}");
            return Err(ExitCode::InvalidInput as i32);
        }
    };

    let _ = display::show_inspection(
        &display::input_name(&args.source),
        position,
        &frame,
        &inspection,
    );

    if let Some(path) = args.dump_struct {
        let data =
            rmp_serde::to_vec_named(&inspection).expect("Failed to serialize into msgpack.");
        let mut file = File::create(path).expect("Failed to create file.");
        file.write_all(&data).expect("Failed to write");
    }

    if inspection.is_consistent() {
        Ok(())
    } else {
        Err(ExitCode::CrcMismatch as i32)
    }
}

fn main() -> Result<(), i32> {
    env_logger::Builder::from_env("MPEGVBR_LOG")
        .format_timestamp(None)
        .init();
    main_body(Args::parse())
}
