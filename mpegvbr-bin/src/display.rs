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

//! A module for a fancy output for "mpegvbr-bin".

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use mpegvbr::component::AdjustmentName;
use mpegvbr::component::LameHeader;
use mpegvbr::component::ReplayGain;
use mpegvbr::component::XingHeader;
use mpegvbr::inspect::Inspection;
use termcolor::Color;
use termcolor::ColorChoice;
use termcolor::ColorSpec;
use termcolor::StandardStream;
use termcolor::WriteColor;

use crate::frame::FrameHeader;

const CRATE_VERSION: &str = match option_env!("CARGO_PKG_VERSION") {
    Some(v) => v,
    None => "unknown",
};
const UNKNOWN_INPUT_NAME: &str = "[unknown]";

fn terminal_output() -> Arc<termcolor::StandardStream> {
    Arc::new(StandardStream::stderr(ColorChoice::Auto))
}

/// Returns the file name part of `path` for display.
pub fn input_name<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().file_name().map_or_else(
        || UNKNOWN_INPUT_NAME.to_owned(),
        |s| s.to_string_lossy().to_string(),
    )
}

/// Show the initial banner.
pub fn show_banner() -> Result<(), std::io::Error> {
    let termout = terminal_output();
    let mut termout = termout.lock();
    termout.set_color(ColorSpec::new().set_bold(true))?;
    write!(termout, "\n{:>10} ", "vbrinfo")?;
    termout.reset()?;
    writeln!(
        termout,
        "(engine v{}, CLI v{})",
        mpegvbr::constant::build_info::CRATE_VERSION,
        CRATE_VERSION
    )?;
    termout.set_color(ColorSpec::new().set_dimmed(true))?;
    writeln!(
        termout,
        "{:>10} [{}]",
        "",
        mpegvbr::constant::build_info::FEATURES
    )?;
    termout.reset()
}

/// Writes a section title in the style of the banner.
fn write_section<W: WriteColor>(
    termout: &mut W,
    title: &str,
    detail: &str,
) -> std::io::Result<()> {
    termout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    write!(termout, "{title:>10} ")?;
    termout.reset()?;
    writeln!(termout, "{detail}")
}

fn write_field<W: WriteColor>(termout: &mut W, name: &str, value: &str) -> std::io::Result<()> {
    termout.set_color(ColorSpec::new().set_dimmed(true))?;
    write!(termout, "{:>10} {name:<22}", "")?;
    termout.reset()?;
    writeln!(termout, "{value}")
}

fn write_crc_result<W: WriteColor>(
    termout: &mut W,
    name: &str,
    result: Option<bool>,
) -> std::io::Result<()> {
    let (color, label) = match result {
        Some(true) => (Color::Green, "OK"),
        Some(false) => (Color::Red, "MISMATCH"),
        None => (Color::Yellow, "not checked"),
    };
    termout.set_color(ColorSpec::new().set_dimmed(true))?;
    write!(termout, "{:>10} {name:<22}", "")?;
    termout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    writeln!(termout, "{label}")?;
    termout.reset()
}

fn write_xing<W: WriteColor>(
    termout: &mut W,
    frame: &FrameHeader,
    xing: &XingHeader,
) -> std::io::Result<()> {
    let id = xing
        .header_id()
        .map_or_else(String::new, |id| format!("{id:?}"));
    write_section(termout, "Header", &id)?;
    write_field(termout, "frames", &xing.total_frames().to_string())?;
    write_field(termout, "bytes", &xing.total_size().to_string())?;
    let spf = frame.samples_per_frame();
    let rate = frame.sample_rate();
    if let Some(duration) = xing.duration(spf, rate) {
        write_field(
            termout,
            "duration",
            &format!("{:.3} s", duration.as_secs_f64()),
        )?;
    }
    if let Some(bitrate) = xing.average_bitrate(spf, rate) {
        write_field(termout, "average bitrate", &format!("{bitrate} bit/s"))?;
    }
    write_field(
        termout,
        "seek table",
        if xing.toc().is_some() { "yes" } else { "no" },
    )?;
    if let Some(quality) = xing.quality_indicator() {
        write_field(termout, "quality", &quality.to_string())?;
    }
    Ok(())
}

fn write_replay_gain<W: WriteColor>(termout: &mut W, gain: &ReplayGain) -> std::io::Result<()> {
    if !gain.is_present() {
        return write_field(termout, "replay gain", "none");
    }
    write_field(
        termout,
        "peak amplitude",
        &format!("{:.6}", gain.peak_signal_amplitude()),
    )?;
    if gain.radio_name() == AdjustmentName::Radio {
        write_field(
            termout,
            "radio gain",
            &format!(
                "{:+.1} dB ({:?})",
                gain.radio_adjustment(),
                gain.radio_originator()
            ),
        )?;
    }
    if gain.audiophile_name() == AdjustmentName::Audiophile {
        write_field(
            termout,
            "audiophile gain",
            &format!(
                "{:+.1} dB ({:?})",
                gain.audiophile_adjustment(),
                gain.audiophile_originator()
            ),
        )?;
    }
    Ok(())
}

fn write_lame<W: WriteColor>(termout: &mut W, lame: &LameHeader) -> std::io::Result<()> {
    write_section(termout, "LAME", &lame.encoder_version())?;
    write_field(
        termout,
        "vbr method",
        &format!("{:?} ({:?})", lame.vbr_method(), lame.lame_vbr_method()),
    )?;
    write_field(termout, "bitrate", &lame.bitrate_description())?;
    if let (Some(v), Some(q)) = (lame.vbr_quality_value(), lame.q_value()) {
        write_field(termout, "quality", &format!("V{v}, q{q}"))?;
    }
    write_field(termout, "lowpass", &format!("{} Hz", lame.lowpass_filter()))?;
    write_field(
        termout,
        "delay / padding",
        &format!("{} / {}", lame.encoder_delay(), lame.encoder_padding()),
    )?;
    write_field(termout, "preset", &lame.preset().to_string())?;
    write_field(termout, "stereo mode", &format!("{:?}", lame.stereo_mode()))?;
    write_field(
        termout,
        "source frequency",
        &format!("{:?}", lame.source_sample_frequency()),
    )?;
    write_field(
        termout,
        "mp3 gain",
        &format!("{:+.1} dB", lame.mp3_gain_decibel_change()),
    )?;
    write_replay_gain(termout, lame.replay_gain())
}

/// Shows the decoded headers and the CRC results.
pub fn show_inspection(
    input_name: &str,
    position: u64,
    frame: &FrameHeader,
    inspection: &Inspection,
) -> Result<(), std::io::Error> {
    let termout = terminal_output();
    let mut termout = termout.lock();
    write_section(&mut termout, "Frame", &format!("{input_name} @ {position}"))?;
    write_field(&mut termout, "format", &frame.to_string())?;

    let xing = inspection.audio_header().xing();
    if !xing.is_present() {
        write_section(&mut termout, "Header", "not found")?;
        return writeln!(termout);
    }
    write_xing(&mut termout, frame, xing)?;

    if let Some(lame) = xing.lame_header() {
        write_lame(&mut termout, lame)?;
        termout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        writeln!(termout, "{:>10} ", "CRC")?;
        termout.reset()?;
        write_crc_result(&mut termout, "music", inspection.music_crc())?;
        write_crc_result(&mut termout, "info tag", inspection.info_tag_crc())?;
    }
    writeln!(termout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_name_is_file_name() {
        assert_eq!(input_name("/tmp/music/track01.mp3"), "track01.mp3");
        assert_eq!(input_name("/"), UNKNOWN_INPUT_NAME);
    }

    #[test]
    fn crc_results_are_labelled() {
        let mut out = termcolor::NoColor::new(vec![]);
        write_crc_result(&mut out, "music", Some(true)).unwrap();
        write_crc_result(&mut out, "info tag", Some(false)).unwrap();
        write_crc_result(&mut out, "music", None).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        assert!(lines[0].trim_start().starts_with("music"));
        assert!(lines[0].ends_with("OK"));
        assert!(lines[1].ends_with("MISMATCH"));
        assert!(lines[2].ends_with("not checked"));
    }
}
