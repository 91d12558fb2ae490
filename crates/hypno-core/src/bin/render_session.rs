//! render-session - render music, binaural and mix around a voice track
//!
//! ```text
//! render-session <voice.wav> <run_dir> [--minutes N] [--band NAME] [--beat HZ]
//!                [--objective NAME] [--no-mix] [--config PATH]
//! ```
//!
//! Settings not given on the command line come from the YAML config
//! (default `~/Music/hypno-sessions/render.yaml`). The outcome is printed
//! as JSON on stdout. Set RUST_LOG=debug for verbose output.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use hypno_core::config::{default_config_path, load_config, RenderConfig};
use hypno_core::generate::{BinauralBand, Objective};
use hypno_core::session::render_session;

const DEFAULT_MINUTES: u32 = 20;

const USAGE: &str = "usage: render-session <voice.wav> <run_dir> [--minutes N] [--band NAME] \
[--beat HZ] [--objective NAME] [--no-mix] [--config PATH]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    voice: PathBuf,
    run_dir: PathBuf,
    minutes: Option<u32>,
    band: Option<BinauralBand>,
    beat: Option<f64>,
    objective: Option<Objective>,
    no_mix: bool,
    config: Option<PathBuf>,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut parsed = Args::default();
    let mut positional = Vec::new();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| iter.next().ok_or_else(|| anyhow!("{} needs a value", flag));
        match arg.as_str() {
            "--minutes" => {
                let v = value("--minutes")?;
                parsed.minutes = Some(v.parse().with_context(|| format!("invalid --minutes: {}", v))?);
            }
            "--band" => {
                parsed.band = Some(value("--band")?.parse().map_err(|e: String| anyhow!(e))?);
            }
            "--beat" => {
                let v = value("--beat")?;
                parsed.beat = Some(v.parse().with_context(|| format!("invalid --beat: {}", v))?);
            }
            "--objective" => {
                parsed.objective = Some(value("--objective")?.parse().map_err(|e: String| anyhow!(e))?);
            }
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            "--no-mix" => parsed.no_mix = true,
            flag if flag.starts_with("--") => bail!("unknown option {}\n{}", flag, USAGE),
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let mut positional = positional.into_iter();
    match (positional.next(), positional.next(), positional.next()) {
        (Some(voice), Some(run_dir), None) => {
            parsed.voice = voice;
            parsed.run_dir = run_dir;
            Ok(parsed)
        }
        _ => bail!("{}", USAGE),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| default_config_path("render.yaml"));
    let config: RenderConfig = load_config(&config_path);

    let mut request = config.session_request(args.minutes.unwrap_or(DEFAULT_MINUTES));
    if let Some(band) = args.band {
        request.band = band;
    }
    if args.objective.is_some() {
        request.objective = args.objective;
    }
    request.beat_override = args.beat;
    if args.no_mix {
        request.mixdown = false;
    }

    let outcome = render_session(&request, &args.voice, &args.run_dir)?;
    if let Some(error) = &outcome.mix_error {
        log::warn!("render-session: mix unavailable: {}", error);
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_only() {
        let parsed = parse_args(args(&["voice.wav", "out/run1"])).unwrap();
        assert_eq!(parsed.voice, PathBuf::from("voice.wav"));
        assert_eq!(parsed.run_dir, PathBuf::from("out/run1"));
        assert_eq!(parsed.minutes, None);
        assert!(!parsed.no_mix);
    }

    #[test]
    fn test_all_options() {
        let parsed = parse_args(args(&[
            "--minutes", "5", "v.wav", "--band", "theta", "--beat", "6.5", "run", "--objective", "sleep",
            "--no-mix", "--config", "c.yaml",
        ]))
        .unwrap();
        assert_eq!(parsed.minutes, Some(5));
        assert_eq!(parsed.band, Some(BinauralBand::Theta));
        assert_eq!(parsed.beat, Some(6.5));
        assert_eq!(parsed.objective, Some(Objective::Sleep));
        assert!(parsed.no_mix);
        assert_eq!(parsed.config, Some(PathBuf::from("c.yaml")));
        assert_eq!(parsed.run_dir, PathBuf::from("run"));
    }

    #[test]
    fn test_bad_input() {
        assert!(parse_args(args(&["only-one.wav"])).is_err());
        assert!(parse_args(args(&["a", "b", "c"])).is_err());
        assert!(parse_args(args(&["a", "b", "--minutes"])).is_err());
        assert!(parse_args(args(&["a", "b", "--minutes", "ten"])).is_err());
        assert!(parse_args(args(&["a", "b", "--band", "omega"])).is_err());
        assert!(parse_args(args(&["a", "b", "--loud"])).is_err());
    }
}
