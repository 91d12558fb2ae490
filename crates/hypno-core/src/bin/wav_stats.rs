//! wav-stats - peak and RMS loudness of WAV files
//!
//! ```text
//! wav-stats <file.wav>... [--max-seconds S]
//! ```
//!
//! Prints one JSON object per file. Problems with a file are reported in its
//! `error` field; the exit code is 0 as long as the arguments parse.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use hypno_core::stats::wav_stats;

const USAGE: &str = "usage: wav-stats <file.wav>... [--max-seconds S]";

#[derive(Debug, PartialEq)]
struct Args {
    files: Vec<PathBuf>,
    max_seconds: Option<f64>,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut files = Vec::new();
    let mut max_seconds = None;
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--max-seconds" => {
                let v = iter.next().ok_or_else(|| anyhow!("--max-seconds needs a value"))?;
                let secs: f64 = v.parse().with_context(|| format!("invalid --max-seconds: {}", v))?;
                if !(secs.is_finite() && secs >= 0.0) {
                    bail!("--max-seconds must be a non-negative number, got {}", v);
                }
                max_seconds = Some(secs);
            }
            flag if flag.starts_with("--") => bail!("unknown option {}\n{}", flag, USAGE),
            _ => files.push(PathBuf::from(arg)),
        }
    }

    if files.is_empty() {
        bail!("{}", USAGE);
    }
    Ok(Args { files, max_seconds })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    for file in &args.files {
        let stats = wav_stats(file, args.max_seconds);
        if let Some(error) = &stats.error {
            log::warn!("wav-stats: {:?}: {}", file, error);
        }
        println!("{}", serde_json::to_string(&serde_json::json!({ "path": file, "stats": stats }))?);
    }
    Ok(())
}
