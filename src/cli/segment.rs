use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::OutputFormat;
use crate::parsing::bed::write_bed;
use crate::parsing::wig::parse_wig_file;
use crate::segmentation::engine::{DEFAULT_MAX_GAP, DEFAULT_MIN_RUN_LENGTH, DEFAULT_THRESHOLD};
use crate::segmentation::{segment_tracks, SegmentationParams};

#[derive(Args)]
pub struct SegmentArgs {
    /// Signal track (wiggle or bedGraph; `-` for stdin; .gz accepted)
    #[arg(required = true)]
    pub track: PathBuf,

    /// Minimum value for a sample to count as enriched
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Qualifying samples this many samples apart (sub-threshold run + 1) start a new interval
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_GAP,
        long_help = "Qualifying samples this many samples apart start a new interval.\n\nThe distance is the number of sub-threshold samples between them plus one, so this is one more than the 'below threshold' count used by older segmentation tools: to tolerate n sub-threshold samples inside an interval, pass n + 2. With the default of 2, the first sub-threshold sample ends an interval."
    )]
    pub max_gap: usize,

    /// Drop intervals shorter than this many bases
    #[arg(long = "min-run", default_value_t = DEFAULT_MIN_RUN_LENGTH)]
    pub min_run_length: u64,
}

pub fn run(args: SegmentArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let tracks = parse_wig_file(&args.track)
        .with_context(|| format!("Failed to read signal track {}", args.track.display()))?;

    let params = SegmentationParams::new(args.threshold, args.max_gap, args.min_run_length);
    let intervals = segment_tracks(&tracks, &params);

    if verbose {
        let samples: usize = tracks.iter().map(|t| t.samples.len()).sum();
        eprintln!(
            "Segmented {} tracks ({samples} samples) into {} intervals",
            tracks.len(),
            intervals.len()
        );
    }

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "parameters": params,
                "intervals": intervals,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text | OutputFormat::Tsv => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            write_bed(&mut out, &intervals)?;
            out.flush().context("Failed to write output")?;
        }
    }

    Ok(())
}
