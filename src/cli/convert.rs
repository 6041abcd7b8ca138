use std::io::{self, BufWriter, Write};

use anyhow::{bail, Context};
use clap::Args;
use tracing::warn;

use crate::cli::input::{InputArgs, InputFormat};
use crate::cli::OutputFormat;
use crate::pairing::{build_pair, group_mates, pair_to_records, DEFAULT_MATE_DELIMITER};
use crate::parsing::mrf::{MrfReader, MrfSchema, MrfWriter};
use crate::parsing::sam::{read_all, SamWriter};
use crate::parsing::source::LineSource;
use crate::parsing::ParseOptions;

#[derive(Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format
    #[arg(long, value_enum)]
    pub to: InputFormat,

    /// Separator between fragment name and mate index in SAM query names
    #[arg(long, default_value_t = DEFAULT_MATE_DELIMITER)]
    pub delimiter: char,

    /// Additional MRF input column to accept (repeatable)
    #[arg(long = "column", value_name = "NAME")]
    pub columns: Vec<String>,
}

/// Counts reported after a conversion
#[derive(Debug, Default, PartialEq, Eq)]
struct ConvertStats {
    read: usize,
    written: usize,
    skipped: usize,
}

pub fn run(args: ConvertArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let from = args.input.format();
    if from == args.to {
        bail!("Input is already {:?}; use `view` to re-serialize it", args.to);
    }

    let source = args.input.open()?;
    let options = args.input.parse_options();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let stats = match from {
        InputFormat::Sam => sam_to_mrf(source, options, args.delimiter, format, &mut out)?,
        InputFormat::Mrf => mrf_to_sam(source, options, &args.columns, format, &mut out)?,
    };
    out.flush().context("Failed to write output")?;

    if verbose {
        eprintln!(
            "Converted {}: {} read, {} written, {} skipped",
            args.input.describe(),
            stats.read,
            stats.written,
            stats.skipped
        );
    }
    Ok(())
}

fn sam_to_mrf<S: LineSource, W: Write>(
    source: S,
    options: ParseOptions,
    delimiter: char,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<ConvertStats> {
    let records = read_all(source, options)?;
    let mut stats = ConvertStats {
        read: records.len(),
        ..ConvertStats::default()
    };

    let mut writer = MrfWriter::new(&mut *out, MrfSchema::default());
    if !matches!(format, OutputFormat::Json) {
        writer.write_header()?;
    }

    for group in group_mates(records, delimiter) {
        let entry = match build_pair(&group) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping fragment");
                stats.skipped += 1;
                continue;
            }
        };
        match format {
            OutputFormat::Json => {
                let line = serde_json::to_string(&entry)?;
                writeln!(writer.get_mut(), "{line}")?;
            }
            OutputFormat::Text | OutputFormat::Tsv => {
                if let Err(e) = writer.schema().check_entry(&entry) {
                    warn!(error = %e, "Skipping fragment that cannot be written as MRF");
                    stats.skipped += 1;
                    continue;
                }
                writer.write_entry(&entry)?;
            }
        }
        stats.written += 1;
    }

    writer.finish()?;
    Ok(stats)
}

fn mrf_to_sam<S: LineSource, W: Write>(
    source: S,
    options: ParseOptions,
    columns: &[String],
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<ConvertStats> {
    let mut reader = MrfReader::with_options(source, options);
    for name in columns {
        reader.register_column(name)?;
    }

    let mut stats = ConvertStats::default();
    let mut writer = SamWriter::new(&mut *out);
    while let Some(entry) = reader.next_entry()? {
        stats.read += 1;
        for record in pair_to_records(&entry, &format!("entry{}", stats.read)) {
            match format {
                OutputFormat::Json => {
                    let line = serde_json::to_string(&record)?;
                    writeln!(writer.get_mut(), "{line}")?;
                }
                OutputFormat::Text | OutputFormat::Tsv => writer.write_record(&record)?,
            }
            stats.written += 1;
        }
    }

    writer.finish()?;
    reader.close()?;
    Ok(stats)
}
