use std::io::{self, BufWriter, Write};

use anyhow::Context;
use clap::Args;

use crate::cli::input::{InputArgs, InputFormat};
use crate::cli::OutputFormat;
use crate::parsing::mrf::{MrfReader, MrfWriter};
use crate::parsing::sam::{SamReader, SamWriter};
use crate::parsing::source::LineSource;
use crate::parsing::ParseOptions;

#[derive(Args)]
pub struct ViewArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Additional MRF column to accept and carry through (repeatable)
    #[arg(long = "column", value_name = "NAME")]
    pub columns: Vec<String>,
}

pub fn run(args: ViewArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let source = args.input.open()?;
    let options = args.input.parse_options();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let count = match args.input.format() {
        InputFormat::Sam => view_sam(source, options, format, &mut out)?,
        InputFormat::Mrf => view_mrf(source, options, &args.columns, format, &mut out)?,
    };

    out.flush().context("Failed to write output")?;
    if verbose {
        eprintln!("Read {count} records from {}", args.input.describe());
    }
    Ok(())
}

fn view_sam<S: LineSource, W: Write>(
    source: S,
    options: ParseOptions,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<usize> {
    let mut reader = SamReader::with_options(source, options);
    let mut count = 0;

    match format {
        OutputFormat::Json => {
            while let Some(record) = reader.next_record()? {
                writeln!(out, "{}", serde_json::to_string(&record)?)?;
                count += 1;
            }
        }
        OutputFormat::Text | OutputFormat::Tsv => {
            let mut writer = SamWriter::new(&mut *out);
            while let Some(record) = reader.next_record()? {
                writer.write_record(&record)?;
                count += 1;
            }
            writer.finish()?;
        }
    }

    reader.close()?;
    Ok(count)
}

fn view_mrf<S: LineSource, W: Write>(
    source: S,
    options: ParseOptions,
    columns: &[String],
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<usize> {
    let mut reader = MrfReader::with_options(source, options);
    for name in columns {
        reader.register_column(name)?;
    }
    let schema = reader.read_schema()?.clone();
    let mut count = 0;

    match format {
        OutputFormat::Json => {
            while let Some(entry) = reader.next_entry()? {
                writeln!(out, "{}", serde_json::to_string(&entry)?)?;
                count += 1;
            }
        }
        OutputFormat::Text | OutputFormat::Tsv => {
            let mut writer = MrfWriter::new(&mut *out, schema);
            writer.write_header()?;
            while let Some(entry) = reader.next_entry()? {
                writer.write_entry(&entry)?;
                count += 1;
            }
            writer.finish()?;
        }
    }

    reader.close()?;
    Ok(count)
}
