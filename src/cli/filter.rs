use std::collections::HashMap;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;

use crate::cli::input::{InputArgs, InputFormat};
use crate::cli::OutputFormat;
use crate::core::block::MappedReadPair;
use crate::core::types::Interval;
use crate::parsing::bed::parse_bed_file;
use crate::parsing::mrf::{MrfReader, MrfWriter};

#[derive(Args)]
pub struct FilterArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// BED file of regions to keep
    #[arg(long, required = true)]
    pub regions: PathBuf,

    /// Keep entries that overlap no region instead
    #[arg(long)]
    pub invert: bool,

    /// Additional MRF column to accept and carry through (repeatable)
    #[arg(long = "column", value_name = "NAME")]
    pub columns: Vec<String>,
}

/// Regions grouped by target, sorted by start
#[derive(Debug, Default)]
struct RegionIndex {
    by_target: HashMap<String, Vec<(u64, u64)>>,
}

impl RegionIndex {
    fn new(intervals: &[Interval]) -> Self {
        let mut by_target: HashMap<String, Vec<(u64, u64)>> = HashMap::new();
        for interval in intervals.iter().filter(|i| !i.is_empty()) {
            by_target
                .entry(interval.target_name.clone())
                .or_default()
                .push((interval.start, interval.end));
        }
        for regions in by_target.values_mut() {
            regions.sort_unstable();
        }
        Self { by_target }
    }

    /// Whether any block of any read overlaps a region
    fn overlaps(&self, entry: &MappedReadPair) -> bool {
        entry.reads().flat_map(|read| &read.blocks).any(|block| {
            let Some(regions) = self.by_target.get(&block.target_name) else {
                return false;
            };
            // Only regions starting before the block ends can overlap it
            let candidates = regions.partition_point(|&(start, _)| start < block.target_end);
            regions[..candidates]
                .iter()
                .any(|&(start, end)| block.overlaps(&block.target_name, start, end))
        })
    }
}

pub fn run(args: FilterArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    if args.input.input_format == Some(InputFormat::Sam) {
        bail!("filter only reads MRF input");
    }

    let intervals = parse_bed_file(&args.regions)
        .with_context(|| format!("Failed to read regions {}", args.regions.display()))?;
    let index = RegionIndex::new(&intervals);

    let mut reader = MrfReader::with_options(args.input.open()?, args.input.parse_options());
    for name in &args.columns {
        reader.register_column(name)?;
    }
    let schema = reader.read_schema()?.clone();

    let stdout = io::stdout();
    let mut writer = MrfWriter::new(BufWriter::new(stdout.lock()), schema);
    if !matches!(format, OutputFormat::Json) {
        writer.write_header()?;
    }

    let (mut seen, mut kept) = (0_usize, 0_usize);
    while let Some(entry) = reader.next_entry()? {
        seen += 1;
        if index.overlaps(&entry) == args.invert {
            continue;
        }
        match format {
            OutputFormat::Json => {
                let line = serde_json::to_string(&entry)?;
                writeln!(writer.get_mut(), "{line}")?;
            }
            OutputFormat::Text | OutputFormat::Tsv => writer.write_entry(&entry)?,
        }
        kept += 1;
    }
    reader.close()?;
    writer.finish().context("Failed to write output")?;

    if verbose {
        eprintln!(
            "Kept {kept} of {seen} entries from {} against {} regions",
            args.input.describe(),
            intervals.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block::{AlignmentBlock, MappedRead, Strand};

    fn entry(target: &str, start: u64, end: u64) -> MappedReadPair {
        MappedReadPair::single(MappedRead::new(vec![AlignmentBlock::new(
            target,
            Strand::Forward,
            start,
            end,
            1,
            end - start + 1,
        )]))
    }

    #[test]
    fn test_region_index_overlaps() {
        let index = RegionIndex::new(&[
            Interval::new("chr1", 100, 200),
            Interval::new("chr1", 10, 20),
            Interval::new("chr2", 0, 5),
        ]);

        // 1-based [101, 110] is 0-based [100, 110)
        assert!(index.overlaps(&entry("chr1", 101, 110)));
        // 1-based [21, 100] ends just before the region at 100
        assert!(!index.overlaps(&entry("chr1", 21, 100)));
        assert!(index.overlaps(&entry("chr1", 20, 30)));
        assert!(index.overlaps(&entry("chr2", 5, 9)));
        assert!(!index.overlaps(&entry("chr2", 6, 9)));
        assert!(!index.overlaps(&entry("chr3", 1, 1000)));
    }

    #[test]
    fn test_second_mate_can_overlap() {
        let index = RegionIndex::new(&[Interval::new("chr1", 500, 600)]);
        let pair = MappedReadPair::paired(
            MappedRead::new(vec![AlignmentBlock::new("chr1", Strand::Forward, 1, 10, 1, 10)]),
            MappedRead::new(vec![AlignmentBlock::new("chr1", Strand::Reverse, 550, 559, 1, 10)]),
        );
        assert!(index.overlaps(&pair));
    }
}
