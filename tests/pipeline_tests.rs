//! Library-level tests that run records through several components:
//! SAM parsing, mate pairing, MRF writing and reading, and the CIGAR codec.

use mrf_tools::core::cigar::{blocks_to_cigar, parse_cigar_string, CigarKind};
use mrf_tools::pairing::{build_pair, group_mates, pair_to_records};
use mrf_tools::parsing::mrf::{parse_mrf_text, MrfWriter};
use mrf_tools::parsing::sam::parse_sam_text;
use mrf_tools::{MrfSchema, ParseOptions};

const SPLICED_PAIR: &str = "\
frag7/1\t99\tchr3\t1000\t60\t5S20M300N25M\t=\t2000\t1050\tAAAAACCCCCCCCCCCCCCCCCCCCGGGGGGGGGGGGGGGGGGGGGGGGG\t*
frag7/2\t147\tchr3\t2000\t60\t50M\t=\t1000\t-1050\tTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTT\t*
solo\t0\tchr9\t50\t60\t10M\t*\t0\t0\tACGTACGTAC\t*
";

/// SAM pairs survive conversion to MRF text and back
#[test]
fn test_sam_to_mrf_and_back() {
    let records = parse_sam_text(SPLICED_PAIR, ParseOptions::default()).unwrap();
    let entries: Vec<_> = group_mates(records, '/')
        .iter()
        .map(|group| build_pair(group).unwrap())
        .collect();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].is_paired);
    assert!(!entries[1].is_paired);

    let mut writer = MrfWriter::new(Vec::new(), MrfSchema::default());
    writer.write_header().unwrap();
    for entry in &entries {
        writer.write_entry(entry).unwrap();
    }
    let text = String::from_utf8(writer.finish().unwrap()).unwrap();

    let (_, reparsed) = parse_mrf_text(&text, ParseOptions::default()).unwrap();
    assert_eq!(reparsed, entries);

    let sam: Vec<_> = reparsed
        .iter()
        .enumerate()
        .flat_map(|(i, entry)| pair_to_records(entry, &format!("entry{i}")))
        .collect();
    assert_eq!(sam.len(), 3);
    assert_eq!(sam[0].query_name, "frag7/1");
    // Clipping is not representable in blocks; the skip survives
    assert_eq!(sam[0].cigar, "20M300N25M");
    assert_eq!(sam[0].position, 1000);
    assert_eq!(sam[1].cigar, "50M");
    assert_eq!(sam[1].mate_reference_name, "=");
    assert_eq!(sam[2].query_name, "solo");
    assert_eq!(sam[2].reference_name, "chr9");
}

/// Deriving a CIGAR from blocks yields only match and skip runs
#[test]
fn test_blocks_to_cigar_uses_match_and_skip_only() {
    let records = parse_sam_text(SPLICED_PAIR, ParseOptions::default()).unwrap();
    let entry = build_pair(&records[..2]).unwrap();

    let cigar = blocks_to_cigar(&entry.read1.blocks);
    let ops = parse_cigar_string(&cigar);
    let kinds: Vec<(u32, CigarKind)> = ops.iter().map(|op| (op.length, op.kind)).collect();
    assert_eq!(
        kinds,
        vec![(20, CigarKind::Match), (300, CigarKind::Skip), (25, CigarKind::Match)]
    );
}
