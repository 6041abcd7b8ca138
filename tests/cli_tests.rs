//! End-to-end tests of the mrf-tools binary
//!
//! Each test writes its inputs to a temporary directory and checks the
//! command's stdout, exit status, or stderr.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAM: &str = "@HD\tVN:1.0\tSO:unsorted
@SQ\tSN:chr1\tLN:248956422
HWUSI-EAS519_1:5:113:14691:9858\t161\tchr1\t2483\t30\t54M\t=\t3349\t920\tGTGATGCCAGGCATGCCCTTCCCCAGCATCAGGTCTCCAGAGCTGCAGAAGACG\tCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCACCCCCC@CCCCCACACCCCA\tMD:Z:54\tSM:i:0
HWUSI-EAS519_1:5:113:14691:9858\t81\tchr1\t3349\t30\t54M\t=\t2483\t-920\tGCTGCACCACTGCCTGGCGCTGTGCCCTTCCTTTGCTCTGCCCGCTGGAGACGG\tCCCCC@CCCCCCCCCCCBCCCCCCBCCCCCCCCCCCCCCCCCCCCCCCCCCCCC\tMD:Z:54\tSM:i:3
";

const MRF: &str = "# two entries
AlignmentBlocks\tSequence\tQueryId
chr1:+:100:109:1:10,chr1:+:200:204:11:15|chr1:-:400:414:1:15\tACGTACGTACGTACG|TTTTTGGGGGCCCCC\tfrag1/1|frag1/2
chr2:+:5:9:1:5\tACGTA\tfrag2
";

fn mrf_tools() -> Command {
    Command::cargo_bin("mrf-tools").expect("binary should be built")
}

fn write_input(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write test input");
    path
}

fn data_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.starts_with('@'))
        .map(|line| format!("{line}\n"))
        .collect()
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

/// SAM records re-serialize byte-for-byte, headers excluded
#[test]
fn test_view_sam_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "reads.sam", SAM);

    mrf_tools()
        .args(["view", arg(&input)])
        .assert()
        .success()
        .stdout(data_lines(SAM));
}

#[test]
fn test_view_sam_as_json_lines() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "reads.sam", SAM);

    let output = mrf_tools()
        .args(["view", arg(&input), "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let records: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["flags"], 161);
    assert_eq!(records[1]["tags"], "MD:Z:54\tSM:i:3");
}

#[test]
fn test_view_gzipped_input() {
    use std::io::Write;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reads.sam.gz");
    let mut encoder = flate2::write::GzEncoder::new(
        fs::File::create(&path).unwrap(),
        flate2::Compression::default(),
    );
    encoder.write_all(SAM.as_bytes()).unwrap();
    encoder.finish().unwrap();

    mrf_tools()
        .args(["view", arg(&path)])
        .assert()
        .success()
        .stdout(data_lines(SAM));
}

#[test]
fn test_view_reads_stdin() {
    mrf_tools()
        .args(["view", "-"])
        .write_stdin(SAM)
        .assert()
        .success()
        .stdout(data_lines(SAM));
}

#[cfg(unix)]
#[test]
fn test_view_from_command() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "reads.sam", SAM);

    mrf_tools()
        .args(["view", "--command", &format!("cat '{}'", arg(&input))])
        .assert()
        .success()
        .stdout(data_lines(SAM));
}

#[cfg(unix)]
#[test]
fn test_view_reports_failing_command() {
    mrf_tools()
        .args(["view", "--command", "exit 2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exit"));
}

/// Strict parsing stops at the first malformed line; lenient parsing reads it as 0
#[test]
fn test_view_strict_and_lenient_numbers() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "bad.sam", "r1\t0\tchr1\t100\tabc\t4M\t*\t0\t0\tACGT\tIIII\n");

    mrf_tools()
        .args(["view", arg(&input)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 1"));

    mrf_tools()
        .args(["view", arg(&input), "--lenient"])
        .assert()
        .success()
        .stdout("r1\t0\tchr1\t100\t0\t4M\t*\t0\t0\tACGT\tIIII\n");
}

#[test]
fn test_view_skip_malformed() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "mixed.sam",
        "r1\t0\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tIIII\nbroken line\nr2\t0\tchr1\t200\t60\t2M\t*\t0\t0\tAC\tII\n",
    );

    mrf_tools()
        .args(["view", arg(&input), "--skip-malformed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("r1\t").and(predicate::str::contains("r2\t")))
        .stdout(predicate::str::contains("broken").not());
}

#[test]
fn test_view_mrf() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "reads.mrf", MRF);

    let expected: String = MRF.lines().skip(1).map(|l| format!("{l}\n")).collect();
    mrf_tools()
        .args(["view", arg(&input)])
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn test_view_mrf_rejects_unregistered_column() {
    let dir = TempDir::new().unwrap();
    let text = "AlignmentBlocks\tScore\nchr1:+:1:5:1:5\t42\n";
    let input = write_input(&dir, "extra.mrf", text);

    mrf_tools()
        .args(["view", arg(&input)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Score"));

    mrf_tools()
        .args(["view", arg(&input), "--column", "Score"])
        .assert()
        .success()
        .stdout(text);
}

#[test]
fn test_convert_sam_to_mrf_pairs_mates() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "reads.sam", SAM);

    mrf_tools()
        .args(["convert", arg(&input), "--to", "mrf"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "AlignmentBlocks\tSequence\tQualityScores\tQueryId\n",
        ))
        .stdout(predicate::str::contains(
            "chr1:-:3349:3402:1:54|chr1:+:2483:2536:1:54\tGCTGCACC",
        ));
}

/// Query names containing the MRF read separator cannot be stored and are skipped
#[test]
fn test_convert_skips_names_with_read_separator() {
    let dir = TempDir::new().unwrap();
    let sam = "gi|123|ref\t0\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tIIII\nplain\t0\tchr1\t200\t60\t4M\t*\t0\t0\tACGT\tIIII\n";
    let input = write_input(&dir, "reads.sam", sam);

    let output = mrf_tools()
        .args(["convert", arg(&input), "--to", "mrf"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let mrf = String::from_utf8(output.stdout).unwrap();
    assert!(!mrf.contains("gi|123|ref"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("reserved separator"));

    // What was written reads back cleanly
    let reread = write_input(&dir, "reads.mrf", &mrf);
    mrf_tools()
        .args(["view", arg(&reread)])
        .assert()
        .success()
        .stdout(predicate::str::contains("chr1:+:200:203:1:4\tACGT\tIIII\tplain"));
}

#[test]
fn test_convert_mrf_to_sam() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "reads.mrf", MRF);

    let output = mrf_tools()
        .args(["convert", arg(&input), "--to", "sam"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<Vec<&str>> = stdout.lines().map(|l| l.split('\t').collect()).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(&lines[0][..6], ["frag1/1", "97", "chr1", "100", "255", "10M90N5M"]);
    assert_eq!(&lines[1][..6], ["frag1/2", "145", "chr1", "400", "255", "15M"]);
    assert_eq!(&lines[2][..6], ["frag2", "0", "chr2", "5", "255", "5M"]);
}

#[test]
fn test_convert_to_same_format_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "reads.sam", SAM);

    mrf_tools()
        .args(["convert", arg(&input), "--to", "sam"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("view"));
}

#[test]
fn test_segment_wiggle_to_bed() {
    let dir = TempDir::new().unwrap();
    let mut wig = String::from("track type=wiggle_0\nvariableStep chrom=chr1\n");
    for (i, value) in [1, 5, 5, 1, 1, 5, 5, 5, 1, 5].iter().enumerate() {
        wig.push_str(&format!("{} {value}\n", i + 1));
    }
    let input = write_input(&dir, "signal.wig", &wig);

    mrf_tools()
        .args([
            "segment",
            arg(&input),
            "--threshold",
            "3",
            "--max-gap",
            "2",
            "--min-run",
            "2",
        ])
        .assert()
        .success()
        .stdout("chr1\t1\t3\nchr1\t5\t8\n");
}

#[test]
fn test_segment_json() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "signal.bedgraph", "chr2\t10\t14\t8.5\n");

    let output = mrf_tools()
        .args(["segment", arg(&input), "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["intervals"][0]["target_name"], "chr2");
    assert_eq!(json["intervals"][0]["start"], 10);
    assert_eq!(json["intervals"][0]["end"], 14);
    assert_eq!(json["parameters"]["max_gap"], 2);
}

#[test]
fn test_filter_by_regions() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "reads.mrf", MRF);
    let regions = write_input(&dir, "regions.bed", "chr2\t0\t6\n");

    mrf_tools()
        .args(["filter", arg(&input), "--regions", arg(&regions)])
        .assert()
        .success()
        .stdout("AlignmentBlocks\tSequence\tQueryId\nchr2:+:5:9:1:5\tACGTA\tfrag2\n");

    mrf_tools()
        .args(["filter", arg(&input), "--regions", arg(&regions), "--invert"])
        .assert()
        .success()
        .stdout(predicate::str::contains("frag1/1|frag1/2"))
        .stdout(predicate::str::contains("frag2\n").not());
}

#[test]
fn test_missing_input_is_an_error() {
    mrf_tools()
        .args(["view", "/nonexistent/reads.sam"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open"));
}
