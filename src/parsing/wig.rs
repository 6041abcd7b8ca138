//! Signal tracks in wiggle or bedGraph form.
//!
//! Three layouts are accepted, and may be mixed in one file:
//!
//! - `variableStep chrom=<name> [span=<n>]` followed by `<position> <value>` lines
//! - `fixedStep chrom=<name> start=<s> step=<k> [span=<n>]` followed by one value per line
//! - bedGraph lines `<chrom> <start> <end> <value>`
//!
//! Wiggle positions are 1-based and bedGraph is 0-based half-open; every
//! sample produced here uses 0-based positions so that intervals called from
//! them are valid BED. `track`, `browser`, `#` and blank lines are skipped.
//!
//! Every covered base becomes one sample, so a single data line may cover
//! at most [`MAX_SPAN`] bases.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::core::types::{SignalSample, SignalTrack};
use crate::parsing::source::{open_path, LineSource, TextLines};
use crate::parsing::ParseError;

const FORMAT: &str = "wiggle";

/// Most bases a single data line may expand to
pub const MAX_SPAN: u64 = 10_000_000;

enum Section {
    None,
    Variable { track: usize, span: u64 },
    Fixed { track: usize, next: u64, step: u64, span: u64 },
}

#[derive(Default)]
struct TrackSet {
    tracks: Vec<SignalTrack>,
    index: HashMap<String, usize>,
}

impl TrackSet {
    fn track(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        self.tracks.push(SignalTrack::new(name));
        self.index.insert(name.to_string(), self.tracks.len() - 1);
        self.tracks.len() - 1
    }

    fn push_span(
        &mut self,
        track: usize,
        start: u64,
        span: u64,
        value: f64,
        line_number: usize,
    ) -> Result<(), ParseError> {
        if span > MAX_SPAN {
            return Err(ParseError::invalid(
                FORMAT,
                line_number,
                format!("line covers {span} bases, more than the limit of {MAX_SPAN}"),
            ));
        }
        let end = start
            .checked_add(span)
            .ok_or_else(|| ParseError::invalid(FORMAT, line_number, "coordinate overflow"))?;
        let samples = &mut self.tracks[track].samples;
        samples.extend((start..end).map(|position| SignalSample::new(position, value)));
        Ok(())
    }

    fn finish(mut self) -> Vec<SignalTrack> {
        for track in &mut self.tracks {
            if !track.is_sorted() {
                debug!(target_name = %track.target_name, "Sorting out-of-order signal samples");
                track.samples.sort_by_key(|s| s.position);
            }
        }
        self.tracks
    }
}

/// Read all tracks from a line source, then close it. Tracks are returned in
/// the order their target first appears.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for malformed declarations or data
/// lines, and `ParseError::Io` if reading fails.
pub fn read_tracks<S: LineSource>(mut source: S) -> Result<Vec<SignalTrack>, ParseError> {
    let mut set = TrackSet::default();
    let mut section = Section::None;
    let mut line_number = 0;

    while let Some(line) = source.next_line()? {
        line_number += 1;
        let line = line.trim();
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("track")
            || line.starts_with("browser")
        {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields[0] {
            "variableStep" => {
                let decl = parse_declaration(&fields[1..], line_number)?;
                let chrom = required(&decl, "chrom", line_number)?;
                section = Section::Variable {
                    track: set.track(chrom),
                    span: optional_number(&decl, "span", 1, line_number)?,
                };
                continue;
            }
            "fixedStep" => {
                let decl = parse_declaration(&fields[1..], line_number)?;
                let chrom = required(&decl, "chrom", line_number)?;
                let start = number(required(&decl, "start", line_number)?, line_number)?;
                if start == 0 {
                    return Err(ParseError::invalid(FORMAT, line_number, "fixedStep start is 1-based"));
                }
                section = Section::Fixed {
                    track: set.track(chrom),
                    next: start - 1,
                    step: optional_number(&decl, "step", 1, line_number)?,
                    span: optional_number(&decl, "span", 1, line_number)?,
                };
                continue;
            }
            _ => {}
        }

        if fields.len() == 4 {
            let track = set.track(fields[0]);
            let start = number(fields[1], line_number)?;
            let end = number(fields[2], line_number)?;
            let value = signal_value(fields[3], line_number)?;
            set.push_span(track, start, end.saturating_sub(start), value, line_number)?;
            continue;
        }

        match (&mut section, fields.as_slice()) {
            (Section::Variable { track, span }, [position, value]) => {
                let position = number(position, line_number)?;
                if position == 0 {
                    return Err(ParseError::invalid(FORMAT, line_number, "variableStep positions are 1-based"));
                }
                let value = signal_value(value, line_number)?;
                set.push_span(*track, position - 1, *span, value, line_number)?;
            }
            (Section::Fixed { track, next, step, span }, [value]) => {
                let value = signal_value(value, line_number)?;
                set.push_span(*track, *next, *span, value, line_number)?;
                *next = next.checked_add(*step).ok_or_else(|| {
                    ParseError::invalid(FORMAT, line_number, "coordinate overflow")
                })?;
            }
            _ => {
                return Err(ParseError::invalid(
                    FORMAT,
                    line_number,
                    format!("unexpected line '{line}'"),
                ));
            }
        }
    }

    source.close()?;
    Ok(set.finish())
}

/// Parse a wiggle or bedGraph file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_wig_file(path: &Path) -> Result<Vec<SignalTrack>, ParseError> {
    read_tracks(open_path(path)?)
}

/// Parse wiggle or bedGraph text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for the first malformed line.
pub fn parse_wig_text(text: &str) -> Result<Vec<SignalTrack>, ParseError> {
    read_tracks(TextLines::new(text.as_bytes()))
}

fn parse_declaration<'a>(
    fields: &[&'a str],
    line_number: usize,
) -> Result<HashMap<&'a str, &'a str>, ParseError> {
    fields
        .iter()
        .map(|&field| {
            field.split_once('=').ok_or_else(|| {
                ParseError::invalid(FORMAT, line_number, format!("expected key=value, found '{field}'"))
            })
        })
        .collect()
}

fn required<'a>(
    decl: &HashMap<&str, &'a str>,
    key: &str,
    line_number: usize,
) -> Result<&'a str, ParseError> {
    decl.get(key)
        .copied()
        .ok_or_else(|| ParseError::invalid(FORMAT, line_number, format!("missing '{key}='")))
}

fn optional_number(
    decl: &HashMap<&str, &str>,
    key: &str,
    default: u64,
    line_number: usize,
) -> Result<u64, ParseError> {
    match decl.get(key) {
        Some(value) => number(value, line_number),
        None => Ok(default),
    }
}

fn number(value: &str, line_number: usize) -> Result<u64, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError::invalid(FORMAT, line_number, format!("invalid integer '{value}'")))
}

fn signal_value(value: &str, line_number: usize) -> Result<f64, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError::invalid(FORMAT, line_number, format!("invalid value '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(track: &SignalTrack) -> Vec<u64> {
        track.samples.iter().map(|s| s.position).collect()
    }

    #[test]
    fn test_variable_step() {
        let wig = "track type=wiggle_0\nvariableStep chrom=chr1\n1 5\n2 5.5\n10 1\n";
        let tracks = parse_wig_text(wig).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].target_name, "chr1");
        assert_eq!(positions(&tracks[0]), vec![0, 1, 9]);
        assert!((tracks[0].samples[1].value - 5.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fixed_step_with_span() {
        let wig = "fixedStep chrom=chr2 start=11 step=10 span=2\n1\n2\n";
        let tracks = parse_wig_text(wig).unwrap();
        assert_eq!(positions(&tracks[0]), vec![10, 11, 20, 21]);
    }

    #[test]
    fn test_bedgraph_and_multiple_targets() {
        let text = "chr1\t0\t3\t2.0\nchr2\t5\t6\t1\nchr1\t3\t4\t0\n";
        let tracks = parse_wig_text(text).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].target_name, "chr1");
        assert_eq!(positions(&tracks[0]), vec![0, 1, 2, 3]);
        assert_eq!(positions(&tracks[1]), vec![5]);
    }

    #[test]
    fn test_out_of_order_samples_are_sorted() {
        let wig = "variableStep chrom=chr1\n5 1\n2 1\n";
        let tracks = parse_wig_text(wig).unwrap();
        assert_eq!(positions(&tracks[0]), vec![1, 4]);
    }

    #[test]
    fn test_oversized_or_overflowing_spans_are_rejected() {
        let huge_span = "variableStep chrom=chr1 span=18446744073709551615\n2 1\n";
        assert!(matches!(
            parse_wig_text(huge_span),
            Err(ParseError::InvalidFormat { line: 2, .. })
        ));

        assert!(parse_wig_text("chr1\t0\t10000000000\t1\n").is_err());

        let overflow = "variableStep chrom=chr1 span=10\n18446744073709551615 1\n";
        assert!(parse_wig_text(overflow).is_err());

        let step_overflow = "fixedStep chrom=chr1 start=1 step=18446744073709551615\n1\n1\n";
        assert!(parse_wig_text(step_overflow).is_err());
    }

    #[test]
    fn test_span_just_over_limit_is_rejected() {
        let text = format!("chr1\t5\t{}\t1\n", 5 + MAX_SPAN + 1);
        assert!(matches!(
            parse_wig_text(&text),
            Err(ParseError::InvalidFormat { line: 1, .. })
        ));
    }

    #[test]
    fn test_data_without_section_is_rejected() {
        assert!(parse_wig_text("1 5\n").is_err());
        assert!(parse_wig_text("variableStep chrom=chr1\n1 abc\n").is_err());
        assert!(parse_wig_text("fixedStep start=1\n").is_err());
        assert!(parse_wig_text("variableStep chrom\n").is_err());
    }
}
