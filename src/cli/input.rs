use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use crate::parsing::source::{open_path, CommandLines, LineSource};
use crate::parsing::ParseOptions;

/// Alignment record formats accepted on input
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    Sam,
    Mrf,
}

impl InputFormat {
    /// Guess from the file extension, ignoring a trailing `.gz`/`.bgz`.
    /// Anything that is not `.mrf` is read as SAM.
    pub fn detect(path: &Path) -> Self {
        let name = path.to_string_lossy().to_lowercase();
        let name = name
            .strip_suffix(".gz")
            .or_else(|| name.strip_suffix(".bgz"))
            .unwrap_or(name.as_str());
        if name.ends_with(".mrf") {
            InputFormat::Mrf
        } else {
            InputFormat::Sam
        }
    }
}

/// Where records come from and how strictly they are parsed
#[derive(Args)]
pub struct InputArgs {
    /// Input file (`-` for stdin; .gz accepted)
    #[arg(required_unless_present = "from_command")]
    pub input: Option<PathBuf>,

    /// Read lines from the standard output of this shell command instead of a file
    #[arg(long = "command", value_name = "COMMAND", conflicts_with = "input")]
    pub from_command: Option<String>,

    /// Input format (default: from the file extension, SAM otherwise)
    #[arg(long, value_enum)]
    pub input_format: Option<InputFormat>,

    /// Accept non-numeric fields as 0 and unchecked CIGARs, as older tools did
    #[arg(long)]
    pub lenient: bool,

    /// Log and skip malformed records instead of stopping at the first one
    #[arg(long)]
    pub skip_malformed: bool,
}

impl InputArgs {
    pub fn parse_options(&self) -> ParseOptions {
        let options = if self.lenient {
            ParseOptions::lenient()
        } else {
            ParseOptions::strict()
        };
        options.with_skip_malformed(self.skip_malformed)
    }

    pub fn format(&self) -> InputFormat {
        match (self.input_format, &self.input) {
            (Some(format), _) => format,
            (None, Some(path)) => InputFormat::detect(path),
            (None, None) => InputFormat::Sam,
        }
    }

    /// Human-readable name of the input for messages
    pub fn describe(&self) -> String {
        match (&self.from_command, &self.input) {
            (Some(command), _) => format!("command '{command}'"),
            (None, Some(path)) => path.display().to_string(),
            (None, None) => "-".to_string(),
        }
    }

    /// Open the configured input as a line source
    pub fn open(&self) -> anyhow::Result<Box<dyn LineSource>> {
        if let Some(command) = &self.from_command {
            let lines = CommandLines::spawn(command)
                .with_context(|| format!("Failed to run command '{command}'"))?;
            return Ok(Box::new(lines));
        }

        let path = self.input.as_deref().unwrap_or_else(|| Path::new("-"));
        let lines =
            open_path(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Box::new(lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_input_format() {
        assert_eq!(InputFormat::detect(Path::new("reads.mrf")), InputFormat::Mrf);
        assert_eq!(InputFormat::detect(Path::new("reads.MRF.gz")), InputFormat::Mrf);
        assert_eq!(InputFormat::detect(Path::new("reads.sam")), InputFormat::Sam);
        assert_eq!(InputFormat::detect(Path::new("-")), InputFormat::Sam);
    }
}
