//! Line sources feeding the stream parsers.
//!
//! Parsers only see the [`LineSource`] trait. Concrete sources:
//!
//! - [`TextLines`]: any [`BufRead`] (in-memory text, files, stdin)
//! - [`CommandLines`]: the stdout of a shell command
//! - [`open_path`]: a file, `-` for stdin, gzip/bgzip detected by extension

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use flate2::read::MultiGzDecoder;
use tracing::{debug, warn};

/// A pull-based supply of text lines
pub trait LineSource {
    /// Next line with its `\n` / `\r\n` terminator removed, or `None` at end of stream
    ///
    /// # Errors
    ///
    /// Returns any error raised by the underlying reader.
    fn next_line(&mut self) -> io::Result<Option<String>>;

    /// Release the underlying resource.
    ///
    /// # Errors
    ///
    /// Returns an error if releasing fails, e.g. a subprocess exited with
    /// a non-zero status.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        (**self).next_line()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Lines from any buffered reader
pub struct TextLines<R: BufRead> {
    reader: R,
}

impl<R: BufRead> TextLines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead> LineSource for TextLines<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

/// Lines from the standard output of a shell command.
///
/// The command runs under `sh -c`. [`LineSource::close`] waits for it to exit
/// and reports a non-zero exit status as an error. Dropping an unclosed
/// source closes the pipe first, then reaps the child.
pub struct CommandLines {
    command: String,
    child: Option<Child>,
    lines: Option<TextLines<BufReader<ChildStdout>>>,
}

impl CommandLines {
    /// Start `command` and read from its stdout
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be spawned.
    pub fn spawn(command: &str) -> io::Result<Self> {
        debug!(command, "Spawning line source command");
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdout(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child process has no stdout"))?;

        Ok(Self {
            command: command.to_string(),
            child: Some(child),
            lines: Some(TextLines::new(BufReader::new(stdout))),
        })
    }
}

impl LineSource for CommandLines {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        match self.lines.as_mut() {
            Some(lines) => lines.next_line(),
            None => Ok(None),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.lines = None;
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "command '{}' exited with {status}",
                self.command
            )))
        }
    }
}

impl Drop for CommandLines {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(command = %self.command, error = %e, "Line source command failed");
        }
    }
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Open a file as a line source; `-` reads stdin
///
/// # Errors
///
/// Returns an error if the file cannot be opened.
pub fn open_path(path: &Path) -> io::Result<TextLines<Box<dyn BufRead>>> {
    let reader: Box<dyn BufRead> = if path.as_os_str() == "-" {
        Box::new(io::stdin().lock())
    } else if is_gzipped(path) {
        Box::new(BufReader::new(MultiGzDecoder::new(File::open(path)?)))
    } else {
        Box::new(BufReader::new(File::open(path)?))
    };
    debug!(path = %path.display(), "Opened line source");
    Ok(TextLines::new(reader))
}
