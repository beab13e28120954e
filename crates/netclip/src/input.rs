use std::io::{self, BufRead, IsTerminal};

use anyhow::{Context, Result};

/// Where this invocation's standard input comes from.
///
/// A terminal means nobody is feeding us a clip, so the invocation fetches.
/// Anything else (a pipe, a redirected file) is a clip to save.
pub enum InputSource<R> {
    Interactive,
    Piped(R),
}

impl InputSource<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            Self::Interactive
        } else {
            Self::Piped(stdin.lock())
        }
    }
}

impl<R: BufRead> InputSource<R> {
    pub fn is_piped(&self) -> bool {
        matches!(self, Self::Piped(_))
    }
}

/// Read the whole stream line by line and trim surrounding whitespace.
/// Interior newlines survive.
pub fn read_clip(reader: impl BufRead) -> Result<String> {
    let mut clip = String::new();
    for line in split_inclusive_lines(reader) {
        clip.push_str(&line.context("failed to read clip from stdin")?);
    }
    Ok(clip.trim().to_string())
}

/// Like `BufRead::lines`, but keeps each line terminator so the clip is
/// reassembled byte for byte.
fn split_inclusive_lines(mut reader: impl BufRead) -> impl Iterator<Item = io::Result<String>> {
    std::iter::from_fn(move || {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(Ok(line)),
            Err(e) => Some(Err(e)),
        }
    })
}
