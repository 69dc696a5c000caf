//! Reading spintax one line at a time.

use crate::{parser, Error, Spintax};
use std::io::BufRead;

/// Iterator over the records (lines) of a reader, each parsed into a [`Spintax`].
///
/// Created by [`records`]. Reading stops after the first I/O error.
#[derive(Debug)]
pub struct Records<R> {
    reader: R,
    line: String,
    done: bool,
}

/// Returns an iterator parsing every line of `reader` independently.
pub fn records<R: BufRead>(reader: R) -> Records<R> {
    Records {
        reader,
        line: String::new(),
        done: false,
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<Spintax, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.line.clear();
        match self.reader.read_line(&mut self.line) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => Some(parser::parse(&mut self.line.chars())),
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

impl Spintax {
    /// Parses the first record of `reader`. An empty reader gives an empty sentence.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        records(reader)
            .next()
            .unwrap_or_else(|| parser::parse(&mut std::iter::empty()))
    }
}
