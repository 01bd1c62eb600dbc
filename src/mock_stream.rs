//! An in-memory stream double: plays back a canned server transcript and
//! records everything the client writes.

use std::cmp::min;
use std::io::{Error, ErrorKind, Read, Result, Write};

enum Mode {
    /// Serve the transcript; error with `UnexpectedEof` when it runs out.
    Script,
    /// Report end-of-stream (`Ok(0)`) on every read.
    Eof,
    /// Fail every read.
    FailRead,
}

pub struct MockStream {
    transcript: Vec<u8>,
    pos: usize,
    pub written: Vec<u8>,
    mode: Mode,
}

impl MockStream {
    pub fn new(transcript: impl Into<Vec<u8>>) -> MockStream {
        MockStream {
            transcript: transcript.into(),
            pos: 0,
            written: Vec::new(),
            mode: Mode::Script,
        }
    }

    pub fn eof() -> MockStream {
        let mut stream = MockStream::new(Vec::new());
        stream.mode = Mode::Eof;
        stream
    }

    pub fn failing() -> MockStream {
        let mut stream = MockStream::new(Vec::new());
        stream.mode = Mode::FailRead;
        stream
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.mode {
            Mode::Eof => return Ok(0),
            Mode::FailRead => {
                return Err(Error::new(ErrorKind::Other, "scripted read failure"))
            }
            Mode::Script => {}
        }
        if self.pos >= self.transcript.len() {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                "transcript exhausted",
            ));
        }
        let n = min(buf.len(), self.transcript.len() - self.pos);
        buf[..n].copy_from_slice(&self.transcript[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
