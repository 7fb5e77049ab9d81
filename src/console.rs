//! Console Output
//!
//! Unbuffered writes to standard output. Every call is flushed before it
//! returns so output interleaves correctly with child processes.

use std::io::{self, Write};

use crate::error::ShimResult;

/// Raw console writer.
pub struct Console<W: Write> {
    sink: W,
}

impl Console<io::Stdout> {
    /// Console attached to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Consume the console and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Write a single character.
    ///
    /// The byte is taken as the character with the same code point and
    /// encoded as UTF-8, so bytes above 0x7F produce two output bytes.
    pub fn put_char(&mut self, ch: u8) -> ShimResult<()> {
        let mut utf8 = [0u8; 4];
        let encoded = char::from(ch).encode_utf8(&mut utf8);
        self.emit(encoded.as_bytes())
    }

    /// Write raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> ShimResult<()> {
        self.emit(bytes)
    }

    /// Write an integer in decimal.
    pub fn put_int(&mut self, value: i32) -> ShimResult<()> {
        self.emit(value.to_string().as_bytes())
    }

    pub fn newline(&mut self) -> ShimResult<()> {
        self.emit(b"\n")
    }

    fn emit(&mut self, bytes: &[u8]) -> ShimResult<()> {
        self.sink.write_all(bytes)?;
        self.sink.flush()?;
        Ok(())
    }
}

impl Default for Console<io::Stdout> {
    fn default() -> Self {
        Self::stdout()
    }
}
