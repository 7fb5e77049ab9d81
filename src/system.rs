//! Host System
//!
//! Bundles every host capability a compiled program can reach into one
//! owned value. Tests build as many independent instances as they need;
//! [`crate::global`] holds the single process-wide one.

use std::io::{self, Write};

use crate::clock::Clock;
use crate::config::ShimConfig;
use crate::console::Console;
use crate::error::{self, ShimResult};
use crate::fd::{self, Descriptor, DescriptorTable};
use crate::process::ProcessExec;

/// All host capabilities behind one value.
pub struct HostSystem<W: Write = io::Stdout> {
    pub files: DescriptorTable,
    pub console: Console<W>,
    pub clock: Clock,
    pub process: ProcessExec,
}

impl HostSystem<io::Stdout> {
    /// Host system writing to standard output.
    pub fn new(config: &ShimConfig) -> ShimResult<Self> {
        Self::with_console(config, Console::stdout())
    }
}

impl<W: Write> HostSystem<W> {
    /// Host system writing console output to `console`.
    pub fn with_console(config: &ShimConfig, console: Console<W>) -> ShimResult<Self> {
        config.validate()?;
        Ok(Self {
            files: DescriptorTable::with_capacity(config.files.capacity),
            console,
            clock: Clock::new(),
            process: ProcessExec::new(&config.process),
        })
    }

    // ========== FILE Operations ==========

    pub fn file_open(&mut self, path: &[u8], for_input: bool) -> Option<Descriptor> {
        self.files.open(path, for_input)
    }

    pub fn file_read(&mut self, fd: Descriptor) -> ShimResult<Option<u8>> {
        self.files.read(fd)
    }

    pub fn file_write(
        &mut self,
        fd: Descriptor,
        buffer: &[u8],
        offset: usize,
        length: usize,
    ) -> ShimResult<()> {
        self.files.write_range(fd, buffer, offset, length)
    }

    pub fn file_available(&mut self, fd: Descriptor) -> ShimResult<i32> {
        self.files.available(fd)
    }

    pub fn file_close(&mut self, fd: Descriptor) {
        self.files.close(fd)
    }

    pub fn file_load(&self, path: &[u8]) -> Option<Vec<u8>> {
        fd::load(path)
    }

    // ========== PROCESS Operations ==========

    pub fn exec(&self, argv: &[&[u8]]) -> ShimResult<i32> {
        self.process.run(argv)
    }

    pub fn chmod(&self, path: &[u8], mode: i32) {
        self.process.chmod(path, mode)
    }

    // ========== ERROR Operations ==========

    pub fn error<T>(&self, kind: &[u8], message: &[u8]) -> ShimResult<T> {
        error::raise(kind, message)
    }
}
