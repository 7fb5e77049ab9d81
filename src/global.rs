//! Process-Wide Host System
//!
//! Compiled programs call the shim as free functions with no receiver. This
//! module owns the process-wide host state those calls reach (the same
//! capabilities a [`HostSystem`](crate::system::HostSystem) bundles) and
//! exposes them with the flat calling convention compiled code expects:
//!
//! | Call | Result |
//! |------|--------|
//! | `file_open` | descriptor, or `-1` |
//! | `file_read` | byte, `0` for absent descriptors, `0xFF` at end of stream |
//! | `file_write_k` / `file_left` / `file_close` | see [`DescriptorTable`](crate::fd::DescriptorTable) |
//! | `file_load` | contents, or `None` |
//! | `exec` | exit status |
//! | `error` | always `Err` |
//!
//! `init` must run before the first call to use a non-default configuration.
//!
//! Only the descriptor table sits behind a lock, and it is held just long
//! enough to pick a slot or clone a handle out. Opening, reading, writing and
//! closing native streams happen after it is released, so a FIFO or terminal
//! that blocks one caller never stalls the others. Console output goes
//! straight to standard output and the clock needs no lock.

use std::fs::File;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, MutexGuard};

use crate::clock::Clock;
use crate::config::ShimConfig;
use crate::console::Console;
use crate::error::{ShimError, ShimResult};
use crate::fd::{self, Descriptor, DescriptorTable, Slot, NO_DESCRIPTOR};
use crate::process::ProcessExec;

/// Host end-of-stream marker truncated to a byte.
pub const END_OF_STREAM_BYTE: u8 = 0xFF;

/// Host state reachable from flat calls.
struct Shared {
    files: Mutex<DescriptorTable>,
    clock: Clock,
    process: ProcessExec,
}

impl Shared {
    fn new(config: &ShimConfig) -> Self {
        Self {
            files: Mutex::new(DescriptorTable::with_capacity(config.files.capacity)),
            clock: Clock::new(),
            process: ProcessExec::new(&config.process),
        }
    }
}

static SHARED: OnceCell<Shared> = OnceCell::new();

/// Initialize the process-wide host system from `config`.
///
/// Returns `Ok(false)` if it was already initialized; the existing instance
/// is kept.
pub fn init(config: &ShimConfig) -> ShimResult<bool> {
    let mut created = false;
    SHARED.get_or_try_init(|| -> ShimResult<Shared> {
        config.validate()?;
        created = true;
        Ok(Shared::new(config))
    })?;
    Ok(created)
}

/// Initialize from `hostrt.toml` found in or above the current directory.
pub fn init_from_cwd() -> ShimResult<bool> {
    let config = ShimConfig::load_from_cwd()?;
    init(&config)
}

/// Whether [`init`] has already run.
pub fn is_initialized() -> bool {
    SHARED.get().is_some()
}

fn shared() -> &'static Shared {
    SHARED.get_or_init(|| Shared::new(&ShimConfig::default()))
}

fn files() -> MutexGuard<'static, DescriptorTable> {
    shared().files.lock()
}

fn input_handle(fd: Descriptor) -> Option<Arc<File>> {
    files().input_handle(fd)
}

// ========== FILE Operations ==========

/// Open a file and return its descriptor, or `-1`.
///
/// The native open runs unlocked. If other callers fill the table while it
/// is in progress, the opened stream is closed again and `-1` is returned.
pub fn file_open(name: &[u8], input: bool) -> Descriptor {
    if !files().has_vacancy() {
        return NO_DESCRIPTOR;
    }
    let slot = match Slot::open(name, input) {
        Some(slot) => slot,
        None => return NO_DESCRIPTOR,
    };
    files().insert(slot).unwrap_or(NO_DESCRIPTOR)
}

pub fn file_read(fd: Descriptor) -> ShimResult<u8> {
    match input_handle(fd) {
        Some(file) => Ok(fd::read_byte(&file)?.unwrap_or(END_OF_STREAM_BYTE)),
        None => Ok(0),
    }
}

/// Write `length` bytes of `buffer` starting at `offset`.
///
/// Negative offsets or lengths are out of bounds for any buffer.
pub fn file_write_k(fd: Descriptor, buffer: &[u8], offset: i32, length: i32) -> ShimResult<()> {
    let file = match files().output_handle(fd) {
        Some(file) => file,
        None => return Ok(()),
    };
    let (offset, length) = match (usize::try_from(offset), usize::try_from(length)) {
        (Ok(offset), Ok(length)) => (offset, length),
        _ => {
            return Err(ShimError::OutOfBounds {
                offset: offset.max(0) as usize,
                length: length.max(0) as usize,
                len: buffer.len(),
            })
        }
    };
    fd::write_range_to(&file, buffer, offset, length)
}

pub fn file_left(fd: Descriptor) -> ShimResult<i32> {
    match input_handle(fd) {
        Some(file) => fd::available_in(&file),
        None => Ok(0),
    }
}

pub fn file_close(fd: Descriptor) {
    let slot = files().take(fd);
    slot.release(fd)
}

/// Read a whole file. Never touches the descriptor table.
pub fn file_load(name: &[u8]) -> Option<Vec<u8>> {
    fd::load(name)
}

// ========== IO (Console) Operations ==========

pub fn putc(ch: u8) -> ShimResult<()> {
    Console::stdout().put_char(ch)
}

pub fn puts(bytes: &[u8]) -> ShimResult<()> {
    Console::stdout().put_bytes(bytes)
}

pub fn puti(value: i32) -> ShimResult<()> {
    Console::stdout().put_int(value)
}

pub fn ln() -> ShimResult<()> {
    Console::stdout().newline()
}

// ========== TIME Operations ==========

pub fn ticks_ms() -> i32 {
    shared().clock.ticks_ms()
}

pub fn ticks_us() -> i32 {
    shared().clock.ticks_us()
}

pub fn ticks_ns() -> i32 {
    shared().clock.ticks_ns()
}

// ========== PROCESS Operations ==========

/// Run a command and wait for its exit status.
pub fn exec(args: &[&[u8]]) -> ShimResult<i32> {
    shared().process.run(args)
}

pub fn chmod(name: &[u8], mode: i32) {
    shared().process.chmod(name, mode)
}

// ========== ERROR / BITWISE Operations ==========

pub fn error<T>(kind: &[u8], message: &[u8]) -> ShimResult<T> {
    crate::error::raise(kind, message)
}

pub fn shl(a: i32, b: i32) -> i32 {
    hostrt_stdlib::shl(a, b)
}

pub fn shr(a: i32, b: i32) -> i32 {
    hostrt_stdlib::shr(a, b)
}
