//! File Descriptor Table
//!
//! Maps small integer descriptors to open native file streams. Compiled
//! programs open a path for input or output, then read single bytes, write
//! byte ranges, query how much input is left, and close.
//!
//! ## Slot allocation
//!
//! `open` scans from slot 0 upward and takes the first vacant slot, so a
//! closed descriptor is reused before any higher one. There is no free list;
//! the table is small and first-fit order is part of the observable contract.
//!
//! ## Shared handles
//!
//! Each occupied slot holds an `Arc<File>`. A caller that keeps the table
//! behind a lock clones the handle out with [`DescriptorTable::input_handle`]
//! or [`DescriptorTable::output_handle`], releases the lock, and then calls
//! [`read_byte`], [`write_range_to`] or [`available_in`]. A blocking FIFO or
//! terminal then stalls only its own caller.
//!
//! ## Conventions
//!
//! - Reading from a descriptor that is out of range or not open for input
//!   yields byte `0`, not an error.
//! - Writing to a descriptor that is not open for output does nothing.
//! - `close` never reports failure.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

use crate::config::DEFAULT_CAPACITY;
use crate::error::{ShimError, ShimResult};

/// Descriptor handed to compiled programs.
pub type Descriptor = i32;

/// Flat-call encoding of "no descriptor available".
pub const NO_DESCRIPTOR: Descriptor = -1;

/// One entry of the table.
///
/// A slot never holds both an input and an output stream.
#[derive(Debug, Default)]
pub enum Slot {
    #[default]
    Vacant,
    Input(Arc<File>),
    Output(Arc<File>),
}

impl Slot {
    pub fn is_vacant(&self) -> bool {
        matches!(self, Slot::Vacant)
    }

    /// Open `path` natively and wrap the stream in the matching slot kind.
    ///
    /// This may block (a FIFO waits for its peer) and touches no table.
    pub fn open(path: &[u8], for_input: bool) -> Option<Slot> {
        let path = native_path(path);
        let opened = if for_input {
            open_input(&path).map(|file| Slot::Input(Arc::new(file)))
        } else {
            open_output(&path).map(|file| Slot::Output(Arc::new(file)))
        };

        match opened {
            Ok(slot) => Some(slot),
            Err(e) => {
                debug!("failed to open {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Release the stream held by this slot, logging native close failures.
    ///
    /// If another caller still holds a clone of the handle, the stream is
    /// closed when that clone is dropped and no failure can be observed.
    pub fn release(self, fd: Descriptor) {
        let handle = match self {
            Slot::Vacant => return,
            Slot::Input(handle) | Slot::Output(handle) => handle,
        };

        match Arc::try_unwrap(handle) {
            Ok(file) => {
                if let Err(e) = close_native(file) {
                    warn!("ignoring close failure on descriptor {}: {}", fd, e);
                }
            }
            Err(_) => debug!("descriptor {} still in use; deferring close", fd),
        }
    }
}

/// Fixed-capacity table of open file streams.
#[derive(Debug)]
pub struct DescriptorTable {
    slots: Box<[Slot]>,
}

impl DescriptorTable {
    /// Create an empty table with the default capacity (128).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty table with `capacity` slots.
    ///
    /// Capacities above `i32::MAX` are clamped so every slot is addressable
    /// by a [`Descriptor`].
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(i32::MAX as usize);
        let slots = std::iter::repeat_with(Slot::default)
            .take(capacity)
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { slots }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len_open(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_vacant()).count()
    }

    /// Whether at least one slot is vacant.
    pub fn has_vacancy(&self) -> bool {
        self.slots.iter().any(Slot::is_vacant)
    }

    /// Whether `fd` currently names an open stream.
    pub fn is_open(&self, fd: Descriptor) -> bool {
        self.slot(fd).is_some_and(|slot| !slot.is_vacant())
    }

    /// Whether `fd` is open for output.
    pub fn is_output(&self, fd: Descriptor) -> bool {
        matches!(self.slot(fd), Some(Slot::Output(_)))
    }

    #[inline]
    fn index(&self, fd: Descriptor) -> Option<usize> {
        usize::try_from(fd).ok().filter(|&idx| idx < self.slots.len())
    }

    #[inline]
    fn slot(&self, fd: Descriptor) -> Option<&Slot> {
        self.index(fd).map(|idx| &self.slots[idx])
    }

    #[inline]
    fn input(&self, fd: Descriptor) -> Option<&File> {
        match self.slot(fd)? {
            Slot::Input(handle) => Some(handle.as_ref()),
            _ => None,
        }
    }

    #[inline]
    fn output(&self, fd: Descriptor) -> Option<&File> {
        match self.slot(fd)? {
            Slot::Output(handle) => Some(handle.as_ref()),
            _ => None,
        }
    }

    /// Shared handle of an input descriptor.
    pub fn input_handle(&self, fd: Descriptor) -> Option<Arc<File>> {
        match self.slot(fd)? {
            Slot::Input(handle) => Some(Arc::clone(handle)),
            _ => None,
        }
    }

    /// Shared handle of an output descriptor.
    pub fn output_handle(&self, fd: Descriptor) -> Option<Arc<File>> {
        match self.slot(fd)? {
            Slot::Output(handle) => Some(Arc::clone(handle)),
            _ => None,
        }
    }

    /// Store an already-opened slot in the first vacant position.
    ///
    /// Returns `None`, and drops `slot`, when the table is full.
    pub fn insert(&mut self, slot: Slot) -> Option<Descriptor> {
        match self.slots.iter().position(Slot::is_vacant) {
            Some(idx) => {
                self.slots[idx] = slot;
                Some(idx as Descriptor)
            }
            None => {
                debug!("descriptor table full ({} slots)", self.slots.len());
                None
            }
        }
    }

    /// Vacate `fd` and hand back whatever it held.
    ///
    /// Out-of-range descriptors yield [`Slot::Vacant`].
    pub fn take(&mut self, fd: Descriptor) -> Slot {
        match self.index(fd) {
            Some(idx) => std::mem::take(&mut self.slots[idx]),
            None => Slot::Vacant,
        }
    }

    /// Open `path` for input (`for_input == true`) or output.
    ///
    /// Output files are created or truncated. Returns `None` when the table
    /// is full or the host refuses to open the path. A full table is detected
    /// before the host is asked, so no output file is created.
    pub fn open(&mut self, path: &[u8], for_input: bool) -> Option<Descriptor> {
        if !self.has_vacancy() {
            debug!("descriptor table full ({} slots)", self.slots.len());
            return None;
        }
        self.insert(Slot::open(path, for_input)?)
    }

    /// Read one byte from an input descriptor.
    ///
    /// Returns `Ok(None)` at end of stream. A descriptor that is out of
    /// range or not open for input yields `Ok(Some(0))`.
    pub fn read(&mut self, fd: Descriptor) -> ShimResult<Option<u8>> {
        match self.input(fd) {
            Some(file) => read_byte(file),
            None => Ok(Some(0)),
        }
    }

    /// Write `buffer[offset..offset + length]` to an output descriptor.
    ///
    /// Does nothing when `fd` is not open for output.
    pub fn write_range(
        &mut self,
        fd: Descriptor,
        buffer: &[u8],
        offset: usize,
        length: usize,
    ) -> ShimResult<()> {
        match self.output(fd) {
            Some(file) => write_range_to(file, buffer, offset, length),
            None => Ok(()),
        }
    }

    /// Bytes that can be read from an input descriptor without blocking.
    ///
    /// Absent descriptors report 0. See [`available_in`].
    pub fn available(&mut self, fd: Descriptor) -> ShimResult<i32> {
        match self.input(fd) {
            Some(file) => available_in(file),
            None => Ok(0),
        }
    }

    /// Close a descriptor and mark its slot vacant.
    ///
    /// Out-of-range and already-vacant descriptors are ignored. Native close
    /// failures are logged and otherwise dropped.
    pub fn close(&mut self, fd: Descriptor) {
        self.take(fd).release(fd)
    }
}

impl Default for DescriptorTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Read one byte from `file`, retrying interrupted reads.
///
/// Returns `Ok(None)` at end of stream.
pub fn read_byte(mut file: &File) -> ShimResult<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match file.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ShimError::Io(e)),
        }
    }
}

/// Write `buffer[offset..offset + length]` to `file`.
pub fn write_range_to(
    mut file: &File,
    buffer: &[u8],
    offset: usize,
    length: usize,
) -> ShimResult<()> {
    let range = offset
        .checked_add(length)
        .filter(|&end| end <= buffer.len())
        .map(|end| &buffer[offset..end])
        .ok_or(ShimError::OutOfBounds {
            offset,
            length,
            len: buffer.len(),
        })?;

    file.write_all(range)?;
    Ok(())
}

/// Bytes readable from `file` without blocking, clamped to `i32::MAX`.
///
/// Regular files report their length past the current position. Pipes,
/// FIFOs and terminals report what the host has buffered for them (FIONREAD
/// on unix). Streams the host cannot measure report 0.
pub fn available_in(mut file: &File) -> ShimResult<i32> {
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Ok(pending_bytes(file)?);
    }
    let position = file.stream_position()?;
    let remaining = metadata.len().saturating_sub(position);
    Ok(remaining.min(i32::MAX as u64) as i32)
}

/// Read an entire file without touching any descriptor table.
///
/// Returns `None` if the file cannot be opened (directories included), its
/// size cannot be determined, or fewer bytes than its reported size can be
/// read.
pub fn load(path: &[u8]) -> Option<Vec<u8>> {
    let path = native_path(path);
    let result = open_input(&path).and_then(|mut file| {
        let len = file.metadata()?.len();
        let len = usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "file too large"))?;
        read_fully(&mut file, len)
    });

    match result {
        Ok(buffer) => Some(buffer),
        Err(e) => {
            debug!("failed to load {}: {}", path.display(), e);
            None
        }
    }
}

/// Read exactly `len` bytes, tolerating short reads.
pub fn read_fully<R: Read>(reader: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buffer = vec![0u8; len];
    let mut pos = 0;
    while pos < len {
        match reader.read(&mut buffer[pos..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("expected {} bytes, got {}", len, pos),
                ))
            }
            Ok(n) => pos += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(buffer)
}

/// Decode a raw filename into a host path.
#[cfg(unix)]
fn native_path(path: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    PathBuf::from(OsStr::from_bytes(path))
}

/// Decode a raw filename into a host path.
#[cfg(not(unix))]
fn native_path(path: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(path).into_owned())
}

fn open_input(path: &Path) -> io::Result<File> {
    let file = File::open(path)?;
    if file.metadata()?.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} is a directory", path.display()),
        ));
    }
    Ok(file)
}

fn open_output(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(unix)]
mod sys {
    nix::ioctl_read_bad!(fionread, nix::libc::FIONREAD, nix::libc::c_int);
}

/// Bytes the host has buffered for a non-regular stream.
#[cfg(unix)]
fn pending_bytes(file: &File) -> io::Result<i32> {
    use nix::errno::Errno;
    use std::os::unix::io::AsRawFd;

    let mut pending: nix::libc::c_int = 0;
    // SAFETY: the descriptor is owned by `file` for the whole call and
    // `pending` is a valid c_int for the kernel to fill.
    match unsafe { sys::fionread(file.as_raw_fd(), &mut pending) } {
        Ok(_) => Ok(pending.max(0)),
        // Character devices such as /dev/null do not answer FIONREAD
        Err(Errno::ENOTTY) | Err(Errno::EINVAL) => Ok(0),
        Err(e) => Err(io::Error::from(e)),
    }
}

#[cfg(not(unix))]
fn pending_bytes(_file: &File) -> io::Result<i32> {
    Ok(0)
}

/// Close a file and report the host's verdict instead of discarding it.
#[cfg(unix)]
fn close_native(file: File) -> io::Result<()> {
    use std::os::unix::io::IntoRawFd;

    nix::unistd::close(file.into_raw_fd()).map_err(io::Error::from)
}

#[cfg(not(unix))]
fn close_native(file: File) -> io::Result<()> {
    drop(file);
    Ok(())
}
