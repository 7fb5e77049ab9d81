//! hostrt - Host Runtime Shim for Compiled Programs
//!
//! The boundary between programs compiled to a managed bytecode target and the
//! host they run on. Compiled code reaches the host only through the
//! operations in this crate.
//!
//! # Features
//!
//! - **File descriptors**: fixed-capacity table of open input/output streams
//!   addressed by small integers, plus whole-file loading
//! - **Console**: unbuffered character, byte, and integer output
//! - **Clock**: millisecond, microsecond, and nanosecond ticks
//! - **Processes**: spawn-and-wait, and permission changes via `chmod`
//! - **Fatal errors**: structured `kind: message` conditions
//! - **Shift guards**: 32-bit shifts that yield zero for out-of-range amounts
//!
//! # Example
//!
//! ```rust
//! use hostrt::{HostSystem, ShimConfig};
//!
//! let config = ShimConfig::default();
//! let mut system = HostSystem::new(&config).unwrap();
//!
//! // Absent descriptors read as zero
//! assert_eq!(system.file_read(3).unwrap(), Some(0));
//!
//! let err = system.error::<()>(b"IOError", b"disk full").unwrap_err();
//! assert_eq!(err.to_string(), "IOError: disk full");
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ Compiled code   │  flat calls: file_open, putc, exec, shl, ...
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ global          │  process-wide state; table lock held per lookup
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ HostSystem      │  injectable; one per test
//! └────────┬────────┘
//!          │
//!   ┌──────┼──────┬─────────┐
//!   ▼      ▼      ▼         ▼
//!  fd   console  clock   process
//! ```
//!
//! # Error policy
//!
//! | Operation | On failure |
//! |-----------|------------|
//! | `open`, `load` | `None` |
//! | `close`, `chmod` | logged, nothing returned |
//! | `read` / `available` on absent descriptor | `0` |
//! | `run`, stream faults, `raise` | `Err(ShimError)` |

#![warn(clippy::all)]

pub mod clock;
pub mod config;
pub mod console;
pub mod error;
pub mod fd;
pub mod global;
pub mod process;
pub mod system;

// Re-export commonly used types
pub use clock::Clock;
pub use config::{ConfigError, ConfigResult, ShimConfig};
pub use console::Console;
pub use error::{raise, RaisedError, ShimError, ShimResult};
pub use fd::{load, Descriptor, DescriptorTable, Slot, NO_DESCRIPTOR};
pub use process::{octal_mode, ProcessExec};
pub use system::HostSystem;

// Shift guards
pub use hostrt_stdlib::{shl, shr};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
