//! hostrt Standard Library - Primitive Operations
//!
//! Operations that compiled programs call directly because their semantics
//! differ from the corresponding native Rust operators.
//!
//! # Supported Operations
//!
//! - Guarded 32-bit left shift (`shl`)
//! - Guarded 32-bit zero-fill right shift (`shr`)

pub mod bitwise;

// Re-export commonly used functions
pub use bitwise::*;
