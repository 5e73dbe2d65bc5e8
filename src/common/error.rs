//! Error and fault definitions.
//!
//! `SimError` unifies every way a component can fail. Fatal variants
//! are caught at the offending pipeline stage and converted into a
//! halt of the simulator; non-fatal variants are handled locally by
//! the component that raised them.

use std::fmt;

/// An error raised by a simulator component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimError {
    /// A word access was not 4-byte aligned.
    Alignment { addr: u32 },

    /// An access fell outside the addressable backing buffer.
    Address { addr: u32 },

    /// A read or write targeted an MMIO offset with no registered
    /// register. Warning-only: reads return 0, writes are dropped.
    UnknownIoAddress { addr: u32 },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Alignment { addr } => {
                write!(f, "unaligned word access at {:#010x}", addr)
            }
            SimError::Address { addr } => {
                write!(f, "address out of range: {:#010x}", addr)
            }
            SimError::UnknownIoAddress { addr } => {
                write!(f, "unknown I/O address {:#010x}", addr)
            }
        }
    }
}

impl std::error::Error for SimError {}

/// One line of an `assemble()` failure report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembleError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}
