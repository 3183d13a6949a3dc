use core::fmt;

use crate::op::Width;

/// A fatal problem with the harness configuration, detected before any test
/// case runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The step between two tested addresses is zero.
    ZeroStep,
    /// The range's base address lies above its end address.
    InvertedRange { base: usize, end: usize },
    /// The base address is not aligned to the access width.
    MisalignedBase { base: usize, width: Width },
    /// The step is not a multiple of the access width, so some addresses
    /// would be misaligned.
    MisalignedStep { step: usize, width: Width },
    /// The store-conditional attempt budget is zero.
    ZeroAttempts,
    /// The executor can't issue atomic instructions of this width (e.g.,
    /// double-word atomics on RV32).
    UnsupportedWidth(Width),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ZeroStep => f.write_str("step must be non-zero"),
            Self::InvertedRange { base, end } => {
                write!(f, "base {base:#x} lies above end {end:#x}")
            }
            Self::MisalignedBase { base, width } => write!(
                f,
                "base {base:#x} is not aligned to {} bytes",
                width.bytes()
            ),
            Self::MisalignedStep { step, width } => write!(
                f,
                "step {step:#x} is not a multiple of {} bytes",
                width.bytes()
            ),
            Self::ZeroAttempts => f.write_str("store-conditional attempt budget must be non-zero"),
            Self::UnsupportedWidth(width) => {
                write!(f, "{}-bit atomics are not supported", width.bytes() * 8)
            }
        }
    }
}
