//! Verification harness for the atomic primitives of a RISC-V memory
//! subsystem.
//!
//! The harness walks a [`MemoryRange`], primes every cell with a value derived
//! from its address by an [`Oracle`], issues atomic memory operations (AMOs)
//! and load-reserved/store-conditional (LR/SC) sequences through an
//! [`AtomicExecutor`], and compares what the hardware committed against what
//! the oracle predicts. Each comparison yields one [`TestResult`], which is
//! written to a line-oriented sink and accumulated in a [`TestReport`].
//!
//! ```text
//!  MemoryRange ──▶ address ──▶ Oracle ──▶ expected
//!                     │                      │
//!                     ▼                      ▼
//!              AtomicExecutor ──▶ outcome ──▶ verify ──▶ TestReport
//!                     ▲               │
//!                     └── retry ◀─────┘ (LR/SC only)
//! ```
//!
//! The crate is `no_std` and allocation-free. The hardware implementation of
//! [`AtomicExecutor`] is only compiled for RISC-V targets; the `sim` feature
//! provides [`sim::SimMemory`] for running the harness anywhere.
#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod error;
pub mod executor;
pub mod harness;
pub mod op;
pub mod oracle;
pub mod range;
pub mod report;
pub mod retry;
#[cfg(feature = "sim")]
pub mod sim;
pub mod verify;

pub use self::{
    error::ConfigError,
    executor::{AmoOutcome, AtomicExecutor, LrScOutcome, ScStatus},
    harness::{Config, Harness, Suites},
    op::{AmoOp, OperationKind, Ordering, Width},
    oracle::{AddressOracle, Oracle},
    range::{Addresses, MemoryRange},
    report::{Summary, TestReport},
    retry::RetryPolicy,
    verify::{FailureKind, Outcome, TestCase, TestResult, Verdict},
};
