//! The capability interface through which the harness touches memory.
use core::fmt;

use crate::op::{AmoOp, Ordering, Width};

#[cfg(all(
    any(target_arch = "riscv32", target_arch = "riscv64"),
    target_feature = "a"
))]
mod riscv;
#[cfg(all(
    any(target_arch = "riscv32", target_arch = "riscv64"),
    target_feature = "a"
))]
pub use self::riscv::RiscvExecutor;

/// Issues memory operations against the memory under test.
///
/// Every method performs exactly one hardware operation (or, for
/// [`Self::lr_sc`], exactly one load-reserved/store-conditional pair) and
/// returns its raw result without interpreting it. In particular, a failed
/// store-conditional is returned to the caller, not retried.
///
/// Implementations must not let the compiler move other memory accesses
/// across any of these operations.
///
/// Addresses passed to these methods are always naturally aligned for the
/// given width, and the width is one for which [`Self::supports`] returned
/// `true`.
pub trait AtomicExecutor {
    /// Get a flag indicating whether atomics of the given width can be
    /// issued.
    fn supports(&self, width: Width) -> bool;

    /// Perform a plain store.
    fn store(&mut self, addr: usize, width: Width, value: u64);

    /// Perform a plain load. The result is zero-extended.
    fn load(&mut self, addr: usize, width: Width) -> u64;

    /// Perform a single atomic read-modify-write operation and return the
    /// value the cell held before it (zero-extended).
    fn amo(&mut self, addr: usize, width: Width, op: AmoOp, operand: u64) -> u64;

    /// Perform one load-reserved immediately followed by one
    /// store-conditional of `new_value` to the same address, using the
    /// ordering annotations selected by `ordering`.
    fn lr_sc(&mut self, addr: usize, width: Width, ordering: Ordering, new_value: u64)
        -> ScStatus;
}

impl<T: AtomicExecutor + ?Sized> AtomicExecutor for &mut T {
    #[inline]
    fn supports(&self, width: Width) -> bool {
        (**self).supports(width)
    }

    #[inline]
    fn store(&mut self, addr: usize, width: Width, value: u64) {
        (**self).store(addr, width, value)
    }

    #[inline]
    fn load(&mut self, addr: usize, width: Width) -> u64 {
        (**self).load(addr, width)
    }

    #[inline]
    fn amo(&mut self, addr: usize, width: Width, op: AmoOp, operand: u64) -> u64 {
        (**self).amo(addr, width, op, operand)
    }

    #[inline]
    fn lr_sc(
        &mut self,
        addr: usize,
        width: Width,
        ordering: Ordering,
        new_value: u64,
    ) -> ScStatus {
        (**self).lr_sc(addr, width, ordering, new_value)
    }
}

/// The raw result register of a store-conditional instruction. Zero means the
/// store was committed.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ScStatus(pub usize);

impl ScStatus {
    pub const SUCCESS: Self = Self(0);
    /// The value a simulated reservation failure reports.
    pub const FAILURE: Self = Self(1);

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for ScStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScStatus({})", self.0)
    }
}

impl fmt::Display for ScStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The observed effect of one AMO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmoOutcome {
    /// The value returned by the AMO instruction.
    pub prior: u64,
    /// The value read back by a plain load after the AMO.
    pub post: u64,
}

/// The observed effect of one store-conditional attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScAttempt {
    pub status: ScStatus,
    /// The value the store-conditional tried to write.
    pub value: u64,
}

/// The aggregated effect of a retried LR/SC sequence. Produced by
/// [`crate::retry::RetryPolicy::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LrScOutcome {
    /// The number of LR/SC pairs issued, including the successful one.
    pub attempts: u32,
    pub succeeded: bool,
    /// The status of the last store-conditional.
    pub last_status: ScStatus,
    /// The value the last store-conditional tried to write.
    pub attempted_value: u64,
    /// The cell contents read back after a successful store-conditional.
    /// `None` if no attempt succeeded.
    pub final_value: Option<u64>,
}

/// Issue one AMO and read the cell back.
///
/// The read-back is a plain load that isn't part of the atomic operation; it
/// observes what the AMO committed.
pub fn execute_amo<E: AtomicExecutor + ?Sized>(
    exec: &mut E,
    addr: usize,
    width: Width,
    op: AmoOp,
    operand: u64,
) -> AmoOutcome {
    let prior = exec.amo(addr, width, op, width.truncate(operand));
    let post = exec.load(addr, width);
    log::trace!("{addr:#x}: {} {operand:#x}: {prior:#x} → {post:#x}", op.mnemonic());
    AmoOutcome { prior, post }
}

/// Issue one LR/SC pair.
pub fn execute_lr_sc<E: AtomicExecutor + ?Sized>(
    exec: &mut E,
    addr: usize,
    width: Width,
    ordering: Ordering,
    new_value: u64,
) -> ScAttempt {
    let value = width.truncate(new_value);
    let status = exec.lr_sc(addr, width, ordering, value);
    log::trace!("{addr:#x}: LR/SC {ordering:?} {value:#x} → {status}");
    ScAttempt { status, value }
}
