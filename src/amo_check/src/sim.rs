//! A simulated memory with a single-hart reservation set, for running the
//! harness without the hardware under test.
//!
//! The reservation model follows the RISC-V unprivileged specification: an
//! LR registers a reservation on the naturally aligned 8-byte granule
//! containing the address, every SC (whether it succeeds or not) consumes the
//! reservation, and any store to the reserved granule invalidates it.
//!
//! Faults can be injected to exercise every failure path of the harness.
use arrayvec::ArrayVec;

use crate::{
    executor::{AtomicExecutor, ScStatus},
    op::{AmoOp, Ordering, Width},
};

/// The size and alignment of a reservation granule.
const GRANULE: usize = 8;

/// XOR-ed into values committed by a corrupted AMO or SC.
pub const CORRUPTION_MASK: u64 = 0x100;

/// How an injected store-conditional failure comes about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScFailure {
    /// The reservation is intact but the SC fails anyway, as the
    /// specification permits.
    Spurious,
    /// Another agent stores (the same value) to the reserved granule between
    /// the LR and the SC, invalidating the reservation.
    InterveningStore,
}

/// Counts of the operations issued against a [`SimMemory`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimStats {
    pub loads: usize,
    pub stores: usize,
    pub amos: usize,
    pub lr_sc_pairs: usize,
    pub sc_committed: usize,
}

/// Sparse simulated memory holding up to `N` distinct 8-byte granules.
/// Memory that was never written reads as zero.
#[derive(Debug, Clone)]
pub struct SimMemory<const N: usize = 64> {
    /// `(granule address, contents)`, contents in little endian
    granules: ArrayVec<(usize, u64), N>,
    reservation: Option<usize>,
    supports_double: bool,
    pending_sc_failures: u32,
    sc_failure: ScFailure,
    corrupt_sc: bool,
    corrupt_amo: bool,
    stats: SimStats,
}

impl SimMemory {
    /// Construct a `SimMemory` with the default capacity.
    pub const fn new() -> Self {
        Self::with_capacity()
    }
}

impl Default for SimMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SimMemory<N> {
    /// Construct a `SimMemory` holding up to `N` granules.
    pub const fn with_capacity() -> Self {
        Self {
            granules: ArrayVec::new_const(),
            reservation: None,
            supports_double: true,
            pending_sc_failures: 0,
            sc_failure: ScFailure::Spurious,
            corrupt_sc: false,
            corrupt_amo: false,
            stats: SimStats {
                loads: 0,
                stores: 0,
                amos: 0,
                lr_sc_pairs: 0,
                sc_committed: 0,
            },
        }
    }

    /// Behave like an RV32 hart, rejecting double-word atomics.
    pub const fn rv32(mut self) -> Self {
        self.supports_double = false;
        self
    }

    /// Make the next `count` store-conditionals fail in the manner specified
    /// by `kind`.
    pub fn fail_next_sc(&mut self, count: u32, kind: ScFailure) {
        self.pending_sc_failures = count;
        self.sc_failure = kind;
    }

    /// Make every committed store-conditional write a value different from
    /// the requested one.
    pub fn corrupt_sc_stores(&mut self, enable: bool) {
        self.corrupt_sc = enable;
    }

    /// Make every AMO commit a result different from the architecturally
    /// defined one. The value returned as the prior value stays correct.
    pub fn corrupt_amo_results(&mut self, enable: bool) {
        self.corrupt_amo = enable;
    }

    pub fn stats(&self) -> SimStats {
        self.stats
    }

    /// Get a flag indicating whether a reservation is currently held.
    pub fn has_reservation(&self) -> bool {
        self.reservation.is_some()
    }

    /// Read a cell without going through the executor interface.
    pub fn peek(&self, addr: usize, width: Width) -> u64 {
        let (granule, shift) = split(addr, width);
        let contents = self
            .granules
            .iter()
            .find(|&&(g, _)| g == granule)
            .map_or(0, |&(_, contents)| contents);
        width.truncate(contents >> shift)
    }

    /// Write a cell as another agent would, invalidating any reservation on
    /// it. Not counted in [`Self::stats`].
    pub fn poke(&mut self, addr: usize, width: Width, value: u64) {
        let (granule, shift) = split(addr, width);
        let mask = width.mask() << shift;
        let slot = self.granule_mut(granule);
        *slot = (*slot & !mask) | ((width.truncate(value) << shift) & mask);

        if self.reservation == Some(granule) {
            log::trace!("reservation on {granule:#x} invalidated by a store");
            self.reservation = None;
        }
    }

    fn granule_mut(&mut self, granule: usize) -> &mut u64 {
        let i = match self.granules.iter().position(|&(g, _)| g == granule) {
            Some(i) => i,
            None => {
                if self.granules.try_push((granule, 0)).is_err() {
                    capacity_exceeded(N);
                }
                self.granules.len() - 1
            }
        };
        &mut self.granules[i].1
    }
}

#[cold]
#[inline(never)]
fn capacity_exceeded(n: usize) -> ! {
    panic!("simulated memory can't hold more than {n} granules")
}

/// Get the granule address and bit shift of the cell at `addr`.
#[inline]
fn split(addr: usize, width: Width) -> (usize, u32) {
    debug_assert_eq!(addr % width.bytes(), 0, "misaligned access to {addr:#x}");
    let granule = addr & !(GRANULE - 1);
    (granule, ((addr - granule) * 8) as u32)
}

impl<const N: usize> AtomicExecutor for SimMemory<N> {
    fn supports(&self, width: Width) -> bool {
        match width {
            Width::Word => true,
            Width::Double => self.supports_double,
        }
    }

    fn store(&mut self, addr: usize, width: Width, value: u64) {
        self.stats.stores += 1;
        self.poke(addr, width, value);
    }

    fn load(&mut self, addr: usize, width: Width) -> u64 {
        self.stats.loads += 1;
        self.peek(addr, width)
    }

    fn amo(&mut self, addr: usize, width: Width, op: AmoOp, operand: u64) -> u64 {
        self.stats.amos += 1;
        let old = self.peek(addr, width);
        let mut new = op.apply(width, old, operand);
        if self.corrupt_amo {
            new ^= CORRUPTION_MASK;
        }
        self.poke(addr, width, new);
        old
    }

    fn lr_sc(
        &mut self,
        addr: usize,
        width: Width,
        _ordering: Ordering,
        new_value: u64,
    ) -> ScStatus {
        self.stats.lr_sc_pairs += 1;
        let (granule, _) = split(addr, width);

        // LR
        let loaded = self.peek(addr, width);
        self.reservation = Some(granule);

        let mut spurious = false;
        if self.pending_sc_failures > 0 {
            self.pending_sc_failures -= 1;
            match self.sc_failure {
                ScFailure::Spurious => spurious = true,
                ScFailure::InterveningStore => self.poke(addr, width, loaded),
            }
        }

        // SC always consumes the reservation
        let reserved = self.reservation.take() == Some(granule);
        if !reserved || spurious {
            return ScStatus::FAILURE;
        }

        let value = if self.corrupt_sc {
            new_value ^ CORRUPTION_MASK
        } else {
            new_value
        };
        self.poke(addr, width, value);
        self.stats.sc_committed += 1;
        ScStatus::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_share_a_granule() {
        let mut mem = SimMemory::new();
        mem.store(0x1000, Width::Word, 0x1111_1111);
        mem.store(0x1004, Width::Word, 0x2222_2222);
        assert_eq!(mem.load(0x1000, Width::Double), 0x2222_2222_1111_1111);
        assert_eq!(mem.load(0x1004, Width::Word), 0x2222_2222);
        assert_eq!(mem.peek(0x2000, Width::Word), 0);
    }

    #[test]
    fn lr_sc_commits() {
        let mut mem = SimMemory::new();
        mem.store(0x1000, Width::Word, 5);
        let status = mem.lr_sc(0x1000, Width::Word, Ordering::Plain, 7);
        assert!(status.is_success());
        assert_eq!(mem.peek(0x1000, Width::Word), 7);
        assert!(!mem.has_reservation());
    }

    #[test]
    fn intervening_store_breaks_reservation() {
        let mut mem = SimMemory::new();
        mem.store(0x1000, Width::Word, 5);
        mem.fail_next_sc(1, ScFailure::InterveningStore);
        let status = mem.lr_sc(0x1000, Width::Word, Ordering::AcqRel, 7);
        assert!(!status.is_success());
        assert_eq!(mem.peek(0x1000, Width::Word), 5);
        assert!(!mem.has_reservation());

        // The injected failure was used up
        assert!(mem
            .lr_sc(0x1000, Width::Word, Ordering::AcqRel, 7)
            .is_success());
        assert_eq!(mem.stats().lr_sc_pairs, 2);
        assert_eq!(mem.stats().sc_committed, 1);
    }

    #[test]
    fn spurious_failure_leaves_cell_untouched() {
        let mut mem = SimMemory::new();
        mem.store(0x1008, Width::Double, u64::MAX);
        mem.fail_next_sc(2, ScFailure::Spurious);
        for _ in 0..2 {
            assert_eq!(
                mem.lr_sc(0x1008, Width::Double, Ordering::SeqCst, 1),
                ScStatus::FAILURE
            );
        }
        assert_eq!(mem.peek(0x1008, Width::Double), u64::MAX);
        assert!(mem
            .lr_sc(0x1008, Width::Double, Ordering::SeqCst, 1)
            .is_success());
    }

    #[test]
    fn amo_returns_prior_value() {
        let mut mem = SimMemory::new();
        mem.store(0x1000, Width::Word, 0x10);
        assert_eq!(mem.amo(0x1000, Width::Word, AmoOp::Add, 5), 0x10);
        assert_eq!(mem.peek(0x1000, Width::Word), 0x15);

        mem.corrupt_amo_results(true);
        assert_eq!(mem.amo(0x1000, Width::Word, AmoOp::Xor, 0xa), 0x15);
        assert_eq!(mem.peek(0x1000, Width::Word), 0x1f ^ CORRUPTION_MASK);
        assert_eq!(mem.stats().amos, 2);
    }

    #[test]
    #[should_panic(expected = "can't hold more than 2 granules")]
    fn capacity_is_bounded() {
        let mut mem = SimMemory::<2>::with_capacity();
        for addr in [0x0, 0x8, 0x10] {
            mem.store(addr, Width::Word, 1);
        }
    }
}
