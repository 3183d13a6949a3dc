//! Expected values, computed without touching the memory under test.
use crate::op::{AmoOp, Width};

/// A source of expected values.
///
/// Implementations must be pure: the same inputs always produce the same
/// outputs, and nothing observed from the hardware feeds back into them.
pub trait Oracle {
    /// The value a cell at `addr` is primed with before it's tested.
    fn seed(&self, addr: usize, width: Width) -> u64;

    /// The value a store-conditional attempts to write into a cell that was
    /// primed with `seed`. Must differ from `seed` so that a dropped store is
    /// observable.
    fn new_value(&self, seed: u64, width: Width) -> u64;

    /// The value a cell should hold after `op` is applied with `operand` to a
    /// cell holding `old`.
    #[inline]
    fn expected_amo(&self, op: AmoOp, width: Width, old: u64, operand: u64) -> u64 {
        op.apply(width, old, operand)
    }
}

impl<T: Oracle + ?Sized> Oracle for &T {
    #[inline]
    fn seed(&self, addr: usize, width: Width) -> u64 {
        (**self).seed(addr, width)
    }

    #[inline]
    fn new_value(&self, seed: u64, width: Width) -> u64 {
        (**self).new_value(seed, width)
    }

    #[inline]
    fn expected_amo(&self, op: AmoOp, width: Width, old: u64, operand: u64) -> u64 {
        (**self).expected_amo(op, width, old, operand)
    }
}

/// The default oracle: the seed is the low 16 bits of the
/// address, and the store-conditional value is the seed plus 1234.
#[derive(Debug, Default, Clone, Copy)]
pub struct AddressOracle;

impl AddressOracle {
    pub const SEED_MASK: usize = 0xffff;
    pub const NEW_VALUE_OFFSET: u64 = 1234;
}

impl Oracle for AddressOracle {
    #[inline]
    fn seed(&self, addr: usize, width: Width) -> u64 {
        width.truncate((addr & Self::SEED_MASK) as u64)
    }

    #[inline]
    fn new_value(&self, seed: u64, width: Width) -> u64 {
        width.truncate(seed.wrapping_add(Self::NEW_VALUE_OFFSET))
    }
}
