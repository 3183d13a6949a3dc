//! The range of addresses under test.
use core::iter::FusedIterator;

use crate::{error::ConfigError, op::Width};

/// A validated `base..=end` address range walked with a fixed step.
///
/// `MemoryRange` is immutable once constructed. [`MemoryRange::iter`] can be
/// called any number of times, each call yielding the same sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    base: usize,
    end: usize,
    step: usize,
}

impl MemoryRange {
    /// The default step, one page.
    pub const DEFAULT_STEP: usize = 0x1000;

    /// Construct a `MemoryRange`.
    ///
    /// `end` is inclusive, but it doesn't have to be reachable from `base`;
    /// the last yielded address is the greatest `base + k * step` not
    /// exceeding `end`.
    pub const fn new(base: usize, end: usize, step: usize) -> Result<Self, ConfigError> {
        if step == 0 {
            return Err(ConfigError::ZeroStep);
        }
        if base > end {
            return Err(ConfigError::InvertedRange { base, end });
        }
        Ok(Self { base, end, step })
    }

    #[inline]
    pub const fn base(&self) -> usize {
        self.base
    }

    #[inline]
    pub const fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub const fn step(&self) -> usize {
        self.step
    }

    /// The number of addresses yielded by [`Self::iter`].
    #[inline]
    #[allow(clippy::len_without_is_empty)] // never empty
    pub const fn len(&self) -> usize {
        (self.end - self.base) / self.step + 1
    }

    /// Check that every yielded address is naturally aligned for `width`.
    pub const fn check_alignment(&self, width: Width) -> Result<(), ConfigError> {
        if self.base % width.bytes() != 0 {
            return Err(ConfigError::MisalignedBase {
                base: self.base,
                width,
            });
        }
        if self.step % width.bytes() != 0 {
            return Err(ConfigError::MisalignedStep {
                step: self.step,
                width,
            });
        }
        Ok(())
    }

    /// Iterate over the addresses `base, base + step, ...` up to `end`.
    #[inline]
    pub const fn iter(&self) -> Addresses {
        Addresses {
            next: Some(self.base),
            end: self.end,
            step: self.step,
        }
    }
}

impl IntoIterator for &MemoryRange {
    type Item = usize;
    type IntoIter = Addresses;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the addresses of a [`MemoryRange`]. Returned by
/// [`MemoryRange::iter`].
#[derive(Debug, Clone)]
pub struct Addresses {
    next: Option<usize>,
    end: usize,
    step: usize,
}

impl Iterator for Addresses {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        let addr = self.next?;
        // Stop at `end` or when stepping would wrap around the address space
        self.next = addr
            .checked_add(self.step)
            .filter(|&next| next <= self.end);
        Some(addr)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.len();
        (len, Some(len))
    }
}

impl ExactSizeIterator for Addresses {
    #[inline]
    fn len(&self) -> usize {
        match self.next {
            Some(next) => (self.end - next) / self.step + 1,
            None => 0,
        }
    }
}

impl FusedIterator for Addresses {}
