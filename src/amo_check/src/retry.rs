//! Bounded retrying of LR/SC sequences.
//!
//! A store-conditional is allowed to fail: the reservation may have been lost
//! to a competing store, or the implementation may fail it spuriously. So one
//! failed attempt says nothing about the correctness of the reservation
//! mechanism. Only a store-conditional that never commits within the attempt
//! budget is a defect.
use core::num::NonZeroU32;

use crate::{
    error::ConfigError,
    executor::{execute_lr_sc, AtomicExecutor, LrScOutcome, ScAttempt, ScStatus},
    op::{Ordering, Width},
};

/// How many LR/SC pairs may be issued for one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: NonZeroU32,
}

impl Default for RetryPolicy {
    /// A single attempt, i.e., no retry.
    fn default() -> Self {
        Self::SINGLE_ATTEMPT
    }
}

impl RetryPolicy {
    pub const SINGLE_ATTEMPT: Self = Self {
        max_attempts: match NonZeroU32::new(1) {
            Some(x) => x,
            None => unreachable!(),
        },
    };

    pub const fn new(max_attempts: u32) -> Result<Self, ConfigError> {
        match NonZeroU32::new(max_attempts) {
            Some(max_attempts) => Ok(Self { max_attempts }),
            None => Err(ConfigError::ZeroAttempts),
        }
    }

    #[inline]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts.get()
    }

    /// Issue LR/SC pairs until a store-conditional commits or the budget is
    /// exhausted.
    ///
    /// `new_value` is called with the 1-based attempt number to obtain the
    /// value to store. After a successful attempt the cell is read back with a
    /// plain load and the result is recorded in
    /// [`LrScOutcome::final_value`].
    pub fn run<E: AtomicExecutor + ?Sized>(
        &self,
        exec: &mut E,
        addr: usize,
        width: Width,
        ordering: Ordering,
        mut new_value: impl FnMut(u32) -> u64,
    ) -> LrScOutcome {
        let mut last = ScAttempt {
            status: ScStatus::FAILURE,
            value: 0,
        };

        for attempt in 1..=self.max_attempts() {
            last = execute_lr_sc(exec, addr, width, ordering, new_value(attempt));

            if last.status.is_success() {
                if attempt > 1 {
                    log::debug!("{addr:#x}: SC committed on attempt {attempt}");
                }
                return LrScOutcome {
                    attempts: attempt,
                    succeeded: true,
                    last_status: last.status,
                    attempted_value: last.value,
                    final_value: Some(exec.load(addr, width)),
                };
            }

            log::trace!(
                "{addr:#x}: SC failed on attempt {attempt}/{} (status = {})",
                self.max_attempts(),
                last.status
            );
        }

        LrScOutcome {
            attempts: self.max_attempts(),
            succeeded: false,
            last_status: last.status,
            attempted_value: last.value,
            final_value: None,
        }
    }
}
