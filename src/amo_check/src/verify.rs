//! Turning observations into verdicts.
//!
//! Every function in this module is total: it compares what was observed with
//! what the oracle expected and always produces a [`TestResult`].
use core::fmt;

use crate::{
    executor::{AmoOutcome, LrScOutcome},
    op::{OperationKind, Width},
};

/// One operation applied to one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestCase {
    pub addr: usize,
    pub width: Width,
    pub kind: OperationKind,
    /// The AMO operand, or the value stored by a plain or LR/SC test.
    pub operand: u64,
}

/// What the hardware did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Plain { read: u64 },
    Amo(AmoOutcome),
    LrSc(LrScOutcome),
}

/// What the oracle predicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expected {
    /// The value the cell should hold after the operation.
    pub value: u64,
    /// The value the cell should have held before the operation, if the
    /// operation reports it (AMOs do).
    pub prior: Option<u64>,
}

/// Why a test case failed. Each variant indicates a different class of
/// defect, so they are never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A plain load didn't return what a plain store wrote.
    ReadBackMismatch,
    /// An AMO returned a prior value other than the cell's contents.
    PriorMismatch,
    /// The cell doesn't hold the architecturally defined AMO result.
    ResultMismatch,
    /// No store-conditional committed within the attempt budget. Points at
    /// the reservation mechanism.
    ReservationExhausted,
    /// A store-conditional reported success, but the cell doesn't hold the
    /// stored value. Points at coherence, not at the reservation mechanism.
    CommitMismatch,
}

impl FailureKind {
    /// A short human-readable explanation.
    pub const fn detail(self) -> &'static str {
        match self {
            Self::ReadBackMismatch => "read-back mismatch",
            Self::PriorMismatch => "prior value mismatch",
            Self::ResultMismatch => "value mismatch after AMO",
            Self::ReservationExhausted => "store-conditional never committed",
            Self::CommitMismatch => "value mismatch after commit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(FailureKind),
}

impl Verdict {
    #[inline]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// The record of one test case.
///
/// Its `Display` implementation renders the report line, e.g.,
/// `[AMOADD.W] Addr 0x00001000: PASS (old=0x10, new=0x15)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestResult {
    pub case: TestCase,
    pub outcome: Outcome,
    pub expected: Expected,
    pub verdict: Verdict,
}

impl TestResult {
    /// A human-readable explanation of the verdict.
    pub const fn detail(&self) -> &'static str {
        match self.verdict {
            Verdict::Pass => "ok",
            Verdict::Fail(kind) => kind.detail(),
        }
    }
}

/// Verify a plain store/load pair.
pub fn verify_plain(case: TestCase, read: u64, expected: u64) -> TestResult {
    let verdict = if read == expected {
        Verdict::Pass
    } else {
        Verdict::Fail(FailureKind::ReadBackMismatch)
    };
    TestResult {
        case,
        outcome: Outcome::Plain { read },
        expected: Expected {
            value: expected,
            prior: None,
        },
        verdict,
    }
}

/// Verify an AMO. PASS iff the AMO returned `expected_prior` and the cell
/// reads back as `expected_post`.
pub fn verify_amo(
    case: TestCase,
    outcome: AmoOutcome,
    expected_prior: u64,
    expected_post: u64,
) -> TestResult {
    let verdict = if outcome.prior != expected_prior {
        Verdict::Fail(FailureKind::PriorMismatch)
    } else if outcome.post != expected_post {
        Verdict::Fail(FailureKind::ResultMismatch)
    } else {
        Verdict::Pass
    };
    TestResult {
        case,
        outcome: Outcome::Amo(outcome),
        expected: Expected {
            value: expected_post,
            prior: Some(expected_prior),
        },
        verdict,
    }
}

/// Verify a (retried) LR/SC sequence. PASS iff a store-conditional committed
/// and the cell reads back as `expected`.
pub fn verify_lr_sc(case: TestCase, outcome: LrScOutcome, expected: u64) -> TestResult {
    let verdict = if !outcome.succeeded {
        Verdict::Fail(FailureKind::ReservationExhausted)
    } else if outcome.final_value != Some(expected) {
        Verdict::Fail(FailureKind::CommitMismatch)
    } else {
        Verdict::Pass
    };
    TestResult {
        case,
        outcome: Outcome::LrSc(outcome),
        expected: Expected {
            value: expected,
            prior: None,
        },
        verdict,
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] Addr {:#010x}: ",
            self.case.kind.tag(self.case.width),
            self.case.addr
        )?;

        match self.verdict {
            Verdict::Pass => f.write_str("PASS")?,
            Verdict::Fail(kind) => write!(f, "FAIL {}", kind.detail())?,
        }

        let expected = self.expected.value;
        match (self.outcome, self.verdict) {
            (Outcome::Plain { read }, Verdict::Pass) => write!(f, " (val={read:#x})"),
            (Outcome::Plain { read }, Verdict::Fail(_)) => {
                write!(f, " (read {read:#x}, expected {expected:#x})")
            }
            (Outcome::Amo(AmoOutcome { prior, post }), Verdict::Pass) => {
                write!(f, " (old={prior:#x}, new={post:#x})")
            }
            (Outcome::Amo(AmoOutcome { prior, post }), Verdict::Fail(_)) => {
                write!(f, " (old={prior:#x}")?;
                if let Some(expected_prior) = self.expected.prior {
                    write!(f, ", expected old={expected_prior:#x}")?;
                }
                write!(f, ", read {post:#x}, expected {expected:#x})")
            }
            (Outcome::LrSc(o), Verdict::Pass) => {
                write!(f, " (val={expected:#x}, attempts={})", o.attempts)
            }
            (Outcome::LrSc(o), Verdict::Fail(FailureKind::ReservationExhausted)) => {
                write!(f, " (attempts={}, sc result={})", o.attempts, o.last_status)
            }
            (Outcome::LrSc(o), Verdict::Fail(_)) => {
                f.write_str(" (read ")?;
                match o.final_value {
                    Some(x) => write!(f, "{x:#x}")?,
                    None => f.write_str("nothing")?,
                }
                write!(f, ", expected {expected:#x}, attempts={})", o.attempts)
            }
        }
    }
}
