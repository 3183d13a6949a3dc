//! Accumulating test results over a run.
use arrayvec::ArrayVec;

use crate::{
    op::OperationKind,
    verify::{TestResult, Verdict},
};

/// Per-operation-kind pass/fail counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    passed: [u32; OperationKind::COUNT],
    failed: [u32; OperationKind::COUNT],
}

impl Summary {
    pub const fn new() -> Self {
        Self {
            passed: [0; OperationKind::COUNT],
            failed: [0; OperationKind::COUNT],
        }
    }

    pub fn record(&mut self, result: &TestResult) {
        let i = result.case.kind.index();
        match result.verdict {
            Verdict::Pass => self.passed[i] += 1,
            Verdict::Fail(_) => self.failed[i] += 1,
        }
    }

    pub fn passed(&self, kind: OperationKind) -> u32 {
        self.passed[kind.index()]
    }

    pub fn failed(&self, kind: OperationKind) -> u32 {
        self.failed[kind.index()]
    }

    /// The number of results recorded for `kind`.
    pub fn count(&self, kind: OperationKind) -> u32 {
        self.passed(kind) + self.failed(kind)
    }

    pub fn total_passed(&self) -> u32 {
        self.passed.iter().sum()
    }

    pub fn total_failed(&self) -> u32 {
        self.failed.iter().sum()
    }

    pub fn total(&self) -> u32 {
        self.total_passed() + self.total_failed()
    }

    /// Iterate over the operation kinds with at least one recorded result,
    /// in [`OperationKind::index`] order.
    pub fn kinds(&self) -> impl Iterator<Item = OperationKind> + '_ {
        (0..OperationKind::COUNT)
            .filter_map(OperationKind::from_index)
            .filter(move |&kind| self.count(kind) > 0)
    }
}

/// The ordered record of a run.
///
/// Up to `N` results are retained in the order they were recorded; results
/// beyond that only contribute to the [`Summary`]. Use `N = 0` to keep only
/// the counts.
#[derive(Debug, Clone)]
pub struct TestReport<const N: usize> {
    results: ArrayVec<TestResult, N>,
    dropped: usize,
    summary: Summary,
}

impl<const N: usize> Default for TestReport<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TestReport<N> {
    pub const fn new() -> Self {
        Self {
            results: ArrayVec::new_const(),
            dropped: 0,
            summary: Summary::new(),
        }
    }

    pub fn record(&mut self, result: TestResult) {
        self.summary.record(&result);
        if self.results.try_push(result).is_err() {
            self.dropped += 1;
        }
    }

    /// The retained results.
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// The number of results that were counted but not retained.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Get a flag indicating whether every recorded test case passed.
    pub fn is_success(&self) -> bool {
        self.summary.total_failed() == 0
    }

    /// Iterate over the retained failures.
    pub fn failures(&self) -> impl Iterator<Item = &TestResult> + '_ {
        self.results.iter().filter(|r| !r.verdict.is_pass())
    }
}
