//! Sequencing the test suites over a memory range.
use core::fmt::Write;

use crate::{
    error::ConfigError,
    executor::{execute_amo, AtomicExecutor},
    op::{AmoOp, OperationKind, Ordering, Width},
    oracle::{AddressOracle, Oracle},
    range::MemoryRange,
    report::TestReport,
    retry::RetryPolicy,
    verify::{verify_amo, verify_lr_sc, verify_plain, TestCase, TestResult},
};

/// The default AMO plan, applied in order to the same cell.
pub const DEFAULT_AMO_PLAN: [(AmoOp, u64); 4] = [
    (AmoOp::Add, 0x5),
    (AmoOp::Xor, 0xa),
    (AmoOp::And, 0xf),
    (AmoOp::Or, 0x80),
];

/// Selects the suites executed by [`Harness::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suites {
    /// Plain store followed by a plain load.
    pub plain: bool,
    pub amo: bool,
    pub lr_sc: bool,
}

impl Suites {
    pub const ALL: Self = Self {
        plain: true,
        amo: true,
        lr_sc: true,
    };
}

impl Default for Suites {
    fn default() -> Self {
        Self::ALL
    }
}

/// The configuration of a [`Harness`].
#[derive(Debug, Clone, Copy)]
pub struct Config<'a> {
    pub range: MemoryRange,
    pub width: Width,
    pub retry: RetryPolicy,
    /// `(operation, operand)` pairs applied in order to each cell.
    pub amo_plan: &'a [(AmoOp, u64)],
    /// The ordering variants exercised at each address.
    pub orderings: &'a [Ordering],
    pub suites: Suites,
}

impl Config<'static> {
    /// Construct a `Config` with the default settings:
    /// 32-bit accesses, a single store-conditional attempt,
    /// [`DEFAULT_AMO_PLAN`], every ordering variant, and every suite.
    pub const fn new(range: MemoryRange) -> Self {
        Self {
            range,
            width: Width::Word,
            retry: RetryPolicy::SINGLE_ATTEMPT,
            amo_plan: &DEFAULT_AMO_PLAN,
            orderings: &Ordering::ALL,
            suites: Suites::ALL,
        }
    }
}

impl<'a> Config<'a> {
    pub const fn with_width(self, width: Width) -> Self {
        Self { width, ..self }
    }

    pub const fn with_retry(self, retry: RetryPolicy) -> Self {
        Self { retry, ..self }
    }

    pub const fn with_suites(self, suites: Suites) -> Self {
        Self { suites, ..self }
    }

    pub const fn with_amo_plan<'b>(self, amo_plan: &'b [(AmoOp, u64)]) -> Config<'b>
    where
        'a: 'b,
    {
        Config {
            range: self.range,
            width: self.width,
            retry: self.retry,
            amo_plan,
            orderings: self.orderings,
            suites: self.suites,
        }
    }

    pub const fn with_orderings<'b>(self, orderings: &'b [Ordering]) -> Config<'b>
    where
        'a: 'b,
    {
        Config {
            range: self.range,
            width: self.width,
            retry: self.retry,
            amo_plan: self.amo_plan,
            orderings,
            suites: self.suites,
        }
    }
}

/// Drives an [`AtomicExecutor`] through the configured suites, verifying each
/// operation against an [`Oracle`].
///
/// The platform must be fully initialized (clocks, console, and the memory
/// controller of the range under test) before a `Harness` is run.
pub struct Harness<'a, E, O = AddressOracle> {
    exec: E,
    oracle: O,
    config: Config<'a>,
}

impl<'a, E: AtomicExecutor> Harness<'a, E> {
    /// Construct a `Harness` using [`AddressOracle`].
    pub fn new(exec: E, config: Config<'a>) -> Result<Self, ConfigError> {
        Self::with_oracle(exec, AddressOracle, config)
    }
}

impl<'a, E: AtomicExecutor, O: Oracle> Harness<'a, E, O> {
    /// Construct a `Harness`, validating `config` against the capabilities of
    /// `exec`.
    pub fn with_oracle(exec: E, oracle: O, config: Config<'a>) -> Result<Self, ConfigError> {
        if !exec.supports(config.width) {
            return Err(ConfigError::UnsupportedWidth(config.width));
        }
        config.range.check_alignment(config.width)?;
        Ok(Self {
            exec,
            oracle,
            config,
        })
    }

    pub fn config(&self) -> &Config<'a> {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.exec
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.exec
    }

    pub fn into_executor(self) -> E {
        self.exec
    }

    /// Run every enabled suite, writing one line per test case and the
    /// suite summaries to `sink` and recording every result in `report`.
    ///
    /// Test failures don't stop the run. Errors returned by `sink` are
    /// ignored; the report is complete regardless.
    pub fn run<const N: usize>(&mut self, sink: &mut impl Write, report: &mut TestReport<N>) {
        let range = self.config.range;
        log::info!(
            "testing {:#x}..={:#x} (step {:#x}, {} addresses, {:?})",
            range.base(),
            range.end(),
            range.step(),
            range.len(),
            self.config.width
        );

        if self.config.suites.plain {
            self.run_plain(sink, report);
        }
        if self.config.suites.amo {
            self.run_amo(sink, report);
        }
        if self.config.suites.lr_sc {
            self.run_lr_sc(sink, report);
        }

        let summary = report.summary();
        log::info!(
            "{} passed, {} failed",
            summary.total_passed(),
            summary.total_failed()
        );
    }

    /// Store each address's seed and load it back.
    pub fn run_plain<const N: usize>(&mut self, sink: &mut impl Write, report: &mut TestReport<N>) {
        let range = self.config.range;
        let width = self.config.width;
        let _ = writeln!(sink, "=== DDR ACCESS TEST ===");
        let _ = writeln!(sink, "Range: {:#x} - {:#x}", range.base(), range.end());

        for addr in range.iter() {
            let seed = self.oracle.seed(addr, width);
            self.exec.store(addr, width, seed);
            let read = self.exec.load(addr, width);

            let case = TestCase {
                addr,
                width,
                kind: OperationKind::Plain,
                operand: seed,
            };
            emit(sink, report, verify_plain(case, read, seed));
        }

        self.write_summary(sink, report, [OperationKind::Plain]);
        let _ = writeln!(sink, "=== DDR ACCESS TEST DONE ===");
    }

    /// Apply the AMO plan to each address.
    ///
    /// The cell is primed with the seed once, and the operations are chained.
    /// The expected value of each step is derived from the oracle's model of
    /// the cell, never from what the hardware returned. If a step fails, the
    /// cell is re-primed with the model value so that the following steps
    /// are still judged independently.
    pub fn run_amo<const N: usize>(&mut self, sink: &mut impl Write, report: &mut TestReport<N>) {
        let width = self.config.width;
        let _ = writeln!(sink, "=== AMO TEST ===");

        for addr in self.config.range.iter() {
            let mut model = self.oracle.seed(addr, width);
            self.exec.store(addr, width, model);

            for &(op, operand) in self.config.amo_plan {
                let operand = width.truncate(operand);
                let expected = self.oracle.expected_amo(op, width, model, operand);
                let outcome = execute_amo(&mut self.exec, addr, width, op, operand);

                let case = TestCase {
                    addr,
                    width,
                    kind: OperationKind::Amo(op),
                    operand,
                };
                let result = verify_amo(case, outcome, model, expected);
                let passed = result.verdict.is_pass();
                emit(sink, report, result);

                if !passed {
                    log::warn!("{addr:#x}: re-priming with {expected:#x} after a failed {op:?}");
                    self.exec.store(addr, width, expected);
                }
                model = expected;
            }
        }

        let kinds = self.config.amo_plan.iter().map(|&(op, _)| OperationKind::Amo(op));
        self.write_summary(sink, report, kinds);
        let _ = writeln!(sink, "=== AMO TEST DONE ===");
    }

    /// Run an LR/SC sequence per ordering variant at each address.
    pub fn run_lr_sc<const N: usize>(&mut self, sink: &mut impl Write, report: &mut TestReport<N>) {
        let width = self.config.width;
        let retry = self.config.retry;
        let _ = writeln!(sink, "=== LR/SC ACCESS TEST ===");

        for addr in self.config.range.iter() {
            let seed = self.oracle.seed(addr, width);
            let new_value = self.oracle.new_value(seed, width);

            for &ordering in self.config.orderings {
                self.exec.store(addr, width, seed);
                let outcome = retry.run(&mut self.exec, addr, width, ordering, |_| new_value);

                let case = TestCase {
                    addr,
                    width,
                    kind: OperationKind::LrSc(ordering),
                    operand: new_value,
                };
                emit(sink, report, verify_lr_sc(case, outcome, new_value));
            }
        }

        let kinds = self.config.orderings.iter().map(|&o| OperationKind::LrSc(o));
        self.write_summary(sink, report, kinds);
        let _ = writeln!(sink, "=== LR/SC ACCESS TEST DONE ===");
    }

    /// Write one count line per distinct kind in `kinds`.
    fn write_summary<const N: usize>(
        &self,
        sink: &mut impl Write,
        report: &TestReport<N>,
        kinds: impl IntoIterator<Item = OperationKind>,
    ) {
        let mut written = [false; OperationKind::COUNT];
        let summary = report.summary();
        for kind in kinds {
            if core::mem::replace(&mut written[kind.index()], true) {
                continue;
            }
            let _ = writeln!(
                sink,
                "{}: {} passed, {} failed",
                kind.tag(self.config.width),
                summary.passed(kind),
                summary.failed(kind)
            );
        }
    }
}

fn emit<const N: usize>(sink: &mut impl Write, report: &mut TestReport<N>, result: TestResult) {
    let _ = writeln!(sink, "{result}");
    if !result.verdict.is_pass() {
        log::debug!("{:?}", result);
    }
    report.record(result);
}

#[cfg(all(test, feature = "sim"))]
mod tests {
    use super::*;
    use crate::{
        sim::{ScFailure, SimMemory},
        verify::{FailureKind, Verdict},
    };

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn range(base: usize, end: usize, step: usize) -> MemoryRange {
        MemoryRange::new(base, end, step).unwrap()
    }

    #[test]
    fn default_window_passes() {
        init_logger();
        let config = Config::new(range(0x30000, 0x3ffff, 0x1000));
        let mut harness = Harness::new(SimMemory::new(), config).unwrap();
        let mut out = String::new();
        let mut report = TestReport::<0>::new();
        harness.run(&mut out, &mut report);

        let summary = report.summary();
        assert!(report.is_success());
        assert_eq!(summary.passed(OperationKind::Plain), 16);
        for op in AmoOp::ALL {
            assert_eq!(summary.passed(OperationKind::Amo(op)), 16);
        }
        for ordering in Ordering::ALL {
            assert_eq!(summary.passed(OperationKind::LrSc(ordering)), 16);
        }
        assert_eq!(summary.total(), 16 * 10);

        assert!(out.starts_with("=== DDR ACCESS TEST ===\nRange: 0x30000 - 0x3ffff\n"));
        assert!(out.contains("[AMOADD.W] Addr 0x00030000: PASS (old=0x0, new=0x5)\n"));
        assert!(out.contains("[LR/SC.W aq/rl] Addr 0x00031000: PASS (val=0x14d2, attempts=1)\n"));
        assert!(out.contains("NORMAL: 16 passed, 0 failed\n=== DDR ACCESS TEST DONE ===\n"));
        assert!(out.contains("AMOOR.W: 16 passed, 0 failed\n=== AMO TEST DONE ===\n"));
        assert!(out.ends_with("LR/SC.W aqrl: 16 passed, 0 failed\n=== LR/SC ACCESS TEST DONE ===\n"));
    }

    #[test]
    fn amo_plan_is_chained() {
        init_logger();
        let config = Config::new(range(0x1010, 0x1010, 0x10)).with_suites(Suites {
            plain: false,
            amo: true,
            lr_sc: false,
        });
        let mut harness = Harness::new(SimMemory::new(), config).unwrap();
        let mut report = TestReport::<4>::new();
        harness.run(&mut String::new(), &mut report);

        let priors: Vec<_> = report
            .results()
            .iter()
            .map(|r| match r.outcome {
                crate::verify::Outcome::Amo(o) => (o.prior, o.post),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(
            priors,
            [(0x1010, 0x1015), (0x1015, 0x101f), (0x101f, 0xf), (0xf, 0x8f)]
        );
        assert_eq!(harness.executor().peek(0x1010, Width::Word), 0x8f);
    }

    #[test]
    fn failed_amo_reprimes_the_cell() {
        init_logger();
        let mut mem = SimMemory::new();
        mem.corrupt_amo_results(true);
        let config = Config::new(range(0x2000, 0x2000, 0x1000)).with_suites(Suites {
            plain: false,
            amo: true,
            lr_sc: false,
        });
        let mut harness = Harness::new(mem, config).unwrap();
        let mut report = TestReport::<4>::new();
        harness.run(&mut String::new(), &mut report);

        // Every step observes the model's prior value, so each failure is
        // reported on its own merits
        for result in report.results() {
            assert_eq!(result.verdict, Verdict::Fail(FailureKind::ResultMismatch));
        }
        assert_eq!(report.results().len(), 4);
        assert_eq!(harness.executor().peek(0x2000, Width::Word), 0x8f);
    }

    #[test]
    fn lr_sc_cases_are_primed_independently() {
        init_logger();
        let mut mem = SimMemory::new();
        mem.fail_next_sc(1, ScFailure::InterveningStore);
        let config = Config::new(range(0x4000, 0x4000, 0x1000)).with_suites(Suites {
            plain: false,
            amo: false,
            lr_sc: true,
        });
        let mut harness = Harness::new(mem, config).unwrap();
        let mut out = String::new();
        let mut report = TestReport::<8>::new();
        harness.run(&mut out, &mut report);

        let verdicts: Vec<_> = report.results().iter().map(|r| r.verdict).collect();
        assert_eq!(
            verdicts,
            [
                Verdict::Fail(FailureKind::ReservationExhausted),
                Verdict::Pass,
                Verdict::Pass,
                Verdict::Pass,
                Verdict::Pass,
            ]
        );
        assert!(out.contains("LR/SC.W: 0 passed, 1 failed\n"));
        assert!(out.contains("LR/SC.W rl: 1 passed, 0 failed\n"));
        // 5 primes
        assert_eq!(harness.executor().stats().stores, 5);
    }

    #[test]
    fn retry_budget_absorbs_spurious_failures() {
        init_logger();
        let mut mem = SimMemory::new();
        mem.fail_next_sc(2, ScFailure::Spurious);
        let config = Config::new(range(0x4000, 0x4000, 0x1000))
            .with_retry(RetryPolicy::new(3).unwrap())
            .with_orderings(&[Ordering::SeqCst]);
        let mut harness = Harness::new(mem, config).unwrap();
        let mut report = TestReport::<8>::new();
        harness.run(&mut String::new(), &mut report);

        assert!(report.is_success());
        let last = report.results().last().unwrap();
        match last.outcome {
            crate::verify::Outcome::LrSc(o) => assert_eq!(o.attempts, 3),
            _ => unreachable!(),
        }
    }

    #[test]
    fn rejects_bad_configs() {
        let rv32 = SimMemory::new().rv32();
        let config = Config::new(range(0x1000, 0x2000, 0x1000)).with_width(Width::Double);
        assert_eq!(
            Harness::new(rv32, config).err(),
            Some(ConfigError::UnsupportedWidth(Width::Double))
        );

        let config = Config::new(range(0x1002, 0x2000, 0x1000));
        assert_eq!(
            Harness::new(SimMemory::new(), config).err(),
            Some(ConfigError::MisalignedBase {
                base: 0x1002,
                width: Width::Word
            })
        );

        let config = Config::new(range(0x1000, 0x2000, 0x4)).with_width(Width::Double);
        assert_eq!(
            Harness::new(SimMemory::new(), config).err(),
            Some(ConfigError::MisalignedStep {
                step: 0x4,
                width: Width::Double
            })
        );
    }

    #[test]
    fn double_width() {
        init_logger();
        let config = Config::new(range(0x8000, 0x8010, 0x8)).with_width(Width::Double);
        let mut harness = Harness::new(SimMemory::new(), config).unwrap();
        let mut out = String::new();
        let mut report = TestReport::<0>::new();
        harness.run(&mut out, &mut report);

        assert!(report.is_success());
        assert_eq!(report.summary().total(), 3 * 10);
        assert!(out.contains("[AMOXOR.D] Addr 0x00008008: PASS (old=0x800d, new=0x8007)\n"));
    }
}
