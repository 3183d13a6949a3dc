//! End-to-end runs of the harness against the simulated memory.
use amo_check::{
    sim::{ScFailure, SimMemory},
    AmoOp, AtomicExecutor, Config, ConfigError, FailureKind, Harness, MemoryRange,
    OperationKind, Oracle, Ordering, Outcome, RetryPolicy, ScStatus, Suites, TestReport,
    Verdict, Width,
};
use itertools::Itertools;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Primes every cell with the same value.
struct FixedSeed(u64);

impl Oracle for FixedSeed {
    fn seed(&self, _addr: usize, width: Width) -> u64 {
        width.truncate(self.0)
    }

    fn new_value(&self, seed: u64, width: Width) -> u64 {
        width.truncate(seed + 1)
    }
}

const AMO_ONLY: Suites = Suites {
    plain: false,
    amo: true,
    lr_sc: false,
};

const LR_SC_ONLY: Suites = Suites {
    plain: false,
    amo: false,
    lr_sc: true,
};

#[test]
fn amoadd_then_amoxor_on_one_cell() {
    init_logger();
    let range = MemoryRange::new(0x1000, 0x1000, 0x1000).unwrap();
    let plan = [(AmoOp::Add, 0x5), (AmoOp::Xor, 0xa)];
    let config = Config::new(range)
        .with_suites(AMO_ONLY)
        .with_amo_plan(&plan);
    let mut harness = Harness::with_oracle(SimMemory::new(), FixedSeed(0x10), config).unwrap();

    let mut out = String::new();
    let mut report = TestReport::<8>::new();
    harness.run(&mut out, &mut report);

    let [add, xor] = report.results() else {
        panic!("unexpected results: {:?}", report.results());
    };
    assert_eq!(add.verdict, Verdict::Pass);
    assert_eq!(add.expected.value, 0x15);
    assert_eq!(xor.verdict, Verdict::Pass);
    assert_eq!(xor.expected.prior, Some(0x15));
    assert_eq!(xor.expected.value, 0x1f);

    assert_eq!(
        out,
        "=== AMO TEST ===\n\
         [AMOADD.W] Addr 0x00001000: PASS (old=0x10, new=0x15)\n\
         [AMOXOR.W] Addr 0x00001000: PASS (old=0x15, new=0x1f)\n\
         AMOADD.W: 1 passed, 0 failed\n\
         AMOXOR.W: 1 passed, 0 failed\n\
         === AMO TEST DONE ===\n"
    );
}

#[test]
fn lost_reservation_is_never_committed() {
    init_logger();
    let mut mem = SimMemory::new();
    mem.fail_next_sc(1, ScFailure::InterveningStore);

    let range = MemoryRange::new(0x30000, 0x30000, 0x1000).unwrap();
    let config = Config::new(range)
        .with_suites(LR_SC_ONLY)
        .with_orderings(&[Ordering::Plain]);
    let mut harness = Harness::new(mem, config).unwrap();

    let mut out = String::new();
    let mut report = TestReport::<1>::new();
    harness.run(&mut out, &mut report);

    let result = &report.results()[0];
    assert_eq!(
        result.verdict,
        Verdict::Fail(FailureKind::ReservationExhausted)
    );
    assert!(out.contains(
        "[LR/SC.W] Addr 0x00030000: FAIL store-conditional never committed \
         (attempts=1, sc result=1)\n"
    ));

    // The cell still holds the seed
    assert_eq!(harness.executor().peek(0x30000, Width::Word), 0);
}

#[test]
fn sixteen_addresses_per_category() {
    init_logger();
    let range = MemoryRange::new(0x30000, 0x3f000, 0x1000).unwrap();
    assert_eq!(range.iter().count(), 16);

    let mut harness = Harness::new(SimMemory::new(), Config::new(range)).unwrap();
    let mut out = String::new();
    let mut report = TestReport::<256>::new();
    harness.run(&mut out, &mut report);

    assert!(report.is_success());
    assert_eq!(report.dropped(), 0);

    let counts = report.results().iter().map(|r| r.case.kind).counts();
    assert_eq!(counts.len(), OperationKind::COUNT);
    assert!(counts.values().all(|&n| n == 16));
    for kind in report.summary().kinds() {
        assert_eq!(report.summary().passed(kind), 16);
    }

    // Each suite walks the range in order
    let amo_addrs: Vec<_> = report
        .results()
        .iter()
        .filter(|r| matches!(r.case.kind, OperationKind::Amo(_)))
        .map(|r| r.case.addr)
        .dedup()
        .collect();
    assert_eq!(amo_addrs, range.iter().collect::<Vec<_>>());

    assert_eq!(out.lines().filter(|l| l.ends_with("TEST DONE ===")).count(), 3);
}

#[test]
fn coherence_defect_is_distinguished_from_exhaustion() {
    init_logger();
    let mut mem = SimMemory::new();
    mem.corrupt_sc_stores(true);

    let range = MemoryRange::new(0x30000, 0x31000, 0x1000).unwrap();
    let config = Config::new(range)
        .with_suites(LR_SC_ONLY)
        .with_retry(RetryPolicy::new(4).unwrap());
    let mut harness = Harness::new(mem, config).unwrap();

    let mut report = TestReport::<16>::new();
    harness.run(&mut String::new(), &mut report);

    assert_eq!(report.summary().total_failed(), 10);
    for result in report.failures() {
        assert_eq!(result.verdict, Verdict::Fail(FailureKind::CommitMismatch));
        let Outcome::LrSc(outcome) = result.outcome else {
            panic!("not an LR/SC outcome: {result:?}");
        };
        assert!(outcome.succeeded);
        assert_eq!(outcome.attempts, 1);
    }
}

#[test]
fn retries_exhaust_under_persistent_interference() {
    init_logger();
    let mut mem = SimMemory::new();
    mem.fail_next_sc(3, ScFailure::InterveningStore);

    let range = MemoryRange::new(0x4000, 0x4000, 0x1000).unwrap();
    let config = Config::new(range)
        .with_suites(LR_SC_ONLY)
        .with_orderings(&[Ordering::Acquire, Ordering::Release])
        .with_retry(RetryPolicy::new(3).unwrap());
    let mut harness = Harness::new(mem, config).unwrap();

    let mut out = String::new();
    let mut report = TestReport::<2>::new();
    harness.run(&mut out, &mut report);

    let verdicts = report.results().iter().map(|r| r.verdict).collect_vec();
    assert_eq!(
        verdicts,
        [
            Verdict::Fail(FailureKind::ReservationExhausted),
            Verdict::Pass
        ]
    );
    assert!(out.contains("(attempts=3, sc result=1)"));
    assert!(out.contains("LR/SC.W aq: 0 passed, 1 failed\n"));
    assert!(out.contains("LR/SC.W rl: 1 passed, 0 failed\n"));
    assert_eq!(harness.executor().stats().lr_sc_pairs, 4);
}

/// Wraps a [`SimMemory`], letting another agent overwrite the cell right
/// before the `n`-th AMO.
struct Meddler {
    mem: SimMemory,
    meddle_before_amo: usize,
    amos: usize,
}

impl AtomicExecutor for Meddler {
    fn supports(&self, width: Width) -> bool {
        self.mem.supports(width)
    }

    fn store(&mut self, addr: usize, width: Width, value: u64) {
        self.mem.store(addr, width, value)
    }

    fn load(&mut self, addr: usize, width: Width) -> u64 {
        self.mem.load(addr, width)
    }

    fn amo(&mut self, addr: usize, width: Width, op: AmoOp, operand: u64) -> u64 {
        if self.amos == self.meddle_before_amo {
            self.mem.poke(addr, width, 0x99);
        }
        self.amos += 1;
        self.mem.amo(addr, width, op, operand)
    }

    fn lr_sc(&mut self, addr: usize, width: Width, ordering: Ordering, new_value: u64) -> ScStatus {
        self.mem.lr_sc(addr, width, ordering, new_value)
    }
}

#[test]
fn foreign_store_is_a_prior_mismatch() {
    init_logger();
    let exec = Meddler {
        mem: SimMemory::new(),
        meddle_before_amo: 1,
        amos: 0,
    };
    let range = MemoryRange::new(0x1000, 0x1000, 0x1000).unwrap();
    let config = Config::new(range).with_suites(AMO_ONLY);
    let mut harness = Harness::with_oracle(exec, FixedSeed(0x10), config).unwrap();

    let mut out = String::new();
    let mut report = TestReport::<4>::new();
    harness.run(&mut out, &mut report);

    // The failed step re-primes the cell, so the rest of the plan passes
    let verdicts = report.results().iter().map(|r| r.verdict).collect_vec();
    assert_eq!(
        verdicts,
        [
            Verdict::Pass,
            Verdict::Fail(FailureKind::PriorMismatch),
            Verdict::Pass,
            Verdict::Pass
        ]
    );
    assert!(out.contains(
        "[AMOXOR.W] Addr 0x00001000: FAIL prior value mismatch \
         (old=0x99, expected old=0x15, read 0x93, expected 0x1f)\n"
    ));
    assert_eq!(harness.into_executor().mem.peek(0x1000, Width::Word), 0x8f);
}

#[test]
fn configuration_errors() {
    assert_eq!(
        MemoryRange::new(0x1000, 0x2000, 0),
        Err(ConfigError::ZeroStep)
    );
    assert_eq!(
        MemoryRange::new(0x2000, 0x1000, 0x1000),
        Err(ConfigError::InvertedRange {
            base: 0x2000,
            end: 0x1000
        })
    );
    assert_eq!(RetryPolicy::new(0), Err(ConfigError::ZeroAttempts));

    let range = MemoryRange::new(0x1000, 0x2000, 0x1000).unwrap();
    let config = Config::new(range).with_width(Width::Double);
    let err = Harness::new(SimMemory::new().rv32(), config).err();
    assert_eq!(err, Some(ConfigError::UnsupportedWidth(Width::Double)));
    assert_eq!(
        err.unwrap().to_string(),
        "64-bit atomics are not supported"
    );
}
