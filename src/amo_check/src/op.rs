//! The vocabulary of operations exercised by the harness.
use core::fmt;

/// The access width of an atomic instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// 32-bit access (`.w` instructions).
    Word,
    /// 64-bit access (`.d` instructions). Only available on RV64.
    Double,
}

impl Width {
    /// The size of an accessed cell in bytes. This is also the alignment
    /// required by the atomic instructions.
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Word => 4,
            Self::Double => 8,
        }
    }

    /// The mask selecting the bits that fit in a cell of this width.
    #[inline]
    pub const fn mask(self) -> u64 {
        match self {
            Self::Word => u32::MAX as u64,
            Self::Double => u64::MAX,
        }
    }

    /// Truncate `x` to this width.
    #[inline]
    pub const fn truncate(self, x: u64) -> u64 {
        x & self.mask()
    }

    /// The instruction suffix (`w` or `d`).
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Word => "W",
            Self::Double => "D",
        }
    }
}

/// An atomic read-modify-write operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmoOp {
    Add,
    Xor,
    And,
    Or,
}

impl AmoOp {
    pub const ALL: [Self; 4] = [Self::Add, Self::Xor, Self::And, Self::Or];

    /// Compute the value the cell should hold after applying this operation to
    /// a cell containing `old`, truncated to `width`.
    ///
    /// ```
    /// use amo_check::{AmoOp, Width};
    /// assert_eq!(AmoOp::Add.apply(Width::Word, 0x10, 0x5), 0x15);
    /// assert_eq!(AmoOp::Add.apply(Width::Word, 0xffff_ffff, 1), 0);
    /// assert_eq!(AmoOp::Xor.apply(Width::Word, 0x15, 0xa), 0x1f);
    /// ```
    #[inline]
    pub const fn apply(self, width: Width, old: u64, operand: u64) -> u64 {
        width.truncate(match self {
            Self::Add => old.wrapping_add(operand),
            Self::Xor => old ^ operand,
            Self::And => old & operand,
            Self::Or => old | operand,
        })
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "AMOADD",
            Self::Xor => "AMOXOR",
            Self::And => "AMOAND",
            Self::Or => "AMOOR",
        }
    }
}

/// The memory-ordering annotation of an LR/SC pair.
///
/// | variant   | load-reserved | store-conditional |
/// |-----------|---------------|-------------------|
/// | `Plain`   | `lr`          | `sc`              |
/// | `Acquire` | `lr.aq`       | `sc`              |
/// | `Release` | `lr`          | `sc.rl`           |
/// | `AcqRel`  | `lr.aq`       | `sc.rl`           |
/// | `SeqCst`  | `lr.aqrl`     | `sc.aqrl`         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ordering {
    Plain,
    Acquire,
    Release,
    AcqRel,
    SeqCst,
}

impl Ordering {
    pub const ALL: [Self; 5] = [
        Self::Plain,
        Self::Acquire,
        Self::Release,
        Self::AcqRel,
        Self::SeqCst,
    ];

    /// The short label used in report lines. Empty for `Plain`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Plain => "",
            Self::Acquire => "aq",
            Self::Release => "rl",
            Self::AcqRel => "aq/rl",
            Self::SeqCst => "aqrl",
        }
    }
}

/// What a single test case does to its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// A plain store followed by a plain load.
    Plain,
    Amo(AmoOp),
    LrSc(Ordering),
}

impl OperationKind {
    /// The number of distinct operation kinds. Used to size summary tables.
    pub const COUNT: usize = 1 + AmoOp::ALL.len() + Ordering::ALL.len();

    /// A dense index in `0..COUNT`.
    pub const fn index(self) -> usize {
        match self {
            Self::Plain => 0,
            Self::Amo(op) => 1 + op as usize,
            Self::LrSc(ordering) => 1 + AmoOp::ALL.len() + ordering as usize,
        }
    }

    /// The inverse of [`Self::index`].
    pub const fn from_index(i: usize) -> Option<Self> {
        if i == 0 {
            Some(Self::Plain)
        } else if i <= AmoOp::ALL.len() {
            Some(Self::Amo(AmoOp::ALL[i - 1]))
        } else if i < Self::COUNT {
            Some(Self::LrSc(Ordering::ALL[i - 1 - AmoOp::ALL.len()]))
        } else {
            None
        }
    }

    /// Get a value implementing `Display` that renders the report tag of this
    /// kind at the given width, e.g., `AMOXOR.W` or `LR/SC.D aq`.
    pub const fn tag(self, width: Width) -> Tag {
        Tag { kind: self, width }
    }
}

/// The report tag of an operation. Returned by [`OperationKind::tag`].
#[derive(Debug, Clone, Copy)]
pub struct Tag {
    kind: OperationKind,
    width: Width,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OperationKind::Plain => f.write_str("NORMAL"),
            OperationKind::Amo(op) => write!(f, "{}.{}", op.mnemonic(), self.width.suffix()),
            OperationKind::LrSc(Ordering::Plain) => write!(f, "LR/SC.{}", self.width.suffix()),
            OperationKind::LrSc(ordering) => {
                write!(f, "LR/SC.{} {}", self.width.suffix(), ordering.label())
            }
        }
    }
}
