//! [`AtomicExecutor`] issuing the instructions of the RISC-V 'A' extension.
use core::{
    arch::asm,
    ptr,
    sync::atomic::{compiler_fence, Ordering as MemOrdering},
};

use super::{AtomicExecutor, ScStatus};
use crate::op::{AmoOp, Ordering, Width};

/// Issues the AMO and LR/SC instructions of the current hart directly.
///
/// Each operation is a single `asm!` block. None of them specify `nomem` or
/// `readonly`, so each acts as a compiler barrier for memory accesses; the
/// explicit `compiler_fence`s around them additionally pin the surrounding
/// Rust code.
#[derive(Debug)]
pub struct RiscvExecutor {
    _private: (),
}

impl RiscvExecutor {
    /// Construct a `RiscvExecutor`.
    ///
    /// # Safety
    ///
    /// Every address later passed to this executor must refer to naturally
    /// aligned, writable RAM that supports atomic accesses and isn't used by
    /// anything else (including the code and data of this program) while the
    /// executor is in use.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

/// `amo<op>.<w|d> old, operand, (addr)`
macro_rules! amo {
    ($insn:literal, $addr:expr, $operand:expr) => {{
        let old: usize;
        unsafe {
            asm!(
                concat!($insn, " {old}, {operand}, ({addr})"),
                old = lateout(reg) old,
                operand = in(reg) $operand,
                addr = in(reg) $addr,
                options(nostack),
            )
        };
        old
    }};
}

/// `lr.<w|d><lr_sfx> tmp, (addr); sc.<w|d><sc_sfx> status, value, (addr)`
///
/// Both registers are `out` (not `lateout`), so neither can alias the inputs
/// that `sc` still reads after `lr` has written `tmp`.
macro_rules! lr_sc {
    ($w:literal, $lr_sfx:literal, $sc_sfx:literal, $addr:expr, $value:expr) => {{
        let status: usize;
        unsafe {
            asm!(
                concat!("lr.", $w, $lr_sfx, " {tmp}, ({addr})"),
                concat!("sc.", $w, $sc_sfx, " {status}, {value}, ({addr})"),
                tmp = out(reg) _,
                status = out(reg) status,
                addr = in(reg) $addr,
                value = in(reg) $value,
                options(nostack),
            )
        };
        status
    }};
}

/// Dispatch on the ordering variant for one width.
macro_rules! lr_sc_ordered {
    ($w:literal, $ordering:expr, $addr:expr, $value:expr) => {
        match $ordering {
            Ordering::Plain => lr_sc!($w, "", "", $addr, $value),
            Ordering::Acquire => lr_sc!($w, ".aq", "", $addr, $value),
            Ordering::Release => lr_sc!($w, "", ".rl", $addr, $value),
            Ordering::AcqRel => lr_sc!($w, ".aq", ".rl", $addr, $value),
            Ordering::SeqCst => lr_sc!($w, ".aqrl", ".aqrl", $addr, $value),
        }
    };
}

#[inline(always)]
fn fenced<R>(f: impl FnOnce() -> R) -> R {
    compiler_fence(MemOrdering::SeqCst);
    let r = f();
    compiler_fence(MemOrdering::SeqCst);
    r
}

#[cfg(not(target_arch = "riscv64"))]
#[cold]
#[inline(never)]
fn unsupported_width() -> ! {
    panic!("double-word atomics require RV64")
}

impl AtomicExecutor for RiscvExecutor {
    #[inline]
    fn supports(&self, width: Width) -> bool {
        match width {
            Width::Word => true,
            Width::Double => cfg!(target_arch = "riscv64"),
        }
    }

    fn store(&mut self, addr: usize, width: Width, value: u64) {
        // Safety: Upheld by the caller of `Self::new`
        fenced(|| unsafe {
            match width {
                Width::Word => ptr::write_volatile(addr as *mut u32, value as u32),
                Width::Double => ptr::write_volatile(addr as *mut u64, value),
            }
        })
    }

    fn load(&mut self, addr: usize, width: Width) -> u64 {
        // Safety: Upheld by the caller of `Self::new`
        fenced(|| unsafe {
            match width {
                Width::Word => ptr::read_volatile(addr as *const u32) as u64,
                Width::Double => ptr::read_volatile(addr as *const u64),
            }
        })
    }

    fn amo(&mut self, addr: usize, width: Width, op: AmoOp, operand: u64) -> u64 {
        let old = fenced(|| match width {
            // `amo*.w` sign-extends the loaded word on RV64; the truncation
            // below discards the extension
            Width::Word => {
                let operand = operand as u32 as usize;
                match op {
                    AmoOp::Add => amo!("amoadd.w", addr, operand),
                    AmoOp::Xor => amo!("amoxor.w", addr, operand),
                    AmoOp::And => amo!("amoand.w", addr, operand),
                    AmoOp::Or => amo!("amoor.w", addr, operand),
                }
            }
            #[cfg(target_arch = "riscv64")]
            Width::Double => {
                let operand = operand as usize;
                match op {
                    AmoOp::Add => amo!("amoadd.d", addr, operand),
                    AmoOp::Xor => amo!("amoxor.d", addr, operand),
                    AmoOp::And => amo!("amoand.d", addr, operand),
                    AmoOp::Or => amo!("amoor.d", addr, operand),
                }
            }
            #[cfg(not(target_arch = "riscv64"))]
            Width::Double => unsupported_width(),
        });
        width.truncate(old as u64)
    }

    fn lr_sc(
        &mut self,
        addr: usize,
        width: Width,
        ordering: Ordering,
        new_value: u64,
    ) -> ScStatus {
        let status = fenced(|| match width {
            Width::Word => {
                let value = new_value as u32 as usize;
                lr_sc_ordered!("w", ordering, addr, value)
            }
            #[cfg(target_arch = "riscv64")]
            Width::Double => {
                let value = new_value as usize;
                lr_sc_ordered!("d", ordering, addr, value)
            }
            #[cfg(not(target_arch = "riscv64"))]
            Width::Double => unsupported_width(),
        });
        ScStatus(status)
    }
}
