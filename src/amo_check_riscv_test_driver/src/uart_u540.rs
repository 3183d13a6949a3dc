//! The UART driver compatible with QEMU `sifive_u` machine
//! (RISC-V Board compatible with SiFive U SDK).
use core::fmt::{self, Write};

const UART0_BASE: usize = 0x1001_0000;
const UART1_BASE: usize = 0x1001_1000;

/// `txdata.full`
const TXDATA_FULL: u32 = 1 << 31;

pub fn stdout_write_str(s: &str) {
    crate::with_cpu_lock(|| {
        let _ = Uart(UART0_BASE).write_str(s);
    });
}

pub fn stdout_write_fmt(args: fmt::Arguments<'_>) {
    crate::with_cpu_lock(|| {
        let _ = Uart(UART0_BASE).write_fmt(args);
    });
}

pub fn stderr_write_fmt(args: fmt::Arguments<'_>) {
    crate::with_cpu_lock(|| {
        let _ = Uart(UART1_BASE).write_fmt(args);
    });
}

/// A SiFive UART. The transmitter must have been enabled by the boot code
/// (QEMU enables it from the start).
struct Uart(usize);

impl Uart {
    fn write_u8(&self, x: u8) {
        let txdata = self.0 as *mut u32;
        unsafe {
            while txdata.read_volatile() & TXDATA_FULL != 0 {}
            txdata.write_volatile(x as u32);
        }
    }
}

impl Write for Uart {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &byte in s.as_bytes() {
            if byte == b'\n' {
                self.write_u8(b'\r');
            }
            self.write_u8(byte);
        }
        Ok(())
    }
}
