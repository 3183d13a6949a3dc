#![deny(unsafe_op_in_unsafe_fn)]
#![cfg_attr(feature = "run", no_std)]
#![cfg_attr(feature = "run", no_main)]

#[cfg(feature = "run")]
mod config;
#[cfg(feature = "run")]
mod console;
#[cfg(feature = "run")]
mod exit;

#[cfg(feature = "output-rtt")]
mod logger_rtt;
#[cfg(feature = "output-uart")]
mod logger_uart;

#[cfg(feature = "output-rtt")]
mod panic_rtt;
#[cfg(feature = "output-uart")]
mod panic_uart;

#[cfg(feature = "output-e310x-uart")]
#[path = "uart_e310x.rs"]
mod uart;
#[cfg(feature = "output-u540-uart")]
#[path = "uart_u540.rs"]
mod uart;

#[cfg(any(feature = "board-e310x-red-v", feature = "board-e310x-qemu"))]
mod e310x;
#[cfg(feature = "board-u540-qemu")]
mod u540;

#[cfg(feature = "run")]
#[riscv_rt::entry]
fn main() -> ! {
    use amo_check::{executor::RiscvExecutor, Harness, TestReport};
    use core::fmt::Write;

    init();

    let mut console = console::Console;

    let config = match config::load() {
        Ok(config) => config,
        Err(e) => fatal(&mut console, e),
    };

    // Safety: The range under test is reserved for this purpose by the
    //         board's memory layout or by the person configuring the build
    let exec = unsafe { RiscvExecutor::new() };
    let mut harness = match Harness::new(exec, config) {
        Ok(harness) => harness,
        Err(e) => fatal(&mut console, e),
    };

    // Only the counts are needed; every result has already been printed when
    // the run completes
    let mut report = TestReport::<0>::new();
    harness.run(&mut console, &mut report);

    let summary = report.summary();
    let _ = writeln!(
        console,
        "=== ALL TESTS DONE: {} passed, {} failed ===",
        summary.total_passed(),
        summary.total_failed()
    );

    exit::exit(report.is_success())
}

/// Bring up the clocks and the output channels.
#[cfg(feature = "run")]
fn init() {
    // Initialize the clock
    #[cfg(any(feature = "board-e310x-red-v", feature = "board-e310x-qemu"))]
    e310x::clocks();

    // Initialize RTT (Real-Time Transfer) with two up channels and set
    // the first one as the print channel for the printing macros, and
    // the second one as log output
    #[cfg(feature = "output-rtt")]
    {
        let channels = rtt_target::rtt_init! {
            up: {
                0: {
                    size: 1024
                    mode: BlockIfFull
                    name: "Terminal"
                }
                1: {
                    size: 1024
                    mode: NoBlockSkip
                    name: "Log"
                }
            }
        };

        unsafe {
            rtt_target::set_print_channel_cs(
                channels.up.0,
                &((|arg, f| f(arg)) as rtt_target::CriticalSectionFunc),
            )
        };
        logger_rtt::init(channels.up.1);
    }

    // Redirect the log output to stderr
    #[cfg(feature = "output-uart")]
    logger_uart::init();
}

/// Report a configuration error and terminate with a failure status.
#[cfg(feature = "run")]
fn fatal(console: &mut console::Console, e: amo_check::ConfigError) -> ! {
    use core::fmt::Write;
    log::error!("invalid configuration: {e:?}");
    let _ = writeln!(console, "FATAL: invalid configuration: {e}");
    exit::exit(false)
}

#[cfg(feature = "output-u540-uart")]
fn with_cpu_lock<R>(f: impl FnOnce() -> R) -> R {
    riscv::interrupt::free(|_| f())
}

#[cfg(not(feature = "run"))]
fn main() {
    panic!("This executable should not be invoked directly");
}
