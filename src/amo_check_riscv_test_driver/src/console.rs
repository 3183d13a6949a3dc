//! The sink receiving the test report.
use core::fmt;

/// Writes to UART0 or the RTT terminal channel, whichever is enabled.
/// Discards everything if neither is.
pub struct Console;

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        #[cfg(feature = "output-uart")]
        crate::uart::stdout_write_str(s);

        #[cfg(feature = "output-rtt")]
        rtt_target::rprint!("{}", s);

        #[cfg(not(any(feature = "output-uart", feature = "output-rtt")))]
        let _ = s;

        Ok(())
    }
}
