//! `log` backend writing to UART1.
struct Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        crate::uart::stderr_write_fmt(format_args!(
            "[{:5} {}] {}\n",
            record.level(),
            record.target(),
            record.args()
        ));
    }

    fn flush(&self) {}
}

pub fn init() {
    // Don't call `unwrap` to reduce the code size
    let _ = log::set_logger(&Logger);
    log::set_max_level(crate::config::LOG_LEVEL);
}
