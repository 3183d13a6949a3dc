//! `log` backend writing to a dedicated RTT up channel.
use core::{cell::RefCell, fmt::Write};
use riscv::interrupt;

static LOG_CHANNEL: interrupt::Mutex<RefCell<Option<rtt_target::UpChannel>>> =
    interrupt::Mutex::new(RefCell::new(None));

struct Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        interrupt::free(move |cs| {
            let mut log_channel = LOG_CHANNEL.borrow(cs).borrow_mut();
            if let Some(channel) = &mut *log_channel {
                // The channel never blocks; a full buffer drops the line
                let _ = writeln!(
                    channel,
                    "[{:5} {}] {}",
                    record.level(),
                    record.target(),
                    record.args()
                );
            }
        });
    }

    fn flush(&self) {}
}

pub fn init(channel: rtt_target::UpChannel) {
    interrupt::free(move |cs| {
        *LOG_CHANNEL.borrow(cs).borrow_mut() = Some(channel);
    });
    // Don't call `unwrap` to reduce the code size
    let _ = log::set_logger(&Logger);
    log::set_max_level(crate::config::LOG_LEVEL);
}
