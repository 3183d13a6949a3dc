//! The harness configuration, fixed at build time.
use amo_check::{Config, ConfigError, MemoryRange, RetryPolicy};

// Generated by `build.rs` from the `AMO_CHECK_*` environment variables
#[allow(dead_code)]
mod generated {
    include!(concat!(env!("OUT_DIR"), "/gen.rs"));
}

pub use self::generated::LOG_LEVEL;
use self::generated::{MAX_SC_ATTEMPTS, STEP, WIDTH};

pub fn load() -> Result<Config<'static>, ConfigError> {
    let (base, end) = bounds();
    let range = MemoryRange::new(base, end, STEP)?;
    let retry = RetryPolicy::new(MAX_SC_ATTEMPTS)?;
    Ok(Config::new(range).with_width(WIDTH).with_retry(retry))
}

#[cfg(not(feature = "range-linker-symbols"))]
fn bounds() -> (usize, usize) {
    (generated::BASE, generated::END)
}

#[cfg(feature = "range-linker-symbols")]
fn bounds() -> (usize, usize) {
    extern "C" {
        static _DDR_start: u8;
        static _DDR_end: u8;
    }
    // Only the addresses of these symbols are used
    unsafe {
        (
            core::ptr::addr_of!(_DDR_start) as usize,
            core::ptr::addr_of!(_DDR_end) as usize,
        )
    }
}
