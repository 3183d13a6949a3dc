//! Clock initialization for HiFive1, Red-V
use e310x_hal::{clock::Clocks, prelude::*, time::Hertz};
use riscv::interrupt;

static mut CLOCKS: Option<Clocks> = None;

#[inline]
pub fn clocks() -> Clocks {
    interrupt::free(
        #[inline]
        |_| unsafe {
            if CLOCKS.is_none() {
                init();
            }
            CLOCKS.unwrap_or_else(|| core::hint::unreachable_unchecked())
        },
    )
}

#[cold]
fn init() {
    let resources = unsafe { e310x_hal::DeviceResources::steal() };

    let coreclk = resources
        .peripherals
        .PRCI
        .constrain()
        .use_external(Hertz(16_000_000))
        .coreclk(Hertz(150_000_000));

    let aonclk = resources
        .peripherals
        .AONCLK
        .constrain()
        .use_external(Hertz(32_768));

    let clocks = Clocks::freeze(coreclk, aonclk);
    log::trace!("coreclk = {} Hz", clocks.coreclk().0);
    unsafe { CLOCKS = Some(clocks) };
}
