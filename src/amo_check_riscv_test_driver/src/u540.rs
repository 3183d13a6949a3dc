//! QEMU `sifive_u`: hart 0 is the E51 monitor core, hart 1 the first U54.

/// Run the harness on the U54 (hart 1) and park every other hart.
#[export_name = "_mp_hook"]
pub fn mp_hook() -> bool {
    match riscv::register::mhartid::read() {
        0 => unsafe {
            // Wake up hart 1 through its CLINT software interrupt
            (0x200_0004 as *mut u32).write_volatile(1);
        },
        1 => return true,
        _ => {}
    }
    crate::exit::idle()
}
