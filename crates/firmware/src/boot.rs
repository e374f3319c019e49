//! Cortex-A9 reset path, exception vectors and runtime glue.
//!
//! The image is loaded into DDR by the debugger (or the FSBL) after ps7_init
//! has configured clocks, DDR and MIO. Reset therefore only needs to:
//!
//! 1. mask IRQ/FIQ and enter SVC mode
//! 2. point the stack at `_stack_top` (see `link.x`)
//! 3. zero `.bss`
//! 4. install the vector table in VBAR
//! 5. jump to `entry`
//!
//! Caches and the MMU stay off until bring-up enables them through
//! [`firmware::zynq::ZynqCache`].

use core::arch::{asm, global_asm};

global_asm!(
    r#"
    .section .vectors, "ax"
    .align 5
    .global _vectors
_vectors:
    b _reset
    b _undefined
    b _svc
    b _prefetch_abort
    b _data_abort
    nop
    b _irq
    b _fiq

_undefined:      mov r0, #1
                 b _trap
_svc:            mov r0, #2
                 b _trap
_prefetch_abort: mov r0, #3
                 b _trap
_data_abort:     mov r0, #4
                 b _trap
_irq:            mov r0, #6
                 b _trap
_fiq:            mov r0, #7
                 b _trap
_trap:
    mov r1, lr
    ldr sp, =_stack_top
    b exception_trap

    .section .text._reset, "ax"
    .global _reset
_reset:
    cpsid if, #0x13
    ldr sp, =_stack_top

    ldr r0, =__sbss
    ldr r1, =__ebss
    mov r2, #0
1:
    cmp r0, r1
    strlo r2, [r0], #4
    blo 1b

    ldr r0, =_vectors
    mcr p15, 0, r0, c12, c0, 0
    isb

    bl entry
2:
    wfe
    b 2b
"#
);

/// Exception kinds, by vector slot.
#[derive(Clone, Copy, defmt::Format)]
enum Exception {
    Undefined,
    Svc,
    PrefetchAbort,
    DataAbort,
    Irq,
    Fiq,
    Unknown,
}

impl Exception {
    fn from_slot(slot: u32) -> Self {
        match slot {
            1 => Self::Undefined,
            2 => Self::Svc,
            3 => Self::PrefetchAbort,
            4 => Self::DataAbort,
            6 => Self::Irq,
            7 => Self::Fiq,
            _ => Self::Unknown,
        }
    }
}

/// Common landing point for every vector except reset.
///
/// No interrupt is ever enabled, so anything arriving here is a fault.
#[no_mangle]
extern "C" fn exception_trap(slot: u32, lr: u32) -> ! {
    let (dfsr, dfar): (u32, u32);
    // SAFETY: reads of the data fault status/address registers only.
    unsafe {
        asm!("mrc p15, 0, {0}, c5, c0, 0", out(reg) dfsr, options(nomem, nostack, preserves_flags));
        asm!("mrc p15, 0, {0}, c6, c0, 0", out(reg) dfar, options(nomem, nostack, preserves_flags));
    }
    defmt::error!(
        "{} exception: lr={=u32:#010x} dfsr={=u32:#010x} dfar={=u32:#010x}",
        Exception::from_slot(slot),
        lr,
        dfsr,
        dfar
    );
    halt()
}

/// Park the core.
pub fn halt() -> ! {
    loop {
        // SAFETY: wait-for-event has no side effects.
        unsafe { asm!("wfe", options(nomem, nostack, preserves_flags)) };
    }
}

/// Single-core critical section: mask IRQ, restore the previous mask.
struct CpsrCriticalSection;

critical_section::set_impl!(CpsrCriticalSection);

const CPSR_IRQ_MASKED: u32 = 1 << 7;

// SAFETY: one core runs this image; masking IRQ excludes every other context.
unsafe impl critical_section::Impl for CpsrCriticalSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        let cpsr: u32;
        // SAFETY: reading CPSR and masking IRQ is always permitted in SVC mode.
        unsafe { asm!("mrs {0}, cpsr", "cpsid i", out(reg) cpsr, options(nostack, preserves_flags)) };
        cpsr
    }

    unsafe fn release(state: critical_section::RawRestoreState) {
        if state & CPSR_IRQ_MASKED == 0 {
            // SAFETY: IRQs were unmasked when the matching acquire ran.
            unsafe { asm!("cpsie i", options(nostack, preserves_flags)) };
        }
    }
}

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    defmt::error!("panic: {}", defmt::Display2Format(info));
    halt()
}
