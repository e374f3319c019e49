//! Startup gate
//!
//! Bring-up can fail before the serial console exists. In that case there is
//! nowhere to print, so the firmware parks at a gate until a debugger attaches
//! and releases it, then returns the failure.

use core::sync::atomic::{AtomicBool, Ordering};

/// Something bring-up can wait on before continuing.
pub trait StartupGate {
    /// Block until released.
    fn wait_for_release(&mut self);
}

impl<T: StartupGate + ?Sized> StartupGate for &mut T {
    fn wait_for_release(&mut self) {
        (**self).wait_for_release();
    }
}

/// Gate that never blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenGate;

impl StartupGate for OpenGate {
    fn wait_for_release(&mut self) {}
}

/// Gate released by a debugger writing `true` to a flag in RAM.
///
/// The flag is normally a `#[no_mangle]` static so it can be set by name
/// from the debugger console.
#[derive(Debug, Clone, Copy)]
pub struct DebuggerGate {
    flag: &'static AtomicBool,
}

impl DebuggerGate {
    /// Gate on `flag`.
    pub const fn new(flag: &'static AtomicBool) -> Self {
        Self { flag }
    }

    /// True once the debugger has released the gate.
    pub fn is_released(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl StartupGate for DebuggerGate {
    fn wait_for_release(&mut self) {
        while !self.is_released() {
            core::hint::spin_loop();
        }
    }
}
