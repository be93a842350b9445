//! SIGINT/SIGTERM to stop-flag bridge.

use std::{
    io, mem, ptr,
    sync::atomic::{AtomicUsize, Ordering},
};

static STOP: AtomicUsize = AtomicUsize::new(0);

/// Process-wide stop flag fed by SIGINT and SIGTERM.
///
/// The handler only stores the signal number into an atomic, which is async-signal-safe.
/// Consumers poll [`StopSignal::flag`] and wind down when it becomes non-zero.
#[derive(Debug, Clone, Copy)]
pub struct StopSignal;

impl StopSignal {
    /// Install the handler for SIGINT and SIGTERM.
    pub fn install() -> io::Result<()> {
        for signal in [libc::SIGINT, libc::SIGTERM] {
            // SAFETY: `sa` is fully initialized before use, the handler is an `extern "C"`
            // function that only touches a static atomic, and a null old-action pointer is allowed.
            let rc = unsafe {
                let mut sa: libc::sigaction = mem::zeroed();
                sa.sa_sigaction = on_stop as *const () as libc::sighandler_t;
                sa.sa_flags = libc::SA_RESTART;
                libc::sigemptyset(&mut sa.sa_mask);
                libc::sigaction(signal, &sa, ptr::null_mut())
            };
            if rc != 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    /// The flag the handler writes to. Zero until a stop signal arrives.
    pub fn flag() -> &'static AtomicUsize {
        &STOP
    }

    /// Whether a stop signal has been received.
    pub fn requested() -> bool {
        STOP.load(Ordering::Acquire) != 0
    }

    /// The signal that requested the stop, if any.
    pub fn received() -> Option<i32> {
        match STOP.load(Ordering::Acquire) {
            0 => None,
            signal => i32::try_from(signal).ok(),
        }
    }
}

extern "C" fn on_stop(signal: libc::c_int) {
    STOP.store(signal as usize, Ordering::Release);
}
