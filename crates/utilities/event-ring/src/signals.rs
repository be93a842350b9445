//! Blocking termination signals across a critical section.

use std::{fmt, io, mem::MaybeUninit};

/// Blocks `SIGINT` and `SIGTERM` on the current thread until dropped.
///
/// Signals that arrive meanwhile stay pending and are delivered once the previous mask is
/// restored.
pub struct SignalShield {
    previous: libc::sigset_t,
}

impl fmt::Debug for SignalShield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalShield").finish_non_exhaustive()
    }
}

impl SignalShield {
    /// Block `SIGINT` and `SIGTERM`, remembering the current mask.
    pub fn new() -> io::Result<Self> {
        let mut block = MaybeUninit::<libc::sigset_t>::uninit();
        let mut previous = MaybeUninit::<libc::sigset_t>::uninit();
        // SAFETY: sigemptyset initializes `block` before sigaddset reads it;
        // pthread_sigmask writes the old mask into `previous` on success.
        let rc = unsafe {
            libc::sigemptyset(block.as_mut_ptr());
            libc::sigaddset(block.as_mut_ptr(), libc::SIGINT);
            libc::sigaddset(block.as_mut_ptr(), libc::SIGTERM);
            libc::pthread_sigmask(libc::SIG_BLOCK, block.as_ptr(), previous.as_mut_ptr())
        };
        if rc != 0 {
            return Err(io::Error::from_raw_os_error(rc));
        }
        // SAFETY: pthread_sigmask succeeded, so `previous` holds the old mask.
        Ok(Self { previous: unsafe { previous.assume_init() } })
    }
}

impl Drop for SignalShield {
    fn drop(&mut self) {
        // SAFETY: `previous` is a mask returned by pthread_sigmask.
        unsafe {
            libc::pthread_sigmask(libc::SIG_SETMASK, &self.previous, std::ptr::null_mut());
        }
    }
}
