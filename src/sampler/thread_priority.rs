use crate::prelude::*;
use std::thread::current;

/// Reduce the scheduling priority of the current thread.
pub fn set_low_priority() {
    #[cfg(windows)]
    let result = unsafe {
        use winapi::um::processthreadsapi::{GetCurrentThread, SetThreadPriority};
        use winapi::um::winbase::THREAD_PRIORITY_BELOW_NORMAL;
        SetThreadPriority(GetCurrentThread(), THREAD_PRIORITY_BELOW_NORMAL as _)
    };

    #[cfg(unix)]
    let result = unsafe {
        use libc::{setpriority, PRIO_PROCESS};
        setpriority(PRIO_PROCESS as _, 0, 5)
    };

    #[cfg(not(any(windows, unix)))]
    let result = 0;

    debug!(
        "Attempted to reduce priority of thread {:?}: {}",
        current().name(),
        result
    );
}
