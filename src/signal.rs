// Termination-signal flag
// SIGINT/SIGTERM only mark a flag; the polling loops observe it and
// unwind with an Interrupted error so the teardown guard still runs

use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn mark_interrupted(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install the handlers. Call once at process start.
#[cfg(unix)]
pub fn install() {
    unsafe {
        libc::signal(libc::SIGINT, mark_interrupted as libc::sighandler_t);
        libc::signal(libc::SIGTERM, mark_interrupted as libc::sighandler_t);
    }
}

#[cfg(not(unix))]
pub fn install() {}

pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

#[cfg(test)]
pub fn trigger() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

#[cfg(test)]
pub fn reset() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}
