//! Safe wrappers for platform-specific unsafe operations.
//!
//! Every `unsafe` block in the codebase lives here. Call sites use the safe
//! public API and never touch `unsafe` directly.

use std::io;

/// Send `signal` to the process with id `pid`.
///
/// Signal 0 only checks that the process exists. Pid 0 and pids outside
/// `pid_t` are rejected, since `kill` would read them as process groups.
///
/// # Safety
/// `kill` has no memory-safety preconditions. The pid is checked to name a
/// single process before the call.
pub fn send_signal(pid: u32, signal: libc::c_int) -> io::Result<()> {
    let target = libc::pid_t::try_from(pid)
        .ok()
        .filter(|&p| p > 0)
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("invalid pid {pid}"))
        })?;
    // SAFETY: kill has no memory-safety preconditions and target is a
    // positive pid, so it names exactly one process.
    let rc = unsafe { libc::kill(target, signal) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Set an environment variable.
///
/// # Safety
/// Caller must ensure no other threads are reading environment variables concurrently.
pub fn set_env(key: &str, value: &str) {
    // SAFETY: Caller must ensure no other threads are reading environment
    // variables concurrently.
    unsafe {
        std::env::set_var(key, value);
    }
}

/// Remove an environment variable.
///
/// # Safety
/// Same contract as [`set_env`].
pub fn remove_env(key: &str) {
    // SAFETY: Same contract as set_env.
    unsafe {
        std::env::remove_var(key);
    }
}
