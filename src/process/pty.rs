//! Spawning with pseudo-interactive output
//!
//! The export tool suppresses progress text unless its output is a terminal,
//! so each of stdout and stderr gets its own pseudo-terminal pair.

use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::process::{Child, Command, Stdio};

/// A running child whose output streams are pseudo-terminal masters
#[derive(Debug)]
pub struct InteractiveChild {
    /// The spawned process
    pub child: Child,
    /// Read end of the stdout terminal
    pub stdout: File,
    /// Read end of the stderr terminal
    pub stderr: File,
}

struct PtyPair {
    master: OwnedFd,
    slave: OwnedFd,
}

fn open_pty() -> io::Result<PtyPair> {
    let mut master: libc::c_int = -1;
    let mut slave: libc::c_int = -1;

    // SAFETY: both out-pointers are valid for writes; name, termios and
    // winsize are optional and passed as null.
    let rc = unsafe {
        libc::openpty(
            &mut master,
            &mut slave,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        )
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: openpty succeeded, so both descriptors are open and owned by us.
    let pair = unsafe {
        PtyPair {
            master: OwnedFd::from_raw_fd(master),
            slave: OwnedFd::from_raw_fd(slave),
        }
    };

    // Keep these out of unrelated children spawned concurrently; a leaked
    // slave would hold the terminal open and hide end-of-stream.
    set_cloexec(pair.master.as_raw_fd())?;
    set_cloexec(pair.slave.as_raw_fd())?;
    Ok(pair)
}

fn set_cloexec(fd: RawFd) -> io::Result<()> {
    // SAFETY: fd is a valid open descriptor owned by the caller.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above; only the close-on-exec bit is added.
    if unsafe { libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Spawn `command` with stdout and stderr attached to fresh pseudo-terminals.
///
/// The command is consumed so the parent's copies of the slave ends are closed
/// as soon as the child is running; reads on the returned masters then end
/// once the child (and anything it spawned) closes its side.
pub fn spawn_interactive(mut command: Command) -> io::Result<InteractiveChild> {
    let out = open_pty()?;
    let err = open_pty()?;

    command
        .stdout(Stdio::from(out.slave))
        .stderr(Stdio::from(err.slave));

    let child = command.spawn()?;
    drop(command);

    Ok(InteractiveChild {
        child,
        stdout: File::from(out.master),
        stderr: File::from(err.master),
    })
}
