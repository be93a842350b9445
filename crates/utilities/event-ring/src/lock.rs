//! Advisory lock and filesystem helpers.

use std::{
    fs::File,
    io,
    os::unix::{fs::MetadataExt, io::AsRawFd},
    path::Path,
};

/// Magic number reported by `statfs` for hugetlbfs mounts.
const HUGETLBFS_MAGIC: i64 = 0x9584_58f6;

/// Try to take an exclusive `flock` without blocking.
///
/// Returns `Ok(false)` if another open file description holds a conflicting lock.
pub(crate) fn try_lock_exclusive(file: &File) -> io::Result<bool> {
    // SAFETY: fd is a valid descriptor owned by `file` for the duration of the call.
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(libc::EWOULDBLOCK) {
        return Ok(false);
    }
    Err(err)
}

/// Take an exclusive `flock`, blocking until it is granted.
pub(crate) fn lock_exclusive(file: &File) -> io::Result<()> {
    // SAFETY: fd is a valid descriptor owned by `file` for the duration of the call.
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
    if rc == 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
}

/// Identify the process holding an exclusive `flock` on `file` via `/proc/locks`.
///
/// Returns `None` where procfs is unavailable or no writer lock matches the file.
pub fn find_lock_owner(file: &File) -> Option<u32> {
    let inode = file.metadata().ok()?.ino();
    let locks = std::fs::read_to_string("/proc/locks").ok()?;
    parse_proc_locks(&locks, inode)
}

/// Find the pid of the `FLOCK WRITE` holder of `inode` in `/proc/locks` content.
///
/// Lines look like `1: FLOCK  ADVISORY  WRITE 4242 00:1a:1337 0 EOF`; blocked waiters
/// (`->` lines) are skipped.
pub fn parse_proc_locks(locks: &str, inode: u64) -> Option<u32> {
    locks.lines().find_map(|line| {
        let fields: Vec<&str> = line.split_ascii_whitespace().collect();
        if fields.get(1) == Some(&"->") {
            return None;
        }
        match fields.as_slice() {
            [_, "FLOCK", _, "WRITE", pid, device_inode, ..] => {
                let lock_inode: u64 = device_inode.rsplit(':').next()?.parse().ok()?;
                (lock_inode == inode).then(|| pid.parse().ok()).flatten()
            }
            _ => None,
        }
    })
}

/// Returns true if the filesystem hosting `path` is hugetlbfs.
///
/// `path` need not exist yet; its closest existing ancestor is checked.
pub fn supports_hugetlb(path: &Path) -> io::Result<bool> {
    use std::{ffi::CString, os::unix::ffi::OsStrExt};

    let existing = path.ancestors().find(|p| p.exists()).unwrap_or_else(|| Path::new("/"));
    let existing = CString::new(existing.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: statfs is plain old data; all-zero is a valid bit pattern.
    let mut stat: libc::statfs = unsafe { std::mem::zeroed() };
    // SAFETY: existing is a valid C string and stat points to writable statfs storage.
    let rc = unsafe { libc::statfs(existing.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    #[allow(clippy::unnecessary_cast)]
    let f_type = stat.f_type as i64;
    Ok(f_type == HUGETLBFS_MAGIC)
}
