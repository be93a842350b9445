//! Crash-safe acquisition of an exclusively owned ring file.
//!
//! A live owner always holds an exclusive `flock` on its ring. An unlocked file at the
//! ring path was therefore left behind by a crashed owner and may be reclaimed. The
//! replacement is initialized under a temporary name and published with a rename that
//! refuses to overwrite, so readers polling the path never observe a partial file.

use std::{
    ffi::OsString,
    fs::{File, OpenOptions},
    io,
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
};

use tracing::{debug, error, warn};

use crate::{
    RingError, RingLayout, SignalShield,
    lock::{find_lock_owner, lock_exclusive, try_lock_exclusive},
};

/// Ring files are created `rw-rw-r--`.
const CREATE_MODE: u32 = 0o664;

/// A published ring file, exclusively locked by this process.
///
/// The lock is released when the file is closed.
#[derive(Debug)]
pub struct OwnedRing {
    file: File,
    path: PathBuf,
    layout: RingLayout,
}

impl OwnedRing {
    /// The open, locked ring file.
    pub const fn file(&self) -> &File {
        &self.file
    }

    /// The path the ring was published under.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The ring's layout.
    pub const fn layout(&self) -> &RingLayout {
        &self.layout
    }
}

/// Temporary initialization path for `path`: `<file-name>.<pid>` in the same directory.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(format!(".{}", std::process::id()));
    path.with_file_name(name)
}

/// Establish sole ownership of the ring file at `path`, initialized with `layout`.
///
/// `SIGINT` and `SIGTERM` are held pending for the duration, so a shutdown request cannot
/// leave a stray temporary file or an unreclaimed ring behind.
pub fn create_owned_ring(path: &Path, layout: &RingLayout) -> Result<OwnedRing, RingError> {
    let _shield = SignalShield::new()
        .map_err(|source| RingError::Lock { path: path.to_path_buf(), source })?;
    claim(path)?;

    let temp_path = temp_path_for(path);
    let file = create_exclusive(&temp_path)?;
    let guard = RemoveOnDrop::new(&temp_path);
    lock_exclusive(&file).map_err(|source| {
        error!(path = %temp_path.display(), %source, "flock on temporary ring file failed");
        RingError::Lock { path: temp_path.clone(), source }
    })?;
    layout
        .initialize(&file)
        .map_err(|source| RingError::Initialize { path: temp_path.clone(), source })?;

    rename_noreplace(&temp_path, path).map_err(|source| {
        error!(from = %temp_path.display(), to = %path.display(), %source, "ring rename failed");
        RingError::Rename { from: temp_path.clone(), to: path.to_path_buf(), source }
    })?;
    guard.disarm();
    debug!(path = %path.display(), size = layout.file_size(), "published event ring");
    Ok(OwnedRing { file, path: path.to_path_buf(), layout: *layout })
}

/// Take the ring path from a crashed owner, or fail if a live owner holds it.
fn claim(path: &Path) -> Result<(), RingError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(source) => return Err(RingError::Open { path: path.to_path_buf(), source }),
    };
    match try_lock_exclusive(&file) {
        Ok(true) => {}
        Ok(false) => {
            let owner = find_lock_owner(&file);
            error!(path = %path.display(), ?owner, "event ring file is owned by another process");
            return Err(RingError::Contended { path: path.to_path_buf(), owner });
        }
        Err(source) => {
            error!(path = %path.display(), %source, "flock on event ring file failed");
            return Err(RingError::Lock { path: path.to_path_buf(), source });
        }
    }
    warn!(path = %path.display(), "reclaiming zombie event ring file");
    if let Err(err) = std::fs::remove_file(path) {
        warn!(path = %path.display(), %err, "could not unlink zombie event ring file");
    }
    Ok(())
}

fn create_exclusive(path: &Path) -> Result<File, RingError> {
    OpenOptions::new().read(true).write(true).create_new(true).mode(CREATE_MODE).open(path).map_err(
        |source| {
            error!(path = %path.display(), %source, "could not create temporary ring file");
            RingError::Create { path: path.to_path_buf(), source }
        },
    )
}

/// Unlinks a path on drop unless disarmed.
struct RemoveOnDrop<'a> {
    path: &'a Path,
    armed: bool,
}

impl<'a> RemoveOnDrop<'a> {
    const fn new(path: &'a Path) -> Self {
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RemoveOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(self.path);
        }
    }
}

#[cfg(target_os = "linux")]
fn rename_noreplace(from: &Path, to: &Path) -> io::Result<()> {
    use std::{ffi::CString, os::unix::ffi::OsStrExt};

    let from = CString::new(from.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let to = CString::new(to.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: both paths are valid C strings; AT_FDCWD resolves relative paths against
    // the working directory. RENAME_NOREPLACE fails with EEXIST if `to` exists.
    let rc = unsafe {
        libc::renameat2(
            libc::AT_FDCWD,
            from.as_ptr(),
            libc::AT_FDCWD,
            to.as_ptr(),
            libc::RENAME_NOREPLACE,
        )
    };
    if rc == 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
}

#[cfg(not(target_os = "linux"))]
fn rename_noreplace(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        return Err(io::Error::new(io::ErrorKind::AlreadyExists, "destination already exists"));
    }
    std::fs::rename(from, to)
}
