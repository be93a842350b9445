/// Resident memory reader backed by `/proc/self/statm`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResidentMemory;

impl ResidentMemory {
    /// Create a new reader.
    pub const fn new() -> Self {
        Self
    }

    /// Resident set size of the current process in bytes.
    ///
    /// Returns `None` where procfs is unavailable.
    pub fn bytes(&self) -> Option<u64> {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let pages = parse_statm(&statm)?;
        pages.checked_mul(page_size())
    }

    /// Resident set size in whole mebibytes, or zero when unknown.
    pub fn megabytes(&self) -> u64 {
        self.bytes().map_or(0, |bytes| bytes >> 20)
    }
}

/// Extract the resident page count, the second field of a `statm` line.
pub fn parse_statm(statm: &str) -> Option<u64> {
    statm.split_ascii_whitespace().nth(1)?.parse().ok()
}

#[cfg(unix)]
fn page_size() -> u64 {
    // SAFETY: sysconf has no preconditions and only reads a system constant.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    u64::try_from(size).unwrap_or(4096)
}

#[cfg(not(unix))]
const fn page_size() -> u64 {
    4096
}
