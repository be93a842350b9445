//! Writer side of an owned execution event ring.

use std::{
    io,
    os::unix::fs::FileExt,
    path::Path,
    sync::OnceLock,
    time::{SystemTime, UNIX_EPOCH},
};

use parking_lot::Mutex;
use strata_executor::{ExecEvent, ExecEventSink};
use tracing::{info, warn};

use crate::{
    DESCRIPTOR_SIZE, HEADER_SIZE, OwnedRing, RecorderError, RingConfig, RingError, RingLayout,
    create_owned_ring, supports_hugetlb,
};

static GLOBAL_RECORDER: OnceLock<EventRecorder> = OnceLock::new();

/// Install the process-wide recorder. Fails if one is already installed.
pub fn init_global_recorder(recorder: EventRecorder) -> Result<&'static EventRecorder, RecorderError> {
    GLOBAL_RECORDER.set(recorder).map_err(|_| RecorderError::AlreadyInitialized)?;
    GLOBAL_RECORDER.get().ok_or(RecorderError::AlreadyInitialized)
}

/// The process-wide recorder, if one was installed.
pub fn global_recorder() -> Option<&'static EventRecorder> {
    GLOBAL_RECORDER.get()
}

/// Resolve, allocate and open the execution event ring described by `config`.
pub fn init_exec_recorder(config: &RingConfig) -> Result<EventRecorder, RingError> {
    let path = config.resolve()?;
    match supports_hugetlb(&path) {
        Ok(true) => {}
        Ok(false) => warn!(
            path = %path.display(),
            "file system hosting event ring file does not support huge pages"
        ),
        Err(err) => warn!(path = %path.display(), %err, "could not inspect event ring file system"),
    }
    let layout = RingLayout::exec(config)?;
    let ring = create_owned_ring(&path, &layout)?;
    info!(path = %path.display(), size = layout.file_size(), "execution event ring created");
    Ok(EventRecorder::new(ring))
}

#[derive(Debug, Default)]
struct Cursor {
    last_seqno: u64,
    payload_head: u64,
}

/// Appends events to an [`OwnedRing`].
///
/// Each event takes the next descriptor slot and a contiguous, wrapping span of the payload
/// buffer. Descriptors are little-endian: sequence number (u64), event kind (u16), two
/// reserved bytes, payload length (u32), logical payload offset (u64) and record time in
/// nanoseconds (u64). Slots are zero until first written; sequence numbers start at one.
///
/// The ring file is unlinked when the recorder is dropped.
#[derive(Debug)]
pub struct EventRecorder {
    ring: OwnedRing,
    cursor: Mutex<Cursor>,
}

impl EventRecorder {
    /// Record into `ring`, starting from its first slot.
    pub fn new(ring: OwnedRing) -> Self {
        Self { ring, cursor: Mutex::new(Cursor::default()) }
    }

    /// Path of the ring file.
    pub fn path(&self) -> &Path {
        self.ring.path()
    }

    /// Layout of the ring file.
    pub const fn layout(&self) -> &RingLayout {
        self.ring.layout()
    }

    /// Sequence number of the most recent event, or zero if none was recorded.
    pub fn last_seqno(&self) -> u64 {
        self.cursor.lock().last_seqno
    }

    /// Append an event, returning its sequence number.
    pub fn append(&self, kind: u16, payload: &[u8]) -> io::Result<u64> {
        let layout = self.ring.layout();
        let buf_size = layout.payload_buf_size();
        let encoded_len = checked_payload_len(payload.len(), buf_size)?;
        let len = u64::from(encoded_len);

        let mut cursor = self.cursor.lock();
        let seqno = cursor.last_seqno + 1;
        let offset = cursor.payload_head;
        let file = self.ring.file();

        let start = offset % buf_size;
        let first = (buf_size - start).min(len) as usize;
        file.write_all_at(&payload[..first], layout.payload_offset() + start)?;
        file.write_all_at(&payload[first..], layout.payload_offset())?;

        let mut descriptor = [0u8; DESCRIPTOR_SIZE as usize];
        descriptor[..8].copy_from_slice(&seqno.to_le_bytes());
        descriptor[8..10].copy_from_slice(&kind.to_le_bytes());
        descriptor[12..16].copy_from_slice(&encoded_len.to_le_bytes());
        descriptor[16..24].copy_from_slice(&offset.to_le_bytes());
        descriptor[24..32].copy_from_slice(&now_nanos().to_le_bytes());
        let slot = (seqno - 1) % layout.descriptor_capacity();
        file.write_all_at(&descriptor, HEADER_SIZE + slot * DESCRIPTOR_SIZE)?;

        cursor.last_seqno = seqno;
        cursor.payload_head = offset + len;
        Ok(seqno)
    }

    /// Remove the ring file from its directory. Readers that already opened it keep access.
    pub fn unlink(&self) -> io::Result<()> {
        match std::fs::remove_file(self.path()) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

impl ExecEventSink for EventRecorder {
    fn record(&self, event: &ExecEvent) {
        if let Err(err) = self.append(event.kind(), &event.encode()) {
            warn!(path = %self.path().display(), %err, "failed to record execution event");
        }
    }
}

impl Drop for EventRecorder {
    fn drop(&mut self) {
        if let Err(err) = self.unlink() {
            warn!(path = %self.path().display(), %err, "could not unlink event ring file");
        }
    }
}

/// Payload length as stored in a descriptor.
///
/// Fails if the payload does not fit in the payload buffer or in the descriptor's
/// 32-bit length field.
fn checked_payload_len(len: usize, buf_size: u64) -> io::Result<u32> {
    let invalid = |reason: String| io::Error::new(io::ErrorKind::InvalidInput, reason);
    if len as u64 > buf_size {
        return Err(invalid(format!(
            "event payload of {len} bytes exceeds ring buffer of {buf_size} bytes"
        )));
    }
    u32::try_from(len)
        .map_err(|_| invalid(format!("event payload of {len} bytes overflows descriptor length")))
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
}
