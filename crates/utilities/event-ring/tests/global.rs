//! Process-wide recorder installation.

use strata_event_ring::{
    EventRecorder, RecorderError, RingConfig, RingLayout, create_owned_ring, global_recorder,
    init_global_recorder,
};

#[test]
fn global_recorder_initializes_once() {
    let dir = tempfile::tempdir().unwrap();
    let config: RingConfig = format!("{}:4:12", dir.path().join("exec").display()).parse().unwrap();
    let layout = RingLayout::exec(&config).unwrap();
    assert!(global_recorder().is_none());

    let path = config.resolve().unwrap();
    let recorder = EventRecorder::new(create_owned_ring(&path, &layout).unwrap());
    let installed = init_global_recorder(recorder).unwrap();
    assert_eq!(installed.path(), path);
    assert!(std::ptr::eq(installed, global_recorder().unwrap()));

    let second_path = dir.path().join("exec-2");
    let second = EventRecorder::new(create_owned_ring(&second_path, &layout).unwrap());
    assert!(matches!(init_global_recorder(second), Err(RecorderError::AlreadyInitialized)));
    // The rejected recorder is dropped and cleans up after itself.
    assert!(!second_path.exists());

    installed.unlink().unwrap();
    assert!(!path.exists());
}
