//! End-to-end cleanup runs against a real directory tree and `RocksDB`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::Utc;
use housekeeper_core::{
    BoardId, ClientId, Clock, ManualClock, ReadinessGate, RecordingId, RoomId, UserId,
};
use housekeeper_reaper::{
    spawn_all, CleanupService, CleanupTask, Collaborators, InMemoryStreamRegistry,
    InMemoryWhiteboards, LocalFileSystem, ReaperConfig, StoreRetentionEvaluator, StreamClient,
    TaskSchedule,
};
use housekeeper_store::{
    Recording, RecordingStore, RocksStore, SessionEntry, SessionStore, User, UserStore,
    RECORDING_EXTENSION,
};
use tempfile::TempDir;

struct Deployment {
    root: TempDir,
    store: Arc<RocksStore>,
    whiteboards: Arc<InMemoryWhiteboards>,
    streams: Arc<InMemoryStreamRegistry>,
    readiness: Arc<ReadinessGate>,
    clock: Arc<ManualClock>,
    service: Arc<CleanupService>,
}

impl Deployment {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(root.path().join("db")).unwrap());
        let whiteboards = Arc::new(InMemoryWhiteboards::new());
        let streams = Arc::new(InMemoryStreamRegistry::new());
        let readiness = Arc::new(ReadinessGate::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));

        let config = ReaperConfig {
            storage_root: root.path().join("streams"),
            recordings_dir: root.path().join("recordings"),
            ..ReaperConfig::default()
        };
        fs::create_dir_all(&config.storage_root).unwrap();
        fs::create_dir_all(&config.recordings_dir).unwrap();

        let service = Arc::new(CleanupService::new(
            config,
            Collaborators {
                readiness: Arc::clone(&readiness),
                clock: clock.clone(),
                fs: Arc::new(LocalFileSystem::new()),
                whiteboards: whiteboards.clone(),
                streams: streams.clone(),
                sessions: store.clone(),
                users: store.clone(),
                recordings: store.clone(),
                retention: Arc::new(StoreRetentionEvaluator::new(store.clone(), clock.clone())),
            },
        ));

        Self {
            root,
            store,
            whiteboards,
            streams,
            readiness,
            clock,
            service,
        }
    }

    fn room(&self, name: &str) -> PathBuf {
        let dir = self.root.path().join("streams").join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn media(&self, recording: &Recording) -> PathBuf {
        self.root
            .path()
            .join("recordings")
            .join(recording.file_name(RECORDING_EXTENSION))
    }

    fn run_everything(&self) {
        for task in CleanupTask::ALL {
            task.run(&self.service);
        }
    }
}

fn write_aged(path: &Path, age: Duration) {
    fs::write(path, b"payload").unwrap();
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() - age)
        .unwrap();
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

fn user(id: u64) -> User {
    User {
        user_id: UserId::new(id),
        login: format!("user{id}"),
        email: format!("user{id}@example.org"),
        reset_hash: None,
        reset_date: None,
        created_at: Utc::now() - chrono::Duration::days(365),
    }
}

fn recording(id: u64, age: chrono::Duration) -> Recording {
    Recording {
        recording_id: RecordingId::new(id),
        name: format!("Weekly sync {id}"),
        room_id: Some(RoomId::new(42)),
        file_hash: format!("9f86d081884c7d65{id:04}"),
        inserted_at: Utc::now() - age,
        retention_days: Some(30),
        notified: true,
    }
}

#[test]
fn full_pass_reclaims_only_what_is_stale() {
    let d = Deployment::new();
    d.readiness.mark_ready();
    let now = d.clock.now();

    // Room 42: idle, one stale test-setup file, one stale upload
    let idle = d.room("42");
    write_aged(&idle.join("TEST_SETUP_1.webm"), minutes(61));
    write_aged(&idle.join("upload.pdf"), minutes(90));

    // Room 7: stale files but someone is drawing
    let drawing = d.room("7");
    write_aged(&drawing.join("upload.pdf"), minutes(90));
    write_aged(&drawing.join("TEST_SETUP_2.webm"), minutes(59));
    d.whiteboards
        .put_item(RoomId::new(7), BoardId::new(1), "line-1", "{\"type\":\"line\"}".into());

    // Room 8: stale files but someone is streaming
    let streaming = d.room("8");
    write_aged(&streaming.join("upload.pdf"), minutes(90));
    d.streams.connect(StreamClient {
        client_id: ClientId::generate(),
        room_id: RoomId::new(8),
        user_id: UserId::new(3),
    });

    // Not a room
    let foreign = d.room("backup");
    write_aged(&foreign.join("dump.sql"), minutes(6000));

    // Sessions
    let idle_session = SessionEntry::new(now - chrono::Duration::minutes(31));
    let live_session = SessionEntry::new(now - chrono::Duration::minutes(29));
    d.store.put_session(&idle_session).unwrap();
    d.store.put_session(&live_session).unwrap();

    // Reset hashes
    let mut stale_reset = user(1);
    stale_reset.issue_reset_hash(now - chrono::Duration::hours(25));
    let mut fresh_reset = user(2);
    fresh_reset.issue_reset_hash(now - chrono::Duration::hours(23));
    d.store.put_user(&stale_reset).unwrap();
    d.store.put_user(&fresh_reset).unwrap();

    // Recordings
    let expired = recording(1, chrono::Duration::days(45));
    let current = recording(2, chrono::Duration::days(5));
    d.store.put_recording(&expired).unwrap();
    d.store.put_recording(&current).unwrap();
    write_aged(&d.media(&expired), minutes(0));
    write_aged(&d.media(&current), minutes(0));

    d.run_everything();

    assert!(!idle.exists());
    assert!(drawing.join("upload.pdf").exists());
    assert!(drawing.join("TEST_SETUP_2.webm").exists());
    assert!(streaming.exists());
    assert!(foreign.join("dump.sql").exists());

    assert!(d.store.get_session(&idle_session.session_id).unwrap().is_none());
    assert!(d.store.get_session(&live_session.session_id).unwrap().is_some());

    assert!(d.store.get_user(&UserId::new(1)).unwrap().unwrap().reset_hash.is_none());
    assert!(d.store.get_user(&UserId::new(2)).unwrap().unwrap().reset_hash.is_some());

    assert!(!d.media(&expired).exists());
    assert!(d.store.get_recording(&expired.recording_id).unwrap().is_none());
    assert!(d.media(&current).exists());
    assert!(d.store.get_recording(&current.recording_id).unwrap().is_some());
}

#[test]
fn closed_gate_leaves_everything_alone() {
    let d = Deployment::new();
    let now = d.clock.now();

    let room = d.room("42");
    write_aged(&room.join("TEST_SETUP_1.webm"), minutes(600));
    let session = SessionEntry::new(now - chrono::Duration::days(1));
    d.store.put_session(&session).unwrap();
    let mut reset = user(1);
    reset.issue_reset_hash(now - chrono::Duration::days(3));
    d.store.put_user(&reset).unwrap();
    let expired = recording(1, chrono::Duration::days(90));
    d.store.put_recording(&expired).unwrap();
    write_aged(&d.media(&expired), minutes(0));

    d.run_everything();

    assert!(room.join("TEST_SETUP_1.webm").exists());
    assert!(d.store.get_session(&session.session_id).unwrap().is_some());
    assert!(d.store.get_user(&UserId::new(1)).unwrap().unwrap().reset_hash.is_some());
    assert!(d.media(&expired).exists());
    assert!(d.store.get_recording(&expired.recording_id).unwrap().is_some());

    d.readiness.mark_ready();
    d.run_everything();

    assert!(!room.join("TEST_SETUP_1.webm").exists());
    assert!(d.store.get_session(&session.session_id).unwrap().is_none());
    assert!(d.store.get_user(&UserId::new(1)).unwrap().unwrap().reset_hash.is_none());
    assert!(!d.media(&expired).exists());
}

#[test]
fn repeated_passes_are_stable() {
    let d = Deployment::new();
    d.readiness.mark_ready();

    let room = d.room("42");
    write_aged(&room.join("upload.pdf"), minutes(10));

    d.run_everything();
    d.run_everything();
    assert!(room.join("upload.pdf").exists());

    // Once the room has been idle long enough it goes, and stays gone
    d.clock.advance(chrono::Duration::minutes(61));
    d.run_everything();
    assert!(!room.exists());
    d.run_everything();
    assert!(!room.exists());
}

#[tokio::test]
async fn scheduled_loops_run_each_task_on_start() {
    let d = Deployment::new();
    d.readiness.mark_ready();

    let session = SessionEntry::new(d.clock.now() - chrono::Duration::hours(2));
    d.store.put_session(&session).unwrap();
    let room = d.room("42");
    write_aged(&room.join("TEST_SETUP_1.webm"), minutes(120));

    let handles = spawn_all(Arc::clone(&d.service), &TaskSchedule::default()).unwrap();

    let mut done = false;
    for _ in 0..300 {
        let session_gone = d.store.get_session(&session.session_id).unwrap().is_none();
        if session_gone && !room.join("TEST_SETUP_1.webm").exists() {
            done = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    for handle in handles {
        handle.abort();
    }

    assert!(done, "scheduled tasks did not run");
}
