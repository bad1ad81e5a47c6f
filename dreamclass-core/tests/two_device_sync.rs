//! Two devices sharing one class through an in-process remote store.

use std::time::Duration;

use dreamclass_core::{
    ClassEvent, ClassStore, Classroom, EventOutcome, FileStore, MemoryBackend, MemoryStore,
    PushOutcome, Reconciliation, RemoteStore, ShareCode, ShareCodeGenerator,
};
use tempfile::tempdir;

const WINDOW: Duration = Duration::from_millis(1500);

struct FixedCode;

impl ShareCodeGenerator for FixedCode {
    fn generate(&self) -> ShareCode {
        ShareCode::parse("푸른하늘-1234").unwrap()
    }
}

fn device(backend: &MemoryBackend) -> Classroom<MemoryBackend> {
    Classroom::open(
        ClassStore::new(MemoryStore::new()),
        RemoteStore::Connected(backend.clone()),
        WINDOW,
    )
    .unwrap()
}

/// Handles events until one matches `done`.
async fn run_until(
    room: &mut Classroom<MemoryBackend>,
    done: impl Fn(&EventOutcome) -> bool,
) -> EventOutcome {
    loop {
        let event = room.next_event().await;
        let outcome = room.handle(event).await.unwrap();
        if done(&outcome) {
            return outcome;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_sticker_edit_reaches_other_device() {
    let backend = MemoryBackend::new();

    let mut device_a = device(&backend);
    let hana = device_a.add_student("Hana", 1).unwrap();
    let connection = device_a.connect_new(&FixedCode).await.unwrap();

    let mut device_b = device(&backend);
    device_b
        .connect_existing(connection.code.clone())
        .await
        .unwrap();
    assert_eq!(device_b.data().students, device_a.data().students);
    assert_eq!(device_b.data().last_sync, device_a.data().last_sync);

    // A gives Hana a sticker; after the debounce window it is pushed
    device_a.adjust_stickers(hana.id, 1).unwrap();
    let pushed = run_until(&mut device_a, |o| matches!(o, EventOutcome::Pushed(_))).await;
    let EventOutcome::Pushed(PushOutcome::Pushed(stamp)) = pushed else {
        panic!("expected a push, got {:?}", pushed);
    };

    // B applies it without pushing anything back
    let event = device_b.next_event().await;
    assert!(matches!(event, ClassEvent::RemoteChange(_)));
    assert_eq!(
        device_b.handle(event).await.unwrap(),
        EventOutcome::Reconciled(Reconciliation::Applied(stamp))
    );
    assert_eq!(device_b.data().student(hana.id).unwrap().stickers, 1);
    assert!(!device_b.sync_status().push_pending);
    assert_eq!(device_b.data().last_sync, Some(stamp));

    // A sees only its own echo
    let echo = device_a.next_event().await;
    assert_eq!(
        device_a.handle(echo).await.unwrap(),
        EventOutcome::Reconciled(Reconciliation::StaleIgnored)
    );

    // connect push, one edit push, nothing else
    assert_eq!(backend.upsert_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_last_writer_wins() {
    let backend = MemoryBackend::new();

    let mut device_a = device(&backend);
    let hana = device_a.add_student("Hana", 1).unwrap();
    let connection = device_a.connect_new(&FixedCode).await.unwrap();

    let mut device_b = device(&backend);
    device_b.connect_existing(connection.code).await.unwrap();

    // Both edit; A's push lands first, B's second
    device_a.adjust_stickers(hana.id, 5).unwrap();
    device_b.adjust_stickers(hana.id, 2).unwrap();
    device_a.push_now().await.unwrap();
    // Stamps come from the wall clock, not the paused runtime clock
    std::thread::sleep(Duration::from_millis(5));
    device_b.push_now().await.unwrap();

    // Each sees A's write then B's; only B's is newer for A
    let a_first = device_a.next_event().await;
    device_a.handle(a_first).await.unwrap();
    let a_second = device_a.next_event().await;
    assert!(matches!(
        device_a.handle(a_second).await.unwrap(),
        EventOutcome::Reconciled(Reconciliation::Applied(_))
    ));

    assert_eq!(device_a.data().student(hana.id).unwrap().stickers, 2);
    assert_eq!(device_a.data().last_sync, device_b.data().last_sync);
}

#[tokio::test]
async fn test_disconnected_device_skips_refresh() {
    let backend = MemoryBackend::new();

    let mut device_a = device(&backend);
    let connection = device_a.connect_new(&FixedCode).await.unwrap();

    let mut device_b = device(&backend);
    device_b.connect_existing(connection.code).await.unwrap();
    device_b.disconnect().unwrap();

    device_a.add_student("Hana", 1).unwrap();
    device_a.push_now().await.unwrap();

    // Disconnected: nothing arrives and refresh is skipped
    assert!(matches!(
        device_b.refresh_now().await.unwrap(),
        Reconciliation::Skipped(_)
    ));
    assert!(device_b.data().students.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reopened_device_catches_up_before_editing() {
    let backend = MemoryBackend::new();
    let temp_dir = tempdir().unwrap();
    let open_b = || {
        Classroom::open(
            ClassStore::new(FileStore::new(temp_dir.path())),
            RemoteStore::Connected(backend.clone()),
            WINDOW,
        )
        .unwrap()
    };

    let mut device_a = device(&backend);
    let hana = device_a.add_student("Hana", 1).unwrap();
    let connection = device_a.connect_new(&FixedCode).await.unwrap();

    // B joins, then its process exits
    let mut device_b = open_b();
    device_b
        .connect_existing(connection.code.clone())
        .await
        .unwrap();
    drop(device_b);

    device_a.adjust_stickers(hana.id, 5).unwrap();
    device_a.push_now().await.unwrap();

    // B starts again from disk, pulls first, then edits
    let mut device_b = open_b();
    assert_eq!(device_b.data().student(hana.id).unwrap().stickers, 0);
    assert!(matches!(
        device_b.refresh_now().await.unwrap(),
        Reconciliation::Applied(_)
    ));
    device_b.add_student("Minjun", 2).unwrap();
    assert!(matches!(
        device_b.settle().await.unwrap(),
        Some(PushOutcome::Pushed(_))
    ));

    let remote = backend.row(&connection.code).unwrap();
    assert_eq!(remote.students.len(), 2);
    assert_eq!(remote.student(hana.id).unwrap().stickers, 5);
}
