//! Poll loop and registry behaviour under a paused clock.
//!
//! The fake backend answers from a per-id script; the tokio clock is
//! paused so interval ticks advance deterministically.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use studio_core::operation::{OperationKind, OperationStatus};
use studio_tracker::{StopReason, TrackerConfig, TrackerEvent, TrackerRegistry};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::Instant;

use common::{events_until, FakeBackend, Step};

const JOB: OperationKind = OperationKind::GenerationJob;
const DOWNLOAD: OperationKind = OperationKind::ModelDownload;

fn registry(backend: &Arc<FakeBackend>) -> TrackerRegistry {
    TrackerRegistry::new(backend.clone(), TrackerConfig::default())
}

fn is_stopped(event: &TrackerEvent) -> bool {
    matches!(event, TrackerEvent::Stopped { .. })
}

// ---------------------------------------------------------------------------
// Test: running(40) then done(100) issues exactly two polls and stops
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn running_then_done_polls_twice() {
    let backend = Arc::new(FakeBackend::new());
    backend.script("j1", vec![Step::running(40), Step::done("/out/final.mp4")]);
    let mut registry = registry(&backend);
    let mut rx = registry.subscribe();
    let start = Instant::now();

    registry.start(JOB, "j1");
    let events = events_until(&mut rx, is_stopped).await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    let polls = backend.polls_for("j1");
    assert_eq!(polls.len(), 2);
    assert_eq!(polls[0].at, start);
    assert_eq!(polls[1].at - polls[0].at, Duration::from_millis(2000));

    assert_eq!(events.len(), 4);
    assert_matches!(&events[0], TrackerEvent::Started { operation_id, .. } if operation_id == "j1");
    assert_matches!(
        &events[1],
        TrackerEvent::Progress { status: OperationStatus::Running, progress: 40, .. }
    );
    assert_matches!(
        &events[2],
        TrackerEvent::Completed { result_ref: Some(r), .. } if r == "/out/final.mp4"
    );
    assert_matches!(
        &events[3],
        TrackerEvent::Stopped { reason: StopReason::Terminal, .. }
    );

    let record = registry.record(JOB).unwrap();
    assert_eq!(record.status, OperationStatus::Done);
    assert_eq!(record.progress, 100);
    assert_eq!(record.result_ref.as_deref(), Some("/out/final.mp4"));
    assert_eq!(record.polls, 2);
    assert!(!registry.is_active(JOB));
}

// ---------------------------------------------------------------------------
// Test: stopping after a terminal snapshot emits nothing further
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn stop_after_terminal_is_noop() {
    let backend = Arc::new(FakeBackend::new());
    backend.script("j1", vec![Step::done("/out/a.mp4")]);
    let mut registry = registry(&backend);
    let mut rx = registry.subscribe();

    registry.start(JOB, "j1");
    events_until(&mut rx, is_stopped).await;

    assert!(!registry.stop(JOB));
    assert_matches!(rx.try_recv(), Err(TryRecvError::Empty));
}

// ---------------------------------------------------------------------------
// Test: a failed poll is recorded and the next tick retries
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn poll_failure_does_not_stop_tracking() {
    let backend = Arc::new(FakeBackend::new());
    backend.script("j1", vec![Step::Fail, Step::running(10), Step::done("/out/b.mp4")]);
    let mut registry = registry(&backend);
    let mut rx = registry.subscribe();

    registry.start(JOB, "j1");
    let events = events_until(&mut rx, |e| matches!(e, TrackerEvent::PollFailed { .. })).await;
    assert_matches!(
        events.last(),
        Some(TrackerEvent::PollFailed { message, .. }) if message == "backend unavailable"
    );

    let record = registry.record(JOB).unwrap();
    assert_eq!(record.poll_error.as_deref(), Some("backend unavailable"));
    assert_eq!(record.status_line(), "error");
    assert_eq!(record.display_progress(), 0);
    assert!(record.controls().trigger_enabled);
    assert!(registry.is_active(JOB));

    events_until(&mut rx, is_stopped).await;
    let record = registry.record(JOB).unwrap();
    assert_eq!(record.status, OperationStatus::Done);
    assert!(record.poll_error.is_none());
    assert_eq!(backend.polls_for("j1").len(), 3);
}

// ---------------------------------------------------------------------------
// Test: backend error status is terminal
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn error_status_stops_with_failed_event() {
    let backend = Arc::new(FakeBackend::new());
    backend.script("d1", vec![Step::running(5), Step::error("checksum mismatch")]);
    let mut registry = registry(&backend);
    let mut rx = registry.subscribe();

    registry.start(DOWNLOAD, "d1");
    let events = events_until(&mut rx, is_stopped).await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_matches!(
        &events[events.len() - 2],
        TrackerEvent::Failed { last_log: Some(log), .. } if log == "checksum mismatch"
    );
    assert_eq!(backend.polls_for("d1").len(), 2);
    assert_eq!(registry.record(DOWNLOAD).unwrap().status, OperationStatus::Error);
}

// ---------------------------------------------------------------------------
// Test: the watch channel sees the terminal record
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn watch_observes_terminal_record() {
    let backend = Arc::new(FakeBackend::new());
    backend.script("j1", vec![Step::running(60), Step::done("/out/c.mp4")]);
    let mut registry = registry(&backend);

    registry.start(JOB, "j1");
    let mut watch = registry.watch(JOB).unwrap();
    let record = watch.wait_for(|r| r.is_terminal()).await.unwrap().clone();

    assert_eq!(record.id(), "j1");
    assert_eq!(record.result_ref.as_deref(), Some("/out/c.mp4"));
}

// ---------------------------------------------------------------------------
// Test: starting a second operation of a kind supersedes the first
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn new_start_supersedes_previous() {
    let backend = Arc::new(FakeBackend::new());
    let mut registry = registry(&backend);
    let mut rx = registry.subscribe();

    registry.start(JOB, "j-a");
    events_until(&mut rx, |e| matches!(e, TrackerEvent::Progress { .. })).await;

    registry.start(JOB, "j-b");
    let events = events_until(&mut rx, is_stopped).await;
    assert_matches!(
        events.last(),
        Some(TrackerEvent::Stopped { operation_id, reason: StopReason::Superseded, .. })
            if operation_id == "j-a"
    );

    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(backend.polls_for("j-a").len(), 1);
    assert!(backend.polls_for("j-b").len() >= 5);
    assert!(registry.is_active(JOB));
    assert_eq!(registry.record(JOB).unwrap().id(), "j-b");
}

// ---------------------------------------------------------------------------
// Test: stop is idempotent and keeps the record readable
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent() {
    let backend = Arc::new(FakeBackend::new());
    let mut registry = registry(&backend);
    let mut rx = registry.subscribe();

    registry.start(JOB, "j1");
    events_until(&mut rx, |e| matches!(e, TrackerEvent::Progress { .. })).await;

    assert!(registry.stop(JOB));
    assert!(!registry.stop(JOB));
    assert!(!registry.is_active(JOB));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.polls_for("j1").len(), 1);

    let stopped: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter(is_stopped)
        .collect();
    assert_eq!(stopped.len(), 1);
    assert_matches!(
        &stopped[0],
        TrackerEvent::Stopped { reason: StopReason::Requested, .. }
    );

    let record = registry.record(JOB).unwrap();
    assert_eq!(record.status, OperationStatus::Running);
    assert_eq!(record.progress, 50);
}

#[tokio::test(start_paused = true)]
async fn stop_without_tracker_returns_false() {
    let backend = Arc::new(FakeBackend::new());
    let mut registry = registry(&backend);

    assert!(!registry.stop(DOWNLOAD));
    assert!(registry.record(DOWNLOAD).is_none());
}

// ---------------------------------------------------------------------------
// Test: stopping one kind leaves the other polling
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn stopping_one_kind_leaves_other_running() {
    let backend = Arc::new(FakeBackend::new());
    let mut registry = registry(&backend);

    registry.start(JOB, "j1");
    registry.start(DOWNLOAD, "d1");
    tokio::time::sleep(Duration::from_millis(1)).await;

    registry.stop(JOB);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(backend.polls_for("j1").len(), 1);
    assert!(backend.polls_for("d1").len() >= 5);
    assert_eq!(registry.active_kinds(), vec![DOWNLOAD]);
}

// ---------------------------------------------------------------------------
// Test: a fetch in flight when stop() is called is never applied
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn in_flight_fetch_is_abandoned_on_stop() {
    let backend = Arc::new(FakeBackend::new());
    backend.script(
        "d1",
        vec![Step::delayed(Duration::from_secs(5), Step::done("/models/llm"))],
    );
    let mut registry = registry(&backend);
    let mut rx = registry.subscribe();

    registry.start(DOWNLOAD, "d1");
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.polls_for("d1").len(), 1);

    assert!(registry.stop(DOWNLOAD));
    tokio::time::sleep(Duration::from_secs(10)).await;

    let record = registry.record(DOWNLOAD).unwrap();
    assert_eq!(record.status, OperationStatus::Queued);
    assert_eq!(record.polls, 0);
    assert!(record.result_ref.is_none());

    let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert!(events.iter().all(|e| !e.is_terminal()));
}

// ---------------------------------------------------------------------------
// Test: a slow response delays the next tick instead of overlapping it
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn slow_responses_never_overlap() {
    let backend = Arc::new(FakeBackend::new());
    backend.script(
        "j1",
        vec![Step::delayed(Duration::from_secs(3), Step::running(10))],
    );
    let mut registry = registry(&backend);

    registry.start(JOB, "j1");
    tokio::time::sleep(Duration::from_secs(20)).await;

    let polls = backend.polls_for("j1");
    assert!(polls.len() >= 4);
    assert_eq!(backend.max_in_flight(), 1);
    for pair in polls.windows(2) {
        assert!(pair[1].at - pair[0].at >= Duration::from_secs(3));
    }
}

// ---------------------------------------------------------------------------
// Test: shutdown stops every tracker
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn shutdown_stops_all_kinds() {
    let backend = Arc::new(FakeBackend::new());
    let mut registry = registry(&backend);
    let mut rx = registry.subscribe();

    registry.start(JOB, "j1");
    registry.start(DOWNLOAD, "d1");
    registry.shutdown().await;

    assert!(registry.active_kinds().is_empty());
    let reasons: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter_map(|e| match e {
            TrackerEvent::Stopped { reason, .. } => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(reasons, vec![StopReason::Shutdown, StopReason::Shutdown]);
}

// ---------------------------------------------------------------------------
// Test: dropping the registry ends its poll loops
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn dropped_registry_stops_polling() {
    let backend = Arc::new(FakeBackend::new());
    let watch = {
        let mut registry = registry(&backend);
        registry.start(JOB, "j1");
        registry.start(DOWNLOAD, "d1");
        let mut watch = registry.watch(JOB).unwrap();
        watch.wait_for(|r| r.polls > 0).await.unwrap();
        watch
    };
    let polls = backend.polls().len();

    tokio::time::sleep(Duration::from_secs(20)).await;

    assert_eq!(backend.polls().len(), polls);
    assert_eq!(watch.borrow().polls, 1);
}

// ---------------------------------------------------------------------------
// Test: random start/stop orders never leave two loops for one kind
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn random_sequences_keep_one_loop_per_kind() {
    let backend = Arc::new(FakeBackend::new());
    let mut registry = TrackerRegistry::new(backend.clone(), TrackerConfig::from_millis(100));
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut current: HashMap<OperationKind, Option<String>> = HashMap::new();

    for step in 0..300 {
        let kind = OperationKind::ALL[rng.random_range(0..OperationKind::ALL.len())];
        if rng.random_bool(0.7) {
            let id = format!("{kind}-{step}");
            registry.start(kind, id.clone());
            current.insert(kind, Some(id));
        } else {
            registry.stop(kind);
            current.insert(kind, None);
        }

        let mark = backend.polls().len();
        tokio::time::sleep(Duration::from_millis(rng.random_range(0..350))).await;

        for poll in &backend.polls()[mark..] {
            let expected = current.get(&poll.kind).cloned().flatten();
            assert_eq!(expected.as_deref(), Some(poll.id.as_str()), "step {step}");
        }
        for kind in OperationKind::ALL {
            let expected = current.get(&kind).is_some_and(Option::is_some);
            assert_eq!(registry.is_active(kind), expected, "step {step}");
        }
    }
}
