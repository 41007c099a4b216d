mod common;

use common::wait_ms;
use owt_autosave::{DebounceScheduler, SaveStatus, StatusReporter};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn bump(count: Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        count.fetch_add(1, Ordering::SeqCst);
    }
}

// ── DebounceScheduler ────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn fires_once_after_window() {
    let scheduler = DebounceScheduler::new(Duration::from_millis(100));
    let count = Arc::new(AtomicUsize::new(0));

    scheduler.arm(bump(count.clone()));
    assert!(scheduler.is_armed());
    wait_ms(99).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);

    wait_ms(2).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(!scheduler.is_armed());
}

#[tokio::test(start_paused = true)]
async fn rearming_restarts_the_window() {
    let scheduler = DebounceScheduler::new(Duration::from_millis(100));
    let count = Arc::new(AtomicUsize::new(0));

    for _ in 0..5 {
        scheduler.arm(bump(count.clone()));
        wait_ms(60).await;
    }
    assert_eq!(count.load(Ordering::SeqCst), 0);

    wait_ms(41).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_prevents_firing() {
    let scheduler = DebounceScheduler::new(Duration::from_millis(100));
    let count = Arc::new(AtomicUsize::new(0));

    scheduler.arm(bump(count.clone()));
    scheduler.cancel();
    assert!(!scheduler.is_armed());

    wait_ms(500).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn drop_cancels_pending_timer() {
    let count = Arc::new(AtomicUsize::new(0));
    {
        let scheduler = DebounceScheduler::new(Duration::from_millis(100));
        scheduler.arm(bump(count.clone()));
    }
    wait_ms(500).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

// ── StatusReporter ───────────────────────────────────────────────

#[test]
fn labels() {
    assert_eq!(SaveStatus::Typing.label(), "Typing...");
    assert_eq!(SaveStatus::Saving.label(), "Saving...");
    assert_eq!(SaveStatus::Saved.to_string(), "Saved");
    assert_eq!(SaveStatus::Error.to_string(), "Error saving");
    assert_eq!(SaveStatus::default(), SaveStatus::Saved);
}

#[test]
fn reporter_tracks_status_and_error() {
    let reporter = StatusReporter::new();
    let rx = reporter.subscribe();
    assert_eq!(reporter.current(), SaveStatus::Saved);

    reporter.set(SaveStatus::Typing);
    assert_eq!(*rx.borrow(), SaveStatus::Typing);

    reporter.fail("Failed to save name: boom".into());
    assert_eq!(reporter.current(), SaveStatus::Error);
    assert_eq!(reporter.last_error().as_deref(), Some("Failed to save name: boom"));
}
