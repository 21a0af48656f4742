mod common;

use common::{POLL_INTERVAL, ScriptedBackend, completed, harness, new_registration};
use racepay::application::poller::ConfirmationPoller;
use racepay::domain::payment::PaymentPhase;
use racepay::domain::registration::PaymentStatus;
use racepay::error::PaymentError;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn poller(backend: &Arc<ScriptedBackend>) -> ConfirmationPoller {
    ConfirmationPoller::new(backend.clone(), POLL_INTERVAL).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_first_check_is_immediate_then_every_interval() {
    let backend = Arc::new(ScriptedBackend::new());
    let handle = poller(&backend).start("reg-1");

    sleep(Duration::from_millis(1)).await;
    assert_eq!(ScriptedBackend::count(&backend.status_checks), 1);

    sleep(Duration::from_millis(2_900)).await;
    assert_eq!(ScriptedBackend::count(&backend.status_checks), 1);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(ScriptedBackend::count(&backend.status_checks), 2);
    assert_eq!(handle.status(), PaymentStatus::Pending);
}

#[tokio::test(start_paused = true)]
async fn test_polling_survives_transient_errors() {
    let failures = rand::thread_rng().gen_range(1..=8);
    let mut statuses: Vec<Result<PaymentStatus, String>> = (0..failures)
        .map(|_| Err("upstream timeout".to_string()))
        .collect();
    statuses.push(Ok(PaymentStatus::Paid));
    let backend = Arc::new(ScriptedBackend::new().with_statuses(statuses));

    let settled = poller(&backend).start("reg-1").settled().await.unwrap();

    assert_eq!(settled, PaymentStatus::Paid);
    assert_eq!(ScriptedBackend::count(&backend.status_checks), failures + 1);
}

#[tokio::test(start_paused = true)]
async fn test_polling_has_no_attempt_limit() {
    let mut statuses = vec![Ok(PaymentStatus::Pending); 500];
    statuses.push(Ok(PaymentStatus::Failed));
    let backend = Arc::new(ScriptedBackend::new().with_statuses(statuses));

    let settled = poller(&backend).start("reg-1").settled().await.unwrap();

    assert_eq!(settled, PaymentStatus::Failed);
    assert_eq!(ScriptedBackend::count(&backend.status_checks), 501);
}

#[tokio::test(start_paused = true)]
async fn test_settled_status_is_published() {
    let backend = Arc::new(
        ScriptedBackend::new().with_statuses(vec![Ok(PaymentStatus::Pending), Ok(PaymentStatus::Paid)]),
    );
    let handle = poller(&backend).start("reg-1");
    let mut status = handle.subscribe();

    status.changed().await.unwrap();

    assert_eq!(*status.borrow(), PaymentStatus::Paid);
    assert_eq!(handle.status(), PaymentStatus::Paid);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_polling() {
    let backend = Arc::new(ScriptedBackend::new());
    let handle = poller(&backend).start("reg-1");

    // Checks at 0s, 3s and 6s.
    sleep(Duration::from_secs(7)).await;
    assert_eq!(ScriptedBackend::count(&backend.status_checks), 3);

    drop(handle);
    sleep(Duration::from_secs(60)).await;

    assert_eq!(ScriptedBackend::count(&backend.status_checks), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_polling() {
    let backend = Arc::new(ScriptedBackend::new());
    let handle = poller(&backend).start("reg-1");
    sleep(Duration::from_secs(1)).await;

    handle.cancel();
    sleep(Duration::from_secs(30)).await;

    assert_eq!(ScriptedBackend::count(&backend.status_checks), 1);
}

#[tokio::test(start_paused = true)]
async fn test_leaving_payment_flow_stops_polling() {
    let mut h = harness(ScriptedBackend::new(), vec![completed()]);

    let left = tokio::time::timeout(
        Duration::from_secs(10),
        h.flow.register(new_registration(None)),
    )
    .await;
    assert!(left.is_err());
    assert_eq!(h.flow.phase(), PaymentPhase::Verifying);

    let checks = ScriptedBackend::count(&h.backend.status_checks);
    assert!(checks > 0);
    sleep(Duration::from_secs(60)).await;

    assert_eq!(ScriptedBackend::count(&h.backend.status_checks), checks);
}

#[test]
fn test_zero_interval_is_rejected() {
    let backend = Arc::new(ScriptedBackend::new());
    assert!(matches!(
        ConfirmationPoller::new(backend, Duration::ZERO),
        Err(PaymentError::Config(_))
    ));
}
