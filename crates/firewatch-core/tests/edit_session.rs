//! Threshold edit session against the mock gateway.

use std::sync::Arc;
use std::time::Duration;

use firewatch_core::{
    ApplyOutcome, EditState, Error, MockEndpoint, MockGateway, Monitor, MonitorEvent,
    PollerOptions, ThresholdConfig, ThresholdField,
};
use tokio::time::sleep;

#[tokio::test]
async fn test_cancel_after_edits_restores_confirmed() {
    let monitor = Monitor::new(
        MockGateway::builder()
            .thresholds(ThresholdConfig::new(28.0, 150.0))
            .build(),
    );
    monitor.poller().refresh_thresholds().await;
    let session = monitor.edit_session();

    session.begin_edit().unwrap();
    session.set_field(ThresholdField::TemperatureMax, "99").unwrap();
    session.set_field(ThresholdField::GasMax, "1").unwrap();
    assert_eq!(session.draft(), ThresholdConfig::new(99.0, 1.0));

    session.cancel().unwrap();

    assert_eq!(session.state(), EditState::Viewing);
    assert_eq!(session.draft(), ThresholdConfig::new(28.0, 150.0));
    assert_eq!(monitor.view().thresholds, ThresholdConfig::new(28.0, 150.0));
}

#[tokio::test]
async fn test_commit_sends_full_draft() {
    let monitor = Monitor::new(MockGateway::new());
    let session = monitor.edit_session();

    session.begin_edit().unwrap();
    session.set_field(ThresholdField::GasMax, "175.5").unwrap();
    let confirmed = session.commit().await.unwrap();

    let sent = monitor.gateway().last_update().await.unwrap();
    assert_eq!(sent.temperature_max, Some(30.0));
    assert_eq!(sent.gas_max, Some(175.5));
    assert_eq!(confirmed, ThresholdConfig::new(30.0, 175.5));

    let view = monitor.view();
    assert_eq!(view.thresholds, confirmed);
    assert!(view.thresholds_confirmed);
}

#[tokio::test]
async fn test_server_normalized_value_wins() {
    let gateway = MockGateway::builder()
        .update_response(ThresholdConfig::new(45.0, 500.0))
        .build();
    let monitor = Monitor::new(gateway);
    let session = monitor.edit_session();

    session.begin_edit().unwrap();
    session.set_field(ThresholdField::TemperatureMax, "60").unwrap();
    session.commit().await.unwrap();

    assert_eq!(monitor.view().thresholds, ThresholdConfig::new(45.0, 500.0));
}

#[tokio::test]
async fn test_failed_commit_notifies_and_rolls_back() {
    let monitor = Monitor::new(
        MockGateway::builder()
            .thresholds(ThresholdConfig::new(28.0, 150.0))
            .build(),
    );
    monitor.poller().refresh_thresholds().await;
    monitor
        .gateway()
        .set_failing(MockEndpoint::UpdateThresholds, true);

    let mut events = monitor.events();
    let session = monitor.edit_session();
    session.begin_edit().unwrap();
    session.set_field(ThresholdField::TemperatureMax, "35").unwrap();

    let err = session.commit().await.unwrap_err();
    assert!(matches!(err, Error::Gateway(ref e) if e.is_unreachable()));

    assert_eq!(session.state(), EditState::Viewing);
    assert_eq!(monitor.view().thresholds, ThresholdConfig::new(28.0, 150.0));
    assert_eq!(session.draft(), ThresholdConfig::new(28.0, 150.0));

    match events.recv().await.unwrap() {
        MonitorEvent::ThresholdUpdateFailed { error } => {
            assert!(error.contains("/thresholds"));
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // Not retried.
    assert_eq!(
        monitor.gateway().call_count(MockEndpoint::UpdateThresholds),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_second_commit_rejected_while_saving() {
    let gateway = MockGateway::builder()
        .latency(MockEndpoint::UpdateThresholds, Duration::from_secs(1))
        .build();
    let monitor = Monitor::new(gateway);
    let session = monitor.edit_session();

    session.begin_edit().unwrap();
    session.set_field(ThresholdField::GasMax, "180").unwrap();

    let (first, second) = tokio::join!(session.commit(), async {
        sleep(Duration::from_millis(100)).await;
        assert_eq!(session.state(), EditState::Saving);
        // The draft being saved stays visible and cannot be edited.
        assert_eq!(session.draft().gas_max, 180.0);
        assert!(session.set_field(ThresholdField::GasMax, "1").is_err());
        assert!(session.cancel().is_err());
        session.commit().await
    });

    assert_eq!(first.unwrap().gas_max, 180.0);
    assert!(matches!(second, Err(Error::CommitInFlight)));
    assert_eq!(session.state(), EditState::Viewing);
    assert_eq!(
        monitor.gateway().call_count(MockEndpoint::UpdateThresholds),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_dropped_commit_returns_to_viewing() {
    let gateway = MockGateway::builder()
        .latency(MockEndpoint::UpdateThresholds, Duration::from_secs(5))
        .build();
    let monitor = Monitor::new(gateway);
    let session = monitor.edit_session();

    session.begin_edit().unwrap();
    let result = tokio::time::timeout(Duration::from_secs(1), session.commit()).await;
    assert!(result.is_err());

    assert_eq!(session.state(), EditState::Viewing);
    assert_eq!(monitor.view().thresholds, ThresholdConfig::default());
}

#[tokio::test(start_paused = true)]
async fn test_commit_beats_slower_startup_fetch() {
    let gateway = MockGateway::builder()
        .thresholds(ThresholdConfig::new(25.0, 100.0))
        .latency(MockEndpoint::Thresholds, Duration::from_secs(3))
        .build();
    let mut monitor = Monitor::new(gateway);
    monitor.start(PollerOptions::default()).unwrap();
    let session: Arc<_> = monitor.edit_session();

    sleep(Duration::from_millis(500)).await;
    session.begin_edit().unwrap();
    session.set_field(ThresholdField::TemperatureMax, "40").unwrap();
    session.set_field(ThresholdField::GasMax, "300").unwrap();
    session.commit().await.unwrap();
    // What the in-flight startup fetch will now return.
    monitor
        .gateway()
        .set_thresholds(ThresholdConfig::new(25.0, 100.0))
        .await;

    // The startup fetch was issued first and lands last; it must not win.
    sleep(Duration::from_secs(5)).await;
    assert_eq!(monitor.view().thresholds, ThresholdConfig::new(40.0, 300.0));

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_commit_after_stop_still_returns_result() {
    let monitor = Monitor::new(MockGateway::new());
    let mut events = monitor.events();
    monitor.stop();

    let session = monitor.edit_session();
    session.begin_edit().unwrap();
    session.set_field(ThresholdField::GasMax, "190").unwrap();
    let confirmed = session.commit().await.unwrap();

    assert_eq!(confirmed.gas_max, 190.0);
    // The torn-down view is no longer updated, and nothing is announced.
    assert_eq!(monitor.view().thresholds, ThresholdConfig::default());
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_commit_supersedes_fetch_issued_while_saving() {
    let gateway = MockGateway::builder()
        .thresholds(ThresholdConfig::new(28.0, 150.0))
        .latency(MockEndpoint::UpdateThresholds, Duration::from_secs(2))
        .build();
    let monitor = Monitor::new(gateway);
    let mut events = monitor.events();
    let session = monitor.edit_session();

    session.begin_edit().unwrap();
    session.set_field(ThresholdField::GasMax, "175").unwrap();

    let (committed, fetched) = tokio::join!(session.commit(), async {
        sleep(Duration::from_millis(100)).await;
        // Reads the pre-commit values while the write is still in flight.
        monitor.poller().refresh_thresholds().await
    });

    let confirmed = committed.unwrap();
    assert_eq!(fetched, ApplyOutcome::Applied);
    assert_eq!(confirmed.gas_max, 175.0);
    assert_eq!(monitor.view().thresholds, confirmed);

    let mut announced = None;
    while let Ok(event) = events.try_recv() {
        if let MonitorEvent::ThresholdsUpdated { thresholds } = event {
            announced = Some(thresholds);
        }
    }
    assert_eq!(announced, Some(confirmed));
}
