mod common;

use common::{service_with, test_config, ScriptedScorer};
use nidsboard::ScenarioKind;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_monitor_produces_one_batch_per_tick() {
    let service = service_with(test_config(10, 5), Arc::new(ScriptedScorer::new(vec![0.3])));
    service.start_monitoring();
    assert!(service.monitor().is_running());

    tokio::time::sleep(Duration::from_millis(150)).await;
    service.shutdown();

    let state = service.snapshot();
    assert!(state.metrics.uptime >= 3);
    assert_eq!(state.metrics.total_flows, state.metrics.uptime * 5);
    assert!(state.recent_flows.len() <= 50);
    assert_eq!(state.metrics.anomalies_detected, 0);
}

#[tokio::test]
async fn test_pause_stops_and_resume_restarts_ingestion() {
    let service = service_with(test_config(10, 2), Arc::new(ScriptedScorer::new(vec![0.3])));
    service.start_monitoring();
    tokio::time::sleep(Duration::from_millis(60)).await;

    let paused = service.pause();
    assert!(!paused.is_live);
    let frozen = service.snapshot().metrics.uptime;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(service.snapshot().metrics.uptime, frozen);

    // Les simulations restent acceptées pendant la pause
    service.simulate(ScenarioKind::Portscan).await;
    assert_eq!(service.snapshot().metrics.uptime, frozen + 1);

    service.resume();
    tokio::time::sleep(Duration::from_millis(100)).await;
    service.shutdown();
    assert!(service.snapshot().metrics.uptime > frozen + 1);
}

#[tokio::test]
async fn test_late_scores_after_pause_are_discarded() {
    let scorer = ScriptedScorer::new(vec![0.95]).with_delay(Duration::from_millis(200));
    let service = service_with(test_config(20, 3), Arc::new(scorer));
    service.start_monitoring();

    // Des ticks sont en vol quand la pause arrive
    tokio::time::sleep(Duration::from_millis(60)).await;
    service.pause();

    tokio::time::sleep(Duration::from_millis(400)).await;
    service.shutdown();

    let state = service.snapshot();
    assert_eq!(state.metrics.uptime, 0);
    assert!(state.incidents.is_empty());
    assert!(state.recent_flows.is_empty());
}

#[tokio::test]
async fn test_paused_start_produces_nothing() {
    let mut config = test_config(10, 5);
    config.monitor.start_live = false;
    let service = service_with(config, Arc::new(ScriptedScorer::new(vec![0.3])));
    service.start_monitoring();

    tokio::time::sleep(Duration::from_millis(80)).await;
    service.shutdown();

    assert!(!service.snapshot().is_live);
    assert_eq!(service.snapshot().metrics.uptime, 0);
}
