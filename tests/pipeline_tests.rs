// End-to-end refresh pipeline against scripted remote calls.

use async_trait::async_trait;
use cloud_pool_monitor::config::MonitorSettings;
use cloud_pool_monitor::core::StatusIndicator;
use cloud_pool_monitor::errors::GatewayError;
use cloud_pool_monitor::monitoring::display::TableRow;
use cloud_pool_monitor::{decode, extract, DisplayModel, PollState, Poller, RemoteCall};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const SCENARIO: &str = "<xml>junk{\"resources\":[{\"name\":\"A\",\"cloud_type\":\"c1\",\"vm_slots\":5,\"vms\":[{\"name\":\"vm1\",\"memory\":512,\"cpucores\":2,\"vmtype\":\"small\",\"status\":\"Running\"}]}]}more</xml>";

fn settings(poll_interval_ms: u64, request_timeout_ms: u64) -> MonitorSettings {
    MonitorSettings {
        endpoint: "http://localhost:8111/".into(),
        method: "get_json_resource".into(),
        poll_interval_ms,
        request_timeout_ms,
    }
}

struct Canned(&'static str);

#[async_trait]
impl RemoteCall for Canned {
    async fn call(&self, _endpoint: &str, _method: &str) -> Result<String, GatewayError> {
        Ok(self.0.to_string())
    }
}

/// Records when each call starts and ends, and cancels the loop after `stop_after` calls.
struct Recording {
    latency: Duration,
    stop_after: usize,
    cancel: CancellationToken,
    calls: Mutex<Vec<(Instant, Instant)>>,
}

#[async_trait]
impl RemoteCall for Recording {
    async fn call(&self, _endpoint: &str, _method: &str) -> Result<String, GatewayError> {
        let started = Instant::now();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((started, Instant::now()));
            calls.len()
        };
        if count >= self.stop_after {
            self.cancel.cancel();
        }
        Ok(SCENARIO.to_string())
    }
}

#[test]
fn scenario_payload_decodes_to_one_running_vm() {
    let pool = decode(extract(SCENARIO).unwrap()).unwrap();

    assert_eq!(pool.resources.len(), 1);
    let cluster = &pool.resources[0];
    assert_eq!(cluster.name, "A");
    assert_eq!(cluster.cloud_type, "c1");
    assert_eq!(cluster.vm_slots, 5);
    assert_eq!(cluster.vms.len(), 1);
    assert_eq!(cluster.vms[0].name, "vm1");
    assert_eq!(cluster.vms[0].status, "Running");
}

#[tokio::test]
async fn scenario_renders_one_green_row() {
    let (mut poller, handle) = Poller::new(Arc::new(Canned(SCENARIO)), settings(10_000, 5_000));
    poller.run_cycle().await;

    let DisplayModel::Table(table) = handle.current().model else {
        panic!("expected a table");
    };
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.groups[0].row_span, 1);
    match &table.groups[0].rows[0] {
        TableRow::Vm { vm, status } => {
            assert_eq!(vm.name, "vm1");
            assert_eq!(status.text, "Running");
            assert_eq!(status.indicator, StatusIndicator::Green);
        }
        TableRow::ClusterOnly => panic!("expected a VM row"),
    }
}

#[tokio::test]
async fn response_without_payload_shows_error_message() {
    let (mut poller, handle) = Poller::new(
        Arc::new(Canned("<xml>no payload here</xml>")),
        settings(10_000, 5_000),
    );
    poller.run_cycle().await;

    assert_eq!(
        handle.current().model,
        DisplayModel::Error {
            message: "Error Reading from RPC Server".to_string()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn fast_cycles_are_spaced_by_the_interval() {
    let interval = Duration::from_secs(10);
    let cancel = CancellationToken::new();
    let gateway = Arc::new(Recording {
        latency: Duration::ZERO,
        stop_after: 5,
        cancel: cancel.clone(),
        calls: Mutex::new(Vec::new()),
    });

    let (poller, _handle) = Poller::new(gateway.clone(), settings(10_000, 5_000));
    poller.run(cancel).await;

    let calls = gateway.calls.lock().unwrap();
    assert_eq!(calls.len(), 5);
    let first = calls[0].0;
    for (n, window) in calls.windows(2).enumerate() {
        let gap = window[1].0 - window[0].0;
        assert!(gap >= interval, "gap {:?} shorter than interval", gap);
        assert!(gap < interval + Duration::from_millis(5), "gap {:?} drifted", gap);
        assert!(window[1].0 - first >= interval * (n as u32 + 1));
    }
}

#[tokio::test(start_paused = true)]
async fn slow_calls_never_overlap() {
    let interval = Duration::from_secs(10);
    let cancel = CancellationToken::new();
    let gateway = Arc::new(Recording {
        latency: Duration::from_secs(15),
        stop_after: 4,
        cancel: cancel.clone(),
        calls: Mutex::new(Vec::new()),
    });

    let (poller, _handle) = Poller::new(gateway.clone(), settings(10_000, 20_000));
    poller.run(cancel).await;

    let calls = gateway.calls.lock().unwrap();
    assert_eq!(calls.len(), 4);
    let first = calls[0].0;
    for (n, window) in calls.windows(2).enumerate() {
        let (_, previous_end) = window[0];
        let (next_start, _) = window[1];
        assert!(next_start >= previous_end, "cycles overlapped");
        assert!(next_start - first >= interval * (n as u32 + 1));
    }
}

#[tokio::test(start_paused = true)]
async fn loop_publishes_every_cycle_then_stops() {
    let cancel = CancellationToken::new();
    let gateway = Arc::new(Recording {
        latency: Duration::ZERO,
        stop_after: 3,
        cancel: cancel.clone(),
        calls: Mutex::new(Vec::new()),
    });

    let (poller, mut handle) = Poller::new(gateway, settings(1_000, 500));
    let task = poller.spawn(cancel);

    let mut published = Vec::new();
    while let Some(frame) = handle.changed().await {
        if frame.state == PollState::Idle {
            published.push((frame.cycle, frame.model));
        }
    }
    task.await.unwrap();

    let (last_cycle, last_model) = published.pop().unwrap();
    assert_eq!(last_cycle, 3);
    assert_eq!(last_model, DisplayModel::Stopped);
    // frames published back to back may be coalesced, so only the shape is checked
    assert!(!published.is_empty());
    assert!(published
        .iter()
        .all(|(_, model)| matches!(model, DisplayModel::Table(_))));
    assert!(published.windows(2).all(|w| w[0].0 < w[1].0));
}
