//! Refresh loop: call the info server, pull the payload out of the response,
//! decode it and publish a freshly rendered display model.
//!
//! Cycles start on a fixed cadence measured from the start of the previous
//! cycle. The next tick is only awaited once the current cycle has published,
//! so two cycles never overlap; a call that overruns the interval just makes
//! the next cycle start late. Any failure inside a cycle is absorbed into the
//! fixed error view and the loop carries on until it is cancelled.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::display::{render, DisplayModel};
use super::publisher::{DisplayHandle, DisplayPublisher, PollState};
use crate::config::MonitorSettings;
use crate::core::{envelope, resource_pool, ResourcePool};
use crate::errors::{GatewayError, MonitorResult};
use crate::gateway::RemoteCall;

pub struct Poller {
    gateway: Arc<dyn RemoteCall>,
    settings: MonitorSettings,
    publisher: DisplayPublisher,
    state: PollState,
    cycle: u64,
}

impl Poller {
    pub fn new(gateway: Arc<dyn RemoteCall>, settings: MonitorSettings) -> (Self, DisplayHandle) {
        let (publisher, handle) = DisplayPublisher::new();
        let poller = Self {
            gateway,
            settings,
            publisher,
            state: PollState::Idle,
            cycle: 0,
        };
        (poller, handle)
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Runs the pipeline up to a decoded snapshot.
    pub async fn fetch_snapshot(&self) -> MonitorResult<ResourcePool> {
        let endpoint = self.settings.endpoint.as_str();
        let timeout = self.settings.request_timeout();

        let call = self.gateway.call(endpoint, &self.settings.method);
        let raw = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(GatewayError::Timeout {
                    endpoint: endpoint.to_string(),
                    timeout,
                }
                .into())
            }
        };

        let payload = envelope::extract(&raw)?;
        Ok(resource_pool::decode(payload)?)
    }

    /// Performs one full cycle and publishes its outcome. Never fails.
    pub async fn run_cycle(&mut self) -> DisplayModel {
        self.cycle += 1;
        self.transition(PollState::Polling);
        self.publisher.begin_cycle(self.cycle);

        let started = Instant::now();
        let model = match self.fetch_snapshot().await {
            Ok(pool) => {
                info!(
                    cycle = self.cycle,
                    clusters = pool.resources.len(),
                    vms = pool.vm_count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Resource pool refreshed"
                );
                DisplayModel::Table(render(&pool))
            }
            Err(e) => {
                warn!(
                    cycle = self.cycle,
                    kind = e.kind(),
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Refresh failed, showing error view"
                );
                DisplayModel::error()
            }
        };

        self.transition(PollState::Idle);
        self.publisher.publish(model.clone());
        model
    }

    /// Polls until `cancel` fires, then publishes the stopped frame.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = interval(self.settings.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            endpoint = %self.settings.endpoint,
            method = %self.settings.method,
            interval_ms = self.settings.poll_interval_ms,
            "Starting poll loop"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(cycle = self.cycle, "Cancelled with a call outstanding");
                    break;
                }
                _ = self.run_cycle() => {}
            }
        }

        self.state = PollState::Idle;
        info!(cycles = self.cycle, "Poll loop stopped");
        self.publisher.shutdown();
    }

    /// Spawns [`Poller::run`] on the runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    fn transition(&mut self, next: PollState) {
        debug!(cycle = self.cycle, from = ?self.state, to = ?next, "Poll state change");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MonitorError;
    use crate::monitoring::display::TableRow;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    const PAYLOAD: &str = r#"<?xml version='1.0'?><methodResponse><params><param><value><string>{"resources": [{"name": "A", "cloud_type": "c1", "vm_slots": 5, "vms": [{"name": "vm1", "memory": 512, "cpucores": 2, "vmtype": "small", "status": "Running"}]}]}</string></value></param></params></methodResponse>"#;

    enum Reply {
        Text(&'static str),
        Fail,
        Hang,
    }

    struct Scripted {
        reply: Reply,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl Scripted {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RemoteCall for Scripted {
        async fn call(&self, endpoint: &str, method: &str) -> Result<String, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push((endpoint.to_string(), method.to_string()));
            match self.reply {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Fail => Err(GatewayError::Request {
                    endpoint: endpoint.to_string(),
                    message: "connection refused".into(),
                }),
                Reply::Hang => std::future::pending().await,
            }
        }
    }

    fn settings() -> MonitorSettings {
        MonitorSettings {
            endpoint: "http://localhost:8111/".into(),
            method: "get_json_resource".into(),
            poll_interval_ms: 10_000,
            request_timeout_ms: 2_000,
        }
    }

    #[tokio::test]
    async fn successful_cycle_publishes_a_table() {
        let gateway = Scripted::new(Reply::Text(PAYLOAD));
        let (mut poller, handle) = Poller::new(gateway.clone(), settings());

        let model = poller.run_cycle().await;
        let DisplayModel::Table(table) = &model else {
            panic!("expected a table, got {:?}", model);
        };
        assert_eq!(table.row_count(), 1);
        assert!(matches!(table.groups[0].rows[0], TableRow::Vm { .. }));

        let frame = handle.current();
        assert_eq!(frame.cycle, 1);
        assert_eq!(frame.state, PollState::Idle);
        assert_eq!(frame.model, model);
        assert_eq!(poller.state(), PollState::Idle);
        assert_eq!(poller.cycles(), 1);

        let calls = gateway.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[("http://localhost:8111/".to_string(), "get_json_resource".to_string())]
        );
    }

    #[tokio::test]
    async fn transport_failure_renders_error_view() {
        let (mut poller, handle) = Poller::new(Scripted::new(Reply::Fail), settings());

        assert!(matches!(poller.fetch_snapshot().await, Err(MonitorError::Transport(_))));
        assert_eq!(poller.run_cycle().await, DisplayModel::error());
        assert_eq!(handle.current().model, DisplayModel::error());
    }

    #[tokio::test]
    async fn missing_envelope_renders_error_view() {
        let gateway = Scripted::new(Reply::Text("<xml>no payload here</xml>"));
        let (mut poller, _handle) = Poller::new(gateway, settings());

        assert!(matches!(poller.fetch_snapshot().await, Err(MonitorError::Envelope(_))));
        assert_eq!(poller.run_cycle().await, DisplayModel::error());
    }

    #[tokio::test]
    async fn undecodable_payload_renders_error_view() {
        let gateway = Scripted::new(Reply::Text("<string>{not valid}</string>"));
        let (mut poller, _handle) = Poller::new(gateway, settings());

        assert!(matches!(poller.fetch_snapshot().await, Err(MonitorError::Decode(_))));
        assert_eq!(poller.run_cycle().await, DisplayModel::error());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_call_times_out() {
        let (mut poller, _handle) = Poller::new(Scripted::new(Reply::Hang), settings());

        match poller.fetch_snapshot().await {
            Err(MonitorError::Transport(GatewayError::Timeout { timeout, .. })) => {
                assert_eq!(timeout, Duration::from_secs(2));
            }
            other => panic!("expected a timeout, got {:?}", other),
        }
        assert_eq!(poller.run_cycle().await, DisplayModel::error());
    }

    #[tokio::test]
    async fn error_replaces_previous_table() {
        let (mut poller, handle) = Poller::new(Scripted::new(Reply::Text(PAYLOAD)), settings());
        poller.run_cycle().await;
        assert!(matches!(handle.current().model, DisplayModel::Table(_)));

        poller.gateway = Scripted::new(Reply::Fail);
        poller.run_cycle().await;
        assert_eq!(handle.current().model, DisplayModel::error());
        assert_eq!(handle.current().cycle, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_a_pending_call_stops_the_loop() {
        let (poller, mut handle) = Poller::new(Scripted::new(Reply::Hang), MonitorSettings {
            request_timeout_ms: 60_000,
            ..settings()
        });
        let cancel = CancellationToken::new();
        let task = poller.spawn(cancel.clone());

        // first frame is the start of cycle 1
        let frame = handle.changed().await.unwrap();
        assert_eq!(frame.state, PollState::Polling);

        cancel.cancel();
        task.await.unwrap();

        let mut last = handle.current();
        while let Some(frame) = handle.changed().await {
            last = frame;
        }
        assert_eq!(last.model, DisplayModel::Stopped);
        assert_eq!(last.state, PollState::Idle);
    }
}
