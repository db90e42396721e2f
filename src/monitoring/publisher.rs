//! The single point where a new display model replaces the previous one.
//!
//! Created with [`DisplayModel::Pending`] at startup, overwritten wholesale
//! after every cycle, and torn down with [`DisplayModel::Stopped`] when the
//! poll loop exits. Readers hold a [`DisplayHandle`] and always see whole frames.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use super::display::DisplayModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PollState {
    /// Between cycles.
    Idle,
    /// A remote call is outstanding.
    Polling,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorFrame {
    pub cycle: u64,
    pub state: PollState,
    pub model: DisplayModel,
    pub published_at: Option<DateTime<Utc>>,
}

pub struct DisplayPublisher {
    tx: watch::Sender<MonitorFrame>,
}

#[derive(Clone)]
pub struct DisplayHandle {
    rx: watch::Receiver<MonitorFrame>,
}

impl DisplayPublisher {
    pub fn new() -> (Self, DisplayHandle) {
        let (tx, rx) = watch::channel(MonitorFrame {
            cycle: 0,
            state: PollState::Idle,
            model: DisplayModel::Pending,
            published_at: None,
        });
        (Self { tx }, DisplayHandle { rx })
    }

    pub fn subscribe(&self) -> DisplayHandle {
        DisplayHandle {
            rx: self.tx.subscribe(),
        }
    }

    /// Marks a cycle as started; the previous model stays visible meanwhile.
    pub fn begin_cycle(&self, cycle: u64) {
        self.tx.send_modify(|frame| {
            frame.cycle = cycle;
            frame.state = PollState::Polling;
        });
    }

    pub fn publish(&self, model: DisplayModel) {
        self.tx.send_modify(|frame| {
            frame.state = PollState::Idle;
            frame.model = model;
            frame.published_at = Some(Utc::now());
        });
    }

    /// Publishes the final frame and closes the channel.
    pub fn shutdown(self) {
        self.publish(DisplayModel::Stopped);
    }
}

impl DisplayHandle {
    pub fn current(&self) -> MonitorFrame {
        self.rx.borrow().clone()
    }

    /// Waits for the next frame. `None` once the publisher is gone and the
    /// last frame has been seen.
    pub async fn changed(&mut self) -> Option<MonitorFrame> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
