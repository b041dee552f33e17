// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The kernel: the channel set plus the shared-state region plus the
//! seeded generator, bundled into the one handle every actor is spawned
//! with.

use std::sync::Arc;

use crate::channel::PriorityChannel;
use crate::config::SimParams;
use crate::events::{LogRecord, MetricsBlock, Record};
use crate::model::{Role, SPECIALIST_COUNT};
use crate::rng::SimRng;
use crate::state::SharedState;

/// The five named channels: arrivals into registration, registered
/// patients into triage, one queue per specialist type, and the log.
pub struct Channels {
    pub registration: PriorityChannel<Record>,
    pub triage: PriorityChannel<Record>,
    pub specialists: [PriorityChannel<Record>; SPECIALIST_COUNT as usize],
    pub log: PriorityChannel<LogRecord>,
}

impl Channels {
    fn new(capacity: usize) -> Self {
        Self {
            registration: PriorityChannel::new(capacity),
            triage: PriorityChannel::new(capacity),
            specialists: std::array::from_fn(|_| PriorityChannel::new(capacity)),
            log: PriorityChannel::new(capacity),
        }
    }
}

pub struct Kernel {
    pub state: Arc<SharedState>,
    pub channels: Channels,
    pub rng: SimRng,
}

impl Kernel {
    pub fn new(params: SimParams) -> Arc<Self> {
        let capacity = params.channel_capacity;
        let seed = params.seed;
        let state = SharedState::new(params);
        Arc::new(Self { state, channels: Channels::new(capacity), rng: SimRng::new(seed) })
    }

    /// Append a plain (no-metrics) line to `LogChan`.
    pub async fn log(&self, pid: u32, role: Role, text: impl Into<String>) {
        let record = LogRecord {
            sim_minute: self.state.sim_minutes_elapsed(),
            pid,
            metrics: None,
            role,
            text: text.into(),
        };
        let _ = self.channels.log.send_with_retry(record).await;
    }

    /// Append a line carrying a metrics snapshot (used by Registration's
    /// heartbeat and Director's monitor line).
    pub async fn log_with_metrics(&self, pid: u32, role: Role, text: impl Into<String>) {
        let inner = self.state.inner.lock().await;
        let (reg1_alive, reg2_alive, triage_alive) = self.state.actor_liveness().await;
        let metrics = MetricsBlock {
            w_inside: inner.inside_waiting_room,
            w_capacity: self.state.capacity,
            reg_q: inner.registration_queue_len.max(self.channels.registration.len() as i64),
            triage_q: self.channels.triage.len() as i64,
            spec_q: self.channels.specialists.iter().map(|c| c.len() as i64).sum(),
            w_sem: self.state.available_seats() as i64,
            reg1_alive,
            reg2_alive,
            triage_alive,
        };
        drop(inner);
        let record = LogRecord {
            sim_minute: self.state.sim_minutes_elapsed(),
            pid,
            metrics: Some(metrics),
            role,
            text: text.into(),
        };
        let _ = self.channels.log.send_with_retry(record).await;
    }

    /// Sleep for a configured service/exam/interval duration, given
    /// directly in milliseconds (not scaled — see DESIGN.md); `0` is
    /// allowed and resolves immediately.
    pub async fn sleep_configured(&self, ms: u64) {
        if ms == 0 {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
    }
}
