// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shared-state region and the waiting-room semaphore W.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::config::SimParams;
use crate::model::SPECIALIST_COUNT;

/// Monotonic counters. Never decrease.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    pub triage_red: u64,
    pub triage_yellow: u64,
    pub triage_green: u64,
    pub triage_sent_home: u64,
    pub outcome_home: u64,
    pub outcome_ward: u64,
    pub outcome_other: u64,
    pub total_patients: u64,
}

/// An in-process task gets a small monotone id (used for log/summary
/// display and for targeting the stop/leave stimuli) plus its own
/// cancellation scope.
#[derive(Clone)]
pub struct ActorHandle {
    pub id: u32,
    pub stop: CancellationToken,
}

impl ActorHandle {
    pub fn new(id: u32, parent: &CancellationToken) -> Self {
        Self { id, stop: parent.child_token() }
    }
}

/// Fields mutated only under the state lock.
pub struct Inner {
    pub inside_waiting_room: u64,
    /// Advisory; the channel's own `len()` is authoritative. Kept only
    /// as a diagnostic fallback.
    pub registration_queue_len: i64,
    pub reg2_active: bool,
    pub reg2_history: Vec<u32>,
    pub counters: Counters,
}

/// The shared-state region plus the waiting-room semaphore.
pub struct SharedState {
    pub inner: Mutex<Inner>,
    pub waiting_room: Arc<Semaphore>,
    pub capacity: u64,
    pub params: SimParams,
    pub sim_start: Instant,
    pub director: ActorHandle,
    pub reg1: Mutex<Option<ActorHandle>>,
    pub reg2: Mutex<Option<ActorHandle>>,
    pub triage: Mutex<Option<ActorHandle>>,
    pub specialists: [Mutex<Option<ActorHandle>>; SPECIALIST_COUNT as usize],
    pub specialist_leave: [AtomicBool; SPECIALIST_COUNT as usize],
    pub patient_factory: Mutex<Option<ActorHandle>>,
    pub shutdown: CancellationToken,
}

impl SharedState {
    pub fn new(params: SimParams) -> Arc<Self> {
        let capacity = params.waiting_room_capacity;
        let shutdown = CancellationToken::new();
        let director = ActorHandle::new(0, &shutdown);
        Arc::new(Self {
            inner: Mutex::new(Inner {
                inside_waiting_room: 0,
                registration_queue_len: 0,
                reg2_active: false,
                reg2_history: Vec::new(),
                counters: Counters::default(),
            }),
            waiting_room: Arc::new(Semaphore::new(capacity as usize)),
            capacity,
            params,
            sim_start: Instant::now(),
            director,
            reg1: Mutex::new(None),
            reg2: Mutex::new(None),
            triage: Mutex::new(None),
            specialists: std::array::from_fn(|_| Mutex::new(None)),
            specialist_leave: std::array::from_fn(|_| AtomicBool::new(false)),
            patient_factory: Mutex::new(None),
            shutdown,
        })
    }

    /// Elapsed simulated minutes since boot, at the configured time scale.
    pub fn sim_minutes_elapsed(&self) -> f64 {
        let ms = self.sim_start.elapsed().as_millis() as f64;
        ms / self.params.time_scale_ms_per_sim_minute as f64
    }

    /// Available waiting-room seats right now (mirrors `value(W)`).
    pub fn available_seats(&self) -> usize {
        self.waiting_room.available_permits()
    }

    /// Whether the configured simulated duration has elapsed. `0` means
    /// unbounded — only an external stop ends the run.
    pub fn duration_reached(&self) -> bool {
        self.params.duration_minutes > 0 && self.sim_minutes_elapsed() >= self.params.duration_minutes as f64
    }

    /// Acquire `persons` waiting-room seats, blocking until free or until
    /// `stop` fires.
    ///
    /// Acquisitions are not atomic across persons, so two concurrent
    /// multi-person patients may interleave their acquires.
    pub async fn acquire_seats(
        self: &Arc<Self>,
        persons: u8,
        stop: &CancellationToken,
    ) -> Option<Vec<OwnedSemaphorePermit>> {
        let mut permits = Vec::with_capacity(persons as usize);
        for _ in 0..persons {
            let sem = Arc::clone(&self.waiting_room);
            tokio::select! {
                acquired = sem.acquire_owned() => {
                    match acquired {
                        Ok(permit) => permits.push(permit),
                        Err(_closed) => return None,
                    }
                }
                _ = stop.cancelled() => return None,
            }
        }
        {
            let mut inner = self.inner.lock().await;
            inner.inside_waiting_room += persons as u64;
            inner.registration_queue_len += 1;
            inner.counters.total_patients += 1;
        }
        Some(permits)
    }

    /// Release `persons` waiting-room seats. This is the single mechanism
    /// by which a patient leaves the waiting room: whichever actor calls
    /// this is "the decider". Dropping `permits` returns them to the
    /// semaphore; the `inside_waiting_room` counter is adjusted separately
    /// under the state lock, which is a narrow window a concurrent
    /// observer may catch between the two.
    pub async fn release_patient(&self, persons: u8, permits: Vec<OwnedSemaphorePermit>) {
        drop(permits);
        let mut inner = self.inner.lock().await;
        inner.inside_waiting_room = inner.inside_waiting_room.saturating_sub(persons as u64);
    }

    pub fn next_actor_id(&self) -> u32 {
        NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed)
    }

    /// Snapshot of whether Reg1, Reg2, and Triage are currently running,
    /// for the monitor line's liveness report. An actor counts as live
    /// once bootstrapped and until its stop token fires; it says nothing
    /// about whether the task has actually finished unwinding yet.
    pub async fn actor_liveness(&self) -> (bool, bool, bool) {
        let reg1 = self.reg1.lock().await.as_ref().is_some_and(|h| !h.stop.is_cancelled());
        let reg2 = self.reg2.lock().await.as_ref().is_some_and(|h| !h.stop.is_cancelled());
        let triage = self.triage.lock().await.as_ref().is_some_and(|h| !h.stop.is_cancelled());
        (reg1, reg2, triage)
    }

    /// Force `W` back up to `expected_free`, the only corrective action
    /// the optional reconcile guardrail performs. Only ever raises
    /// capacity; a `W` that is already at or above `expected_free` is left
    /// alone (that direction of drift is not observed in practice and
    /// forgetting permits out from under in-flight holders is unsafe).
    pub fn reconcile_waiting_room(&self, expected_free: u64) {
        let available = self.available_seats() as u64;
        if expected_free > available {
            self.waiting_room.add_permits((expected_free - available) as usize);
        }
    }
}

static NEXT_ACTOR_ID: AtomicU32 = AtomicU32::new(1);

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
