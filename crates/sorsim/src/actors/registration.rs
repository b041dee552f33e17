// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registration: one or two interchangeable instances dequeuing arrivals
//! (VIP first) and forwarding them to Triage.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::channel::TrySendError;
use crate::kernel::Kernel;
use crate::model::Role;
use crate::state::ActorHandle;

/// Run a Registration desk until stopped. `role` is `Reg1` or `Reg2` and
/// only affects the log tag — the behavior is identical, since either
/// instance competes for the same `RegChan`.
pub async fn run(kernel: Arc<Kernel>, handle: ActorHandle, role: Role) {
    let heartbeat_stop = handle.stop.child_token();
    let heartbeat = spawn_heartbeat(Arc::clone(&kernel), handle.id, role, heartbeat_stop.clone());

    loop {
        let received = tokio::select! {
            _ = handle.stop.cancelled() => None,
            record = kernel.channels.registration.recv_at_most(2) => record,
        };
        let Some(mut record) = received else { break };

        {
            let mut inner = kernel.state.inner.lock().await;
            if inner.registration_queue_len > 0 {
                inner.registration_queue_len -= 1;
            }
        }

        kernel.log(handle.id, role, format!("Registering id={}", record.patient.id)).await;
        kernel.sleep_configured(kernel.state.params.registration_service_ms).await;

        record.key = record.patient.arrival_key();
        let patient_id = record.patient.id;
        let persons = record.patient.persons_count;

        match kernel.channels.triage.send_with_retry(record).await {
            Ok(()) => {
                // Forwarded successfully: Triage (or a later stage) is
                // now the decider for this patient's seats, not Registration.
                kernel.log(handle.id, role, format!("Forwarded id={patient_id}")).await;
            }
            Err((TrySendError::Closed, dropped)) => {
                kernel.state.release_patient(persons, dropped.permits).await;
                kernel.log(handle.id, role, format!("Dropped id={patient_id}, channel destroyed")).await;
            }
            Err((TrySendError::Full, _)) => unreachable!("send_with_retry retries Full indefinitely"),
        }
    }

    heartbeat_stop.cancel();
    let _ = heartbeat.await;
}

fn spawn_heartbeat(
    kernel: Arc<Kernel>,
    pid: u32,
    role: Role,
    stop: tokio_util::sync::CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let interval_ms = kernel.state.params.registration_heartbeat_ms;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {}
            }
            kernel.log_with_metrics(pid, role, "heartbeat".to_string()).await;
        }
    })
}
