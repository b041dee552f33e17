// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Triage: assigns a severity color, sometimes sends the patient home
//! directly, otherwise routes to a specialist queue.

use std::sync::Arc;

use crate::channel::TrySendError;
use crate::kernel::Kernel;
use crate::model::Role;
use crate::state::ActorHandle;

pub async fn run(kernel: Arc<Kernel>, handle: ActorHandle) {
    loop {
        let received = tokio::select! {
            _ = handle.stop.cancelled() => None,
            record = kernel.channels.triage.recv_at_most(2) => record,
        };
        let Some(mut record) = received else { break };

        kernel.sleep_configured(kernel.state.params.triage_service_ms).await;

        let patient_id = record.patient.id;
        let persons = record.patient.persons_count;

        if kernel.rng.percent(kernel.state.params.send_home_probability_pct) {
            {
                let mut inner = kernel.state.inner.lock().await;
                inner.counters.triage_sent_home += 1;
            }
            kernel.state.release_patient(persons, std::mem::take(&mut record.permits)).await;
            kernel.log(handle.id, Role::Triage, format!("Sent home from triage id={patient_id}")).await;
            continue;
        }

        let color = kernel.rng.triage_color(kernel.state.params.triage_red_pct, kernel.state.params.triage_yellow_pct);
        {
            let mut inner = kernel.state.inner.lock().await;
            match color {
                crate::model::TriageColor::Red => inner.counters.triage_red += 1,
                crate::model::TriageColor::Yellow => inner.counters.triage_yellow += 1,
                crate::model::TriageColor::Green => inner.counters.triage_green += 1,
            }
        }

        let target = kernel.rng.specialist();
        record.patient.triage_color = Some(color);
        record.patient.specialist_target = Some(target);
        record.key = record.patient.specialist_key().unwrap_or(target.key_base());

        kernel
            .log(handle.id, Role::Triage, format!("Assigned id={patient_id} color={color} specialist={}", target.index()))
            .await;

        match kernel.channels.specialists[target.index()].send_with_retry(record).await {
            Ok(()) => {}
            Err((TrySendError::Closed, dropped)) => {
                // Triage routed the patient but the destination is gone;
                // Triage is still the last actor to have touched it, so
                // it releases rather than leaking capacity.
                kernel.state.release_patient(persons, dropped.permits).await;
                kernel.log(handle.id, Role::Triage, format!("Dropped id={patient_id}, specialist channel destroyed")).await;
            }
            Err((TrySendError::Full, _)) => unreachable!("send_with_retry retries Full indefinitely"),
        }
    }
}
