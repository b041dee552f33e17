// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specialist: one instance per specialty type, dequeuing in severity
//! order, recording a disposition, and releasing the patient's seats.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::kernel::Kernel;
use crate::model::{Outcome, Role, Specialist};
use crate::state::ActorHandle;

pub async fn run(kernel: Arc<Kernel>, handle: ActorHandle, specialist: Specialist) {
    loop {
        if kernel.state.specialist_leave[specialist.index()].swap(false, Ordering::AcqRel) {
            let lo = kernel.state.params.specialist_leave_min_ms;
            let hi = kernel.state.params.specialist_leave_max_ms;
            let leave_ms = kernel.rng.duration_ms(lo, hi);
            kernel.log(handle.id, Role::Specialist, format!("type={} on temporary leave", specialist.index())).await;
            tokio::select! {
                _ = handle.stop.cancelled() => break,
                _ = kernel.sleep_configured(leave_ms) => {}
            }
            kernel.log(handle.id, Role::Specialist, format!("type={} resumed", specialist.index())).await;
        }

        let received = tokio::select! {
            _ = handle.stop.cancelled() => None,
            record = kernel.channels.specialists[specialist.index()].recv_at_most(specialist.max_key()) => record,
        };
        let Some(record) = received else { break };

        let patient_id = record.patient.id;
        let persons = record.patient.persons_count;

        kernel
            .log(handle.id, Role::Specialist, format!("Received patient id={patient_id} type={}", specialist.index()))
            .await;

        let lo = kernel.state.params.specialist_exam_min_ms;
        let hi = kernel.state.params.specialist_exam_max_ms;
        let exam_ms = kernel.rng.duration_ms(lo, hi);
        kernel.sleep_configured(exam_ms).await;

        let outcome =
            kernel.rng.outcome(kernel.state.params.outcome_home_per_mille, kernel.state.params.outcome_ward_per_mille);
        {
            let mut inner = kernel.state.inner.lock().await;
            match outcome {
                Outcome::Home => inner.counters.outcome_home += 1,
                Outcome::Ward => inner.counters.outcome_ward += 1,
                Outcome::Other => inner.counters.outcome_other += 1,
            }
        }

        kernel.state.release_patient(persons, record.permits).await;
        kernel
            .log(
                handle.id,
                Role::Specialist,
                format!("Handled patient id={patient_id} outcome={}", outcome.as_str()),
            )
            .await;
    }
}
