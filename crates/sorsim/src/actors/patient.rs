// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Patient actor: acquires waiting-room slots and hands the patient
//! off to Registration, then exits.

use std::sync::Arc;

use crate::channel::TrySendError;
use crate::events::Record;
use crate::kernel::Kernel;
use crate::model::{Patient, Role};
use crate::state::ActorHandle;

/// Run one Patient actor to completion: acquire → enqueue → exit.
///
/// On a successful handoff, the seats travel onward inside the `Record`
/// and a downstream actor becomes the decider (registration drop, triage
/// send-home, or specialist disposition). If the handoff itself fails,
/// this actor is the decider and releases the seats itself.
pub async fn run(kernel: Arc<Kernel>, handle: ActorHandle, patient: Patient) {
    kernel.log(handle.id, Role::Patient, format!("waiting to enter waiting room id={}", patient.id)).await;

    let guardian_stop = handle.stop.child_token();
    let guardian_task = patient.has_guardian.then(|| {
        let kernel = Arc::clone(&kernel);
        let pid = handle.id;
        let stop = guardian_stop.clone();
        tokio::spawn(async move { run_guardian(kernel, pid, stop).await })
    });

    let Some(permits) = kernel.state.acquire_seats(patient.persons_count, &handle.stop).await else {
        kernel.log(handle.id, Role::Patient, format!("id={} stopped before entering", patient.id)).await;
        guardian_stop.cancel();
        return;
    };

    kernel
        .log(
            handle.id,
            Role::Patient,
            format!(
                "Patient arrived id={} age={} vip={} guardian={} persons={}",
                patient.id, patient.age, patient.vip as u8, patient.has_guardian as u8, patient.persons_count
            ),
        )
        .await;

    let key = patient.arrival_key();
    let record = Record { key, patient: patient.clone(), permits, extras: String::new() };

    match kernel.channels.registration.send_with_retry(record).await {
        Ok(()) => {
            kernel.log(handle.id, Role::Patient, format!("Patient registered id={}", patient.id)).await;
        }
        Err((TrySendError::Closed, dropped)) => {
            kernel
                .log(handle.id, Role::Patient, format!("id={} channel destroyed before registration", patient.id))
                .await;
            kernel.state.release_patient(dropped.patient.persons_count, dropped.permits).await;
        }
        Err((TrySendError::Full, _)) => unreachable!("send_with_retry retries Full indefinitely"),
    }

    guardian_stop.cancel();
    if let Some(task) = guardian_task {
        let _ = task.await;
    }
}

/// Observability-only child: logs presence and sleeps until stopped. It
/// never touches the waiting-room semaphore — the guardian's seat was
/// already accounted for in the parent's `persons_count`.
async fn run_guardian(kernel: Arc<Kernel>, pid: u32, stop: tokio_util::sync::CancellationToken) {
    kernel.log(pid, Role::Patient, "guardian present".to_string()).await;
    stop.cancelled().await;
    kernel.log(pid, Role::Patient, "guardian departed".to_string()).await;
}
