// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PatientFactory: emits Patient actors at scaled intervals, backpressured
//! by a child cap.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::actors::patient;
use crate::kernel::Kernel;
use crate::model::{Patient, Role};
use crate::state::ActorHandle;

pub async fn run(kernel: Arc<Kernel>, handle: ActorHandle) {
    let mut children: JoinSet<()> = JoinSet::new();
    let mut next_id: u64 = 1;
    let cap = kernel.state.params.patient_factory_child_cap;

    loop {
        while children.try_join_next().is_some() {}

        if handle.stop.is_cancelled() || kernel.state.duration_reached() {
            break;
        }

        if children.len() >= cap {
            tokio::select! {
                _ = handle.stop.cancelled() => break,
                _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            }
            continue;
        }

        let age = kernel.rng.patient_age();
        let vip = kernel.rng.is_vip(kernel.state.params.vip_probability_pct);
        let patient = Patient::new(next_id, age, vip);
        next_id += 1;

        let child_handle = ActorHandle::new(kernel.state.next_actor_id(), &handle.stop);
        let child_kernel = Arc::clone(&kernel);
        children.spawn(async move { patient::run(child_kernel, child_handle, patient).await });

        let lo = kernel.state.params.patient_gen_min_ms;
        let hi = kernel.state.params.patient_gen_max_ms;
        let sleep_ms = kernel.rng.duration_ms(lo, hi);
        tokio::select! {
            _ = handle.stop.cancelled() => break,
            _ = kernel.sleep_configured(sleep_ms) => {}
        }
    }

    kernel.log(handle.id, Role::PatientGen, "stopping, joining outstanding patients".to_string()).await;
    // Cancelling propagates to every spawned child through its token,
    // which is a child of `handle.stop`.
    while children.join_next().await.is_some() {}
}
