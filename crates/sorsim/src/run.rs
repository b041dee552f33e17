// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entry points for the primary mode and each standalone sub-mode. Every
//! sub-mode bootstraps its own in-process kernel rather than attaching to
//! another process's channels — there is no cross-process shared memory
//! in this implementation (see DESIGN.md).

use std::path::PathBuf;
use std::sync::Arc;

use crate::actors::{director, factory, registration, specialist, triage};
use crate::config::SimParams;
use crate::kernel::Kernel;
use crate::model::{Patient, Role, Specialist};
use crate::state::ActorHandle;

/// Run the full simulation: bootstrap the kernel and hand off to Director.
pub async fn run_primary(params: SimParams, log_path: PathBuf, summary_path: PathBuf) -> anyhow::Result<()> {
    let kernel = Kernel::new(params);
    director::run(kernel, log_path, summary_path).await
}

/// Spawns `fut` as a task and waits for it to finish on its own, or for
/// `Ctrl-C`, in which case `stop` is cancelled and the task is still
/// awaited so it can exit its loop cleanly rather than being dropped
/// mid-iteration.
async fn run_until_ctrl_c<F>(stop: tokio_util::sync::CancellationToken, fut: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let mut task = tokio::spawn(fut);
    tokio::select! {
        _ = &mut task => {}
        _ = tokio::signal::ctrl_c() => {
            stop.cancel();
            let _ = task.await;
        }
    }
}

/// Standalone Logger sub-mode: drains whatever reaches its own, otherwise
/// empty, `LogChan` and appends to `path` until `Ctrl-C`.
pub async fn run_logger_mode(_channel_id: String, path: PathBuf) -> anyhow::Result<()> {
    let kernel = Kernel::new(SimParams::default());
    let task_kernel = Arc::clone(&kernel);
    let task = tokio::spawn(async move { crate::actors::logger::run(task_kernel, &path).await });

    let _ = tokio::signal::ctrl_c().await;
    kernel.channels.log.close();

    task.await.map_err(|e| anyhow::anyhow!("logger task panicked: {e}"))?
}

/// Standalone Registration desk (primary or secondary) with no upstream
/// PatientFactory or downstream Triage — runs idle until `Ctrl-C`.
pub async fn run_registration_mode(key_base: i64, role: Role) -> anyhow::Result<()> {
    let kernel = Kernel::new(SimParams::default());
    let handle = ActorHandle::new(key_base as u32, &kernel.state.shutdown);
    let stop = kernel.state.shutdown.clone();
    run_until_ctrl_c(stop, registration::run(Arc::clone(&kernel), handle, role)).await;
    Ok(())
}

pub async fn run_triage_mode(key_base: i64) -> anyhow::Result<()> {
    let kernel = Kernel::new(SimParams::default());
    let handle = ActorHandle::new(key_base as u32, &kernel.state.shutdown);
    let stop = kernel.state.shutdown.clone();
    run_until_ctrl_c(stop, triage::run(Arc::clone(&kernel), handle)).await;
    Ok(())
}

pub async fn run_specialist_mode(key_base: i64, type_idx: u8) -> anyhow::Result<()> {
    anyhow::ensure!(type_idx < crate::model::SPECIALIST_COUNT, "specialist type must be 0..6");
    let kernel = Kernel::new(SimParams::default());
    let handle = ActorHandle::new(key_base as u32, &kernel.state.shutdown);
    let stop = kernel.state.shutdown.clone();
    run_until_ctrl_c(stop, specialist::run(Arc::clone(&kernel), handle, Specialist(type_idx))).await;
    Ok(())
}

/// Standalone PatientFactory, parameterized directly from the sub-mode's
/// own arguments rather than a config file.
#[allow(clippy::too_many_arguments)]
pub async fn run_patient_generator_mode(
    key_base: i64,
    n: u64,
    k: u64,
    duration: u64,
    ms_per_minute: u64,
    seed: u64,
    min: Option<u64>,
    max: Option<u64>,
) -> anyhow::Result<()> {
    let mut params = SimParams {
        waiting_room_capacity: n,
        open_threshold_k: k,
        duration_minutes: duration,
        time_scale_ms_per_sim_minute: ms_per_minute,
        seed,
        ..SimParams::default()
    };
    if let Some(min) = min {
        params.patient_gen_min_ms = min;
    }
    if let Some(max) = max {
        params.patient_gen_max_ms = max;
    }
    params.validate()?;

    let kernel = Kernel::new(params);
    let handle = ActorHandle::new(key_base as u32, &kernel.state.shutdown);
    let stop = kernel.state.shutdown.clone();
    run_until_ctrl_c(stop, factory::run(Arc::clone(&kernel), handle)).await;
    Ok(())
}

/// Spawns a single standalone Patient actor with explicit fields and
/// waits for it to either hand off to Registration or exit on stop.
#[allow(clippy::too_many_arguments)]
pub async fn run_patient_mode(
    key_base: i64,
    id: u64,
    age: u8,
    vip: bool,
    guardian: bool,
    persons: u8,
) -> anyhow::Result<()> {
    let kernel = Kernel::new(SimParams::default());
    let handle = ActorHandle::new(key_base as u32, &kernel.state.shutdown);
    let patient = Patient::explicit(id, age, vip, guardian, persons);
    crate::actors::patient::run(kernel, handle, patient).await;
    Ok(())
}

pub async fn run_visualize_mode(log_path: PathBuf, interval_ms: u64) -> anyhow::Result<()> {
    crate::visualize::run(&log_path, interval_ms).await
}
