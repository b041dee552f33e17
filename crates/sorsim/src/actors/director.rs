// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Director: bootstraps every actor, runs the provisioning/leave-stimulus/
//! monitor control loops, and orchestrates cooperative shutdown.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::actors::{factory, logger, registration, specialist, triage};
use crate::events::LogRecord;
use crate::kernel::Kernel;
use crate::model::{Role, Specialist, SPECIALIST_COUNT};
use crate::state::ActorHandle;
use crate::summary;

/// Bootstrap the kernel's actors, run until a shutdown is triggered, then
/// dismantle everything and write the summary file.
pub async fn run(kernel: Arc<Kernel>, log_path: PathBuf, summary_path: PathBuf) -> anyhow::Result<()> {
    let director_id = kernel.state.director.id;

    let logger_kernel = Arc::clone(&kernel);
    let logger_path = log_path.clone();
    let logger_task = tokio::spawn(async move { logger::run(logger_kernel, &logger_path).await });

    kernel.log(director_id, Role::Director, "bootstrapped kernel".to_string()).await;

    let reg1_handle = ActorHandle::new(kernel.state.next_actor_id(), &kernel.state.shutdown);
    *kernel.state.reg1.lock().await = Some(reg1_handle.clone());
    let reg1_task = {
        let kernel = Arc::clone(&kernel);
        let handle = reg1_handle.clone();
        tokio::spawn(async move { registration::run(kernel, handle, Role::Reg1).await })
    };

    let triage_handle = ActorHandle::new(kernel.state.next_actor_id(), &kernel.state.shutdown);
    *kernel.state.triage.lock().await = Some(triage_handle.clone());
    let triage_task = {
        let kernel = Arc::clone(&kernel);
        let handle = triage_handle.clone();
        tokio::spawn(async move { triage::run(kernel, handle).await })
    };

    let factory_handle = ActorHandle::new(kernel.state.next_actor_id(), &kernel.state.shutdown);
    *kernel.state.patient_factory.lock().await = Some(factory_handle.clone());
    let factory_task = {
        let kernel = Arc::clone(&kernel);
        let handle = factory_handle.clone();
        tokio::spawn(async move { factory::run(kernel, handle).await })
    };

    let mut specialist_tasks = Vec::with_capacity(SPECIALIST_COUNT as usize);
    for idx in 0..SPECIALIST_COUNT {
        let handle = ActorHandle::new(kernel.state.next_actor_id(), &kernel.state.shutdown);
        *kernel.state.specialists[idx as usize].lock().await = Some(handle.clone());
        let kernel = Arc::clone(&kernel);
        let specialist = Specialist(idx);
        let task_handle = handle.clone();
        specialist_tasks.push(tokio::spawn(async move { specialist::run(kernel, task_handle, specialist).await }));
    }

    spawn_signal_handler(kernel.state.shutdown.clone());

    let provisioning_task = tokio::spawn(provisioning_loop(Arc::clone(&kernel)));
    let leave_stimulus_task = tokio::spawn(leave_stimulus_loop(Arc::clone(&kernel)));
    let monitor_task = tokio::spawn(monitor_loop(Arc::clone(&kernel)));

    wait_for_shutdown_trigger(&kernel).await;
    kernel.log(director_id, Role::Director, "shutdown triggered".to_string()).await;
    kernel.state.shutdown.cancel();

    leave_stimulus_task.abort();
    monitor_task.abort();

    let join_timeout = Duration::from_millis(kernel.state.params.shutdown_join_timeout_ms);
    // Joined rather than aborted: `provisioning_loop` still has its own
    // `close_reg2` cleanup to run on the cancellation path it just took,
    // and aborting here would race that cleanup and orphan Reg2.
    join_with_timeout(provisioning_task, join_timeout).await;
    join_with_timeout(reg1_task, join_timeout).await;
    join_with_timeout(triage_task, join_timeout).await;
    join_with_timeout(factory_task, join_timeout).await;
    for task in specialist_tasks {
        join_with_timeout(task, join_timeout).await;
    }

    summary::write(&kernel.state, &summary_path).await?;

    let sentinel = LogRecord {
        sim_minute: kernel.state.sim_minutes_elapsed(),
        pid: director_id,
        metrics: None,
        role: Role::Director,
        text: "END".to_string(),
    };
    let _ = kernel.channels.log.send_with_retry(sentinel).await;
    join_with_timeout(logger_task, join_timeout).await;

    Ok(())
}

async fn join_with_timeout(mut handle: tokio::task::JoinHandle<()>, timeout: Duration) {
    tokio::select! {
        _ = &mut handle => {}
        _ = tokio::time::sleep(timeout) => {
            handle.abort();
        }
    }
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();
        let mut sigusr1 = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::user_defined1()).ok();
        tokio::select! {
            _ = async {
                match sigint.as_mut() {
                    Some(s) => s.recv().await,
                    None => std::future::pending().await,
                }
            } => {
                tracing::info!("received SIGINT, shutting down");
            }
            _ = async {
                match sigusr1.as_mut() {
                    Some(s) => s.recv().await,
                    None => std::future::pending().await,
                }
            } => {
                tracing::info!("received SIGUSR1 (evacuation), shutting down");
            }
            _ = shutdown.cancelled() => {}
        }
        shutdown.cancel();
    });
}

async fn wait_for_shutdown_trigger(kernel: &Arc<Kernel>) {
    if kernel.state.params.duration_minutes == 0 {
        kernel.state.shutdown.cancelled().await;
        return;
    }
    loop {
        tokio::select! {
            _ = kernel.state.shutdown.cancelled() => return,
            _ = tokio::time::sleep(Duration::from_millis(200)) => {}
        }
        if kernel.state.duration_reached() {
            return;
        }
    }
}

/// Open Reg2 when the registration backlog reaches `K`, close it once it
/// drops below `N/3`. The gap between the two enforces hysteresis.
async fn provisioning_loop(kernel: Arc<Kernel>) {
    let mut reg2_task: Option<tokio::task::JoinHandle<()>> = None;
    let mut ticker = tokio::time::interval(Duration::from_millis(kernel.state.params.provisioning_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = kernel.state.shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let (reg_len, active) = {
            let inner = kernel.state.inner.lock().await;
            ((kernel.channels.registration.len() as i64).max(inner.registration_queue_len), inner.reg2_active)
        };

        if !active && reg_len >= kernel.state.params.open_threshold_k as i64 {
            let handle = ActorHandle::new(kernel.state.next_actor_id(), &kernel.state.shutdown);
            {
                let mut inner = kernel.state.inner.lock().await;
                inner.reg2_active = true;
                inner.reg2_history.push(handle.id);
            }
            *kernel.state.reg2.lock().await = Some(handle.clone());
            kernel.log(kernel.state.director.id, Role::Director, format!("opening reg2 id={}", handle.id)).await;
            let task_kernel = Arc::clone(&kernel);
            let task_handle = handle.clone();
            reg2_task = Some(tokio::spawn(async move { registration::run(task_kernel, task_handle, Role::Reg2).await }));
        } else if active && reg_len < kernel.state.params.close_threshold() as i64 {
            kernel.log(kernel.state.director.id, Role::Director, "closing reg2".to_string()).await;
            close_reg2(&kernel, &mut reg2_task).await;
        }
    }

    close_reg2(&kernel, &mut reg2_task).await;
}

async fn close_reg2(kernel: &Arc<Kernel>, reg2_task: &mut Option<tokio::task::JoinHandle<()>>) {
    if let Some(handle) = kernel.state.reg2.lock().await.take() {
        handle.stop.cancel();
    }
    if let Some(task) = reg2_task.take() {
        join_with_timeout(task, Duration::from_millis(kernel.state.params.shutdown_join_timeout_ms)).await;
    }
    let mut inner = kernel.state.inner.lock().await;
    inner.reg2_active = false;
}

/// Every tick, with a small probability, send one randomly chosen
/// specialist on temporary leave.
async fn leave_stimulus_loop(kernel: Arc<Kernel>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(kernel.state.params.leave_stimulus_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = kernel.state.shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }
        if kernel.rng.percent(kernel.state.params.leave_stimulus_probability_pct) {
            let target = kernel.rng.specialist();
            kernel.state.specialist_leave[target.index()].store(true, Ordering::Release);
            kernel
                .log(kernel.state.director.id, Role::Director, format!("stimulated temporary leave specialist={}", target.index()))
                .await;
        }
    }
}

/// Every few seconds, log a metrics snapshot and check `W` against its
/// expected value, optionally reconciling on drift.
async fn monitor_loop(kernel: Arc<Kernel>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(kernel.state.params.monitor_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = kernel.state.shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let (inside, w_sem) = {
            let inner = kernel.state.inner.lock().await;
            (inner.inside_waiting_room, kernel.state.available_seats() as u64)
        };
        let expected_free = kernel.state.capacity.saturating_sub(inside);
        let missing = expected_free as i64 - w_sem as i64;

        kernel.log_with_metrics(kernel.state.director.id, Role::Director, "monitor".to_string()).await;

        if missing > 0 {
            if kernel.state.params.reconcile_wait_sem {
                kernel.state.reconcile_waiting_room(expected_free);
                kernel
                    .log(
                        kernel.state.director.id,
                        Role::Director,
                        format!("ERROR MON RECONCILE missing={missing} expectedFree={expected_free} wSem={w_sem}"),
                    )
                    .await;
            } else {
                kernel
                    .log(
                        kernel.state.director.id,
                        Role::Director,
                        format!("W drift detected missing={missing} expectedFree={expected_free} wSem={w_sem}"),
                    )
                    .await;
            }
        }
    }
}

