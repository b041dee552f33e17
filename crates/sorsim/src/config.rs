// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line surface and the simulation's own parameter set.
//!
//! The config *file* is a thin key=value/`#`-comment text format — a
//! deliberately minimal front-end, so this is the one ambient concern
//! that stays hand-rolled rather than reaching for a crate; everything
//! else (CLI parsing, env fallbacks) uses `clap::Parser` +
//! `#[command(flatten)]` + `#[command(subcommand)]`.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sorsim", version, about = "Emergency department pipeline simulator.")]
pub struct Cli {
    #[command(flatten)]
    pub primary: PrimaryArgs,

    #[command(subcommand)]
    pub mode: Option<Mode>,
}

/// Flags for the primary mode: run the whole simulation in this process.
#[derive(Debug, clap::Args)]
pub struct PrimaryArgs {
    /// Config file path (key=value text, `#` comments).
    #[arg(long = "config", env = "SORSIM_CONFIG")]
    pub config_path: Option<PathBuf>,

    /// Path the Logger actor appends simulation log lines to.
    #[arg(long, default_value = "sorsim.log", env = "SORSIM_LOG_PATH")]
    pub log_path: PathBuf,

    /// Path the summary file is written to at shutdown.
    #[arg(long, default_value = "sorsim-summary.txt", env = "SORSIM_SUMMARY_PATH")]
    pub summary_path: PathBuf,

    /// Overrides the config file's reconcile-guardrail toggle.
    #[arg(long, env = "SORSIM_RECONCILE_WAITSEM")]
    pub reconcile_wait_sem: Option<u8>,

    /// Operational (tracing) log level — distinct from the simulation log.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Operational (tracing) log format: `json` or `text`.
    #[arg(long, default_value = "json")]
    pub log_format: String,

    /// Positional `N K duration msPerMinute seed`, used when `--config`
    /// is not given.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub positional: Vec<String>,
}

/// Per-actor standalone sub-modes. Each bootstraps its own minimal
/// in-process kernel rather than attaching to another process's IPC
/// resources — see DESIGN.md for why.
#[derive(Debug, Subcommand)]
pub enum Mode {
    /// Run a standalone Logger actor.
    Logger {
        channel_id: String,
        path: PathBuf,
    },
    /// Run a standalone primary Registration desk.
    Registration {
        key_base: i64,
    },
    /// Run a standalone secondary Registration desk.
    Registration2 {
        key_base: i64,
    },
    /// Run a standalone Triage actor.
    Triage {
        key_base: i64,
    },
    /// Run a standalone Specialist actor.
    Specialist {
        key_base: i64,
        type_idx: u8,
    },
    /// Run a standalone PatientFactory.
    PatientGenerator {
        key_base: i64,
        n: u64,
        k: u64,
        duration: u64,
        ms_per_minute: u64,
        seed: u64,
        min: Option<u64>,
        max: Option<u64>,
    },
    /// Spawn a single standalone Patient actor.
    Patient {
        key_base: i64,
        id: u64,
        age: u8,
        vip: u8,
        guardian: u8,
        persons: u8,
    },
    /// Tail a log file and render it.
    Visualize {
        log_path: PathBuf,
        interval_ms: Option<u64>,
    },
}

/// The simulation's own parameters, resolved from either a config file
/// or the positional quintet, then env-overridden.
#[derive(Debug, Clone)]
pub struct SimParams {
    pub waiting_room_capacity: u64,
    pub open_threshold_k: u64,
    pub duration_minutes: u64,
    pub time_scale_ms_per_sim_minute: u64,
    pub seed: u64,
    pub registration_service_ms: u64,
    pub triage_service_ms: u64,
    pub specialist_exam_min_ms: u64,
    pub specialist_exam_max_ms: u64,
    pub specialist_leave_min_ms: u64,
    pub specialist_leave_max_ms: u64,
    pub patient_gen_min_ms: u64,
    pub patient_gen_max_ms: u64,
    pub render_interval_ms: u64,
    pub reconcile_wait_sem: bool,
    /// Supplemented configurability beyond the minimal quintet.
    pub send_home_probability_pct: u8,
    pub triage_red_pct: u8,
    pub triage_yellow_pct: u8,
    pub outcome_home_per_mille: u32,
    pub outcome_ward_per_mille: u32,
    pub vip_probability_pct: u8,
    pub channel_capacity: usize,
    pub patient_factory_child_cap: usize,
    pub monitor_interval_ms: u64,
    pub provisioning_interval_ms: u64,
    pub leave_stimulus_interval_ms: u64,
    pub leave_stimulus_probability_pct: u8,
    pub registration_heartbeat_ms: u64,
    pub shutdown_join_timeout_ms: u64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            waiting_room_capacity: 10,
            open_threshold_k: 0,
            duration_minutes: 0,
            time_scale_ms_per_sim_minute: 1000,
            seed: 12345,
            registration_service_ms: 200,
            triage_service_ms: 150,
            specialist_exam_min_ms: 500,
            specialist_exam_max_ms: 1500,
            specialist_leave_min_ms: 2000,
            specialist_leave_max_ms: 5000,
            patient_gen_min_ms: 100,
            patient_gen_max_ms: 400,
            render_interval_ms: 500,
            reconcile_wait_sem: false,
            send_home_probability_pct: 5,
            triage_red_pct: 10,
            triage_yellow_pct: 35,
            outcome_home_per_mille: 850,
            outcome_ward_per_mille: 995,
            vip_probability_pct: 10,
            channel_capacity: 4096,
            patient_factory_child_cap: 2000,
            monitor_interval_ms: 5000,
            provisioning_interval_ms: 100,
            leave_stimulus_interval_ms: 1000,
            leave_stimulus_probability_pct: 5,
            registration_heartbeat_ms: 5000,
            shutdown_join_timeout_ms: 5000,
        }
    }
}

impl SimParams {
    /// Validate after resolving from file/positional + env.
    pub fn validate(&mut self) -> anyhow::Result<()> {
        anyhow::ensure!(self.waiting_room_capacity > 0, "N_waitingRoom must be > 0");
        if self.open_threshold_k == 0 {
            self.open_threshold_k = (self.waiting_room_capacity / 2).max(1);
        }
        anyhow::ensure!(
            self.open_threshold_k >= self.waiting_room_capacity / 2,
            "K_registrationThreshold must be >= N/2"
        );
        anyhow::ensure!(self.time_scale_ms_per_sim_minute > 0, "timeScaleMsPerSimMinute must be > 0");
        anyhow::ensure!(self.render_interval_ms > 0, "visualizerRenderIntervalMs must be > 0");
        anyhow::ensure!(
            self.specialist_exam_min_ms <= self.specialist_exam_max_ms,
            "specialistExamMinMs must be <= specialistExamMaxMs"
        );
        anyhow::ensure!(
            self.specialist_leave_min_ms <= self.specialist_leave_max_ms,
            "specialistLeaveMinMs must be <= specialistLeaveMaxMs"
        );
        anyhow::ensure!(
            self.patient_gen_min_ms <= self.patient_gen_max_ms,
            "patientGenMinMs must be <= patientGenMaxMs"
        );
        anyhow::ensure!(
            self.triage_red_pct as u32 + self.triage_yellow_pct as u32 <= 100,
            "triage red+yellow percentages must not exceed 100"
        );
        anyhow::ensure!(self.send_home_probability_pct <= 100, "send-home probability must be a percentage");
        anyhow::ensure!(
            self.outcome_home_per_mille <= self.outcome_ward_per_mille && self.outcome_ward_per_mille <= 1000,
            "outcome thresholds must satisfy home <= ward <= 1000"
        );
        Ok(())
    }

    /// Open at `regLen >= K`; close at `regLen < N/3`. The gap between
    /// the two enforces hysteresis.
    pub fn close_threshold(&self) -> u64 {
        self.waiting_room_capacity / 3
    }
}

/// Parse the thin key=value config file.
pub fn load_config_file(path: &std::path::Path) -> anyhow::Result<SimParams> {
    let text = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
    let mut params = SimParams::default();

    for (lineno, raw_line) in text.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            anyhow::bail!("config line {} is not key=value: {raw_line}", lineno + 1);
        };
        let key = key.trim();
        let value = value.trim();
        apply_config_key(&mut params, key, value)
            .map_err(|e| anyhow::anyhow!("config line {}: {e}", lineno + 1))?;
    }

    Ok(params)
}

fn apply_config_key(params: &mut SimParams, key: &str, value: &str) -> anyhow::Result<()> {
    fn parse_u64(value: &str) -> anyhow::Result<u64> {
        value.parse().map_err(|_| anyhow::anyhow!("expected an integer, got {value:?}"))
    }
    fn parse_i64(value: &str) -> anyhow::Result<i64> {
        value.parse().map_err(|_| anyhow::anyhow!("expected an integer, got {value:?}"))
    }

    match key {
        "N_waitingRoom" => params.waiting_room_capacity = parse_u64(value)?,
        "K_registrationThreshold" => params.open_threshold_k = parse_u64(value)?,
        "simulationDurationMinutes" => {
            let v = parse_i64(value)?;
            params.duration_minutes = v.max(0) as u64;
        }
        "timeScaleMsPerSimMinute" => params.time_scale_ms_per_sim_minute = parse_u64(value)?,
        "randomSeed" => params.seed = parse_u64(value)?,
        "visualizerRenderIntervalMs" => params.render_interval_ms = parse_u64(value)?,
        "registrationServiceMs" => params.registration_service_ms = parse_u64(value)?,
        "triageServiceMs" => params.triage_service_ms = parse_u64(value)?,
        "specialistExamMinMs" => params.specialist_exam_min_ms = parse_u64(value)?,
        "specialistExamMaxMs" => params.specialist_exam_max_ms = parse_u64(value)?,
        "specialistLeaveMinMs" => params.specialist_leave_min_ms = parse_u64(value)?,
        "specialistLeaveMaxMs" => params.specialist_leave_max_ms = parse_u64(value)?,
        "patientGenMinMs" => params.patient_gen_min_ms = parse_u64(value)?,
        "patientGenMaxMs" => params.patient_gen_max_ms = parse_u64(value)?,
        "reconcileWaitSem" => params.reconcile_wait_sem = value != "0",
        other => anyhow::bail!("unrecognized config key {other:?}"),
    }
    Ok(())
}

impl PrimaryArgs {
    /// Resolve `SimParams` from `--config` or the positional quintet, then
    /// apply the `SORSIM_RECONCILE_WAITSEM` env override.
    pub fn resolve(&self) -> anyhow::Result<SimParams> {
        let mut params = if let Some(path) = &self.config_path {
            load_config_file(path)?
        } else {
            self.parse_positional()?
        };

        if let Some(flag) = self.reconcile_wait_sem {
            params.reconcile_wait_sem = flag != 0;
        }

        params.validate()?;
        Ok(params)
    }

    fn parse_positional(&self) -> anyhow::Result<SimParams> {
        anyhow::ensure!(
            self.positional.len() == 5,
            "expected positional `N K duration msPerMinute seed`, got {} argument(s)",
            self.positional.len()
        );
        let mut parsed = [0u64; 5];
        for (i, tok) in self.positional.iter().enumerate() {
            parsed[i] = tok.parse().map_err(|_| anyhow::anyhow!("positional argument {:?} is not an integer", tok))?;
        }
        Ok(SimParams {
            waiting_room_capacity: parsed[0],
            open_threshold_k: parsed[1],
            duration_minutes: parsed[2],
            time_scale_ms_per_sim_minute: parsed[3],
            seed: parsed[4],
            ..SimParams::default()
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
