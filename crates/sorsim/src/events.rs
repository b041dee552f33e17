// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event payloads carried between pipeline stages, plus the wire
//! grammar a log line renders to.

use tokio::sync::OwnedSemaphorePermit;

use crate::channel::Keyed;
use crate::model::{Patient, Role};

/// A patient in flight between two actors on `RegChan` / `TriageChan` /
/// `SpecChan[t]`.
///
/// Carries the waiting-room permits it holds. Whichever actor drops
/// `permits` without forwarding the record onward is the "decider" that
/// releases the patient's seats — ownership transfer, not a second
/// bookkeeping step, is what prevents capacity from leaking when an actor
/// forgets to release what it acquired.
pub struct Record {
    pub key: i64,
    pub patient: Patient,
    pub permits: Vec<OwnedSemaphorePermit>,
    pub extras: String,
}

impl Keyed for Record {
    fn key(&self) -> i64 {
        self.key
    }
}

/// A single `LogChan` entry.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub sim_minute: f64,
    pub pid: u32,
    pub metrics: Option<MetricsBlock>,
    pub role: Role,
    pub text: String,
}

impl Keyed for LogRecord {
    fn key(&self) -> i64 {
        // Logger applies no priority filter, so every record shares one
        // key and the channel behaves as plain FIFO.
        0
    }
}

/// Optional metrics block attached to a log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsBlock {
    pub w_inside: u64,
    pub w_capacity: u64,
    pub reg_q: i64,
    pub triage_q: i64,
    pub spec_q: i64,
    pub w_sem: i64,
    pub reg1_alive: bool,
    pub reg2_alive: bool,
    pub triage_alive: bool,
}

impl MetricsBlock {
    /// Renders
    /// `wR=<in>/<cap>;rQ=<n>;tQ=<n>;sQ=<n>;wSem=<n>;sSem=<n>;reg1=<0|1>;reg2=<0|1>;triage=<0|1>;`.
    ///
    /// `sSem` has no distinct meaning here — there is exactly one
    /// semaphore, W — so it mirrors `wSem` rather than inventing a second
    /// one (see DESIGN.md). The trailing three fields are the liveness
    /// report for Reg1/Reg2/Triage.
    pub fn render(&self) -> String {
        format!(
            "wR={}/{};rQ={};tQ={};sQ={};wSem={};sSem={};reg1={};reg2={};triage={};",
            self.w_inside,
            self.w_capacity,
            self.reg_q,
            self.triage_q,
            self.spec_q,
            self.w_sem,
            self.w_sem,
            self.reg1_alive as u8,
            self.reg2_alive as u8,
            self.triage_alive as u8,
        )
    }
}

impl LogRecord {
    /// Renders `<simMinute>;<pid>;[metrics;]<role>;<text>`.
    pub fn render(&self) -> String {
        match &self.metrics {
            Some(m) => {
                format!("{:.4};{};{}{};{}", self.sim_minute, self.pid, m.render(), self.role.as_str(), self.text)
            }
            None => format!("{:.4};{};{};{}", self.sim_minute, self.pid, self.role.as_str(), self.text),
        }
    }
}
