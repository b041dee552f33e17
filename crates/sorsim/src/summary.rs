// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Summary file writer: a deterministic plain-text snapshot of totals,
//! outcome counts, specialist identifiers, and Reg2 history, written once
//! at shutdown.

use std::path::Path;

use crate::state::SharedState;

pub async fn write(state: &SharedState, path: &Path) -> anyhow::Result<()> {
    let inner = state.inner.lock().await;
    let mut specialist_ids = Vec::with_capacity(state.specialists.len());
    for slot in &state.specialists {
        let id = slot.lock().await.as_ref().map(|h| h.id.to_string()).unwrap_or_else(|| "-".to_string());
        specialist_ids.push(id);
    }
    let reg2_history: Vec<String> = inner.reg2_history.iter().map(|id| id.to_string()).collect();

    let body = format!(
        "total_patients={total}\n\
         triage_red={red}\n\
         triage_yellow={yellow}\n\
         triage_green={green}\n\
         triage_sent_home={sent_home}\n\
         outcome_home={home}\n\
         outcome_ward={ward}\n\
         outcome_other={other}\n\
         inside_waiting_room={inside}\n\
         waiting_room_capacity={capacity}\n\
         specialists={specialists}\n\
         reg2_history={reg2_history}\n\
         elapsed={elapsed}\n",
        total = inner.counters.total_patients,
        red = inner.counters.triage_red,
        yellow = inner.counters.triage_yellow,
        green = inner.counters.triage_green,
        sent_home = inner.counters.triage_sent_home,
        home = inner.counters.outcome_home,
        ward = inner.counters.outcome_ward,
        other = inner.counters.outcome_other,
        inside = inner.inside_waiting_room,
        capacity = state.capacity,
        specialists = specialist_ids.join(","),
        reg2_history = reg2_history.join(","),
        elapsed = format_elapsed(state.sim_minutes_elapsed()),
    );

    std::fs::write(path, body).map_err(|e| anyhow::anyhow!("failed to write summary file {}: {e}", path.display()))
}

/// Renders elapsed simulated minutes as `d h m s`.
fn format_elapsed(total_minutes: f64) -> String {
    let total_seconds = (total_minutes.max(0.0) * 60.0).round() as u64;
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{days}d {hours}h {minutes}m {seconds}s")
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
