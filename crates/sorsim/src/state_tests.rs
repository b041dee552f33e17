// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::config::SimParams;

fn params(n: u64) -> SimParams {
    SimParams { waiting_room_capacity: n, ..SimParams::default() }
}

#[tokio::test]
async fn acquire_then_release_restores_capacity() -> anyhow::Result<()> {
    let state = SharedState::new(params(4));
    let stop = CancellationToken::new();

    let permits = state.acquire_seats(2, &stop).await.ok_or_else(|| anyhow::anyhow!("acquire failed"))?;
    assert_eq!(state.available_seats(), 2);
    assert_eq!(state.inner.lock().await.inside_waiting_room, 2);

    state.release_patient(2, permits).await;
    assert_eq!(state.available_seats(), 4);
    assert_eq!(state.inner.lock().await.inside_waiting_room, 0);
    Ok(())
}

#[tokio::test]
async fn two_person_acquire_blocks_on_single_free_seat() -> anyhow::Result<()> {
    let state = SharedState::new(params(2));
    let stop = CancellationToken::new();

    // Take one seat so only one remains free.
    let one = state.acquire_seats(1, &stop).await.ok_or_else(|| anyhow::anyhow!("acquire failed"))?;
    assert_eq!(state.available_seats(), 1);

    let state2 = Arc::clone(&state);
    let stop2 = stop.clone();
    let blocked = tokio::spawn(async move { state2.acquire_seats(2, &stop2).await });

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!blocked.is_finished(), "a 2-person acquire must not proceed on a single free seat");

    state.release_patient(1, one).await;
    let result = tokio::time::timeout(Duration::from_millis(200), blocked).await??;
    assert_eq!(result.map(|p| p.len()), Some(2));
    Ok(())
}

#[tokio::test]
async fn stop_cancels_a_blocked_acquire() -> anyhow::Result<()> {
    let state = SharedState::new(params(1));
    let stop = CancellationToken::new();
    let _holder = state.acquire_seats(1, &stop).await.ok_or_else(|| anyhow::anyhow!("acquire failed"))?;

    let state2 = Arc::clone(&state);
    let stop2 = stop.clone();
    let blocked = tokio::spawn(async move { state2.acquire_seats(1, &stop2).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    stop.cancel();
    let result = tokio::time::timeout(Duration::from_millis(200), blocked).await??;
    assert!(result.is_none(), "cancellation should abort the blocked acquire");
    Ok(())
}

proptest! {
    /// For any sequence of acquire/release batches that never exceeds
    /// capacity, `value(W) + insideWaitingRoom` must equal the fixed
    /// capacity `N` after every single acquire and every release.
    #[test]
    fn acquire_release_preserves_seat_invariant(batches in proptest::collection::vec(1u8..4, 1..20)) {
        let runtime = tokio::runtime::Runtime::new().map_err(|e| TestCaseError::fail(e.to_string()))?;
        runtime.block_on(async {
            let capacity = batches.iter().map(|&persons| persons as u64).sum::<u64>();
            let state = SharedState::new(params(capacity));
            let stop = CancellationToken::new();

            for &persons in &batches {
                let permits = match state.acquire_seats(persons, &stop).await {
                    Some(p) => p,
                    None => return Err(TestCaseError::fail("acquire unexpectedly blocked at sized capacity")),
                };
                let inside = state.inner.lock().await.inside_waiting_room;
                let available = state.available_seats() as u64;
                prop_assert_eq!(available + inside, capacity, "invariant broken right after acquire");

                state.release_patient(persons, permits).await;
                let inside = state.inner.lock().await.inside_waiting_room;
                let available = state.available_seats() as u64;
                prop_assert_eq!(available + inside, capacity, "invariant broken right after release");
            }
            Ok(())
        })?;
    }
}
