// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Priority channel abstraction: a bounded FIFO of keyed records that
//! supports "deliver the lowest key whose value is `<= K`" selective
//! receive, with FIFO ordering among equal keys.
//!
//! A priority heap guarded by a lock and a condition variable satisfies
//! that contract and is portable, which is exactly what this is: a
//! `BinaryHeap` behind a `tokio::sync::Mutex`, woken by a
//! `tokio::sync::Notify`. Sends are non-blocking; saturation is reported
//! to the caller, which owns the 1 ms retry discipline.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;

use tokio::sync::{Mutex, Notify};

/// Implemented by every record type carried on a [`PriorityChannel`].
/// Smaller keys are served first; equal keys are served FIFO.
pub trait Keyed {
    fn key(&self) -> i64;
}

struct Slot<T> {
    key: i64,
    seq: u64,
    value: T,
}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.seq == other.seq
    }
}

impl<T> Eq for Slot<T> {}

impl<T> PartialOrd for Slot<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Slot<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the lowest key first,
        // and the lowest seq (earliest arrival) first among equal keys.
        other.key.cmp(&self.key).then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Inner<T> {
    heap: BinaryHeap<Slot<T>>,
    next_seq: u64,
}

/// Outcome of a non-blocking send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrySendError {
    /// Channel at capacity; retryable.
    Full,
    /// Channel destroyed; permanent.
    Closed,
}

pub struct PriorityChannel<T> {
    inner: Mutex<Inner<T>>,
    notify: Notify,
    capacity: usize,
    closed: AtomicBool,
    len: AtomicUsize,
}

impl<T: Keyed> PriorityChannel<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner { heap: BinaryHeap::new(), next_seq: 0 }),
            notify: Notify::new(),
            capacity,
            closed: AtomicBool::new(false),
            len: AtomicUsize::new(0),
        }
    }

    /// Advisory channel depth, used for provisioning and monitor lines.
    pub fn len(&self) -> usize {
        self.len.load(AtomicOrdering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(AtomicOrdering::Relaxed)
    }

    /// Destroy the channel: pending and future receivers see `None`,
    /// pending and future senders see `Closed`.
    pub fn close(&self) {
        self.closed.store(true, AtomicOrdering::Relaxed);
        self.notify.notify_waiters();
    }

    /// Attempt one non-blocking send. On [`TrySendError::Full`] the value
    /// is handed back so the caller can retry without cloning.
    pub async fn try_send(&self, value: T) -> Result<(), (TrySendError, T)> {
        if self.is_closed() {
            return Err((TrySendError::Closed, value));
        }
        let mut inner = self.inner.lock().await;
        if inner.heap.len() >= self.capacity {
            return Err((TrySendError::Full, value));
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let key = value.key();
        inner.heap.push(Slot { key, seq, value });
        self.len.store(inner.heap.len(), AtomicOrdering::Relaxed);
        drop(inner);
        self.notify.notify_one();
        Ok(())
    }

    /// Non-blocking send with a fixed 1 ms backoff, retried indefinitely
    /// until it succeeds or the channel is destroyed. On permanent
    /// failure the value is handed back so the caller can still release
    /// any resources it carries.
    pub async fn send_with_retry(&self, value: T) -> Result<(), (TrySendError, T)> {
        let mut value = value;
        loop {
            match self.try_send(value).await {
                Ok(()) => return Ok(()),
                Err((TrySendError::Closed, v)) => return Err((TrySendError::Closed, v)),
                Err((TrySendError::Full, v)) => {
                    value = v;
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        }
    }

    /// Block until a record with `key <= max_key` is available, returning
    /// the lowest such key (FIFO among ties), or `None` once the channel is
    /// destroyed and drained.
    pub async fn recv_at_most(&self, max_key: i64) -> Option<T> {
        loop {
            let mut exhausted = false;
            {
                let mut inner = self.inner.lock().await;
                match inner.heap.pop() {
                    Some(slot) if slot.key <= max_key => {
                        self.len.store(inner.heap.len(), AtomicOrdering::Relaxed);
                        return Some(slot.value);
                    }
                    Some(slot) => {
                        // Lowest key present doesn't qualify yet; nothing
                        // else in the heap can, so put it back and wait.
                        inner.heap.push(slot);
                    }
                    None => {
                        if self.is_closed() {
                            exhausted = true;
                        }
                    }
                }
            }
            if exhausted {
                return None;
            }
            // `notify_one`/`notify_waiters` can race a fresh `notified()`
            // registration; a short poll interval is the safety net.
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = tokio::time::sleep(Duration::from_millis(25)) => {}
            }
        }
    }

    /// Block until a record whose key is exactly `key` is available. Not
    /// used by any built-in actor (all predicates here are "at most"), kept
    /// because both selection modes are useful independently of which
    /// one any particular receiver happens to use.
    pub async fn recv_exact(&self, key: i64) -> Option<T> {
        loop {
            let mut exhausted = false;
            {
                let mut inner = self.inner.lock().await;
                let mut rest = Vec::with_capacity(inner.heap.len());
                let mut found = None;
                while let Some(slot) = inner.heap.pop() {
                    if found.is_none() && slot.key == key {
                        found = Some(slot.value);
                    } else {
                        rest.push(slot);
                    }
                }
                for slot in rest {
                    inner.heap.push(slot);
                }
                self.len.store(inner.heap.len(), AtomicOrdering::Relaxed);
                if let Some(value) = found {
                    return Some(value);
                }
                if self.is_closed() {
                    exhausted = true;
                }
            }
            if exhausted {
                return None;
            }
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = tokio::time::sleep(Duration::from_millis(25)) => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
