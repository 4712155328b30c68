/*
 * SPDX-FileCopyrightText: Copyright (c) 2023 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: MIT
 *
 * Permission is hereby granted, free of charge, to any person obtaining a
 * copy of this software and associated documentation files (the "Software"),
 * to deal in the Software without restriction, including without limitation
 * the rights to use, copy, modify, merge, publish, distribute, sublicense,
 * and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
 * THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
 * FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
 * DEALINGS IN THE SOFTWARE.
 */
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Serializes workflows that target the same BMC operation. Each
/// `(endpoint, operation)` pair gets its own async mutex; different pairs
/// never wait on each other.
#[derive(Debug, Default, Clone)]
pub struct TargetLocks {
    locks: Arc<Mutex<KeyMap>>,
}

type KeyMap = HashMap<String, Arc<AsyncMutex<()>>>;

// Inserting or removing cannot leave the map half-updated, so poisoning is
// ignored.
fn lock_map(locks: &Mutex<KeyMap>) -> MutexGuard<'_, KeyMap> {
    locks.lock().unwrap_or_else(|e| e.into_inner())
}

/// Held for the duration of a workflow. Dropping it releases the key and
/// forgets it once nobody else holds or waits for it.
#[derive(Debug)]
pub struct TargetGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<Mutex<KeyMap>>,
}

impl TargetGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for TargetGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = lock_map(&self.locks);
        // Waiters hold a clone of the entry, so a count of one means the map
        // is the only owner left.
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
        debug!("Released lock {}", self.key);
    }
}

impl TargetLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = lock_map(&self.locks);
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Waits until no other guard holds `(endpoint, operation)`.
    pub async fn acquire(&self, endpoint: &str, operation: &str) -> TargetGuard {
        let key = format!("{endpoint}/{operation}");
        let lock = self.lock_for(&key);
        debug!("Acquiring lock {key}");
        let guard = lock.lock_owned().await;
        debug!("Acquired lock {key}");
        TargetGuard {
            key,
            guard: Some(guard),
            locks: self.locks.clone(),
        }
    }
}
