// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Owner of every Lane: spawns one thread per Lane, fans cross-lane emits
//! out, and runs the two-phase barrier shutdown protocol.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use laneway_core::{DestinationId, EventId, SenderId};

use crate::lane::{Lane, DRAIN_TICKS};

/// Owns every Lane registered against it, one OS thread each once started,
/// and coordinates cross-lane fan-out plus orderly shutdown.
pub struct Synchronizer {
    lanes: Mutex<Vec<Arc<Lane>>>,
    started: AtomicBool,
    finishing: Arc<AtomicBool>,
    finish_signal: (Mutex<bool>, Condvar),
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Synchronizer {
    /// Create an empty Synchronizer. Lanes register themselves via
    /// [`Lane::new`], which calls [`Synchronizer::add_lane`].
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            lanes: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
            finishing: Arc::new(AtomicBool::new(false)),
            finish_signal: (Mutex::new(false), Condvar::new()),
            handles: Mutex::new(Vec::new()),
        })
    }

    /// Register `lane`. The lane list is immutable once [`start`](Self::start) is called.
    pub fn add_lane(&self, lane: Arc<Lane>) {
        if self.started.load(Ordering::Acquire) {
            log::error!(
                "lane '{}' registered after start(); it will never run",
                lane.name()
            );
            return;
        }
        self.lanes.lock().expect("lanes poisoned").push(lane);
    }

    /// Whether the `finishing` flag has been raised; observed by every Lane
    /// loop on its next tick boundary.
    pub fn is_finishing(&self) -> bool {
        self.finishing.load(Ordering::Acquire)
    }

    /// Raise the `finishing` flag without blocking. Used internally when an
    /// EntryPoint failure must propagate shutdown to every sibling lane.
    pub(crate) fn request_finish(&self) {
        self.finishing.store(true, Ordering::Release);
    }

    /// Deliver `payload` to every Lane other than `source_id`'s own Binder.
    /// Never routes back to the originating lane.
    pub(crate) fn distribute_to_others<P>(
        &self,
        source_id: usize,
        id: EventId,
        dest: DestinationId,
        payload: P,
        sender: SenderId,
    ) where
        P: Clone + Send + 'static,
    {
        let lanes = self.lanes.lock().expect("lanes poisoned");
        for lane in lanes.iter().filter(|lane| lane.id() != source_id) {
            if let Err(err) = lane.emit_from_other(id, dest, payload.clone(), sender) {
                log::error!(
                    "cross-lane fan-out to '{}' rejected on channel ({id}, {dest}): {err}",
                    lane.name()
                );
            }
        }
    }

    /// Notify a blocked [`finish(true)`](Self::finish) caller that the
    /// conventional `EA_FINISH` event has been delivered.
    pub(crate) fn notify_external_finish(&self) {
        let (lock, condvar) = &self.finish_signal;
        *lock.lock().expect("finish signal poisoned") = true;
        condvar.notify_all();
    }

    /// Run every registered EntryPoint, then release all Lanes to begin
    /// ticking. Entry points and the first tick loop iteration are both run
    /// on each Lane's own spawned thread; `entry_barrier` (barrier #0)
    /// guarantees every EntryPoint has completed before any Lane ticks a
    /// user handler.
    pub fn start(self: &Arc<Self>) {
        self.started.store(true, Ordering::Release);

        let mut lanes = self.lanes.lock().expect("lanes poisoned").clone();
        lanes.sort_by_key(|lane| lane.rate_limit_group());

        let lane_count = lanes.len();
        if lane_count == 0 {
            return;
        }

        let entry_barrier = Arc::new(Barrier::new(lane_count));
        let drain_barriers: Arc<[Barrier]> =
            (0..DRAIN_TICKS).map(|_| Barrier::new(lane_count)).collect();

        let mut handles = self.handles.lock().expect("handles poisoned");
        for lane in lanes {
            let entry_barrier = entry_barrier.clone();
            let drain_barriers = drain_barriers.clone();
            let name = lane.name().to_string();
            let handle = thread::Builder::new()
                .name(name)
                .spawn(move || lane.run(entry_barrier, drain_barriers))
                .expect("failed to spawn lane thread");
            handles.push(handle);
        }
    }

    /// Begin the two-phase shutdown protocol.
    ///
    /// If `block_until_external` is true, block first until the
    /// conventional `EA_FINISH` event has been observed by some Lane, then
    /// raise `finishing` and join every Lane thread. Returns once every
    /// thread owned by this Synchronizer has exited.
    pub fn finish(&self, block_until_external: bool) {
        if block_until_external {
            let (lock, condvar) = &self.finish_signal;
            let mut signalled = lock.lock().expect("finish signal poisoned");
            while !*signalled {
                signalled = condvar.wait(signalled).expect("finish signal poisoned");
            }
        }

        self.finishing.store(true, Ordering::Release);

        let handles: Vec<JoinHandle<()>> =
            std::mem::take(&mut *self.handles.lock().expect("handles poisoned"));
        for handle in handles {
            if let Err(panic) = handle.join() {
                log::error!("lane thread panicked during shutdown: {panic:?}");
            }
        }
    }
}
