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

//! Deferred emit buffer for objects constructed before their SubLane exists.

use std::sync::Mutex;

use laneway_core::{DestinationId, EventId, SenderId};

use crate::sub_lane::SubLane;

/// Replays a single stored `(channel, payload, sender)` tuple through a
/// SubLane once it becomes available. Type-erased so heterogeneous payload
/// types can share one storage buffer.
trait StorageReplay: Send {
    fn replay(self: Box<Self>, sub_lane: &SubLane);
}

struct StoredEvent<P> {
    id: EventId,
    dest: DestinationId,
    payload: P,
    sender: SenderId,
}

impl<P: Clone + Send + 'static> StorageReplay for StoredEvent<P> {
    fn replay(self: Box<Self>, sub_lane: &SubLane) {
        if let Err(err) = sub_lane.emit(self.id, self.dest, self.payload, self.sender) {
            log::warn!(
                "EventStorage replay dropped mismatched payload on channel ({}, {}): {err}",
                self.id,
                self.dest
            );
        }
    }
}

/// A temporary buffer of `(channel, payload, sender)` tuples, recorded
/// during object construction before a SubLane is available, and replayed
/// later through that SubLane in arrival order via its full `emit` (local
/// delivery plus cross-lane fan-out).
pub struct EventStorage {
    entries: Mutex<Vec<Box<dyn StorageReplay>>>,
}

impl EventStorage {
    /// Create an empty storage buffer.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Record a `(channel, payload, sender)` tuple for later replay.
    pub fn store<P: Clone + Send + 'static>(
        &self,
        id: EventId,
        dest: DestinationId,
        payload: P,
        sender: SenderId,
    ) {
        self.entries
            .lock()
            .expect("event storage poisoned")
            .push(Box::new(StoredEvent {
                id,
                dest,
                payload,
                sender,
            }));
    }

    /// Replay every stored tuple onto `sub_lane`, in arrival order, draining
    /// this buffer. A type mismatch during replay is logged and the
    /// offending tuple is dropped; it is not fatal since the producer has
    /// already left scope.
    pub fn replay_into(&self, sub_lane: &SubLane) {
        let entries: Vec<Box<dyn StorageReplay>> = self
            .entries
            .lock()
            .expect("event storage poisoned")
            .drain(..)
            .collect();
        for entry in entries {
            entry.replay(sub_lane);
        }
    }

    /// Number of tuples currently buffered, for diagnostics and tests.
    pub fn pending_len(&self) -> usize {
        self.entries.lock().expect("event storage poisoned").len()
    }
}

impl Default for EventStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lane::{Lane, LaneConfig};
    use crate::synchronizer::Synchronizer;
    use std::sync::{Arc, Mutex as StdMutex};

    #[test]
    fn replay_delivers_in_arrival_order() {
        let sync = Synchronizer::new();
        let lane = Lane::new(&sync, LaneConfig::at_frequency(1000));
        let sub = lane.create_sub_lane();

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let seen_clone = seen.clone();
        sub.connect::<i32, _>(7, 0, move |payload, _| seen_clone.lock().unwrap().push(*payload));

        let storage = EventStorage::new();
        storage.store(7, 0, 1, 0);
        storage.store(7, 0, 2, 0);
        storage.store(7, 0, 3, 0);
        assert_eq!(storage.pending_len(), 3);

        storage.replay_into(&sub);
        assert_eq!(storage.pending_len(), 0);
        sub.tick();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }
}
