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

//! A scoped, non-copyable child inbox of a Lane.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use laneway_core::event::binder::Binder;
use laneway_core::event::connect::{self, IntoCallback};
use laneway_core::{DestinationId, EventId, EventError, SenderId, Void};

use crate::lane::Lane;

/// A scoped inbox a component can create to receive events without
/// polluting its Lane's global registry.
///
/// Owns a private [`Binder`]. Its own connections disappear when the
/// SubLane is dropped, and it detaches safely from its parent Lane: once
/// [`invalidate_lane`](SubLane::invalidate_lane) runs, later emits become
/// silent no-ops instead of racing a parent that may already be tearing down.
pub struct SubLane {
    parent: Arc<Lane>,
    valid: AtomicBool,
    binder: Binder,
}

impl SubLane {
    pub(crate) fn new(parent: Arc<Lane>) -> Self {
        Self {
            parent,
            valid: AtomicBool::new(true),
            binder: Binder::new(),
        }
    }

    /// Register `callback` on `(id, dest)` of this SubLane's private Binder.
    pub fn connect<P, F>(&self, id: EventId, dest: DestinationId, callback: F)
    where
        P: Send + 'static,
        F: Fn(&P, SenderId) + Send + Sync + 'static,
    {
        self.binder.connect::<P, _>(id, dest, callback);
    }

    /// Register a payload-carrying handler method of `target` on `(id, dest)`
    /// of this SubLane's private Binder, deducing the payload type from the
    /// handler's own signature. Delegates to [`connect::connect`].
    pub fn connect_handler<T, P, F, Marker>(
        &self,
        id: EventId,
        dest: DestinationId,
        target: Arc<T>,
        handler: F,
    ) where
        T: Send + Sync + 'static,
        P: Send + 'static,
        F: IntoCallback<T, P, Marker> + 'static,
    {
        connect::connect(&self.binder, id, dest, target, handler);
    }

    /// Register a `Void`-payload handler method of `target` on `(id, dest)`
    /// of this SubLane's private Binder. Delegates to [`connect::connect_void`].
    pub fn connect_void_handler<T, F, Marker>(
        &self,
        id: EventId,
        dest: DestinationId,
        target: Arc<T>,
        handler: F,
    ) where
        T: Send + Sync + 'static,
        F: IntoCallback<T, Void, Marker> + 'static,
    {
        connect::connect_void(&self.binder, id, dest, target, handler);
    }

    /// Route through the parent Lane (local delivery plus cross-lane
    /// fan-out) and additionally deliver to this SubLane's private Binder.
    ///
    /// A no-op, without error, once the parent back-reference has been
    /// invalidated.
    pub fn emit<P>(
        &self,
        id: EventId,
        dest: DestinationId,
        payload: P,
        sender: SenderId,
    ) -> Result<(), EventError>
    where
        P: Clone + Send + 'static,
    {
        if !self.valid.load(Ordering::Acquire) {
            return Ok(());
        }
        self.parent.emit(id, dest, payload.clone(), sender)?;
        self.binder.emit(id, dest, payload, sender)
    }

    /// Deliver only to this SubLane's private Binder; never forwards to the
    /// parent and never fans out cross-lane.
    pub fn sub_emit<P>(
        &self,
        id: EventId,
        dest: DestinationId,
        payload: P,
        sender: SenderId,
    ) -> Result<(), EventError>
    where
        P: Send + 'static,
    {
        self.binder.emit(id, dest, payload, sender)
    }

    /// Drain only this SubLane's private Binder.
    pub fn tick(&self) {
        self.binder.tick();
    }

    /// Mark the parent back-reference dead. Safe to call from any thread;
    /// subsequent `emit` calls become silent no-ops.
    pub fn invalidate_lane(&self) {
        self.valid.store(false, Ordering::Release);
    }

    /// Whether the parent back-reference is still live.
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lane::LaneConfig;
    use crate::synchronizer::Synchronizer;
    use std::sync::Mutex as StdMutex;

    #[test]
    fn sub_emit_stays_local_and_does_not_touch_parent_binder() {
        let sync = Synchronizer::new();
        let lane = Lane::new(&sync, LaneConfig::at_frequency(1000));
        let sub = lane.create_sub_lane();

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let seen_clone = seen.clone();
        sub.connect::<i32, _>(5, 0, move |payload, _| seen_clone.lock().unwrap().push(*payload));

        sub.sub_emit::<i32>(5, 0, 42, 0).unwrap();
        sub.tick();

        assert_eq!(*seen.lock().unwrap(), vec![42]);
    }

    #[test]
    fn invalidated_sub_lane_emit_is_silent() {
        let sync = Synchronizer::new();
        let lane = Lane::new(&sync, LaneConfig::at_frequency(1000));
        let sub = lane.create_sub_lane();

        sub.invalidate_lane();
        assert!(!sub.is_valid());

        let result = sub.emit::<i32>(5, 0, 42, 0);
        assert!(result.is_ok());
    }
}
