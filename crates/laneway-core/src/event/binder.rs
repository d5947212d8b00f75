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

//! Routing table from [`Channel`] to [`Binding`].

use std::any::type_name;
use std::sync::Mutex;

use indexmap::IndexMap;

use crate::event::binding::{Binding, ErasedBinding};
use crate::event::error::EventError;
use crate::event::types::{Channel, DestinationId, EventId, SenderId};

/// Maps `(EventId, DestinationId)` channels to their [`Binding`], in
/// insertion order.
///
/// `tick()` iterates bindings in the order their channel was first connected
/// to, not sorted by key, so downstream handler ordering is stable across
/// runs that register channels in the same sequence.
pub struct Binder {
    bindings: Mutex<IndexMap<Channel, Box<dyn ErasedBinding>>>,
}

impl Binder {
    /// Create an empty binder.
    pub fn new() -> Self {
        Self {
            bindings: Mutex::new(IndexMap::new()),
        }
    }

    /// Register `callback` on `(id, dest)` for payload type `P`.
    ///
    /// Creates a `Binding<P>` on first use of the channel. A later connect
    /// to the same channel with a different `P` is a programmer error that
    /// is not detected here; it surfaces as `IncompatibleType` on the first
    /// mismatching emit, per the error taxonomy.
    pub fn connect<P, F>(&self, id: EventId, dest: DestinationId, callback: F)
    where
        P: Send + 'static,
        F: Fn(&P, SenderId) + Send + Sync + 'static,
    {
        let channel = (id, dest);
        let mut bindings = self.bindings.lock().expect("binder poisoned");
        let erased = bindings
            .entry(channel)
            .or_insert_with(|| Box::new(Binding::<P>::new(channel)));
        match erased.as_any().downcast_ref::<Binding<P>>() {
            Some(binding) => binding.connect(callback),
            None => log::error!(
                "connect to channel {channel:?} used payload type {} but it was \
                 already established as {}; handler was not registered",
                type_name::<P>(),
                erased.payload_type_name()
            ),
        }
    }

    /// Emit `payload` on `(id, dest)`.
    ///
    /// A missing channel is silently ignored: an emit without subscribers is
    /// valid. A channel whose established payload type differs from `P`
    /// raises [`EventError::IncompatibleType`].
    pub fn emit<P: Send + 'static>(
        &self,
        id: EventId,
        dest: DestinationId,
        payload: P,
        sender: SenderId,
    ) -> Result<(), EventError> {
        let channel = (id, dest);
        let bindings = self.bindings.lock().expect("binder poisoned");
        let Some(erased) = bindings.get(&channel) else {
            return Ok(());
        };
        match erased.as_any().downcast_ref::<Binding<P>>() {
            Some(binding) => {
                binding.emit(payload, sender);
                Ok(())
            }
            None => Err(EventError::IncompatibleType {
                channel,
                expected: erased.payload_type_name(),
                actual: type_name::<P>(),
            }),
        }
    }

    /// Drain every binding once, in insertion-stable order.
    pub fn tick(&self) {
        let bindings = self.bindings.lock().expect("binder poisoned");
        for binding in bindings.values() {
            binding.call();
        }
    }

    /// Number of distinct channels registered, for diagnostics and tests.
    pub fn channel_count(&self) -> usize {
        self.bindings.lock().expect("binder poisoned").len()
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}
