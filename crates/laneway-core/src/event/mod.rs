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

//! Type-erased publish/subscribe primitives for routing events by
//! `(EventId, DestinationId)` channel.
//!
//! A [`binding::Binding`] holds exactly one payload type's callback list and
//! pending-payload queue for a single channel. A [`binder::Binder`] is the
//! per-lane routing table from channel to binding. [`connect`] adapts member
//! function handlers of various arities into the uniform callback shape the
//! binder expects.

pub mod binder;
pub mod binding;
pub mod connect;
pub mod error;
pub mod types;

pub use binder::Binder;
pub use binding::Binding;
pub use error::EventError;
pub use types::{Channel, DestinationId, EventId, SenderId, TickData, Void, EA_FINISH};
