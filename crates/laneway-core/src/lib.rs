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

//! # Laneway Core
//!
//! Foundational crate containing the type-erased publish/subscribe primitives
//! that every Lane builds its tick loop around: [`Binding`], [`Binder`] and the
//! handler-signature adapters in [`event::connect`].

#![warn(missing_docs)]

pub mod event;

pub use event::binder::Binder;
pub use event::binding::Binding;
pub use event::error::EventError;
pub use event::types::{Channel, DestinationId, EventId, SenderId, TickData, Void, EA_FINISH};
