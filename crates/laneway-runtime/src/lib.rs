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

//! # Laneway Runtime
//!
//! The tick-driven, thread-per-lane executor built on top of
//! `laneway_core`'s type-erased binder. A [`Synchronizer`] owns a set of
//! [`Lane`]s, one OS thread each, fans cross-lane emits out to every other
//! lane, and runs the two-phase barrier shutdown protocol.

#![warn(missing_docs)]

pub mod error;
pub mod event_storage;
pub mod lane;
pub mod sub_lane;
pub mod synchronizer;

pub use error::RuntimeError;
pub use event_storage::EventStorage;
pub use lane::{EntryPoint, Lane, LaneConfig, LaneState, RateLimitGroup};
pub use sub_lane::SubLane;
pub use synchronizer::Synchronizer;
