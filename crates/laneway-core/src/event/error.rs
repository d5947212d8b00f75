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

//! Error taxonomy for the event-dispatch path.

use crate::event::types::Channel;

/// Errors raised synchronously at the call site of an event-path operation.
///
/// `UnknownChannel` and invalidated-SubLane emits are deliberately not part
/// of this enum: both are silent no-ops by contract, not error conditions.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// An emit's runtime payload type did not match the type a channel was
    /// first registered with. Always indicates a structural bug at the call
    /// site; never swallowed.
    #[error("channel {channel:?} expected payload type {expected}, got {actual}")]
    IncompatibleType {
        /// The channel the mismatched emit targeted.
        channel: Channel,
        /// `std::any::type_name` of the type the channel was established with.
        expected: &'static str,
        /// `std::any::type_name` of the type actually supplied.
        actual: &'static str,
    },
}
