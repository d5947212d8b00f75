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

//! Core identifiers and built-in payload types shared by every channel.

/// Identifies an event category. Reserved ranges are a convention of the
/// collaborating modules; the core treats this as an opaque key.
pub type EventId = u32;

/// The logical target of an event on a channel. `0` means "broadcast": all
/// handlers registered without a specific destination receive it.
pub type DestinationId = u64;

/// Identifies the source of an event. `0` means unspecified.
pub type SenderId = u64;

/// `(EventId, DestinationId)`: the unit of routing. Every handler and every
/// emitted payload belongs to exactly one channel.
pub type Channel = (EventId, DestinationId);

/// Broadcast destination: delivers to every handler registered on a channel
/// without a specific destination.
pub const BROADCAST: DestinationId = 0;

/// Unspecified sender.
pub const UNKNOWN_SENDER: SenderId = 0;

/// Zero-field payload for notifications that carry no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Void;

/// Payload delivered once per tick on a Lane's loop-hook channel.
///
/// Carries the wall-clock time elapsed since the previous tick began, not
/// the duration of work done during that tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickData {
    /// Wall-clock milliseconds since the previous tick.
    pub time_since_last_tick: u64,
}

/// Event id reserved for the conventional external-shutdown signal. Any Lane
/// may emit `Void` on `(EA_FINISH, BROADCAST)` to request orderly shutdown;
/// the Synchronizer treats its receipt as the external-finish signal when
/// `finish(true)` was requested.
pub const EA_FINISH: EventId = 1;

/// Event id reserved for a Lane's internal loop-hook channel.
pub const EA_TICK: EventId = 2;

/// First event id applications are free to use by convention.
pub const APPLICATION_EVENT_ID_BASE: EventId = 10_000;
