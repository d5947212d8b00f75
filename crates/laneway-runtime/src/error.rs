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

//! Error taxonomy for lane lifecycle failures.

/// Errors that escalate through the shutdown path rather than being
/// contained at the call site.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// An [`EntryPoint`](crate::lane::EntryPoint) returned `Err` before tick
    /// 0. The owning lane is marked failed and skips its tick loop; shutdown
    /// is propagated to every sibling lane.
    #[error("entry point for lane '{lane}' failed: {source}")]
    EntryPointFailure {
        /// Name of the lane whose entry point failed.
        lane: String,
        /// The underlying failure.
        #[source]
        source: anyhow::Error,
    },
}
