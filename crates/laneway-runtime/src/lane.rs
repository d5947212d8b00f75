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

//! A single-threaded, tick-driven executor for one thematic responsibility.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex, Weak};
use std::thread;
use std::time::{Duration, Instant};

use laneway_core::event::binder::Binder;
use laneway_core::event::binding::{Binding, ErasedBinding};
use laneway_core::event::connect::{self, IntoCallback};
use laneway_core::{DestinationId, EventId, EventError, SenderId, TickData, Void};
use laneway_core::event::types::{BROADCAST, EA_FINISH, EA_TICK, UNKNOWN_SENDER};

use crate::error::RuntimeError;
use crate::sub_lane::SubLane;
use crate::synchronizer::Synchronizer;

/// Bounded number of extra barriered ticks run after `finishing` is observed,
/// so in-flight cross-lane emits have time to reach their destinations.
/// One hop per tick suffices for any chain of at most this many hand-offs.
pub const DRAIN_TICKS: usize = 10;

/// A Lane's purely-informational start-order tie-break tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RateLimitGroup {
    /// Highest-priority tie-break group.
    Rl1,
    /// Second tie-break group.
    Rl2,
    /// Third tie-break group.
    Rl3,
    /// Lowest-priority tie-break group.
    Rl4,
}

/// Lane construction options.
#[derive(Debug, Clone)]
pub struct LaneConfig {
    /// Target tick frequency. Determines the tick budget as `1000 / frequency_hz` ms.
    pub frequency_hz: u32,
    /// Name used for diagnostics and thread naming.
    pub name: Option<String>,
    /// Informational start-order tie-break tag.
    pub rate_limit_group: Option<RateLimitGroup>,
}

impl LaneConfig {
    /// A lane config at the given frequency with no name or rate-limit group.
    pub fn at_frequency(frequency_hz: u32) -> Self {
        Self {
            frequency_hz,
            name: None,
            rate_limit_group: None,
        }
    }

    /// Set the diagnostic name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the start-order tie-break group.
    pub fn rate_limit_group(mut self, group: RateLimitGroup) -> Self {
        self.rate_limit_group = Some(group);
        self
    }
}

/// A one-shot initialization callback that runs on a Lane's own thread,
/// exactly once, before tick 0. Used for thread-affine resource acquisition
/// (render contexts, sockets, files) that must be owned by the thread that
/// will keep using it.
pub type EntryPoint = Box<dyn FnOnce(&Lane) -> anyhow::Result<()> + Send>;

/// Externally observable lifecycle state of a Lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneState {
    /// Registered with a Synchronizer but not yet started.
    Constructed,
    /// Thread owned by the Synchronizer is running the tick loop.
    Running,
    /// The Synchronizer has set the stop flag; the lane is in or about to
    /// enter the bounded drain phase.
    Finishing,
    /// The lane's entry point failed; it never entered the tick loop.
    Failed,
}

/// A tick-driven executor hosting one thematic responsibility (view,
/// physics, networking, ...). Owns a [`Binder`], a dedicated loop-hook
/// binding, and the [`SubLane`]s created against it.
pub struct Lane {
    id: usize,
    name: String,
    tick_budget: Duration,
    rate_limit_group: Option<RateLimitGroup>,
    synchronizer: Weak<Synchronizer>,
    binder: Binder,
    loop_hook: Binding<TickData>,
    last_tick_start: Mutex<Instant>,
    sub_lanes: Mutex<Vec<Weak<SubLane>>>,
    entry_point: Mutex<Option<EntryPoint>>,
    failure: Mutex<Option<Arc<RuntimeError>>>,
    failed: AtomicBool,
    finishing: AtomicBool,
    running: AtomicBool,
}

static NEXT_LANE_ID: AtomicUsize = AtomicUsize::new(0);

impl Lane {
    /// Construct a Lane and register it with `synchronizer`.
    ///
    /// The Lane does not begin ticking until `synchronizer.start()` is
    /// called; construction only reserves its slot and id.
    pub fn new(synchronizer: &Arc<Synchronizer>, config: LaneConfig) -> Arc<Self> {
        let id = NEXT_LANE_ID.fetch_add(1, Ordering::Relaxed);
        let name = config
            .name
            .unwrap_or_else(|| format!("lane-{id}"));
        let tick_budget = Duration::from_millis(1000 / config.frequency_hz.max(1) as u64);

        let lane = Arc::new(Self {
            id,
            name,
            tick_budget,
            rate_limit_group: config.rate_limit_group,
            synchronizer: Arc::downgrade(synchronizer),
            binder: Binder::new(),
            loop_hook: Binding::new((EA_TICK, BROADCAST)),
            last_tick_start: Mutex::new(Instant::now()),
            sub_lanes: Mutex::new(Vec::new()),
            entry_point: Mutex::new(None),
            failure: Mutex::new(None),
            failed: AtomicBool::new(false),
            finishing: AtomicBool::new(false),
            running: AtomicBool::new(false),
        });

        lane.install_finish_handler();
        synchronizer.add_lane(lane.clone());
        lane
    }

    /// Registers the conventional `(EA_FINISH, BROADCAST)` handler that
    /// notifies the owning Synchronizer's condvar, so
    /// `Synchronizer::finish(block_until_external = true)` can block on it.
    fn install_finish_handler(&self) {
        let synchronizer = self.synchronizer.clone();
        self.binder
            .connect::<Void, _>(EA_FINISH, BROADCAST, move |_payload, _sender| {
                if let Some(sync) = synchronizer.upgrade() {
                    sync.notify_external_finish();
                }
            });
    }

    /// Opaque identity assigned at construction; stable for the Lane's lifetime.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start-order tie-break tag, if any.
    pub fn rate_limit_group(&self) -> Option<RateLimitGroup> {
        self.rate_limit_group
    }

    /// Current externally-observable lifecycle state.
    pub fn state(&self) -> LaneState {
        if self.failed.load(Ordering::Acquire) {
            LaneState::Failed
        } else if self.finishing.load(Ordering::Acquire) {
            LaneState::Finishing
        } else if self.running.load(Ordering::Acquire) {
            LaneState::Running
        } else {
            LaneState::Constructed
        }
    }

    /// Register the one-shot entry point run before tick 0 on this Lane's thread.
    pub fn set_entry_point(&self, entry: EntryPoint) {
        *self.entry_point.lock().expect("entry point poisoned") = Some(entry);
    }

    /// The error that put this Lane into [`LaneState::Failed`], if any.
    pub fn failure(&self) -> Option<Arc<RuntimeError>> {
        self.failure.lock().expect("failure poisoned").clone()
    }

    /// Register `callback` on `(id, dest)` for payload type `P`.
    pub fn connect<P, F>(&self, id: EventId, dest: DestinationId, callback: F)
    where
        P: Send + 'static,
        F: Fn(&P, SenderId) + Send + Sync + 'static,
    {
        self.binder.connect::<P, _>(id, dest, callback);
    }

    /// Register a payload-carrying handler method of `target` on `(id, dest)`,
    /// deducing the payload type from the handler's own signature. Accepts
    /// `Fn(&T, &P)` and `Fn(&T, &P, SenderId)` methods; delegates to
    /// [`connect::connect`].
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

    /// Register a `Void`-payload handler method of `target` on `(id, dest)`.
    /// Accepts `Fn(&T)` and `Fn(&T, SenderId)` methods; delegates to
    /// [`connect::connect_void`].
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

    /// Register `callback` to run exactly once per tick with the tick's
    /// [`TickData`].
    pub fn connect_loop<F>(&self, callback: F)
    where
        F: Fn(&TickData, SenderId) + Send + Sync + 'static,
    {
        self.loop_hook.connect(callback);
    }

    /// Deliver locally via this Lane's Binder, then fan out to every other
    /// Lane owned by the same Synchronizer.
    ///
    /// Fan-out requires `P: Clone`: the Synchronizer must hand an
    /// independent copy of the payload to each of the other lanes.
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
        self.binder.emit(id, dest, payload.clone(), sender)?;
        if let Some(sync) = self.synchronizer.upgrade() {
            sync.distribute_to_others(self.id, id, dest, payload, sender);
        }
        Ok(())
    }

    /// Enqueue into this Lane's own Binder only. Used by the Synchronizer as
    /// the receiving side of cross-lane distribution; never fans out further.
    pub fn emit_from_other<P>(
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

    /// Create a scoped child inbox bound to this Lane.
    pub fn create_sub_lane(self: &Arc<Self>) -> Arc<SubLane> {
        let sub_lane = Arc::new(SubLane::new(self.clone()));
        self.sub_lanes
            .lock()
            .expect("sub_lanes poisoned")
            .push(Arc::downgrade(&sub_lane));
        sub_lane
    }

    fn invalidate_sub_lanes(&self) {
        let sub_lanes = self.sub_lanes.lock().expect("sub_lanes poisoned");
        for weak in sub_lanes.iter() {
            if let Some(sub_lane) = weak.upgrade() {
                sub_lane.invalidate_lane();
            }
        }
    }

    /// One tick: drain the loop hook, tick live SubLanes, then drain the
    /// Binder; finally sleep for whatever remains of the tick budget.
    ///
    /// SubLanes tick after the loop hook and before the Binder's own tick;
    /// that ordering is an explicit implementation choice, not mandated by
    /// the contract.
    fn tick(&self) {
        let tick_start = Instant::now();
        let elapsed_since_last = {
            let mut last = self.last_tick_start.lock().expect("last_tick_start poisoned");
            let elapsed = tick_start.duration_since(*last);
            *last = tick_start;
            elapsed
        };

        self.loop_hook.emit(
            TickData {
                time_since_last_tick: elapsed_since_last.as_millis() as u64,
            },
            UNKNOWN_SENDER,
        );
        self.loop_hook.call();

        for weak in self.sub_lanes.lock().expect("sub_lanes poisoned").iter() {
            if let Some(sub_lane) = weak.upgrade() {
                sub_lane.tick();
            }
        }

        self.binder.tick();

        let work_duration = tick_start.elapsed();
        if let Some(remaining) = self.tick_budget.checked_sub(work_duration) {
            thread::sleep(remaining);
        }
        // Work overran the budget: no sleep, and no catch-up on the next tick.
    }

    /// Run this Lane's full lifecycle on the calling thread: entry point,
    /// barrier #0 rendezvous, the normal tick loop until `finishing` is
    /// observed, then the bounded drain phase.
    pub(crate) fn run(self: Arc<Self>, entry_barrier: Arc<Barrier>, drain_barriers: Arc<[Barrier]>) {
        if let Some(entry) = self.entry_point.lock().expect("entry point poisoned").take() {
            if let Err(err) = entry(&self) {
                let runtime_err = RuntimeError::EntryPointFailure {
                    lane: self.name.clone(),
                    source: err,
                };
                log::error!("{runtime_err}");
                *self.failure.lock().expect("failure poisoned") = Some(Arc::new(runtime_err));
                self.failed.store(true, Ordering::Release);
                if let Some(sync) = self.synchronizer.upgrade() {
                    sync.request_finish();
                }
            }
        }

        entry_barrier.wait();

        if self.failed.load(Ordering::Acquire) {
            // Still rendezvous on every drain barrier: the barrier's party
            // count includes this thread, and siblings would deadlock
            // waiting on a hop that never arrives.
            for barrier in drain_barriers.iter() {
                barrier.wait();
            }
            self.invalidate_sub_lanes();
            return;
        }

        self.running.store(true, Ordering::Release);
        *self.last_tick_start.lock().expect("last_tick_start poisoned") = Instant::now();

        loop {
            if self
                .synchronizer
                .upgrade()
                .map(|sync| sync.is_finishing())
                .unwrap_or(true)
            {
                break;
            }
            self.tick();
        }

        self.running.store(false, Ordering::Release);
        self.finishing.store(true, Ordering::Release);

        for barrier in drain_barriers.iter() {
            barrier.wait();
            self.tick();
        }

        self.invalidate_sub_lanes();
    }
}
