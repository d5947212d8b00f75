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

//! Integration tests exercising full Synchronizer/Lane lifecycles.

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use laneway_core::Void;
use laneway_runtime::{Lane, LaneConfig, Synchronizer};

#[test]
fn cross_lane_emit_reaches_every_lane_exactly_once() {
    let sync = Synchronizer::new();
    let a = Lane::new(&sync, LaneConfig::at_frequency(200).named("a"));
    let b = Lane::new(&sync, LaneConfig::at_frequency(200).named("b"));
    let c = Lane::new(&sync, LaneConfig::at_frequency(200).named("c"));

    let a_hits = Arc::new(AtomicUsize::new(0));
    let b_hits = Arc::new(AtomicUsize::new(0));
    let c_hits = Arc::new(AtomicUsize::new(0));

    let a_hits_clone = a_hits.clone();
    a.connect::<i32, _>(4000, 0, move |_, _| {
        a_hits_clone.fetch_add(1, Ordering::SeqCst);
    });
    let b_hits_clone = b_hits.clone();
    b.connect::<i32, _>(4000, 0, move |_, _| {
        b_hits_clone.fetch_add(1, Ordering::SeqCst);
    });
    let c_hits_clone = c_hits.clone();
    c.connect::<i32, _>(4000, 0, move |_, _| {
        c_hits_clone.fetch_add(1, Ordering::SeqCst);
    });

    sync.start();
    a.emit::<i32>(4000, 0, 9, 0).unwrap();

    thread::sleep(Duration::from_millis(50));
    sync.finish(false);

    // The origin lane delivers locally exactly once; fan-out must not also
    // route the payload back to it (no double delivery on the origin).
    assert_eq!(a_hits.load(Ordering::SeqCst), 1);
    assert_eq!(b_hits.load(Ordering::SeqCst), 1);
    assert_eq!(c_hits.load(Ordering::SeqCst), 1);
}

#[test]
fn loop_hook_runs_once_per_tick_alongside_queued_handlers() {
    let sync = Synchronizer::new();
    let lane = Lane::new(&sync, LaneConfig::at_frequency(100).named("ticker"));

    let loop_runs = Arc::new(AtomicUsize::new(0));
    let loop_runs_clone = loop_runs.clone();
    lane.connect_loop(move |_tick, _sender| {
        loop_runs_clone.fetch_add(1, Ordering::SeqCst);
    });

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    lane.connect::<i32, _>(3000, 0, move |payload, _| {
        seen_clone.lock().unwrap().push(*payload);
    });

    sync.start();
    lane.emit::<i32>(3000, 0, 1, 0).unwrap();
    lane.emit::<i32>(3000, 0, 2, 0).unwrap();
    lane.emit::<i32>(3000, 0, 3, 0).unwrap();

    thread::sleep(Duration::from_millis(60));
    sync.finish(false);

    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    assert!(loop_runs.load(Ordering::SeqCst) >= 1);
}

#[test]
fn sub_lane_handler_stops_firing_after_invalidation() {
    let sync = Synchronizer::new();
    let lane = Lane::new(&sync, LaneConfig::at_frequency(200).named("scoped"));
    let sub = lane.create_sub_lane();

    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();
    sub.connect::<Void, _>(2000, 42, move |_, _| {
        hits_clone.fetch_add(1, Ordering::SeqCst);
    });

    sync.start();
    sub.emit::<Void>(2000, 42, Void, 0).unwrap();
    thread::sleep(Duration::from_millis(30));

    sub.invalidate_lane();
    sub.emit::<Void>(2000, 42, Void, 0).unwrap();
    thread::sleep(Duration::from_millis(30));

    sync.finish(false);

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn finish_blocks_until_ea_finish_is_observed_and_drains_in_flight_emits() {
    let sync = Synchronizer::new();
    let a = Lane::new(&sync, LaneConfig::at_frequency(200).named("a"));
    let b = Lane::new(&sync, LaneConfig::at_frequency(200).named("b"));

    let b_total = Arc::new(AtomicI32::new(0));
    let b_total_clone = b_total.clone();
    b.connect::<i32, _>(3000, 0, move |payload, _| {
        b_total_clone.fetch_add(*payload, Ordering::SeqCst);
    });

    sync.start();
    a.emit::<i32>(3000, 0, 5, 0).unwrap();
    a.emit::<Void>(laneway_core::EA_FINISH, 0, Void, 0).unwrap();

    sync.finish(true);

    assert_eq!(b_total.load(Ordering::SeqCst), 5);
}

#[test]
fn entry_point_failure_marks_lane_failed_and_propagates_shutdown() {
    let sync = Synchronizer::new();
    let healthy = Lane::new(&sync, LaneConfig::at_frequency(200).named("healthy"));
    let doomed = Lane::new(&sync, LaneConfig::at_frequency(200).named("doomed"));

    doomed.set_entry_point(Box::new(|_lane| anyhow::bail!("socket bind failed")));

    sync.start();
    thread::sleep(Duration::from_millis(50));
    sync.finish(false);

    assert_eq!(doomed.state(), laneway_runtime::LaneState::Failed);
    assert_ne!(healthy.state(), laneway_runtime::LaneState::Failed);

    let failure = doomed.failure().expect("doomed lane should record its failure");
    assert!(failure.to_string().contains("socket bind failed"));
    assert!(healthy.failure().is_none());
}
