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

//! Wires up a Synchronizer with three Lanes and exercises cross-lane
//! fan-out, a SubLane-scoped handler, and the two-phase shutdown protocol.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use laneway_core::Void;
use laneway_runtime::{LaneConfig, RateLimitGroup, Synchronizer};

const SCORE_EVENT: u32 = 10_000;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let synchronizer = Synchronizer::new();

    let view = laneway_runtime::Lane::new(
        &synchronizer,
        LaneConfig::at_frequency(60)
            .named("view")
            .rate_limit_group(RateLimitGroup::Rl1),
    );
    let physics = laneway_runtime::Lane::new(
        &synchronizer,
        LaneConfig::at_frequency(50)
            .named("physics")
            .rate_limit_group(RateLimitGroup::Rl2),
    );
    let network = laneway_runtime::Lane::new(
        &synchronizer,
        LaneConfig::at_frequency(20)
            .named("network")
            .rate_limit_group(RateLimitGroup::Rl3),
    );

    struct ScoreBoard {
        total: AtomicI32,
    }

    impl ScoreBoard {
        fn on_score_delta(&self, delta: &i32, _sender: u64) {
            let total = self.total.fetch_add(*delta, Ordering::SeqCst) + *delta;
            log::info!("physics lane observed score delta {delta}, running total {total}");
        }
    }

    let score_board = Arc::new(ScoreBoard {
        total: AtomicI32::new(0),
    });
    physics.connect_handler::<ScoreBoard, i32, _, _>(
        SCORE_EVENT,
        0,
        score_board.clone(),
        ScoreBoard::on_score_delta,
    );

    let tick_count = Arc::new(AtomicI32::new(0));
    let tick_count_view = tick_count.clone();
    view.connect_loop(move |tick, _sender| {
        let count = tick_count_view.fetch_add(1, Ordering::SeqCst) + 1;
        if count % 60 == 0 {
            log::debug!("view tick {count}, {}ms since previous", tick.time_since_last_tick);
        }
    });

    struct HudCounter {
        hits: AtomicI32,
    }

    impl HudCounter {
        fn on_notification(&self) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    let hud = view.create_sub_lane();
    let hud_counter = Arc::new(HudCounter {
        hits: AtomicI32::new(0),
    });
    hud.connect_void_handler::<HudCounter, _, _>(
        SCORE_EVENT + 1,
        0,
        hud_counter.clone(),
        HudCounter::on_notification,
    );

    synchronizer.start();

    view.emit::<i32>(SCORE_EVENT, 0, 7, 0)?;
    hud.sub_emit::<Void>(SCORE_EVENT + 1, 0, Void, 0)?;

    thread::sleep(Duration::from_millis(200));

    network.emit::<Void>(laneway_core::EA_FINISH, 0, Void, 0)?;
    synchronizer.finish(true);

    log::info!(
        "shutdown complete: physics observed total score {}, hud handled {} local notifications",
        score_board.total.load(Ordering::SeqCst),
        hud_counter.hits.load(Ordering::SeqCst)
    );

    Ok(())
}
