// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Wall-clock timing of the dispatch and barrier phase.

use std::time::{Duration, Instant};

/// A running stopwatch on the monotonic clock.
#[derive(Debug)]
pub struct Probe {
    started: Instant,
}

impl Probe {
    /// Start timing now.
    pub fn start() -> Probe {
        Probe {
            started: Instant::now(),
        }
    }

    /// Stop timing and return what elapsed.
    pub fn stop(self) -> Duration {
        self.started.elapsed()
    }
}
