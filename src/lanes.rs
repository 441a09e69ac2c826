// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Lanes: independent, ordered queues of work.
//!
//! Each lane is one scoped thread reading a FIFO channel.  A tile is
//! submitted as two operations on its lane: a compute, which shades
//! the tile into the lane's private staging buffer, and a transfer,
//! which copies the staging buffer into the tile's band of the image.
//! Because a lane executes strictly in the order it was fed, the
//! compute of tile `k + num_lanes` cannot touch the staging buffer
//! until the transfer of tile `k` has drained it, and a single staging
//! buffer per lane is enough.  Lanes share nothing but the read-only
//! kernel, so one lane's transfer overlaps another lane's compute.
//!
//! Submitting never waits.  The only blocking point is `wait`, which
//! closes every queue and joins every lane.

use crossbeam::channel::{unbounded, Sender};
use crossbeam::thread::{Scope, ScopedJoinHandle};
use tracing::debug;

use crate::buffer;
use crate::error::{Error, Result};
use crate::kernel::Kernel;
use crate::tiles::{Partition, Tile};

/// The two kinds of operation a lane executes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Shade a tile into the lane's staging buffer.
    Compute,
    /// Copy the staging buffer into the image.
    Transfer,
}

/// One executed operation, as recorded by the lane that ran it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LaneEvent {
    /// What was done.
    pub stage: Stage,
    /// Which tile it was done for.
    pub tile: usize,
}

/// What a lane did, in the order it did it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaneReport {
    /// The lane's id.
    pub lane: usize,
    /// Operations in execution order.
    pub events: Vec<LaneEvent>,
}

enum LaneOp<'env> {
    Compute(Tile),
    Transfer(Tile, &'env mut [u8]),
}

/// A fixed set of running lanes, alive for the duration of a scope.
pub struct LanePool<'scope, 'env> {
    senders: Vec<Sender<LaneOp<'env>>>,
    handles: Vec<ScopedJoinHandle<'scope, LaneReport>>,
}

impl<'scope, 'env> LanePool<'scope, 'env> {
    /// Starts one thread per lane of the partition, each with a staging
    /// buffer large enough for one tile.
    pub fn spawn(
        scope: &'scope Scope<'env>,
        kernel: &'env Kernel,
        partition: &Partition,
    ) -> Result<LanePool<'scope, 'env>> {
        let staging_len = partition.block_height() * kernel.width();
        let mut pool = LanePool {
            senders: Vec::with_capacity(partition.num_lanes()),
            handles: Vec::with_capacity(partition.num_lanes()),
        };

        for lane in 0..partition.num_lanes() {
            let staging = match buffer::allocate(staging_len, "lane staging buffer") {
                Ok(staging) => staging,
                Err(e) => {
                    pool.wait().ok();
                    return Err(e);
                }
            };
            let (sender, receiver) = unbounded::<LaneOp<'env>>();
            let spawned = scope
                .builder()
                .name(format!("lane-{}", lane))
                .spawn(move |_| {
                    let mut staging = staging;
                    let mut events = Vec::new();
                    for op in receiver {
                        match op {
                            LaneOp::Compute(tile) => {
                                let len = tile.height() * kernel.width();
                                if let Err(panic) = kernel.compute(tile.rows(), &mut staging[..len]) {
                                    std::panic::resume_unwind(panic);
                                }
                                events.push(LaneEvent {
                                    stage: Stage::Compute,
                                    tile: tile.index,
                                });
                            }
                            LaneOp::Transfer(tile, band) => {
                                band.copy_from_slice(&staging[..band.len()]);
                                events.push(LaneEvent {
                                    stage: Stage::Transfer,
                                    tile: tile.index,
                                });
                            }
                        }
                    }
                    debug!(lane, operations = events.len(), "lane drained");
                    LaneReport { lane, events }
                });

            match spawned {
                Ok(handle) => {
                    pool.senders.push(sender);
                    pool.handles.push(handle);
                }
                Err(_) => {
                    pool.wait().ok();
                    return Err(Error::LaneFailure(lane));
                }
            }
        }
        Ok(pool)
    }

    /// Queues a tile's compute and transfer on its lane and returns
    /// immediately.
    pub fn submit(&self, tile: Tile, band: &'env mut [u8]) -> Result<()> {
        let sender = self
            .senders
            .get(tile.lane)
            .ok_or(Error::LaneFailure(tile.lane))?;
        debug!(
            tile = tile.index,
            lane = tile.lane,
            y_start = tile.y_start,
            y_stop = tile.y_stop,
            "dispatch"
        );
        sender
            .send(LaneOp::Compute(tile))
            .map_err(|_| Error::LaneFailure(tile.lane))?;
        sender
            .send(LaneOp::Transfer(tile, band))
            .map_err(|_| Error::LaneFailure(tile.lane))?;
        Ok(())
    }

    /// The barrier: closes every lane's queue, then blocks until every
    /// lane has executed everything it was given.  Every lane is joined
    /// even if an earlier one failed; the first failure is reported.
    pub fn wait(self) -> Result<Vec<LaneReport>> {
        drop(self.senders);
        let mut reports = Vec::with_capacity(self.handles.len());
        let mut failure = None;
        for (lane, handle) in self.handles.into_iter().enumerate() {
            match handle.join() {
                Ok(report) => reports.push(report),
                Err(_) => {
                    failure.get_or_insert(Error::LaneFailure(lane));
                }
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ImageBuffer;
    use crate::planes::Viewport;
    use num::Complex;

    fn kernel() -> Kernel {
        let vp = Viewport::new(Complex::new(-0.75, 0.0), (2.75, 2.0), 1.0 / 64.0).unwrap();
        Kernel::new(vp, 50, 2)
    }

    fn run(kernel: &Kernel, partition: &Partition) -> (ImageBuffer, Vec<LaneReport>) {
        let mut image = ImageBuffer::allocate(crate::planes::IntegralPlane(
            kernel.width(),
            partition.height(),
        ))
        .unwrap();
        let reports = {
            let bands = image.split_tiles(partition).unwrap();
            crossbeam::scope(|scope| {
                let pool = LanePool::spawn(scope, kernel, partition).unwrap();
                for (tile, band) in bands {
                    pool.submit(tile, band).unwrap();
                }
                pool.wait().unwrap()
            })
            .unwrap()
        };
        (image, reports)
    }

    #[test]
    fn each_lane_runs_its_tiles_in_issue_order() {
        let kernel = kernel();
        let partition = Partition::new(128, 16, 3).unwrap();
        let (_, reports) = run(&kernel, &partition);

        assert_eq!(reports.len(), 3);
        for report in &reports {
            let expected: Vec<LaneEvent> = (report.lane..16)
                .step_by(3)
                .flat_map(|tile| {
                    vec![
                        LaneEvent {
                            stage: Stage::Compute,
                            tile,
                        },
                        LaneEvent {
                            stage: Stage::Transfer,
                            tile,
                        },
                    ]
                })
                .collect();
            assert_eq!(report.events, expected);
        }
    }

    #[test]
    fn every_tile_lands_in_its_own_band() {
        let kernel = kernel();
        let partition = Partition::new(128, 16, 3).unwrap();
        let (image, _) = run(&kernel, &partition);

        let mut expected = vec![0u8; kernel.width() * 128];
        kernel.shade_rows(0..128, &mut expected);
        assert_eq!(image.as_bytes(), &expected[..]);
    }

    #[test]
    fn more_lanes_than_tiles_leaves_idle_lanes() {
        let kernel = kernel();
        let partition = Partition::new(128, 2, 5).unwrap();
        let (_, reports) = run(&kernel, &partition);
        assert_eq!(reports.len(), 5);
        assert_eq!(reports[0].events.len(), 2);
        assert_eq!(reports[1].events.len(), 2);
        assert!(reports[2..].iter().all(|r| r.events.is_empty()));
    }

    #[test]
    fn submit_to_unknown_lane_fails() {
        let kernel = kernel();
        let partition = Partition::new(128, 4, 2).unwrap();
        let mut scratch = vec![0u8; kernel.width() * 32];
        let band = &mut scratch[..];
        let result = crossbeam::scope(|scope| {
            let pool = LanePool::spawn(scope, &kernel, &partition).unwrap();
            let mut tile = partition.tile(0);
            tile.lane = 7;
            let outcome = pool.submit(tile, band);
            pool.wait().unwrap();
            outcome
        })
        .unwrap();
        match result {
            Err(Error::LaneFailure(7)) => (),
            other => panic!("expected lane failure, got {:?}", other),
        }
    }

    #[test]
    fn dead_lane_fails_the_barrier_but_others_drain() {
        let kernel = kernel();
        let width = kernel.width();
        let partition = Partition::new(128, 4, 2).unwrap();

        // One row longer than lane 0's staging buffer, so its transfer
        // panics.
        let mut oversized = vec![0u8; 33 * width];
        let mut healthy = vec![0u8; 32 * width];
        let (doomed, survivor) = (&mut oversized[..], &mut healthy[..]);
        let outcome = crossbeam::scope(|scope| {
            let pool = LanePool::spawn(scope, &kernel, &partition).unwrap();
            pool.submit(partition.tile(0), doomed).unwrap();
            pool.submit(partition.tile(1), survivor).unwrap();
            pool.wait()
        })
        .unwrap();

        match outcome {
            Err(Error::LaneFailure(0)) => (),
            other => panic!("expected lane 0 to fail, got {:?}", other),
        }
        let mut expected = vec![0u8; 32 * width];
        kernel.shade_rows(partition.tile(1).rows(), &mut expected);
        assert_eq!(healthy, expected);
    }
}
