// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A whole run: allocate, dispatch every tile, wait at the barrier,
//! and hand back the finished raster.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::buffer::ImageBuffer;
use crate::error::{Error, Result};
use crate::kernel::Kernel;
use crate::lanes::{LanePool, LaneReport};
use crate::planes::Viewport;
use crate::probe::Probe;
use crate::tiles::Partition;

/// Default tile count.
pub const DEFAULT_BLOCKS: usize = 16;
/// Default lane count.
pub const DEFAULT_LANES: usize = 3;
/// Default iteration cap.
pub const DEFAULT_ITERATIONS: u32 = 50;

/// Splits the machine's processors between the lanes.
pub fn default_workers(lanes: usize) -> usize {
    (num_cpus::get() / lanes.max(1)).max(1)
}

/// Every parameter of a run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// The region being sampled.
    pub viewport: Viewport,
    /// Per-pixel iteration cap.
    pub max_iterations: u32,
    /// Number of tiles the rows are split into.
    pub num_blocks: usize,
    /// Number of lanes the tiles are spread over.
    pub num_lanes: usize,
    /// Worker threads each lane shades a tile with.
    pub workers: usize,
    /// Refuse a block count that does not divide the image height,
    /// instead of leaving the trailing rows unrendered.
    pub strict: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            viewport: Viewport::default(),
            max_iterations: DEFAULT_ITERATIONS,
            num_blocks: DEFAULT_BLOCKS,
            num_lanes: DEFAULT_LANES,
            workers: default_workers(DEFAULT_LANES),
            strict: false,
        }
    }
}

impl RenderConfig {
    /// The same run without tiling: one block on one lane, given every
    /// processor.
    pub fn single_pass(self) -> Self {
        RenderConfig {
            num_blocks: 1,
            num_lanes: 1,
            workers: default_workers(1),
            ..self
        }
    }

    /// How this run's rows are split into tiles.
    pub fn partition(&self) -> Result<Partition> {
        let height = self.viewport.height();
        if self.strict {
            Partition::exact(height, self.num_blocks, self.num_lanes)
        } else {
            Partition::new(height, self.num_blocks, self.num_lanes)
        }
    }

    /// Checks everything that can be checked before allocating.
    pub fn validate(&self) -> Result<Partition> {
        if self.workers == 0 {
            return Err(Error::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        self.partition()
    }
}

/// What a finished run reports besides the image.
#[derive(Clone, Debug)]
pub struct RenderReport {
    /// Time from the first dispatch to the barrier returning.
    pub elapsed: Duration,
    /// How the rows were split.
    pub partition: Partition,
    /// What each lane executed, by lane id.
    pub lanes: Vec<LaneReport>,
}

/// Renders the configured view.  Returns the raster only once every
/// lane has drained.
pub fn render(config: &RenderConfig) -> Result<(ImageBuffer, RenderReport)> {
    let partition = config.validate()?;
    let mut image = ImageBuffer::allocate(config.viewport.integral_plane())?;

    let uncovered = partition.uncovered();
    if !uncovered.is_empty() {
        warn!(
            first = uncovered.start,
            last = uncovered.end - 1,
            blocks = partition.num_blocks(),
            "image height is not a multiple of the block count; trailing rows are left black"
        );
    }

    let kernel = Kernel::new(config.viewport, config.max_iterations, config.workers);
    let (elapsed, lanes) = {
        let bands = image.split_tiles(&partition)?;
        let kernel = &kernel;
        let partition = &partition;
        crossbeam::scope(move |scope| -> Result<(Duration, Vec<LaneReport>)> {
            let pool = LanePool::spawn(scope, kernel, partition)?;
            let probe = Probe::start();
            let dispatched = bands
                .into_iter()
                .try_for_each(|(tile, band)| pool.submit(tile, band));
            let drained = pool.wait();
            let elapsed = probe.stop();
            dispatched?;
            Ok((elapsed, drained?))
        })
        .map_err(|_| Error::WorkerPanic)??
    };

    debug!(
        blocks = partition.num_blocks(),
        lanes = partition.num_lanes(),
        block_height = partition.block_height(),
        "barrier returned"
    );
    info!(
        seconds = elapsed.as_secs_f64(),
        "Elapsed Time (s): {:.6}",
        elapsed.as_secs_f64()
    );

    Ok((
        image,
        RenderReport {
            elapsed,
            partition,
            lanes,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::{dwell, intensity};
    use crate::lanes::Stage;
    use crate::planes::Pixel;
    use num::Complex;

    fn config() -> RenderConfig {
        RenderConfig {
            viewport: Viewport::new(Complex::new(-0.75, 0.0), (2.75, 2.0), 1.0 / 64.0).unwrap(),
            max_iterations: 50,
            num_blocks: 16,
            num_lanes: 3,
            workers: 2,
            strict: false,
        }
    }

    #[test]
    fn default_config_is_the_documented_run() {
        let config = RenderConfig::default();
        assert_eq!(config.viewport, Viewport::default());
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.num_blocks, 16);
        assert_eq!(config.num_lanes, 3);
        assert!(config.workers >= 1);
        assert_eq!(config.partition().unwrap().block_height(), 1250);
    }

    #[test]
    fn tiled_and_single_pass_are_byte_identical() {
        let tiled = config();
        let (tiled_image, tiled_report) = render(&tiled).unwrap();
        let (single_image, single_report) = render(&tiled.single_pass()).unwrap();
        assert_eq!(tiled_report.partition.num_blocks(), 16);
        assert_eq!(single_report.partition.num_blocks(), 1);
        assert_eq!(tiled_image.as_bytes(), single_image.as_bytes());
    }

    #[test]
    fn every_pixel_matches_the_evaluator() {
        let config = config();
        let (image, _) = render(&config).unwrap();
        let vp = config.viewport;
        for row in 0..vp.height() {
            for column in 0..vp.width() {
                let c = vp.pixel_to_point(&Pixel(column, row));
                let expected = intensity(dwell(c, 50), 50);
                assert_eq!(image.row(row)[column], expected);
            }
        }
        // The center of the view is inside the set.
        assert_eq!(image.row(64)[88], 0);
    }

    #[test]
    fn lanes_report_round_robin_fifo() {
        let (_, report) = render(&config()).unwrap();
        assert_eq!(report.lanes.len(), 3);
        for lane in &report.lanes {
            let computes: Vec<usize> = lane
                .events
                .iter()
                .filter(|e| e.stage == Stage::Compute)
                .map(|e| e.tile)
                .collect();
            let expected: Vec<usize> = (lane.lane..16).step_by(3).collect();
            assert_eq!(computes, expected);
            for pair in lane.events.chunks(2) {
                assert_eq!(pair[0].stage, Stage::Compute);
                assert_eq!(pair[1].stage, Stage::Transfer);
                assert_eq!(pair[0].tile, pair[1].tile);
            }
        }
    }

    #[test]
    fn uneven_split_leaves_trailing_rows_black() {
        let mut config = config();
        config.num_blocks = 10;
        let (image, report) = render(&config).unwrap();
        assert_eq!(report.partition.uncovered(), 120..128);
        for row in 120..128 {
            assert!(image.row(row).iter().all(|&b| b == 0));
        }
        // Row 0 is the bottom edge of the view, far outside the set.
        assert!(image.row(0).iter().any(|&b| b != 0));
    }

    #[test]
    fn strict_refuses_uneven_split() {
        let mut config = config();
        config.num_blocks = 10;
        config.strict = true;
        match render(&config) {
            Err(Error::InvalidConfig(_)) => (),
            other => panic!("expected invalid configuration, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn zero_workers_is_rejected() {
        let mut config = config();
        config.workers = 0;
        assert!(render(&config).is_err());
    }

    #[test]
    fn huge_worker_count_still_renders() {
        let mut config = config();
        config.workers = usize::max_value();
        assert!(config.validate().is_ok());
        let (image, _) = render(&config).unwrap();
        let (expected, _) = render(&self::config()).unwrap();
        assert_eq!(image.as_bytes(), expected.as_bytes());
    }

    #[test]
    fn zero_iterations_renders_black() {
        let mut config = config();
        config.max_iterations = 0;
        let (image, _) = render(&config).unwrap();
        assert!(image.as_bytes().iter().all(|&b| b == 0));
    }
}
