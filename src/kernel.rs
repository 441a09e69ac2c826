// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The per-tile compute step.  A band of rows is split again into
//! smaller bands, one per worker thread, and every pixel in a band is
//! mapped, iterated and shaded independently of every other pixel.

use std::ops::Range;

use itertools::iproduct;

use crate::escape::{dwell, intensity};
use crate::planes::{Pixel, Viewport};

/// Everything needed to shade a row of the image.  Shared read-only by
/// every lane and every worker.
#[derive(Copy, Clone, Debug)]
pub struct Kernel {
    viewport: Viewport,
    max_iterations: u32,
    workers: usize,
}

impl Kernel {
    /// A kernel that splits each band over `workers` threads.  A worker
    /// count of zero is treated as one.
    pub fn new(viewport: Viewport, max_iterations: u32, workers: usize) -> Kernel {
        Kernel {
            viewport,
            max_iterations,
            workers: workers.max(1),
        }
    }

    /// Width of a row, in pixels.
    pub fn width(&self) -> usize {
        self.viewport.width()
    }

    /// Shade a single pixel.
    #[inline]
    pub fn shade(&self, pixel: &Pixel) -> u8 {
        let point = self.viewport.pixel_to_point(pixel);
        intensity(dwell(point, self.max_iterations), self.max_iterations)
    }

    /// Shade `rows` into `out`, which holds exactly those rows.
    pub fn shade_rows(&self, rows: Range<usize>, out: &mut [u8]) {
        debug_assert_eq!(out.len(), rows.len() * self.width());
        for (slot, (row, column)) in out.iter_mut().zip(iproduct!(rows, 0..self.width())) {
            *slot = self.shade(&Pixel(column, row));
        }
    }

    /// The parallel version of `shade_rows`.  Returns the panic of any
    /// worker that died so the caller can decide how to fail.
    pub fn compute(&self, rows: Range<usize>, out: &mut [u8]) -> std::thread::Result<()> {
        let width = self.width();
        if rows.is_empty() || width == 0 {
            return Ok(());
        }

        // No more workers than rows; also keeps the rounding sum in range.
        let workers = self.workers.min(rows.len());
        let band = (rows.len() + workers - 1) / workers;
        if band == rows.len() {
            self.shade_rows(rows, out);
            return Ok(());
        }

        let start = rows.start;
        crossbeam::scope(|spawner| {
            for (i, region) in out.chunks_mut(band * width).enumerate() {
                let first = start + i * band;
                let last = first + region.len() / width;
                spawner.spawn(move |_| {
                    self.shade_rows(first..last, region);
                });
            }
        })
    }
}
