// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The single byte-per-pixel raster a run writes into.

use crate::error::{Error, Result};
use crate::planes::IntegralPlane;
use crate::tiles::{Partition, Tile};

/// Obtains `len` zeroed bytes, reporting failure instead of aborting.
pub(crate) fn allocate(len: usize, what: &'static str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailure { bytes: len, what })?;
    bytes.resize(len, 0);
    Ok(bytes)
}

/// A row-major grayscale raster, one byte per pixel.  The buffer is
/// owned by the run; tiles only ever see disjoint row bands of it.
#[derive(Debug)]
pub struct ImageBuffer {
    plane: IntegralPlane,
    pixels: Vec<u8>,
}

impl ImageBuffer {
    /// Allocates a zeroed raster the size of the plane.
    pub fn allocate(plane: IntegralPlane) -> Result<ImageBuffer> {
        let len = plane
            .0
            .checked_mul(plane.1)
            .ok_or(Error::AllocationFailure {
                bytes: usize::max_value(),
                what: "image buffer",
            })?;
        let pixels = allocate(len, "image buffer")?;
        Ok(ImageBuffer { plane, pixels })
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.plane.0
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.plane.1
    }

    /// The raw pixels, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// One row of pixels.
    pub fn row(&self, row: usize) -> &[u8] {
        let width = self.width();
        &self.pixels[row * width..(row + 1) * width]
    }

    /// Surrenders the pixels.
    pub fn into_vec(self) -> Vec<u8> {
        self.pixels
    }

    /// Cuts the raster into one mutable band per tile.  The bands are
    /// produced by repeatedly splitting the remainder at the end of the
    /// current tile, so no two of them can overlap; rows past the last
    /// tile are not handed out at all.
    pub fn split_tiles(&mut self, partition: &Partition) -> Result<Vec<(Tile, &mut [u8])>> {
        if partition.height() != self.height() {
            return Err(Error::InvalidConfig(format!(
                "partition of {} rows applied to an image of {} rows",
                partition.height(),
                self.height()
            )));
        }

        let width = self.width();
        let mut rest: &mut [u8] = &mut self.pixels[..partition.covered().end * width];
        let mut bands = Vec::with_capacity(partition.num_blocks());
        for tile in partition.tiles() {
            let (band, tail) = std::mem::take(&mut rest).split_at_mut(tile.height() * width);
            bands.push((tile, band));
            rest = tail;
        }
        debug_assert!(rest.is_empty());
        Ok(bands)
    }
}
