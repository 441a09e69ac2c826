// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Partitioning of the image rows into tiles, and the assignment of
//! tiles to lanes.
//!
//! Every tile is `block_height` rows tall and tile `b` starts at row
//! `b * block_height`, so tile `b` ends exactly where tile `b + 1`
//! starts.  The ranges are therefore pairwise disjoint and their union
//! is `[0, num_blocks * block_height)`.  That is the whole argument
//! for writing the image buffer without a lock, and
//! `ImageBuffer::split_tiles` turns it into disjoint `&mut` slices.
//!
//! When the image height is not a multiple of the block count, the
//! last `height % num_blocks` rows belong to no tile and are never
//! computed.  `Partition::uncovered` names them.

use std::ops::Range;

use crate::error::{Error, Result};

/// One unit of work: a contiguous band of rows and the lane it runs on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    /// Position of this tile in dispatch order.
    pub index: usize,
    /// First row of the band.
    pub y_start: usize,
    /// One past the last row of the band.
    pub y_stop: usize,
    /// The lane this tile is queued on.
    pub lane: usize,
}

impl Tile {
    /// The rows covered by this tile.
    pub fn rows(&self) -> Range<usize> {
        self.y_start..self.y_stop
    }

    /// Number of rows in the tile.
    pub fn height(&self) -> usize {
        self.y_stop - self.y_start
    }
}

/// How the rows of an image are split into tiles and spread over lanes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    height: usize,
    num_blocks: usize,
    num_lanes: usize,
    block_height: usize,
}

impl Partition {
    /// Splits `height` rows into `num_blocks` tiles of equal, truncated
    /// height, assigned round-robin to `num_lanes` lanes.
    pub fn new(height: usize, num_blocks: usize, num_lanes: usize) -> Result<Partition> {
        if num_blocks == 0 {
            return Err(Error::InvalidConfig("block count must be at least 1".to_string()));
        }
        if num_lanes == 0 {
            return Err(Error::InvalidConfig("lane count must be at least 1".to_string()));
        }
        Ok(Partition {
            height,
            num_blocks,
            num_lanes,
            block_height: height / num_blocks,
        })
    }

    /// As `new`, but refuses a split that would leave rows uncovered.
    pub fn exact(height: usize, num_blocks: usize, num_lanes: usize) -> Result<Partition> {
        let partition = Partition::new(height, num_blocks, num_lanes)?;
        if !partition.uncovered().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "{} rows do not divide into {} blocks",
                height, num_blocks
            )));
        }
        Ok(partition)
    }

    /// Rows in the image being split.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Rows per tile.
    pub fn block_height(&self) -> usize {
        self.block_height
    }

    /// Number of tiles.
    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// Number of lanes.
    pub fn num_lanes(&self) -> usize {
        self.num_lanes
    }

    /// The lane a given block is queued on.
    pub fn lane_of(&self, block: usize) -> usize {
        block % self.num_lanes
    }

    /// The `block`th tile.
    pub fn tile(&self, block: usize) -> Tile {
        let y_start = block * self.block_height;
        Tile {
            index: block,
            y_start,
            y_stop: y_start + self.block_height,
            lane: self.lane_of(block),
        }
    }

    /// All tiles, in dispatch order.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        (0..self.num_blocks).map(move |block| self.tile(block))
    }

    /// Rows covered by some tile.
    pub fn covered(&self) -> Range<usize> {
        0..self.num_blocks * self.block_height
    }

    /// Trailing rows no tile covers.  Empty when the height divides
    /// evenly.
    pub fn uncovered(&self) -> Range<usize> {
        self.num_blocks * self.block_height..self.height
    }
}
