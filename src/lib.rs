#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tiled Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane for
//! which repeatedly squaring `z` and adding `c` never runs off to
//! infinity.  The escape-time picture of it counts, for every sample
//! point, how many steps that takes (the "dwell"), capped at some
//! maximum, and paints the count as a shade of gray.
//!
//! This crate computes that picture by cutting the image into bands of
//! rows ("tiles") and feeding them, round-robin, to a small number of
//! lanes.  Each lane shades a tile into its own staging buffer with a
//! handful of worker threads, then copies it into the image; while one
//! lane copies, the others are still computing.  The dispatching
//! thread never waits on a tile, only once at the end for every lane to
//! drain.  The image needs no lock because every tile owns a disjoint
//! band of it.

extern crate crossbeam;
extern crate failure;
extern crate image;
extern crate itertools;
extern crate num;
extern crate num_cpus;

pub mod buffer;
pub mod error;
pub mod escape;
pub mod kernel;
pub mod lanes;
pub mod persist;
pub mod planes;
pub mod probe;
pub mod processor;
pub mod render;
pub mod tiles;

pub use buffer::ImageBuffer;
pub use error::{Error, Result};
pub use persist::{save, OutputFormat};
pub use planes::Viewport;
pub use processor::ProcessorInfo;
pub use render::{render, RenderConfig, RenderReport};
