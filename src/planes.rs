// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Viewport struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane described by its center, its
//! extents, and the size of one pixel.
use num::Complex;

use crate::error::{Error, Result};

/// Describes the width and height of an integral plane that is assumed
/// to start at 0,0.  All values are non-negative integers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

impl IntegralPlane {
    /// The total number of points in the integral grid.  Used to
    /// calculate memory needs.
    pub fn len(&self) -> usize {
        self.0 * self.1
    }

    /// Describes that the integral plane has no points at all.
    pub fn is_empty(&self) -> bool {
        self.0 == 0 || self.1 == 0
    }
}

/// Describes the column, row of a point in the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The rectangle of the complex plane being sampled, and the grid laid
/// over it.  Immutable for the duration of a run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// The point at the middle of the region.
    pub center: Complex<f64>,
    /// Real (width) and imaginary (height) extents of the region.
    pub length: (f64, f64),
    /// Distance between adjacent samples, identical on both axes.
    pub pixel_size: f64,
    // Corner of the region with the smallest real and imaginary parts.
    origin: Complex<f64>,
    integral_plane: IntegralPlane,
}

impl Viewport {
    /// Constructor.  Takes the center of the region, its extents, and
    /// the pixel size, and derives the grid.  Grid dimensions are the
    /// extents divided by the pixel size, truncated.
    pub fn new(center: Complex<f64>, length: (f64, f64), pixel_size: f64) -> Result<Viewport> {
        if !(pixel_size > 0.0) || !pixel_size.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "pixel size must be positive, got {}",
                pixel_size
            )));
        }

        if !(length.0 > 0.0 && length.1 > 0.0) || !length.0.is_finite() || !length.1.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "extents must be positive, got {}x{}",
                length.0, length.1
            )));
        }

        let origin = Complex::new(center.re - length.0 / 2.0, center.im - length.1 / 2.0);
        let integral_plane = IntegralPlane(
            (length.0 / pixel_size) as usize,
            (length.1 / pixel_size) as usize,
        );

        if integral_plane.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "a pixel size of {} leaves no pixels in a {}x{} region",
                pixel_size, length.0, length.1
            )));
        }

        Ok(Viewport {
            center,
            length,
            pixel_size,
            origin,
            integral_plane,
        })
    }

    /// Number of columns (pixels_x).
    pub fn width(&self) -> usize {
        self.integral_plane.0
    }

    /// Number of rows (pixels_y).
    pub fn height(&self) -> usize {
        self.integral_plane.1
    }

    /// The grid laid over the region.
    pub fn integral_plane(&self) -> IntegralPlane {
        self.integral_plane
    }

    /// The corner of the region the grid starts from: (x_min, y_min).
    pub fn origin(&self) -> Complex<f64> {
        self.origin
    }

    /// Given a pixel on the integral plane, return the complex number
    /// it samples.  The formula is `min + n * pixel_size` on each axis
    /// and must stay that way: the output image is compared byte for
    /// byte against other renderers using the same expression.
    #[inline]
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            self.origin.re + (pixel.0 as f64) * self.pixel_size,
            self.origin.im + (pixel.1 as f64) * self.pixel_size,
        )
    }
}

impl Default for Viewport {
    /// The classic full view: centered at -0.75, 2.75 by 2.0, one
    /// ten-thousandth per pixel, which makes a 27500x20000 grid.
    fn default() -> Self {
        Viewport {
            center: Complex::new(-0.75, 0.0),
            length: (2.75, 2.0),
            pixel_size: 0.0001,
            origin: Complex::new(-2.125, -1.0),
            integral_plane: IntegralPlane(27500, 20000),
        }
    }
}
