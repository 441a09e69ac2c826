// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time test and the grayscale map applied to its result.

use num::Complex;

/// The squared escape radius.  A point whose orbit reaches this is
/// outside the set.
const ESCAPE: f64 = 4.0;

/// This is our classic iterator function: it counts how many times
/// `z = z * z + point` can be applied before `z` leaves the circle of
/// radius two, up to `max_iterations`.  A result equal to
/// `max_iterations` means the point is treated as inside the set.
///
/// The squaring is spelled out instead of using `Complex`
/// multiplication so that the arithmetic is exactly `x*x - y*y + x0`
/// and `2*x*y + y0`, in that order.  Iteration continues only while
/// the orbit is strictly inside the radius.
#[inline]
pub fn dwell(point: Complex<f64>, max_iterations: u32) -> u32 {
    let (mut x, mut y) = (0.0_f64, 0.0_f64);
    let mut count = 0;
    while x * x + y * y < ESCAPE && count < max_iterations {
        let next_x = x * x - y * y + point.re;
        y = 2.0 * x * y + point.im;
        x = next_x;
        count += 1;
    }
    count
}

/// Linear grayscale: points inside the set are black, everything else
/// is scaled by how long it took to escape.  Truncates, never rounds.
#[inline]
pub fn intensity(dwell: u32, max_iterations: u32) -> u8 {
    if dwell >= max_iterations {
        0
    } else {
        (255 * u64::from(dwell) / u64::from(max_iterations)) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn origin_never_escapes() {
        assert_eq!(dwell(Complex::new(0.0, 0.0), 50), 50);
        assert_eq!(intensity(50, 50), 0);
    }

    #[test]
    fn two_escapes_after_one_step() {
        let d = dwell(Complex::new(2.0, 0.0), 50);
        assert_eq!(d, 1);
        assert_eq!(intensity(d, 50), 5);
    }

    #[test]
    fn center_of_default_view_is_inside() {
        assert_eq!(dwell(Complex::new(-0.75, 0.0), 50), 50);
        assert_eq!(dwell(Complex::new(-0.75, 0.0), 1000), 1000);
    }

    #[test]
    fn iteration_continues_only_strictly_inside_radius() {
        // After one step z = (-2, 0) and |z|^2 == 4, which is not
        // strictly inside, so the count stops there.
        assert_eq!(dwell(Complex::new(-2.0, 0.0), 50), 1);
        // Just inside the radius keeps going.
        assert!(dwell(Complex::new(-1.999, 0.0), 50) > 1);
    }

    #[test]
    fn zero_iterations_returns_zero() {
        assert_eq!(dwell(Complex::new(0.0, 0.0), 0), 0);
        assert_eq!(dwell(Complex::new(5.0, 5.0), 0), 0);
    }

    #[test]
    fn already_outside_escapes_on_first_step() {
        assert_eq!(dwell(Complex::new(3.0, 3.0), 50), 1);
    }

    #[test]
    fn intensity_truncates() {
        assert_eq!(intensity(25, 50), 127);
        assert_eq!(intensity(49, 50), 249);
        assert_eq!(intensity(0, 50), 0);
        assert_eq!(intensity(1, 3), 85);
    }

    #[test]
    fn intensity_does_not_overflow_large_caps() {
        let max = u32::max_value();
        assert_eq!(intensity(max - 1, max), 254);
    }

    #[test]
    fn dwell_is_bounded_and_repeatable() {
        let mut rng = rand::thread_rng();
        for _ in 0..2000 {
            let c = Complex::new(rng.gen_range(-2.5..1.0), rng.gen_range(-1.5..1.5));
            let max = rng.gen_range(0..200);
            let d = dwell(c, max);
            assert!(d <= max);
            assert_eq!(d, dwell(c, max));
        }
    }
}
