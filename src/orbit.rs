// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Orbits of the quadratic map z -> z^2 + c, and how much of an orbit
//! the viewport actually gets to see.

use num::Complex;

use crate::planes::Viewport;

/// One sample of an orbit: the iterate `z`, together with the constant
/// `c` that produced it.  A seed is a point whose `z` is still zero.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    /// The current iterate.
    pub z: Complex<f64>,
    /// The constant added at every step.
    pub c: Complex<f64>,
}

impl Point {
    /// A seed for the constant `c`.
    pub fn seed(c: Complex<f64>) -> Point {
        Point {
            z: Complex::new(0.0, 0.0),
            c,
        }
    }

    /// Squared Euclidean distance from the iterate to `other`.
    #[inline]
    pub fn dist2(&self, other: Complex<f64>) -> f64 {
        (self.z - other).norm_sqr()
    }
}

/// Storage for the iterates of a single evaluation.  It is allocated
/// once, at its full capacity, and every call to `evaluate` overwrites
/// what the previous call left behind, so anything derived from an
/// orbit has to be consumed before the next evaluation.
#[derive(Clone, Debug)]
pub struct Orbit {
    points: Vec<Point>,
    capacity: usize,
}

impl Orbit {
    /// An empty orbit able to hold `capacity` iterates.
    pub fn with_capacity(capacity: usize) -> Orbit {
        Orbit {
            points: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// The most iterations `evaluate` may be asked for.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Length of the last evaluated orbit.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the last evaluation escaped on its first step, or if
    /// nothing has been evaluated yet.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The iterates of the last evaluation, in order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Iterate z -> z^2 + c from z = 0 for the seed's `c`, recording
    /// every iterate, until the iterate's squared magnitude exceeds
    /// `escape_radius2` or `max_iterations` steps have been taken.
    /// Returns true if the orbit escaped; the escaping iterate itself
    /// is not recorded.
    ///
    /// Panics if `max_iterations` exceeds the capacity of the orbit.
    pub fn evaluate(&mut self, seed: &Point, max_iterations: usize, escape_radius2: f64) -> bool {
        assert!(
            max_iterations <= self.capacity,
            "asked for {} iterations from an orbit that holds {}",
            max_iterations,
            self.capacity
        );
        self.points.clear();
        let c = seed.c;
        let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
        for _ in 0..max_iterations {
            z = z * z + c;
            if z.norm_sqr() > escape_radius2 {
                return true;
            }
            self.points.push(Point { z, c });
        }
        false
    }

    /// The fraction of the orbit's iterates that land on screen.  This
    /// is what the sampler is trying to maximize.  The orbit must not
    /// be empty; callers treat an empty orbit as contributing nothing.
    pub fn contribution(&self, viewport: &Viewport) -> f64 {
        debug_assert!(!self.points.is_empty());
        let visible = self
            .points
            .iter()
            .filter(|p| viewport.is_on_screen(viewport.project(p)))
            .count();
        visible as f64 / self.points.len() as f64
    }

    /// How close the orbit ever comes to `target`, squared.  Infinite
    /// for an empty orbit.
    pub fn closest_dist2(&self, target: Complex<f64>) -> f64 {
        self.points
            .iter()
            .map(|p| p.dist2(target))
            .fold(std::f64::INFINITY, f64::min)
    }
}

const D4: f64 = 1.0 / 4.0;
const D16: f64 = D4 / 4.0;

/// True if `c` lies inside the main cardioid or the period-2 bulb.
/// Those points never escape, so samplers that only care about
/// escaping orbits can skip them without iterating.
pub fn in_main_bulbs(c: Complex<f64>) -> bool {
    let y = c.im * c.im;
    let q = y + (c.re - D4) * (c.re - D4);
    q * (q + c.re - D4) <= y * D4 || (c.re + 1.0) * (c.re + 1.0) + y <= D16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Target;

    fn full_set() -> Viewport {
        Viewport::new(Target::full_set(), 480, 640).unwrap()
    }

    #[test]
    fn origin_never_escapes() {
        let mut orbit = Orbit::with_capacity(50_000);
        for &budget in &[1, 500, 5_000, 50_000] {
            let escaped = orbit.evaluate(&Point::seed(Complex::new(0.0, 0.0)), budget, 4.0);
            assert!(!escaped);
            assert_eq!(orbit.len(), budget);
        }
    }

    #[test]
    fn far_seeds_escape_on_the_first_step() {
        let vp = full_set();
        let mut orbit = Orbit::with_capacity(100);
        for &c in &[Complex::new(2.5, 0.0), Complex::new(-1.6, 1.6), Complex::new(0.0, -3.0)] {
            assert!(orbit.evaluate(&Point::seed(c), 100, vp.escape_radius2()));
            assert!(orbit.is_empty());
        }
    }

    #[test]
    fn escaping_iterate_is_not_recorded() {
        // 1 -> 2 -> 5: escapes on the third step with two points kept.
        let mut orbit = Orbit::with_capacity(10);
        assert!(orbit.evaluate(&Point::seed(Complex::new(1.0, 0.0)), 10, 4.0));
        assert_eq!(orbit.len(), 2);
        assert_eq!(orbit.points()[0].z, Complex::new(1.0, 0.0));
        assert_eq!(orbit.points()[1].z, Complex::new(2.0, 0.0));
        assert_eq!(orbit.points()[1].c, Complex::new(1.0, 0.0));
    }

    #[test]
    fn evaluation_overwrites_the_previous_orbit() {
        let mut orbit = Orbit::with_capacity(10);
        orbit.evaluate(&Point::seed(Complex::new(0.0, 0.0)), 10, 4.0);
        assert_eq!(orbit.len(), 10);
        orbit.evaluate(&Point::seed(Complex::new(1.0, 0.0)), 10, 4.0);
        assert_eq!(orbit.len(), 2);
    }

    #[test]
    #[should_panic]
    fn asking_past_the_cap_panics() {
        let mut orbit = Orbit::with_capacity(10);
        orbit.evaluate(&Point::seed(Complex::new(0.0, 0.0)), 11, 4.0);
    }

    #[test]
    fn contribution_is_a_fraction() {
        let vp = Viewport::new(Target::new(0.0, 0.0, 1.0), 100, 100).unwrap();
        let mut orbit = Orbit::with_capacity(10);

        // Stays at zero: always on screen.
        orbit.evaluate(&Point::seed(Complex::new(0.0, 0.0)), 10, vp.escape_radius2());
        assert_eq!(orbit.contribution(&vp), 1.0);

        // 1 -> 2, and the screen only spans [-0.5, 0.5].
        orbit.evaluate(&Point::seed(Complex::new(1.0, 0.0)), 10, vp.escape_radius2());
        assert_eq!(orbit.contribution(&vp), 0.0);

        // 0.25i -> -0.0625+0.25i -> ... stays near the center.
        orbit.evaluate(&Point::seed(Complex::new(0.0, 0.25)), 10, vp.escape_radius2());
        let contribution = orbit.contribution(&vp);
        assert!(contribution >= 0.0 && contribution <= 1.0);
    }

    #[test]
    fn closest_approach() {
        let mut orbit = Orbit::with_capacity(10);
        orbit.evaluate(&Point::seed(Complex::new(1.0, 0.0)), 10, 4.0);
        assert_eq!(orbit.closest_dist2(Complex::new(2.0, 0.0)), 0.0);
        assert_eq!(orbit.closest_dist2(Complex::new(0.0, 0.0)), 1.0);
        let empty = Orbit::with_capacity(1);
        assert!(empty.closest_dist2(Complex::new(0.0, 0.0)).is_infinite());
    }

    #[test]
    fn main_bulbs() {
        assert!(in_main_bulbs(Complex::new(0.0, 0.0)));
        assert!(in_main_bulbs(Complex::new(-1.0, 0.0)));
        assert!(in_main_bulbs(Complex::new(0.2, 0.1)));
        assert!(!in_main_bulbs(Complex::new(0.5, 0.0)));
        assert!(!in_main_bulbs(Complex::new(-2.0, 1.0)));
    }
}
