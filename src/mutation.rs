// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Proposals for the Markov chains.  Most mutations nudge the current
//! seed a little; every so often the kernel gives up on the
//! neighborhood entirely and picks a fresh seed from anywhere in the
//! escape disk, so that no chain can get stuck in one corner of the
//! set forever.

use num::Complex;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use std::f64::consts::PI;

use crate::config::MutationParams;
use crate::orbit::Point;

/// A uniformly random seed inside the disk of `radius` around
/// `center`, by rejection from the enclosing square.
pub fn random_in_disk<R: Rng>(rng: &mut R, center: Complex<f64>, radius: f64) -> Point {
    let r2 = radius * radius;
    loop {
        let offset = Complex::new(rng.gen_range(-radius, radius), rng.gen_range(-radius, radius));
        if offset.norm_sqr() < r2 {
            return Point::seed(center + offset);
        }
    }
}

/// Proposes candidates for one chain.  The restart counter belongs to
/// the kernel, so every chain needs its own.
#[derive(Clone, Debug)]
pub struct MutationKernel {
    restart_interval: u32,
    counter: u32,
    // Largest perturbation radius, already scaled by the zoom.
    base_radius: f64,
    restart_radius: f64,
    angle: Uniform<f64>,
    // exp(-u) for u in this range spans [1/step_ratio, 1].
    shrink: Uniform<f64>,
}

impl MutationKernel {
    /// A kernel for a target at `zoom`, restarting inside the disk of
    /// `restart_radius` around the origin (normally the escape radius).
    pub fn new(params: &MutationParams, zoom: f64, restart_radius: f64) -> Self {
        MutationKernel {
            restart_interval: params.restart_interval,
            counter: params.restart_interval,
            base_radius: params.step_scale / zoom,
            restart_radius,
            angle: Uniform::new(0.0, 2.0 * PI),
            shrink: Uniform::new(0.0, params.step_ratio.ln()),
        }
    }

    /// The largest radius a small step can have.
    pub fn base_radius(&self) -> f64 {
        self.base_radius
    }

    /// Propose a successor to `current`.  One call in every
    /// `restart_interval` returns a fresh point from the whole disk;
    /// the rest move `c` by a random angle and a log-uniform radius
    /// between the smallest and largest step.
    pub fn mutate<R: Rng>(&mut self, current: &Point, rng: &mut R) -> Point {
        self.counter -= 1;
        if self.counter == 0 {
            self.counter = self.restart_interval;
            return random_in_disk(rng, Complex::new(0.0, 0.0), self.restart_radius);
        }

        let phi = self.angle.sample(rng);
        let r = self.base_radius * (-self.shrink.sample(rng)).exp();
        Point::seed(current.c + Complex::from_polar(&r, &phi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn disk_samples_stay_in_the_disk() {
        let mut rng = StdRng::seed_from_u64(7);
        let center = Complex::new(-0.5, 0.25);
        for _ in 0..1000 {
            let p = random_in_disk(&mut rng, center, 0.1);
            assert!((p.c - center).norm_sqr() < 0.01);
            assert_eq!(p.z, Complex::new(0.0, 0.0));
        }
    }

    #[test]
    fn small_steps_stay_within_the_base_radius() {
        let params = MutationParams {
            restart_interval: 1_000_000,
            ..MutationParams::default()
        };
        let mut kernel = MutationKernel::new(&params, 10.0, 2.0);
        let mut rng = StdRng::seed_from_u64(11);
        let current = Point::seed(Complex::new(-0.75, 0.1));
        let smallest = kernel.base_radius() / params.step_ratio;
        for _ in 0..1000 {
            let step = (kernel.mutate(&current, &mut rng).c - current.c).norm();
            assert!(step <= kernel.base_radius() * (1.0 + 1e-12));
            assert!(step >= smallest * (1.0 - 1e-12));
        }
    }

    #[test]
    fn base_radius_shrinks_with_zoom() {
        let params = MutationParams::default();
        let near = MutationKernel::new(&params, 100.0, 2.0);
        let far = MutationKernel::new(&params, 1.0, 2.0);
        assert!((near.base_radius() - 0.001).abs() < 1e-15);
        assert!((far.base_radius() - 0.1).abs() < 1e-15);
    }

    #[test]
    fn every_fifth_mutation_restarts() {
        // With a tiny step, anything far from the current point must
        // have come from a restart.
        let params = MutationParams {
            step_scale: 1e-9,
            ..MutationParams::default()
        };
        let mut kernel = MutationKernel::new(&params, 1.0, 2.0);
        let mut rng = StdRng::seed_from_u64(3);
        let current = Point::seed(Complex::new(10.0, 10.0));
        let restarts: Vec<usize> = (1..=20)
            .filter(|_| (kernel.mutate(&current, &mut rng).c - current.c).norm() > 1.0)
            .collect();
        assert_eq!(restarts, vec![5, 10, 15, 20]);
    }
}
