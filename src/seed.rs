// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Finds a first point whose orbit passes through the screen.
//!
//! Not required per se, but it's a lot faster than trying random
//! samples over and over until one sticks, especially at high zoom,
//! where almost nothing picked uniformly from the plane ever lands on
//! screen.  Each round samples a disk; if nothing visible turns up,
//! the disk is halved and recentered on the escaping sample whose
//! orbit came closest to the center of the screen.

use num::Complex;
use rand::Rng;
use tracing::trace;

use crate::config::SeedSearch;
use crate::error::{RenderError, Result};
use crate::mutation::random_in_disk;
use crate::orbit::{Orbit, Point};
use crate::planes::Viewport;

/// Searches for visible seeds in one viewport.
pub struct SeedFinder<'a> {
    viewport: &'a Viewport,
    search: SeedSearch,
    budget: usize,
}

impl<'a> SeedFinder<'a> {
    /// A finder that evaluates every sample at `budget` iterations.
    pub fn new(viewport: &'a Viewport, search: SeedSearch, budget: usize) -> Self {
        SeedFinder {
            viewport,
            search,
            budget,
        }
    }

    /// Look for a seed inside the disk of `radius` around `center`,
    /// shrinking toward the most promising sample each time a disk
    /// comes up empty.  Fails once the disk has been halved more than
    /// `max_depth` times.  The orbit is scratch space; on success it
    /// holds the seed's orbit.
    pub fn find<R: Rng>(
        &self,
        center: Complex<f64>,
        radius: f64,
        orbit: &mut Orbit,
        rng: &mut R,
    ) -> Result<Point> {
        let goal = self.viewport.target.center;
        let escape_radius2 = self.viewport.escape_radius2();
        let (mut center, mut radius) = (center, radius);

        for depth in 0..=self.search.max_depth {
            let mut best: Option<(f64, Point)> = None;
            for _ in 0..self.search.samples {
                let sample = random_in_disk(rng, center, radius);
                if !orbit.evaluate(&sample, self.budget, escape_radius2) || orbit.is_empty() {
                    continue;
                }
                if orbit.contribution(self.viewport) > 0.0 {
                    return Ok(sample);
                }
                let closest = orbit.closest_dist2(goal);
                if best.map_or(true, |(d, _)| closest < d) {
                    best = Some((closest, sample));
                }
            }

            // Nothing escaped at all: stay put and look closer.
            if let Some((d, sample)) = best {
                trace!(depth, closest = d, "narrowing seed search");
                center = sample.c;
            }
            radius /= 2.0;
        }

        Err(RenderError::SeedSearchExhausted {
            depth: self.search.max_depth,
        })
    }
}
