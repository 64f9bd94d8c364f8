// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The classic Buddhabrot: pick seeds uniformly from the escape disk
//! and plot every orbit that escapes.  "Naive" in this case means that
//! nothing steers the sampling toward the screen, so at any real zoom
//! almost every sample is wasted.  It's kept as a baseline for the
//! Metropolis sampler.

use num::Complex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::buffer::AccumulationBuffer;
use crate::config::{Config, CHANNELS};
use crate::error::{RenderError, Result};
use crate::mutation::random_in_disk;
use crate::orbit::{in_main_bulbs, Orbit};
use crate::planes::Viewport;

/// Takes a viewport and a sample count and renders a Buddhabrot by
/// uniform sampling.  Each stratum's channel receives every escaping
/// orbit short enough for its budget.
pub struct NaiveRenderer {
    viewport: Viewport,
    strata: [usize; CHANNELS],
    budget: usize,
    samples: usize,
    seed: u64,
}

impl NaiveRenderer {
    /// Requires the configuration (for the target, the strata and the
    /// seed) and the total number of seeds to try.
    pub fn new(config: &Config, samples: usize) -> Result<Self> {
        config.validate()?;
        Ok(NaiveRenderer {
            viewport: Viewport::from_config(config)?,
            strata: config.strata,
            budget: config.evaluation_budget(),
            samples,
            seed: config.seed,
        })
    }

    /// The geometry of the image.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    // Try `samples` seeds, plotting into `buffer`.
    fn plot(&self, samples: usize, rng: &mut StdRng, buffer: &mut AccumulationBuffer) {
        let mut orbit = Orbit::with_capacity(self.budget);
        let origin = Complex::new(0.0, 0.0);
        let radius = self.viewport.escape_radius();
        for _ in 0..samples {
            let seed = random_in_disk(rng, origin, radius);
            if in_main_bulbs(seed.c) {
                continue;
            }
            if !orbit.evaluate(&seed, self.budget, self.viewport.escape_radius2()) {
                continue;
            }
            for (channel, &budget) in self.strata.iter().enumerate() {
                if orbit.len() <= budget {
                    buffer.splat(channel, orbit.points(), &self.viewport);
                }
            }
        }
    }

    /// A multi-threaded render.  Every worker has its own generator,
    /// derived from the seed and the worker's index, and its own
    /// buffer; the buffers are merged at the end.
    pub fn buddhabrot(&self, threads: usize) -> Result<AccumulationBuffer> {
        let threads = threads.max(1);
        let shares: Vec<(u64, usize)> = (0..threads)
            .map(|i| {
                let extra = if i < self.samples % threads { 1 } else { 0 };
                (self.seed.wrapping_add(i as u64), self.samples / threads + extra)
            })
            .collect();

        let regions = crossbeam::scope(|spawner| {
            let handles: Vec<_> = shares
                .iter()
                .map(|&(seed, samples)| {
                    spawner.spawn(move |_| {
                        let mut rng = StdRng::seed_from_u64(seed);
                        let mut region = AccumulationBuffer::for_viewport(&self.viewport);
                        self.plot(samples, &mut rng, &mut region);
                        region
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().map_err(|_| RenderError::WorkerPanicked))
                .collect::<Result<Vec<AccumulationBuffer>>>()
        })
        .map_err(|_| RenderError::WorkerPanicked)??;

        let mut merged = AccumulationBuffer::for_viewport(&self.viewport);
        for region in &regions {
            merged.merge(region);
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            width: 48,
            height: 64,
            strata: [2_000, 200, 20],
            max_orbit_length: 2_000,
            seed: 17,
            ..Config::default()
        }
    }

    #[test]
    fn classic_render_plots_something() {
        let renderer = NaiveRenderer::new(&config(), 500).unwrap();
        let buffer = renderer.buddhabrot(1).unwrap();
        assert!(buffer.total(0) > 0.0);
        // Anything short enough for a small budget fits the big one too.
        assert!(buffer.total(0) >= buffer.total(1));
        assert!(buffer.total(1) >= buffer.total(2));
    }

    #[test]
    fn classic_render_is_repeatable() {
        let renderer = NaiveRenderer::new(&config(), 300).unwrap();
        assert_eq!(renderer.buddhabrot(2).unwrap(), renderer.buddhabrot(2).unwrap());
    }

    #[test]
    fn rejects_invalid_configuration() {
        let mut bad = config();
        bad.width = 0;
        assert!(NaiveRenderer::new(&bad, 10).is_err());
    }
}
