// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A render session: the ensemble of chains, the image they plot into,
//! and the loop that drives them.
//!
//! As many disparate parts of the Mandelbrot set produce orbits that
//! pass through the screen, the session runs many copies of the
//! sampler from different starting points; that way important orbits
//! are less likely to be missed early on.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use crate::buffer::AccumulationBuffer;
use crate::chain::Chain;
use crate::config::Config;
use crate::error::{RenderError, Result};
use crate::planes::Viewport;

/// Owns everything a render needs.  Nothing lives in globals, so any
/// number of sessions can run side by side.
pub struct RenderSession {
    config: Config,
    viewport: Viewport,
    chains: Vec<Chain>,
    buffer: AccumulationBuffer,
    accepted: u64,
}

// Split `count` items into at most `threads` contiguous runs.
fn chunk_size(count: usize, threads: usize) -> usize {
    let threads = threads.max(1);
    ((count + threads - 1) / threads).max(1)
}

impl RenderSession {
    /// Validate the configuration and seed every chain.  Each chain
    /// gets its own generator, derived in order from the master seed,
    /// so the chains come out the same however many threads look for
    /// their seeds.
    pub fn bootstrap(config: Config, threads: usize) -> Result<RenderSession> {
        config.validate()?;
        let viewport = Viewport::from_config(&config)?;

        let mut master = StdRng::seed_from_u64(config.seed);
        let mut rngs = Vec::with_capacity(config.ensemble_size);
        for _ in 0..config.ensemble_size {
            rngs.push(StdRng::from_rng(&mut master).map_err(|e| RenderError::Rng(e.to_string()))?);
        }
        let jobs: Vec<(usize, StdRng)> = rngs.into_iter().enumerate().collect();
        let per_worker = chunk_size(jobs.len(), threads);

        let mut chains = Vec::with_capacity(config.ensemble_size);
        {
            let (config, viewport) = (&config, &viewport);
            let seeded = crossbeam::scope(|spawner| {
                let handles: Vec<_> = jobs
                    .chunks(per_worker)
                    .map(|jobs| {
                        spawner.spawn(move |_| {
                            jobs.iter()
                                .map(|(index, rng)| Chain::bootstrap(*index, config, viewport, rng.clone()))
                                .collect::<Vec<Chain>>()
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| handle.join().map_err(|_| RenderError::WorkerPanicked))
                    .collect::<Result<Vec<Vec<Chain>>>>()
            })
            .map_err(|_| RenderError::WorkerPanicked)??;
            for batch in seeded {
                chains.extend(batch);
            }
        }
        info!(chains = chains.len(), "ensemble bootstrapped");

        let buffer = AccumulationBuffer::for_viewport(&viewport);
        Ok(RenderSession {
            config,
            viewport,
            chains,
            buffer,
            accepted: 0,
        })
    }

    /// The configuration the session was started with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The geometry of the image.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The chains, in ensemble order.
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// The image so far.
    pub fn buffer(&self) -> &AccumulationBuffer {
        &self.buffer
    }

    /// Total accepted mutations over all chains and strata.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// One outer iteration on the calling thread: every chain, in
    /// order, gets one step.  Returns the number of acceptances.
    pub fn step(&mut self) -> u64 {
        let budget = self.config.evaluation_budget();
        let strata = self.config.strata;
        let mut accepted = 0;
        for chain in self.chains.iter_mut() {
            accepted += chain.advance(&self.viewport, &strata, budget, &mut self.buffer);
        }
        self.accepted += accepted;
        accepted
    }

    /// Run `iterations` outer iterations with the chains split across
    /// `threads` workers.  Every worker plots into a private buffer
    /// that is merged into the session's when the round is over; the
    /// counts are whole numbers, so the merged image is the same as a
    /// single-threaded run would have made.  `stop` is checked before
    /// every chain step.
    pub fn run_round(&mut self, iterations: usize, threads: usize, stop: &AtomicBool) -> Result<u64> {
        let budget = self.config.evaluation_budget();
        let strata = self.config.strata;
        let per_worker = chunk_size(self.chains.len(), threads);
        let viewport = &self.viewport;
        let chains = &mut self.chains;

        let results = crossbeam::scope(|spawner| {
            let handles: Vec<_> = chains
                .chunks_mut(per_worker)
                .map(|chains| {
                    spawner.spawn(move |_| {
                        let mut local = AccumulationBuffer::for_viewport(viewport);
                        let mut accepted = 0;
                        'rounds: for _ in 0..iterations {
                            for chain in chains.iter_mut() {
                                if stop.load(Ordering::Relaxed) {
                                    break 'rounds;
                                }
                                accepted += chain.advance(viewport, &strata, budget, &mut local);
                            }
                        }
                        (local, accepted)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().map_err(|_| RenderError::WorkerPanicked))
                .collect::<Result<Vec<(AccumulationBuffer, u64)>>>()
        })
        .map_err(|_| RenderError::WorkerPanicked)??;

        let mut accepted = 0;
        for (local, count) in results {
            self.buffer.merge(&local);
            accepted += count;
        }
        self.accepted += accepted;
        Ok(accepted)
    }

    /// Render until `rounds` rounds of `round_length` outer iterations
    /// have run, or forever if `rounds` is zero, or until `stop` is
    /// raised.  `flush` is handed the image each time `flush_every`
    /// acceptances have piled up since the last flush, and once more at
    /// the end.
    pub fn run<F>(
        &mut self,
        rounds: usize,
        round_length: usize,
        threads: usize,
        stop: &AtomicBool,
        mut flush: F,
    ) -> Result<u64>
    where
        F: FnMut(&AccumulationBuffer, u64) -> Result<()>,
    {
        let mut pending = 0;
        let mut round = 0;
        while (rounds == 0 || round < rounds) && !stop.load(Ordering::Relaxed) {
            let accepted = self.run_round(round_length, threads, stop)?;
            round += 1;
            pending += accepted;
            debug!(round, accepted, total = self.accepted, "round complete");
            if pending >= self.config.flush_every {
                flush(&self.buffer, self.accepted)?;
                pending = 0;
            }
        }
        flush(&self.buffer, self.accepted)?;
        Ok(self.accepted)
    }
}
