// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A single Metropolis-Hastings chain.
//!
//! A chain holds the seed it last accepted, how much of that seed's
//! orbit was visible, and, for every iteration stratum, the budget and
//! orbit length it last accepted under.  Each step proposes one
//! candidate, evaluates it once at the largest budget, and then lets
//! every stratum whose budget admits the candidate's orbit length
//! decide independently whether to take it.

use num::Complex;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, warn};

use crate::buffer::AccumulationBuffer;
use crate::config::{Config, CHANNELS};
use crate::mutation::MutationKernel;
use crate::orbit::{Orbit, Point};
use crate::planes::Viewport;
use crate::seed::SeedFinder;

/// What one stratum remembers about the last candidate it accepted.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StratumRecord {
    /// The iteration budget of the stratum at the time.
    pub last_budget: usize,
    /// The length of the accepted orbit.
    pub last_orbit_length: usize,
}

/// The Metropolis acceptance ratio for a candidate with contribution
/// `candidate` against a chain currently at `current`, in a stratum of
/// `budget` iterations that last accepted under `record`.
///
/// The two transition terms correct for long orbits being proposed and
/// accepted less often than short ones.  When the candidate is the
/// chain's own state, every factor cancels and the ratio is exactly 1.
pub fn acceptance_ratio(
    candidate: f64,
    current: f64,
    budget: usize,
    record: StratumRecord,
    orbit_length: usize,
) -> f64 {
    let (budget, last_budget) = (budget as f64, record.last_budget as f64);
    let (length, last_length) = (orbit_length as f64, record.last_orbit_length as f64);
    let t1 = (budget * last_length) / (last_budget * length);
    let t2 = (last_budget * length) / (budget * last_length);
    (candidate * t1) / (current * t2)
}

/// One member of the ensemble.  Chains share nothing with each other:
/// each owns its random generator, its mutation kernel and its orbit
/// scratch space, so they can be stepped on any thread in any order.
pub struct Chain {
    state: Point,
    contribution: f64,
    strata: [StratumRecord; CHANNELS],
    kernel: MutationKernel,
    orbit: Orbit,
    rng: StdRng,
    accepted: u64,
}

impl Chain {
    /// Start a chain at `state`, whose orbit at `budget` iterations was
    /// `orbit_length` long and had the given contribution.  Every
    /// stratum starts from the same record.
    pub fn new(
        state: Point,
        contribution: f64,
        budget: usize,
        orbit_length: usize,
        kernel: MutationKernel,
        orbit: Orbit,
        rng: StdRng,
    ) -> Chain {
        let record = StratumRecord {
            last_budget: budget,
            last_orbit_length: orbit_length,
        };
        Chain {
            state,
            contribution,
            strata: [record; CHANNELS],
            kernel,
            orbit,
            rng,
            accepted: 0,
        }
    }

    /// Find a visible seed for chain `index` and start a chain there.
    /// A seed search that runs out of depth is logged and started over;
    /// a well-formed configuration always has a visible seed somewhere.
    pub fn bootstrap(index: usize, config: &Config, viewport: &Viewport, mut rng: StdRng) -> Chain {
        let budget = config.evaluation_budget();
        let mut orbit = Orbit::with_capacity(config.max_orbit_length);
        let finder = SeedFinder::new(viewport, config.seed_search, budget);
        let origin = Complex::new(0.0, 0.0);

        let mut attempt = 1;
        let seed = loop {
            match finder.find(origin, config.seed_search.radius, &mut orbit, &mut rng) {
                Ok(seed) => break seed,
                Err(err) => {
                    warn!(chain = index, attempt, "couldn't find a seed: {}", err);
                    attempt += 1;
                }
            }
        };

        orbit.evaluate(&seed, budget, viewport.escape_radius2());
        let contribution = orbit.contribution(viewport);
        debug!(chain = index, re = seed.c.re, im = seed.c.im, contribution, "chain seeded");

        let kernel = MutationKernel::new(&config.mutation, viewport.target.zoom, viewport.escape_radius());
        let length = orbit.len();
        Chain::new(seed, contribution, budget, length, kernel, orbit, rng)
    }

    /// The last accepted seed.
    pub fn state(&self) -> &Point {
        &self.state
    }

    /// The contribution of the last accepted seed.
    pub fn contribution(&self) -> f64 {
        self.contribution
    }

    /// The per-stratum bookkeeping.
    pub fn strata(&self) -> &[StratumRecord; CHANNELS] {
        &self.strata
    }

    /// How many times any stratum of this chain has accepted.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// One step of the chain: propose, evaluate at `budget`, and offer
    /// the candidate to every stratum.  Accepted orbits are plotted
    /// into the stratum's channel.  Returns the number of acceptances.
    pub fn advance(
        &mut self,
        viewport: &Viewport,
        strata: &[usize; CHANNELS],
        budget: usize,
        buffer: &mut AccumulationBuffer,
    ) -> u64 {
        let candidate = self.kernel.mutate(&self.state, &mut self.rng);
        if !self.orbit.evaluate(&candidate, budget, viewport.escape_radius2()) || self.orbit.is_empty() {
            return 0;
        }
        let contribution = self.orbit.contribution(viewport);
        if contribution == 0.0 {
            return 0;
        }

        let length = self.orbit.len();
        let mut accepted = 0;
        for (channel, &stratum_budget) in strata.iter().enumerate() {
            if length > stratum_budget {
                continue;
            }
            let alpha = acceptance_ratio(
                contribution,
                self.contribution,
                stratum_budget,
                self.strata[channel],
                length,
            );
            if alpha > self.rng.gen::<f64>() {
                self.state = candidate;
                self.contribution = contribution;
                self.strata[channel] = StratumRecord {
                    last_budget: stratum_budget,
                    last_orbit_length: length,
                };
                buffer.splat(channel, self.orbit.points(), viewport);
                accepted += 1;
            }
        }
        self.accepted += accepted;
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Target;
    use rand::SeedableRng;

    #[test]
    fn identical_candidate_is_always_accepted() {
        let record = StratumRecord {
            last_budget: 5_000,
            last_orbit_length: 321,
        };
        assert_eq!(acceptance_ratio(0.25, 0.25, 5_000, record, 321), 1.0);
    }

    #[test]
    fn better_contribution_raises_the_ratio() {
        let record = StratumRecord {
            last_budget: 500,
            last_orbit_length: 100,
        };
        let better = acceptance_ratio(0.5, 0.25, 500, record, 100);
        let worse = acceptance_ratio(0.1, 0.25, 500, record, 100);
        assert_eq!(better, 2.0);
        assert!(worse < 1.0);
    }

    #[test]
    fn transition_terms_square_the_length_ratio() {
        let record = StratumRecord {
            last_budget: 500,
            last_orbit_length: 100,
        };
        // T1 / T2 = (last_length / length)^2 at equal budgets.
        let alpha = acceptance_ratio(0.5, 0.5, 500, record, 200);
        assert!((alpha - 0.25).abs() < 1e-12);
    }

    #[test]
    fn bootstrapped_chain_is_visible() {
        let config = Config {
            width: 48,
            height: 64,
            ..Config::default()
        };
        let viewport = Viewport::from_config(&config).unwrap();
        let chain = Chain::bootstrap(0, &config, &viewport, StdRng::seed_from_u64(5));
        assert!(chain.contribution() > 0.0);
        let records = chain.strata();
        assert!(records.iter().all(|r| *r == records[0]));
        assert_eq!(records[0].last_budget, 50_000);
        assert!(records[0].last_orbit_length > 0);
    }

    #[test]
    fn advancing_only_plots_on_acceptance() {
        let config = Config {
            target: Target::full_set(),
            width: 48,
            height: 64,
            ..Config::default()
        };
        let viewport = Viewport::from_config(&config).unwrap();
        let mut chain = Chain::bootstrap(0, &config, &viewport, StdRng::seed_from_u64(9));
        let mut buffer = AccumulationBuffer::for_viewport(&viewport);
        let mut accepted = 0;
        for _ in 0..50 {
            accepted += chain.advance(&viewport, &config.strata, config.evaluation_budget(), &mut buffer);
        }
        assert_eq!(accepted, chain.accepted());
        let total: f64 = (0..CHANNELS).map(|c| buffer.total(c)).sum();
        assert_eq!(accepted == 0, total == 0.0);
    }

    #[test]
    fn strata_only_take_orbits_within_their_budget() {
        let config = Config {
            width: 48,
            height: 64,
            strata: [2_000, 200, 20],
            max_orbit_length: 2_000,
            ..Config::default()
        };
        let viewport = Viewport::from_config(&config).unwrap();
        let budget = config.evaluation_budget();
        let mut chain = Chain::bootstrap(0, &config, &viewport, StdRng::seed_from_u64(23));
        let mut gated = 0;

        for _ in 0..2_000 {
            let before = *chain.strata();
            let mut buffer = AccumulationBuffer::for_viewport(&viewport);
            let accepted = chain.advance(&viewport, &config.strata, budget, &mut buffer);
            let length = chain.orbit.len();

            for (channel, &stratum_budget) in config.strata.iter().enumerate() {
                let plotted = buffer.total(channel) > 0.0;
                if length > stratum_budget {
                    assert!(!plotted);
                    assert_eq!(chain.strata()[channel], before[channel]);
                    if accepted > 0 {
                        gated += 1;
                    }
                } else if plotted {
                    assert_eq!(
                        chain.strata()[channel],
                        StratumRecord {
                            last_budget: stratum_budget,
                            last_orbit_length: length,
                        }
                    );
                } else {
                    assert_eq!(chain.strata()[channel], before[channel]);
                }
            }
        }
        assert!(gated > 0);
    }
}
