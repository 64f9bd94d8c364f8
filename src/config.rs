// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run configuration.  Everything in here is fixed for the lifetime of
//! a render; there is no way to change the target or the strata of a
//! session once it has been bootstrapped.

use num::Complex;

use crate::error::{RenderError, Result};

/// The number of output channels, and therefore of iteration strata.
pub const CHANNELS: usize = 3;

/// A handful of known-good places to look, as (real, imaginary, zoom).
/// Entry 0 is the empty view and can't be rendered; entry 1 is the
/// whole set.
pub const PRESETS: [(f64, f64, f64); 10] = [
    (0.0, 0.0, 0.0),
    (-0.4, 0.0, 0.32),
    (-1.25275, -0.343, 250.0),
    (-0.1592, -1.0317, 80.5),
    (-0.529854097, -0.667968575, 80.5),
    (-0.657560793, 0.467732884, 70.5),
    (-1.185768799, 0.302592593, 90.5),
    (0.443108035, 0.345012263, 4000.0),
    (-0.647663050, 0.380700836, 1275.0),
    (-0.0443594, -0.986749, 88.2),
];

/// Where the camera is pointed: the point of the complex plane at the
/// center of the image, and how far in we are zoomed.  A zoom of 1.0
/// fits a span of 1.0 into the height of the image.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Target {
    /// The complex coordinate at the center of the image.
    pub center: Complex<f64>,
    /// Magnification; must be positive.
    pub zoom: f64,
}

impl Target {
    /// Build a target from its parts.
    pub fn new(re: f64, im: f64, zoom: f64) -> Self {
        Target {
            center: Complex::new(re, im),
            zoom,
        }
    }

    /// The whole set, centered on the origin.
    pub fn full_set() -> Self {
        Target::new(0.0, 0.0, 0.32)
    }

    /// One of the entries of `PRESETS`.  The empty view and anything
    /// past the end of the table return None.
    pub fn preset(index: usize) -> Option<Self> {
        match PRESETS.get(index) {
            Some(&(re, im, zoom)) if zoom > 0.0 => Some(Target::new(re, im, zoom)),
            _ => None,
        }
    }

    /// The map z -> z^2 + c commutes with conjugation, so a target
    /// centered on the real axis renders a mirror-symmetric image.
    pub fn is_symmetric(&self) -> bool {
        self.center.im == 0.0
    }
}

/// How the mutation kernel proposes new points.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MutationParams {
    /// Every this-many calls the kernel throws away the current point
    /// and picks a fresh one from the whole escape disk.
    pub restart_interval: u32,
    /// The largest perturbation radius, at zoom 1.0.  The actual
    /// radius is divided by the zoom.
    pub step_scale: f64,
    /// The ratio between the largest and the smallest perturbation
    /// radius.  Radii are drawn log-uniformly between the two.
    pub step_ratio: f64,
}

impl Default for MutationParams {
    fn default() -> Self {
        MutationParams {
            restart_interval: 5,
            step_scale: 0.1,
            step_ratio: 1000.0,
        }
    }
}

/// How the seed finder looks for a first visible orbit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SeedSearch {
    /// Random points tried per disk before the disk shrinks.
    pub samples: usize,
    /// How many times the disk may be halved before giving up.
    pub max_depth: usize,
    /// Radius of the initial disk, centered on the origin.
    pub radius: f64,
}

impl Default for SeedSearch {
    fn default() -> Self {
        SeedSearch {
            samples: 200,
            max_depth: 500,
            radius: 2.0,
        }
    }
}

/// Everything needed to start a render session.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Where we're looking.
    pub target: Target,
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// The number of independent Markov chains.
    pub ensemble_size: usize,
    /// Iteration budget per output channel.  Channel `k` only receives
    /// orbits that escape within `strata[k]` iterations.
    pub strata: [usize; CHANNELS],
    /// The capacity of every orbit buffer.  No evaluation may ask for
    /// more iterations than this.
    pub max_orbit_length: usize,
    /// Mutation kernel parameters.
    pub mutation: MutationParams,
    /// Seed finder parameters.
    pub seed_search: SeedSearch,
    /// Seed for the master random generator.  Two sessions with the
    /// same configuration and seed produce identical images.
    pub seed: u64,
    /// Flush the image after this many accepted mutations.
    pub flush_every: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target: Target::full_set(),
            width: 480,
            height: 640,
            ensemble_size: 30,
            strata: [50_000, 5_000, 500],
            max_orbit_length: 50_000,
            mutation: MutationParams::default(),
            seed_search: SeedSearch::default(),
            seed: 0,
            flush_every: 65_536,
        }
    }
}

fn invalid<T>(message: &str) -> Result<T> {
    Err(RenderError::InvalidConfig(message.to_string()))
}

impl Config {
    /// The budget every candidate is evaluated at: the largest
    /// stratum.  Each stratum then decides for itself whether the
    /// realized orbit is short enough to count.
    pub fn evaluation_budget(&self) -> usize {
        self.strata.iter().cloned().max().unwrap_or(0)
    }

    /// Reject configurations that can't be rendered.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return invalid("image dimensions must be positive");
        }
        if !(self.target.zoom.is_finite() && self.target.zoom > 0.0) {
            return invalid("zoom must be a positive number");
        }
        if !(self.target.center.re.is_finite() && self.target.center.im.is_finite()) {
            return invalid("target center must be finite");
        }
        if self.ensemble_size == 0 {
            return invalid("at least one chain is required");
        }
        for (i, budget) in self.strata.iter().enumerate() {
            if *budget == 0 {
                return invalid("iteration strata must be positive");
            }
            if *budget > self.max_orbit_length {
                return invalid("an iteration stratum exceeds the orbit length cap");
            }
            if self.strata[..i].contains(budget) {
                return invalid("iteration strata must be distinct");
            }
        }
        if self.mutation.restart_interval == 0 {
            return invalid("the restart interval must be at least 1");
        }
        if !(self.mutation.step_scale.is_finite() && self.mutation.step_scale > 0.0) {
            return invalid("the mutation step scale must be positive");
        }
        if !(self.mutation.step_ratio.is_finite() && self.mutation.step_ratio > 1.0) {
            return invalid("the mutation step ratio must be greater than 1");
        }
        if self.seed_search.samples == 0 {
            return invalid("the seed search needs at least one sample per disk");
        }
        if !(self.seed_search.radius.is_finite() && self.seed_search.radius > 0.0) {
            return invalid("the seed search radius must be positive");
        }
        if self.flush_every == 0 {
            return invalid("the flush interval must be at least 1");
        }
        Ok(())
    }
}
