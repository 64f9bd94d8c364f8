#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Buddhabrot renderer
//!
//! The Buddhabrot (and the Nebulabrot) are variants of the Mandelbrot
//! set that explore "what's in the black heart" of the Mandelbrot.
//! Each point c of the complex plane is iterated under z -> z^2 + c,
//! starting from zero.  Every iteration creates a new complex number
//! that itself may be used as a coordinate on the complex plane.  By
//! mapping the iterates of every orbit that eventually escapes to the
//! nearest integral pixel and incrementing that pixel by one, we get a
//! density image called a Buddhabrot.  Giving each color channel a
//! different iteration budget makes it a Nebulabrot.
//!
//! Picking seeds uniformly works for the whole set, but once zoomed in
//! almost no orbit passes through the screen.  This crate instead runs
//! an ensemble of Metropolis-Hastings chains that wander toward seeds
//! whose orbits are visible:
//!
//! * `planes` maps between the complex plane and pixels,
//! * `orbit` iterates seeds and scores how visible their orbits are,
//! * `seed` finds each chain's first visible seed,
//! * `mutation` proposes the next seed from the current one,
//! * `chain` decides whether to accept a proposal,
//! * `buffer` accumulates accepted orbits,
//! * `session` ties them together and drives the loop,
//! * `output` tone-maps the result to a PNM file.
//!
//! `naive` keeps the classic uniform sampler around for comparison.

pub mod buffer;
pub mod chain;
pub mod config;
pub mod error;
pub mod mutation;
pub mod naive;
pub mod orbit;
pub mod output;
pub mod planes;
pub mod seed;
pub mod session;

pub use buffer::AccumulationBuffer;
pub use config::{Config, Target, CHANNELS};
pub use error::{RenderError, Result};
pub use naive::NaiveRenderer;
pub use planes::{Pixel, Viewport};
pub use session::RenderSession;
