// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The errors a render can report.  Contract violations (asking the
//! evaluator for more iterations than the orbit can hold, splatting
//! into a channel that doesn't exist) are panics, not errors.

use failure::Fail;
use std::io;

/// Everything that can go wrong while setting up or running a render.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The configuration can't describe a renderable image.
    #[fail(display = "invalid configuration: {}", _0)]
    InvalidConfig(String),

    /// The seed finder narrowed its search disk past the depth bound
    /// without finding an orbit that touches the screen.
    #[fail(display = "no visible seed found after {} refinements", depth)]
    SeedSearchExhausted {
        /// The depth bound that was exceeded.
        depth: usize,
    },

    /// A per-chain random generator could not be derived from the
    /// master generator.
    #[fail(display = "could not seed random generator: {}", _0)]
    Rng(String),

    /// A worker thread panicked in the middle of a round.
    #[fail(display = "render worker panicked")]
    WorkerPanicked,

    /// Writing the image failed.
    #[fail(display = "I/O error: {}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        RenderError::Io(err)
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, RenderError>;
