// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Viewport struct, which describes the relationship
//! between a rectangle on the integral plane with an origin at 0,0
//! and the region of the complex plane around a target.
//!
//! The image is rotated a quarter turn relative to the usual picture
//! of the Mandelbrot set: the imaginary axis runs across the image
//! and the real axis runs down it, so negative real parts end up near
//! the top.  That's the traditional way to present a Buddhabrot.

use itertools::iproduct;
use num::Complex;

use crate::config::{Config, Target};
use crate::error::{RenderError, Result};
use crate::orbit::Point;

/// Describes the x, y of a pixel.  Projections of orbit points may
/// land anywhere, including off the image, so the coordinates are
/// signed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pixel(pub i64, pub i64);

/// Maps between the complex plane and the pixels of the image, and
/// knows how far out an orbit has to go before it can no longer come
/// back onto the screen.
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Where the camera is pointed.
    pub target: Target,
    /// Width of the integral plane.
    pub width: usize,
    /// Height of the integral plane.
    pub height: usize,
    // Pixels per unit of the complex plane.  Both axes share it; the
    // zoom is defined against the height of the image.
    scale: f64,
    escape_radius2: f64,
}

impl Viewport {
    /// Constructor.  Takes the target and the size of the integral
    /// plane.  The escape radius is derived here, once.
    pub fn new(target: Target, width: usize, height: usize) -> Result<Viewport> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidConfig(
                "The viewport must have a positive width and height".to_string(),
            ));
        }
        if !(target.zoom.is_finite() && target.zoom > 0.0) {
            return Err(RenderError::InvalidConfig(
                "The viewport zoom must be positive".to_string(),
            ));
        }

        let mut viewport = Viewport {
            target,
            width,
            height,
            scale: target.zoom * (height as f64),
            escape_radius2: 0.0,
        };
        viewport.escape_radius2 = viewport.corner_radius2().max(4.0);
        Ok(viewport)
    }

    /// The viewport described by a configuration.
    pub fn from_config(config: &Config) -> Result<Viewport> {
        Viewport::new(config.target, config.width, config.height)
    }

    // The largest squared magnitude among the four corner pixels.
    fn corner_radius2(&self) -> f64 {
        let (right, bottom) = (self.width as i64 - 1, self.height as i64 - 1);
        iproduct!(&[0, right], &[0, bottom])
            .map(|(&x, &y)| self.unproject(Pixel(x, y)).c.norm_sqr())
            .fold(0.0, f64::max)
    }

    /// Given an orbit point, find the pixel its iterate lands on.  Only
    /// the iterate `z` matters; the constant `c` is along for the ride.
    pub fn project(&self, point: &Point) -> Pixel {
        let x = (point.z.im - self.target.center.im) * self.scale + (self.width / 2) as f64;
        let y = (point.z.re - self.target.center.re) * self.scale + (self.height / 2) as f64;
        Pixel(x.round() as i64, y.round() as i64)
    }

    /// Inverse of `project`.  The location lands in `c`, ready to be
    /// used as a seed; `z` is zero.
    pub fn unproject(&self, pixel: Pixel) -> Point {
        let re = (pixel.1 - (self.height / 2) as i64) as f64 / self.scale + self.target.center.re;
        let im = (pixel.0 - (self.width / 2) as i64) as f64 / self.scale + self.target.center.im;
        Point::seed(Complex::new(re, im))
    }

    /// Whether the pixel is inside the image.
    pub fn is_on_screen(&self, pixel: Pixel) -> bool {
        0 <= pixel.0 && pixel.0 < self.width as i64 && 0 <= pixel.1 && pixel.1 < self.height as i64
    }

    /// Linear offset of a pixel from the root of an image buffer laid
    /// out row by row, or None if the pixel is off screen.
    pub fn offset(&self, pixel: Pixel) -> Option<usize> {
        if self.is_on_screen(pixel) {
            Some(pixel.1 as usize * self.width + pixel.0 as usize)
        } else {
            None
        }
    }

    /// For a symmetric target, the pixel across the axis of symmetry.
    /// None when the target isn't symmetric, or when the pixel sits on
    /// the axis and is its own mirror.  The real axis projects onto
    /// column `width / 2`, so at even widths the mirror of column 0
    /// falls off the image.
    pub fn mirror(&self, pixel: Pixel) -> Option<Pixel> {
        if !self.target.is_symmetric() {
            return None;
        }
        let axis = (self.width / 2) as i64;
        let mirrored = Pixel(2 * axis - pixel.0, pixel.1);
        if mirrored == pixel {
            None
        } else {
            Some(mirrored)
        }
    }

    /// The squared escape radius.  A bound of 4 is only enough when
    /// the whole screen lies within radius 2 of the origin; for
    /// anything else it grows to reach the farthest corner, so that no
    /// orbit is cut off while it could still be on screen.
    pub fn escape_radius2(&self) -> f64 {
        self.escape_radius2
    }

    /// The escape radius itself.
    pub fn escape_radius(&self) -> f64 {
        self.escape_radius2.sqrt()
    }
}
