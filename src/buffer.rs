// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The image the orbits are plotted into: one float per channel per
//! pixel, only ever incremented.  Normalization happens on the way out,
//! in `output`.

use crate::config::CHANNELS;
use crate::orbit::Point;
use crate::planes::Viewport;

/// Below this, a channel maximum is treated as this, so that a
/// completely black channel doesn't divide by zero.
pub const MIN_MAXIMUM: f32 = 0.01;

/// Per-pixel, per-channel hit counts, laid out row by row.
#[derive(Clone, Debug, PartialEq)]
pub struct AccumulationBuffer {
    width: usize,
    height: usize,
    cells: Vec<[f32; CHANNELS]>,
}

impl AccumulationBuffer {
    /// A zeroed buffer.
    pub fn new(width: usize, height: usize) -> Self {
        AccumulationBuffer {
            width,
            height,
            cells: vec![[0.0; CHANNELS]; width * height],
        }
    }

    /// A zeroed buffer the size of the viewport.
    pub fn for_viewport(viewport: &Viewport) -> Self {
        AccumulationBuffer::new(viewport.width, viewport.height)
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// All the cells, row by row.
    pub fn cells(&self) -> &[[f32; CHANNELS]] {
        &self.cells
    }

    /// The channels of the pixel at x, y.
    pub fn get(&self, x: usize, y: usize) -> [f32; CHANNELS] {
        self.cells[y * self.width + x]
    }

    /// Plot an orbit into one channel: every iterate that lands on
    /// screen adds one to its pixel.  For a symmetric target the
    /// mirrored pixel gets one too, unless the pixel is its own
    /// mirror.  Returns the number of increments made.
    pub fn splat(&mut self, channel: usize, orbit: &[Point], viewport: &Viewport) -> usize {
        assert!(channel < CHANNELS, "no such channel: {}", channel);
        debug_assert_eq!((self.width, self.height), (viewport.width, viewport.height));
        let mut hits = 0;
        for point in orbit {
            let pixel = viewport.project(point);
            if let Some(offset) = viewport.offset(pixel) {
                self.cells[offset][channel] += 1.0;
                hits += 1;
                if let Some(offset) = viewport.mirror(pixel).and_then(|m| viewport.offset(m)) {
                    self.cells[offset][channel] += 1.0;
                    hits += 1;
                }
            }
        }
        hits
    }

    /// Add another buffer of the same size into this one.
    pub fn merge(&mut self, other: &AccumulationBuffer) {
        assert_eq!((self.width, self.height), (other.width, other.height));
        for (mine, theirs) in self.cells.iter_mut().zip(other.cells.iter()) {
            for channel in 0..CHANNELS {
                mine[channel] += theirs[channel];
            }
        }
    }

    /// The largest value in each channel, but never less than
    /// `MIN_MAXIMUM`.
    pub fn maxima(&self) -> [f32; CHANNELS] {
        self.cells
            .iter()
            .fold([MIN_MAXIMUM; CHANNELS], |mut acc, cell| {
                for channel in 0..CHANNELS {
                    acc[channel] = acc[channel].max(cell[channel]);
                }
                acc
            })
    }

    /// Sum of every cell in one channel.
    pub fn total(&self, channel: usize) -> f64 {
        self.cells.iter().map(|cell| f64::from(cell[channel])).sum()
    }
}
