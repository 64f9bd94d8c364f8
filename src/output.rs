// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tone mapping and file output.  Each channel is divided by its own
//! maximum, pushed through a gain curve, and written out as PNM.

use image::pnm::PNMEncoder;
use image::pnm::{PNMSubtype, SampleEncoding};
use image::ColorType;
use num::clamp;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::buffer::AccumulationBuffer;
use crate::config::CHANNELS;
use crate::error::Result;

// log(1.25) / log(2): sends 0.25 to 0.3125 and leaves 0.5 alone.
const BEND_EXPONENT: f32 = 0.321_928_1;

fn bend(x: f32) -> f32 {
    (2.0 * x).powf(BEND_EXPONENT) / 2.0
}

/// Map a normalized value in [0, 1] to a byte.  The curve is an inverse
/// sigmoid, brightening small-but-not-zero values and darkening
/// large-but-not-one values.  That still comes out too dark, so the
/// result is doubled and saturates at 255.
pub fn gain_correct(x: f32) -> u8 {
    let x = clamp(x, 0.0, 1.0);
    let adjusted = if x <= 0.5 { bend(x) } else { 1.0 - bend(1.0 - x) };
    let m = (adjusted * 2.0 * 256.0) as i32;
    clamp(m, 0, 255) as u8
}

/// The whole buffer as interleaved 8-bit RGB, channel 0 in red.
pub fn to_rgb8(buffer: &AccumulationBuffer) -> Vec<u8> {
    let maxima = buffer.maxima();
    let mut pixels = Vec::with_capacity(buffer.cells().len() * CHANNELS);
    for cell in buffer.cells() {
        for channel in 0..CHANNELS {
            pixels.push(gain_correct(cell[channel] / maxima[channel]));
        }
    }
    pixels
}

/// One channel of the buffer as 8-bit gray.
pub fn to_gray8(buffer: &AccumulationBuffer, channel: usize) -> Vec<u8> {
    let maximum = buffer.maxima()[channel];
    buffer
        .cells()
        .iter()
        .map(|cell| gain_correct(cell[channel] / maximum))
        .collect()
}

fn write_pnm(
    path: &Path,
    pixels: &[u8],
    buffer: &AccumulationBuffer,
    subtype: PNMSubtype,
    color: ColorType,
) -> Result<()> {
    let output = BufWriter::new(File::create(path)?);
    let mut encoder = PNMEncoder::new(output).with_subtype(subtype);
    encoder.encode(pixels, buffer.width() as u32, buffer.height() as u32, color)?;
    Ok(())
}

/// Write the buffer as a binary color PPM.
pub fn write_ppm<P: AsRef<Path>>(path: P, buffer: &AccumulationBuffer) -> Result<()> {
    let pixels = to_rgb8(buffer);
    write_pnm(
        path.as_ref(),
        &pixels,
        buffer,
        PNMSubtype::Pixmap(SampleEncoding::Binary),
        ColorType::RGB(8),
    )
}

/// Write one channel of the buffer as a binary PGM.
pub fn write_pgm<P: AsRef<Path>>(path: P, buffer: &AccumulationBuffer, channel: usize) -> Result<()> {
    let pixels = to_gray8(buffer, channel);
    write_pnm(
        path.as_ref(),
        &pixels,
        buffer,
        PNMSubtype::Graymap(SampleEncoding::Binary),
        ColorType::Gray(8),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Target;
    use crate::orbit::Point;
    use crate::planes::Viewport;
    use num::Complex;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn gain_curve_endpoints() {
        assert_eq!(gain_correct(0.0), 0);
        assert_eq!(gain_correct(1.0), 255);
        // The midpoint is left alone by the bend and saturates once doubled.
        assert_eq!(gain_correct(0.5), 255);
        assert_eq!(gain_correct(-3.0), 0);
        assert_eq!(gain_correct(7.0), 255);
    }

    #[test]
    fn gain_curve_brightens_the_dark_end() {
        let quarter = gain_correct(0.25);
        assert!(quarter > 128);
        assert!(gain_correct(0.01) > 0);
        assert!(gain_correct(0.01) <= gain_correct(0.02));
    }

    fn lit_buffer() -> AccumulationBuffer {
        let vp = Viewport::new(Target::new(0.0, 0.5, 1.0), 4, 2).unwrap();
        let mut buffer = AccumulationBuffer::for_viewport(&vp);
        let p = Point {
            z: Complex::new(0.0, 0.5),
            c: Complex::new(0.0, 0.0),
        };
        buffer.splat(0, &[p], &vp);
        buffer
    }

    #[test]
    fn rgb_layout() {
        let pixels = to_rgb8(&lit_buffer());
        assert_eq!(pixels.len(), 4 * 2 * 3);
        // Pixel (2, 1) is the only lit one, red only.
        let lit = (4 + 2) * 3;
        assert_eq!(&pixels[lit..lit + 3], &[255, 0, 0]);
        assert_eq!(pixels.iter().filter(|&&b| b != 0).count(), 1);
    }

    #[test]
    fn writes_ppm_and_pgm() {
        let dir = tempdir().unwrap();
        let buffer = lit_buffer();
        let color = dir.path().join("color.ppm");
        let red = dir.path().join("red.pgm");
        write_ppm(&color, &buffer).unwrap();
        write_pgm(&red, &buffer, 0).unwrap();
        let color = fs::read(color).unwrap();
        let red = fs::read(red).unwrap();
        assert!(color.starts_with(b"P6"));
        assert!(red.starts_with(b"P5"));
        assert!(color.ends_with(&to_rgb8(&buffer)));
        assert!(red.ends_with(&to_gray8(&buffer, 0)));
    }
}
