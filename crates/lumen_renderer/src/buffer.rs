//! Accumulation buffer with per-pixel running statistics.
//!
//! Every pixel keeps Welford's running mean and sum of squared deviations so
//! that noise can be measured while samples are still arriving.

use crate::{error::RenderResult, Color};
use image::{ImageBuffer, Rgba, RgbaImage};
use std::path::Path;
use std::slice::ChunksMut;

/// Running statistics for one pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pixel {
    samples: u32,
    mean: Color,
    m2: Color,
}

impl Pixel {
    /// Fold one radiance sample into the running statistics.
    pub fn add_sample(&mut self, sample: Color) {
        self.samples += 1;
        if self.samples == 1 {
            self.mean = sample;
            return;
        }
        let previous = self.mean;
        self.mean = previous + (sample - previous) / self.samples as f64;
        self.m2 += (sample - previous) * (sample - self.mean);
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Mean of all samples so far.
    pub fn color(&self) -> Color {
        self.mean
    }

    /// Sample variance, zero until there are two samples.
    pub fn variance(&self) -> Color {
        if self.samples < 2 {
            return Color::ZERO;
        }
        self.m2 / (self.samples - 1) as f64
    }

    pub fn standard_deviation(&self) -> Color {
        let v = self.variance();
        Color::new(v.x.sqrt(), v.y.sqrt(), v.z.sqrt())
    }

    /// Extra samples this pixel should receive out of a budget of `budget`.
    ///
    /// The noisiest channel's standard deviation is divided by `threshold`,
    /// clamped to [0, 1] and raised to `exponent`; the result is the share of
    /// the budget to spend.
    pub fn adaptive_samples(&self, budget: u32, threshold: f64, exponent: f64) -> u32 {
        if budget == 0 {
            return 0;
        }
        let noise = (self.standard_deviation().max_element() / threshold).clamp(0.0, 1.0);
        (noise.powf(exponent) * budget as f64) as u32
    }
}

/// Output channel of a [`Buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Mean color with gamma 2.2 applied
    Color,
    Variance,
    StandardDeviation,
    /// Sample count relative to the busiest pixel
    Samples,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Color,
        Channel::Variance,
        Channel::StandardDeviation,
        Channel::Samples,
    ];

    /// Short lowercase name, used for file suffixes.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Color => "color",
            Channel::Variance => "variance",
            Channel::StandardDeviation => "stddev",
            Channel::Samples => "samples",
        }
    }
}

/// Image-sized grid of [`Pixel`]s.
///
/// Row 0 is the bottom of the image: pixel `(x, y)` is sampled at camera
/// coordinates `((x + r) / width, (y + r) / height)`.
#[derive(Debug, Clone)]
pub struct Buffer {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl Buffer {
    /// Create an empty buffer.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Pixel::default(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the pixel at (x, y).
    pub fn pixel(&self, x: usize, y: usize) -> &Pixel {
        &self.pixels[y * self.width + x]
    }

    pub fn add_sample(&mut self, x: usize, y: usize, sample: Color) {
        self.pixels[y * self.width + x].add_sample(sample);
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Mutable rows, bottom row first.
    pub fn rows_mut(&mut self) -> ChunksMut<'_, Pixel> {
        self.pixels.chunks_mut(self.width.max(1))
    }

    /// Highest sample count of any pixel.
    pub fn max_samples(&self) -> u32 {
        self.pixels.iter().map(Pixel::samples).max().unwrap_or(0)
    }

    /// Total samples over all pixels.
    pub fn total_samples(&self) -> u64 {
        self.pixels.iter().map(|p| p.samples() as u64).sum()
    }

    /// Unclamped value of `channel` at (x, y). `max_samples` normalises the
    /// sample count channel.
    pub fn channel_value(&self, x: usize, y: usize, channel: Channel, max_samples: u32) -> Color {
        let pixel = self.pixel(x, y);
        match channel {
            Channel::Color => pixel.color().powf(1.0 / 2.2),
            Channel::Variance => pixel.variance(),
            Channel::StandardDeviation => pixel.standard_deviation(),
            Channel::Samples => {
                let p = if max_samples == 0 {
                    0.0
                } else {
                    pixel.samples() as f64 / max_samples as f64
                };
                Color::splat(p)
            }
        }
    }

    /// Convert a channel to RGBA bytes, top row first.
    pub fn to_rgba(&self, channel: Channel) -> Vec<u8> {
        let max_samples = self.max_samples();
        let mut bytes = Vec::with_capacity(self.width * self.height * 4);
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let rgba = color_to_rgba(self.channel_value(x, y, channel, max_samples));
                bytes.extend_from_slice(&rgba);
            }
        }
        bytes
    }

    pub fn to_image(&self, channel: Channel) -> RgbaImage {
        let max_samples = self.max_samples();
        ImageBuffer::from_fn(self.width as u32, self.height as u32, |x, row| {
            let y = self.height - 1 - row as usize;
            Rgba(color_to_rgba(self.channel_value(x as usize, y, channel, max_samples)))
        })
    }

    /// Write a channel as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>, channel: Channel) -> RenderResult<()> {
        let path = path.as_ref();
        self.to_image(channel).save(path)?;
        log::info!("Wrote {} channel to {}", channel.name(), path.display());
        Ok(())
    }
}

/// Clamp a value to [0, 1] range.
#[inline]
fn clamp_01(x: f64) -> f64 {
    // NaN maps to 0
    if x > 0.0 {
        x.min(1.0)
    } else {
        0.0
    }
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let r = (255.0 * clamp_01(color.x)) as u8;
    let g = (255.0 * clamp_01(color.y)) as u8;
    let b = (255.0 * clamp_01(color.z)) as u8;
    [r, g, b, 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welford_matches_two_pass() {
        let samples = [
            Color::new(0.1, 2.0, 0.0),
            Color::new(0.4, 1.0, 0.0),
            Color::new(0.9, 3.5, 0.0),
            Color::new(0.2, 0.5, 0.0),
            Color::new(0.7, 2.5, 0.0),
        ];
        let mut pixel = Pixel::default();
        for s in samples {
            pixel.add_sample(s);
        }

        let n = samples.len() as f64;
        let mean = samples.iter().copied().sum::<Color>() / n;
        let var = samples
            .iter()
            .map(|s| (*s - mean) * (*s - mean))
            .sum::<Color>()
            / (n - 1.0);

        assert_eq!(pixel.samples(), 5);
        assert!((pixel.color() - mean).length() < 1e-12);
        assert!((pixel.variance() - var).length() < 1e-12);
        assert_eq!(pixel.variance().z, 0.0);
    }

    #[test]
    fn test_single_sample_has_no_variance() {
        let mut pixel = Pixel::default();
        pixel.add_sample(Color::splat(3.0));

        assert_eq!(pixel.color(), Color::splat(3.0));
        assert_eq!(pixel.variance(), Color::ZERO);
        assert_eq!(pixel.adaptive_samples(64, 1.0, 3.0), 0);
    }

    #[test]
    fn test_adaptive_samples() {
        let mut pixel = Pixel::default();
        pixel.add_sample(Color::ZERO);
        pixel.add_sample(Color::new(1.0, 0.0, 0.0));

        // Variance 0.5, so the red channel's std is ~0.707
        assert_eq!(pixel.adaptive_samples(100, 1.0, 1.0), 70);
        assert_eq!(pixel.adaptive_samples(100, 2.0, 3.0), 4);
        // Saturates at the full budget
        assert_eq!(pixel.adaptive_samples(100, 0.1, 2.0), 100);
        assert_eq!(pixel.adaptive_samples(0, 1.0, 2.0), 0);
    }

    #[test]
    fn test_export_flips_rows_and_clamps() {
        let mut buffer = Buffer::new(2, 2);
        buffer.add_sample(0, 0, Color::new(4.0, 0.0, 0.0));
        buffer.add_sample(1, 1, Color::new(0.0, 0.0, 1.0));

        let bytes = buffer.to_rgba(Channel::Color);
        assert_eq!(bytes.len(), 16);
        // Top row first: (0, 1) then (1, 1)
        assert_eq!(&bytes[0..4], &[0, 0, 0, 255]);
        assert_eq!(&bytes[4..8], &[0, 0, 255, 255]);
        // Bottom left is clamped to full red
        assert_eq!(&bytes[8..12], &[255, 0, 0, 255]);

        let image = buffer.to_image(Channel::Color);
        assert_eq!(image.get_pixel(0, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_samples_channel() {
        let mut buffer = Buffer::new(2, 1);
        for _ in 0..4 {
            buffer.add_sample(0, 0, Color::ONE);
        }
        buffer.add_sample(1, 0, Color::ONE);

        assert_eq!(buffer.max_samples(), 4);
        assert_eq!(buffer.total_samples(), 5);
        assert_eq!(buffer.channel_value(1, 0, Channel::Samples, 4), Color::splat(0.25));
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        let mut buffer = Buffer::new(3, 2);
        buffer.add_sample(1, 1, Color::splat(0.5));
        buffer.save_png(&path, Channel::Color).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
