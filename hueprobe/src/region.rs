//! Selects the central region of a frame that gets sampled for its dominant color

use image::{imageops, RgbImage};
use palette::Srgb;

/// `3n/4` computed without overflowing for large `n`
// the result is <= n, so it fits back into a u32
#[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
const fn three_quarters(n: u32) -> u32 {
	(n as u64 * 3 / 4) as u32
}

/// A half-open rectangle `[start_x, end_x) x [start_y, end_y)` inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
	/// Left edge (inclusive)
	pub start_x: u32,
	/// Top edge (inclusive)
	pub start_y: u32,
	/// Right edge (exclusive)
	pub end_x: u32,
	/// Bottom edge (exclusive)
	pub end_y: u32,
}

impl Region {
	/// The center half of a `width` x `height` frame along both axes.
	///
	/// The bounds are `w/4, h/4, 3w/4, 3h/4` using integer division,
	/// so any frame of at least 4x4 gives a region of at least 1x1.
	#[must_use]
	pub const fn centered(width: u32, height: u32) -> Self {
		Self {
			start_x: width / 4,
			start_y: height / 4,
			end_x: three_quarters(width),
			end_y: three_quarters(height),
		}
	}

	/// Number of columns in this region
	#[must_use]
	pub const fn width(&self) -> u32 {
		self.end_x.saturating_sub(self.start_x)
	}

	/// Number of rows in this region
	#[must_use]
	pub const fn height(&self) -> u32 {
		self.end_y.saturating_sub(self.start_y)
	}

	/// Whether this region covers no pixels
	#[must_use]
	pub const fn is_empty(&self) -> bool {
		self.width() == 0 || self.height() == 0
	}

	/// Copy the pixels inside this region out of `frame`.
	///
	/// Parts of the region outside of the frame are cut off,
	/// so a degenerate region or frame gives an empty image instead of failing.
	#[must_use]
	pub fn extract(&self, frame: &RgbImage) -> RgbImage {
		let (width, height) = frame.dimensions();
		let x = self.start_x.min(width);
		let y = self.start_y.min(height);
		let w = self.end_x.min(width).saturating_sub(x);
		let h = self.end_y.min(height).saturating_sub(y);
		imageops::crop_imm(frame, x, y, w, h).to_image()
	}

	/// The pixels inside this region as an unordered set of color samples
	#[must_use]
	pub fn samples(&self, frame: &RgbImage) -> Vec<Srgb<u8>> {
		self.extract(frame)
			.pixels()
			.map(|&image::Rgb([r, g, b])| Srgb::new(r, g, b))
			.collect()
	}
}
