//! Find the dominant color in the center of a video frame using k-means clustering.
//!
//! # Examples
//!
//! ## Get the dominant color of the central region of a frame.
//!
//! ```
//! use hueprobe::{KmeansOptions, Region};
//!
//! let frame = image::RgbImage::from_pixel(640, 480, image::Rgb([12, 200, 64]));
//! let samples = Region::centered(640, 480).samples(&frame);
//! let color = hueprobe::dominant_color(&samples, &KmeansOptions::default());
//!
//! assert_eq!(color, Some(palette::Srgb::new(12, 200, 64)));
//! ```
//!
//! ## Inspect every cluster instead of only the largest one.
//!
//! ```
//! use hueprobe::{ColorCounts, KmeansOptions};
//! use palette::Srgb;
//!
//! let pixels = [Srgb::new(255, 0, 0), Srgb::new(255, 0, 0), Srgb::new(0, 0, 255)];
//! let counts = ColorCounts::from_srgb(&pixels);
//! let result = hueprobe::from_color_counts(&counts, &KmeansOptions { k: 2, ..KmeansOptions::default() });
//!
//! assert_eq!(result.counts.iter().sum::<u32>(), 3);
//! assert_eq!(result.dominant(), Some(Srgb::new(255, 0, 0)));
//! ```
//!
//! # Arguments
//!
//! Here are explanations of the fields of [`KmeansOptions`].
//!
//! Note that if `trials` = 0, `k` = 0, or an empty slice of Srgb colors is provided,
//! then the [`KmeansResult`] will have no centroids and [`dominant_color`] returns `None`.
//!
//! ## K
//!
//! This is the (maximum) number of clusters to split the region into. The default is `5`.
//!
//! Fewer clusters are used if the region has fewer than `k` distinct colors.
//! Only the largest cluster is used for the dominant color,
//! so a small glare spot or shadow ends up in its own cluster instead of skewing the result
//! like it would for a plain average.
//!
//! ## Trials
//!
//! This is the number of times to run k-means, taking the trial with the lowest variance.
//!
//! For live video a single trial is usually enough.
//!
//! ## Convergence Threshold
//!
//! The iterations stop once the centroids moved less than this distance in total,
//! measured in sRGB with each channel scaled to `0.0..=1.0`.
//! A threshold of `0.001` is far below the size of one 8-bit channel step.
//!
//! ## Max Iterations
//!
//! This is the maximum number of iterations allowed for each k-means trial.
//!
//! ## Seed
//!
//! This is the value used to seed the random number generator which is used to choose the initial centroids.
//! The same seed and the same pixels always give the same result. The default is `42`.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::cargo)]
#![warn(clippy::use_debug, clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![warn(clippy::unwrap_used, clippy::unwrap_in_result)]
#![warn(clippy::unneeded_field_pattern, clippy::rest_pat_in_fully_bound_structs)]
#![warn(clippy::unnecessary_self_imports)]
#![warn(clippy::str_to_string, clippy::string_to_string, clippy::string_slice)]
#![warn(missing_docs, clippy::missing_docs_in_private_items, rustdoc::all)]
#![warn(clippy::float_cmp_const, clippy::lossy_float_literal)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::unreadable_literal)]

use palette::Srgb;
use std::collections::HashMap;

mod kmeans;
pub mod overlay;
pub mod region;
pub mod session;

pub use kmeans::{KmeansOptions, KmeansResult};
pub use overlay::{text_color_for, Composite, Label, Overlay};
pub use region::Region;
pub use session::{DisplaySink, FrameSource, Iteration, Session, State, StopReason, Summary};

/// Deduplicated colors from a set of pixel samples
#[derive(Debug, Clone, Default)]
pub struct ColorCounts {
	/// Distinct colors, with each channel in `0.0..=1.0`
	pub(crate) colors: Vec<Srgb<f32>>,
	/// The number of duplicate pixels for each color
	pub(crate) counts: Vec<u32>,
}

impl ColorCounts {
	/// Merge duplicate pixels, keeping track of how many times each color occurs.
	///
	/// Samples are merged in order of first appearance.
	#[must_use]
	pub fn from_srgb(pixels: &[Srgb<u8>]) -> Self {
		let mut data = Self::default();

		// Packed Srgb -> data index
		let mut memo: HashMap<u32, u32> = HashMap::new();

		for &srgb in pixels {
			let key = u32::from_be_bytes([0, srgb.red, srgb.green, srgb.blue]);
			let index = *memo.entry(key).or_insert_with(|| {
				// data.len() < u32::MAX because there are only (2^8)^3 < u32::MAX possible sRGB colors
				#[allow(clippy::cast_possible_truncation)]
				let index = data.colors.len() as u32;

				data.colors.push(srgb.into_format());
				data.counts.push(0);
				index
			});

			data.counts[index as usize] += 1;
		}

		data
	}

	/// The number of distinct colors
	#[must_use]
	pub fn num_colors(&self) -> u32 {
		// at most 2^24 distinct colors
		#[allow(clippy::cast_possible_truncation)]
		{
			self.colors.len() as u32
		}
	}

	/// The total number of pixels, counting duplicates
	#[must_use]
	pub fn num_pixels(&self) -> u64 {
		self.counts.iter().copied().map(u64::from).sum()
	}

	/// Whether there are no samples at all
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.colors.is_empty()
	}

	/// Iterate over each distinct color and its number of occurrences
	pub(crate) fn pairs(&self) -> impl Iterator<Item = (Srgb<f32>, u32)> + '_ {
		self.colors.iter().copied().zip(self.counts.iter().copied())
	}
}

/// Runs k-means on the provided slice of Srgb colors.
///
/// See the crate documentation for information on each option.
#[must_use]
pub fn from_srgb(pixels: &[Srgb<u8>], options: &KmeansOptions) -> KmeansResult {
	from_color_counts(&ColorCounts::from_srgb(pixels), options)
}

/// Runs k-means on a [`ColorCounts`] from [`ColorCounts::from_srgb`]
///
/// Use this function to run k-means multiple times on the same pixels but with different options.
#[must_use]
pub fn from_color_counts(color_counts: &ColorCounts, options: &KmeansOptions) -> KmeansResult {
	kmeans::run(color_counts, options)
}

/// The centroid of the largest cluster of `pixels`, rounded to 8-bit channels.
///
/// Returns `None` if there are no pixels to cluster or `k` is 0.
/// If multiple clusters tie for the most pixels, the one with the lowest index wins.
#[must_use]
pub fn dominant_color(pixels: &[Srgb<u8>], options: &KmeansOptions) -> Option<Srgb<u8>> {
	if pixels.is_empty() {
		None
	} else {
		from_srgb(pixels, options).dominant()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn test_colors() -> Vec<Srgb<u8>> {
		let range = (0..u8::MAX).step_by(32);
		let mut colors = Vec::new();

		for r in range.clone() {
			for g in range.clone() {
				for b in range.clone() {
					colors.push(Srgb::new(r, g, b));
				}
			}
		}

		colors
	}

	#[test]
	fn from_srgb_merges_duplicates() {
		let colors = test_colors();
		let mut pixels = colors.clone();
		pixels.extend(colors.iter().rev());
		pixels.extend(&colors[..10]);

		let counts = ColorCounts::from_srgb(&pixels);

		assert_eq!(counts.num_colors() as usize, colors.len());
		assert_eq!(counts.num_pixels(), pixels.len() as u64);
		assert_eq!(&counts.counts[..10], &[3; 10]);
		assert!(counts.counts[10..].iter().all(|&n| n == 2));
	}

	#[test]
	fn from_srgb_keeps_first_appearance_order() {
		let pixels = [Srgb::new(1, 2, 3), Srgb::new(0, 0, 0), Srgb::new(1, 2, 3)];
		let counts = ColorCounts::from_srgb(&pixels);

		let colors = counts.colors.iter().map(|c| c.into_format::<u8>()).collect::<Vec<_>>();
		assert_eq!(colors, vec![Srgb::new(1, 2, 3), Srgb::new(0, 0, 0)]);
		assert_eq!(counts.counts, vec![2, 1]);
	}

	#[test]
	fn empty_pixels_have_no_dominant_color() {
		assert!(ColorCounts::from_srgb(&[]).is_empty());
		assert_eq!(dominant_color(&[], &KmeansOptions::default()), None);
	}

	#[test]
	fn uniform_pixels_give_that_color() {
		for color in [Srgb::new(0, 0, 0), Srgb::new(255, 255, 255), Srgb::new(17, 99, 201)] {
			let pixels = vec![color; 321];
			for k in 1..=8 {
				let options = KmeansOptions { k, ..KmeansOptions::default() };
				assert_eq!(dominant_color(&pixels, &options), Some(color));
			}
		}
	}

	#[test]
	fn zero_k_gives_no_color() {
		let pixels = test_colors();
		let options = KmeansOptions { k: 0, ..KmeansOptions::default() };
		assert_eq!(dominant_color(&pixels, &options), None);
	}
}
