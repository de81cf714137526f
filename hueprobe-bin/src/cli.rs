//! Specifies the CLI and handles arg parsing

use clap::Parser;
use hueprobe::{overlay::MAX_SWATCH_HEIGHT, KmeansOptions, Overlay};
use std::{
	fmt::{Debug, Display},
	num::ParseFloatError,
	ops::RangeBounds,
	str::FromStr,
	time::Duration,
};

/// Show the dominant color in the center of a webcam feed.
///
/// The center half of each frame is clustered with k-means,
/// and the centroid of the largest cluster is shown as a swatch below the live image.
#[derive(Parser)]
#[command(version)]
pub struct Options {
	/// Index of the camera to capture from
	#[arg(short, long, default_value_t = 0)]
	pub device: i32,

	/// The frame width to request from the camera
	#[arg(long, default_value_t = 640)]
	pub width: u32,

	/// The frame height to request from the camera
	#[arg(long, default_value_t = 480)]
	pub height: u32,

	/// The (maximum) number of clusters to split the center of each frame into
	///
	/// Only the largest cluster is shown, so higher values keep more small details,
	/// like glare or shadows, from bleeding into the dominant color.
	#[arg(short, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..))]
	pub k: u8,

	/// The number of trials of k-means to run per frame
	///
	/// The trial with the lowest variance is picked.
	#[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
	pub trials: u32,

	/// The threshold number used to determine k-means convergence
	///
	/// Distances are measured in sRGB with channels in the range [0.0, 1.0].
	#[arg(short = 'e', long, default_value_t = 0.001, value_parser = parse_valid_convergence)]
	pub convergence_threshold: f32,

	/// The maximum number of iterations for each k-means trial
	#[arg(short = 'i', long, default_value_t = 64)]
	pub max_iter: u32,

	/// The seed value used for the random number generator
	#[arg(long, default_value_t = 42)]
	pub seed: u64,

	/// The height in pixels of the color swatch below the frame
	#[arg(
		long,
		default_value_t = 70,
		value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SWATCH_HEIGHT))
	)]
	pub swatch_height: u32,

	/// The key that stops the video stream
	#[arg(short, long, default_value_t = 'q')]
	pub quit_key: char,

	/// How long to wait for a key press after each frame, in milliseconds
	#[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
	pub delay: u64,

	/// The title of the display window
	#[arg(long, default_value = "Dominant Color Detector")]
	pub window: String,

	/// Print additional information, such as the dominant color of each frame
	///
	/// Per-frame timings are logged at the trace level, e.g. with `RUST_LOG=trace`.
	#[arg(long)]
	pub verbose: bool,
}

impl Options {
	/// The k-means options for every frame
	pub fn kmeans(&self) -> KmeansOptions {
		KmeansOptions {
			k: self.k,
			trials: self.trials,
			convergence_threshold: self.convergence_threshold,
			max_iter: self.max_iter,
			seed: self.seed,
		}
	}

	/// The rendering options for every frame
	pub fn overlay(&self) -> Overlay {
		Overlay { swatch_height: self.swatch_height }
	}

	/// The key poll timeout
	pub fn delay(&self) -> Duration {
		Duration::from_millis(self.delay)
	}
}

/// Parse a float value and ensure it in the provided, valid range
fn parse_float_in_range<T>(s: &str, range: impl RangeBounds<T> + Debug) -> Result<T, String>
where
	T: FromStr<Err = ParseFloatError> + Display + PartialOrd,
{
	let value: T = s.parse().map_err(|e| format!("{e}"))?;
	if range.contains(&value) {
		Ok(value)
	} else {
		Err(format!("{value} is not in {range:?}"))
	}
}

/// Parse the convergence number and ensure it is >= `0.0`
fn parse_valid_convergence(s: &str) -> Result<f32, String> {
	parse_float_in_range(s, 0.0..)
}
