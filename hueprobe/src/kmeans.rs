//! Provides the implementation for (sort) k-means over sRGB colors

use crate::ColorCounts;
use palette::Srgb;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Squared euclidean distance between two colors
fn squared_distance(x: Srgb<f32>, y: Srgb<f32>) -> f32 {
	let dr = x.red - y.red;
	let dg = x.green - y.green;
	let db = x.blue - y.blue;
	dr * dr + dg * dg + db * db
}

/// The all zero vector sum
const ZERO_SUM: Srgb<f64> = Srgb::new(0.0, 0.0, 0.0);

/// Options for running k-means
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KmeansOptions {
	/// The (maximum) number of clusters
	pub k: u8,
	/// The number of k-means trials to run, keeping the one with the lowest variance
	pub trials: u32,
	/// The total centroid movement at or below which iterations stop
	pub convergence_threshold: f32,
	/// The maximum number of iterations for each trial
	pub max_iter: u32,
	/// Seed for choosing the initial centroids
	pub seed: u64,
}

impl Default for KmeansOptions {
	fn default() -> Self {
		Self {
			k: 5,
			trials: 1,
			convergence_threshold: 0.001,
			max_iter: 64,
			seed: 42,
		}
	}
}

/// Bookkeeping for each k-means data point
struct PointData {
	/// Center assignment for this data point
	assignment: Vec<u8>,
	/// Weight of each data point used to randomly select starting centroids in k-means++
	weight: Vec<f32>,
}

impl PointData {
	/// Create a [`PointData`] with the given number data points
	fn new(n: u32) -> Self {
		let n = n as usize;
		Self {
			assignment: vec![0; n],
			weight: vec![f32::INFINITY; n],
		}
	}

	/// Reset data for the next k-means trial
	fn reset(&mut self) {
		// a later trial may have fewer centers than the previous one
		self.assignment.fill(0);
		self.weight.fill(f32::INFINITY);
	}
}

/// Data for each center/centroid
struct CenterData {
	/// The centroid point
	centroid: Vec<Srgb<f32>>,
	/// Vector sum for all data points in this center
	sum: Vec<Srgb<f64>>,
	/// Number of points in this center
	count: Vec<u32>,
}

impl CenterData {
	/// Create a [`CenterData`] with the given number of centers
	fn new(k: u8) -> Self {
		let k = usize::from(k);
		Self {
			centroid: Vec::new(),
			sum: vec![ZERO_SUM; k],
			count: vec![0; k],
		}
	}

	/// Reset data for the next k-means trial
	fn reset(&mut self) {
		self.centroid.clear();
		self.sum.fill(ZERO_SUM);
		self.count.fill(0);
	}
}

/// Holds all the state used by k-means
struct KmeansState {
	/// Data for each center
	centers: CenterData,
	/// One fourth of the squared distance between each pairs of centers
	distances: Vec<(u8, f32)>,
	/// Data for each point
	points: PointData,
}

impl KmeansState {
	/// Initialize a new [`KmeansState`] with `k` centers and `n` data points
	fn new(k: u8, n: u32) -> Self {
		Self {
			centers: CenterData::new(k),
			distances: vec![(0, 0.0); usize::from(k) * usize::from(k)],
			points: PointData::new(n),
		}
	}
}

/// Result from running k-means
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansResult {
	/// Variance achieved by these centroids
	///
	/// A lower variance indicates a tighter clustering.
	pub variance: f64,
	/// Final centroid colors, with each channel in `0.0..=1.0`
	pub centroids: Vec<Srgb<f32>>,
	/// Number of pixels in each centroid
	pub counts: Vec<u32>,
	/// Number of elapsed iterations
	pub iterations: u32,
}

impl KmeansResult {
	/// Create an empty result, representing that no k-means trials were able to be run
	const fn empty() -> Self {
		Self {
			variance: 0.0,
			centroids: Vec::new(),
			counts: Vec::new(),
			iterations: 0,
		}
	}

	/// The index of the cluster with the most pixels, preferring the lowest index on ties
	#[must_use]
	pub fn dominant_index(&self) -> Option<usize> {
		self.counts
			.iter()
			.enumerate()
			.fold(None, |best: Option<(usize, u32)>, (i, &n)| match best {
				Some((_, most)) if most >= n => best,
				_ => Some((i, n)),
			})
			.map(|(i, _)| i)
	}

	/// The centroid of the cluster with the most pixels, rounded to the nearest 8-bit value.
	///
	/// Channels exactly halfway between two values round to the even one.
	#[must_use]
	pub fn dominant(&self) -> Option<Srgb<u8>> {
		self.dominant_index()
			.map(|i| self.centroids[i].into_format())
	}
}

/// Choose the starting centroids using the k-means++ algorithm
fn kmeans_plus_plus(
	k: u8,
	rng: &mut impl Rng,
	colors: &[Srgb<f32>],
	centroids: &mut Vec<Srgb<f32>>,
	weights: &mut [f32],
) {
	use rand::{
		distributions::{WeightedError, WeightedIndex},
		prelude::Distribution,
	};

	// Pick any random first centroid
	centroids.push(colors[rng.gen_range(0..colors.len())]);

	// Pick each next centroid with a weighted probability based off the squared distance to its closest centroid
	for i in 1..usize::from(k) {
		let centroid = centroids[i - 1];
		for (weight, &color) in weights.iter_mut().zip(colors) {
			*weight = f32::min(*weight, squared_distance(color, centroid));
		}

		match WeightedIndex::new(&*weights) {
			Ok(sampler) => centroids.push(colors[sampler.sample(rng)]),
			// all points exactly match a centroid
			Err(WeightedError::AllWeightsZero) => return,
			Err(WeightedError::InvalidWeight | WeightedError::NoItem | WeightedError::TooMany) => {
				unreachable!("distances are >= 0 and colors.len() is in 1..=2.pow(24)")
			},
		}
	}
}

/// Add `n` copies of `color` to a vector sum
fn add_scaled(sum: &mut Srgb<f64>, color: Srgb<f32>, n: f64) {
	sum.red += n * f64::from(color.red);
	sum.green += n * f64::from(color.green);
	sum.blue += n * f64::from(color.blue);
}

/// Initializes the center sums and counts based off the initial centroids
fn compute_initial_sums(data: &ColorCounts, centers: &mut CenterData, assignment: &[u8]) {
	for ((color, n), &center) in data.pairs().zip(assignment) {
		let i = usize::from(center);
		add_scaled(&mut centers.sum[i], color, f64::from(n));
		centers.count[i] += n;
	}
}

/// For each pair of centers, update their distances and sort each center's row by increasing distance
// i and j are < centroids.len() <= u8::MAX
#[allow(clippy::cast_possible_truncation)]
fn update_distances(centroids: &[Srgb<f32>], distances: &mut [(u8, f32)]) {
	let k = centroids.len();
	for i in 0..k {
		let ci = centroids[i];
		distances[i * k + i] = (i as u8, 0.0);
		for j in (i + 1)..k {
			let cj = centroids[j];
			let dist = squared_distance(ci, cj) / 4.0;
			distances[j * k + i] = (i as u8, dist);
			distances[i * k + j] = (j as u8, dist);
		}
	}

	for row in distances[..(k * k)].chunks_exact_mut(k) {
		row.sort_by(|(_, x), (_, y)| f32::total_cmp(x, y));
	}
}

/// Find the center closest to `color`, starting from its current center `ci`.
///
/// Centers whose (quartered, squared) distance to `ci` exceeds the distance from `color` to `ci`
/// cannot be closer, so the search stops at the first such center in the sorted row.
fn nearest_center(color: Srgb<f32>, ci: u8, centroids: &[Srgb<f32>], distances: &[(u8, f32)]) -> u8 {
	let k = centroids.len();
	let row = usize::from(ci);
	let dist = squared_distance(color, centroids[row]);

	let mut min_dist = dist;
	let mut min_center = ci;
	for &(other_center, half_dist) in &distances[(row * k + 1)..((row + 1) * k)] {
		if dist < half_dist {
			break;
		}

		let other_dist = squared_distance(color, centroids[usize::from(other_center)]);
		if other_dist < min_dist {
			min_dist = other_dist;
			min_center = other_center;
		}
	}

	min_center
}

/// Move a point with `n` pixels of `color` from `center` to `min_center`
fn move_point(centers: &mut CenterData, color: Srgb<f32>, n: u32, center: &mut u8, min_center: u8) {
	if min_center != *center {
		let nf = f64::from(n);
		let ci = usize::from(*center);
		let cj = usize::from(min_center);

		add_scaled(&mut centers.sum[ci], color, -nf);
		centers.count[ci] -= n;

		add_scaled(&mut centers.sum[cj], color, nf);
		centers.count[cj] += n;

		*center = min_center;
	}
}

/// For each data point, update its assigned center
#[cfg(not(feature = "threads"))]
fn update_assignments(data: &ColorCounts, centers: &mut CenterData, distances: &[(u8, f32)], points: &mut PointData) {
	for ((color, n), center) in data.pairs().zip(&mut points.assignment) {
		let min_center = nearest_center(color, *center, &centers.centroid, distances);
		move_point(centers, color, n, center, min_center);
	}
}

/// For each data point, update its assigned center
#[cfg(feature = "threads")]
fn update_assignments(data: &ColorCounts, centers: &mut CenterData, distances: &[(u8, f32)], points: &mut PointData) {
	use rayon::prelude::*;

	let num_points = data.colors.len();
	let centroids = &centers.centroid;
	let nearest = data
		.colors
		.par_iter()
		.zip(&points.assignment)
		.with_min_len(num_points / rayon::current_num_threads())
		.map(|(&color, &center)| nearest_center(color, center, centroids, distances))
		.collect::<Vec<_>>();

	// Sums are updated in point order so that the result does not depend on the number of threads
	for (((color, n), center), min_center) in data.pairs().zip(&mut points.assignment).zip(nearest) {
		move_point(centers, color, n, center, min_center);
	}
}

/// For each center, update its centroid using the vector sums and compute deltas
fn update_centroids(rng: &mut impl Rng, centers: &mut CenterData) -> f32 {
	let mut total_delta = 0.0;
	for ((centroid, &n), sum) in centers.centroid.iter_mut().zip(&centers.count).zip(&centers.sum) {
		let new_centroid = if n == 0 {
			// an empty center gets another chance somewhere random in the color cube
			Srgb::new(rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>())
		} else {
			let n = f64::from(n);
			// Sums may need greater precision, but the average can fall back down to a reduced precision
			#[allow(clippy::cast_possible_truncation)]
			Srgb::new((sum.red / n) as f32, (sum.green / n) as f32, (sum.blue / n) as f32)
		};

		total_delta += squared_distance(*centroid, new_centroid).sqrt();
		*centroid = new_centroid;
	}

	total_delta
}

/// Run a trial of sort k-means
fn kmeans(
	data: &ColorCounts,
	KmeansState { centers, distances, points }: &mut KmeansState,
	k: u8,
	max_iter: u32,
	convergence: f32,
	seed: u64,
) -> KmeansResult {
	let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
	kmeans_plus_plus(k, &mut rng, &data.colors, &mut centers.centroid, &mut points.weight);
	compute_initial_sums(data, centers, &points.assignment);

	let mut iterations = 0;
	let mut total_delta = f32::INFINITY;
	while iterations < max_iter && total_delta > convergence {
		update_distances(&centers.centroid, distances);
		update_assignments(data, centers, distances, points);
		total_delta = update_centroids(&mut rng, centers);
		iterations += 1;
	}

	let variance = data
		.pairs()
		.zip(&points.assignment)
		.map(|((color, n), &center)| {
			f64::from(n) * f64::from(squared_distance(color, centers.centroid[usize::from(center)]))
		})
		.sum();

	let centroids = centers
		.centroid
		.iter()
		.zip(&centers.count)
		.filter_map(|(&color, &count)| if count == 0 { None } else { Some(color) })
		.collect::<Vec<_>>();

	let counts = centers.count.iter().copied().filter(|&n| n > 0).collect::<Vec<_>>();

	centers.reset();
	points.reset();

	KmeansResult { variance, centroids, counts, iterations }
}

/// Run multiple trials of k-means, taking the trial with the lowest variance
///
/// An empty result with no centroids is returned if `data` is empty, `trials` = 0, or `k` = 0.
pub fn run(data: &ColorCounts, options: &KmeansOptions) -> KmeansResult {
	let &KmeansOptions {
		k,
		trials,
		convergence_threshold,
		max_iter,
		seed,
	} = options;

	if k == 0 || data.is_empty() {
		return KmeansResult::empty();
	}

	let mut state = KmeansState::new(k, data.num_colors());

	let result = (0..trials)
		.map(|i| kmeans(data, &mut state, k, max_iter, convergence_threshold, seed ^ u64::from(i)))
		.min_by(|x, y| f64::total_cmp(&x.variance, &y.variance))
		.unwrap_or(KmeansResult::empty());

	tracing::trace!(
		colors = data.num_colors(),
		clusters = result.centroids.len(),
		iterations = result.iterations,
		variance = result.variance,
		"k-means finished"
	);

	result
}
