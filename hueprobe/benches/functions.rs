use criterion::{
	black_box, criterion_group, criterion_main, measurement::WallTime, BenchmarkGroup, BenchmarkId, Criterion,
	SamplingMode,
};
use hueprobe::{ColorCounts, KmeansOptions, Overlay, Region};
use image::{Rgb, RgbImage};
use std::time::Duration;

/// Webcam resolutions to benchmark at
const RESOLUTIONS: [(u32, u32); 3] = [(320, 240), (640, 480), (1280, 720)];

/// A frame with smooth gradients and a bright spot, loosely resembling a camera image
fn synthetic_frame(width: u32, height: u32) -> RgbImage {
	RgbImage::from_fn(width, height, |x, y| {
		let (cx, cy) = (width / 2, height / 3);
		if x.abs_diff(cx) < width / 20 && y.abs_diff(cy) < height / 20 {
			Rgb([250, 250, 245])
		} else {
			#[allow(clippy::cast_possible_truncation)]
			Rgb([
				(x * 200 / width) as u8,
				(y * 160 / height + 40) as u8,
				((x + y) * 90 / (width + height) + 20) as u8,
			])
		}
	})
}

fn frames() -> Vec<(String, RgbImage)> {
	RESOLUTIONS
		.iter()
		.map(|&(width, height)| (format!("{width}x{height}"), synthetic_frame(width, height)))
		.collect()
}

fn create_group<'a>(c: &'a mut Criterion, name: &'a str) -> BenchmarkGroup<'a, WallTime> {
	let mut group = c.benchmark_group(name);
	group
		.sample_size(30)
		.noise_threshold(0.05)
		.sampling_mode(SamplingMode::Flat)
		.warm_up_time(Duration::from_millis(500));
	group
}

fn preprocessing(c: &mut Criterion) {
	let mut group = create_group(c, "preprocessing");

	for (name, frame) in frames() {
		let region = Region::centered(frame.width(), frame.height());
		group.bench_with_input(BenchmarkId::from_parameter(name), &frame, |b, frame| {
			b.iter(|| ColorCounts::from_srgb(&region.samples(black_box(frame))));
		});
	}
}

fn kmeans(c: &mut Criterion) {
	let mut group = create_group(c, "kmeans");

	let counts = frames()
		.into_iter()
		.map(|(name, frame)| {
			let region = Region::centered(frame.width(), frame.height());
			(name, ColorCounts::from_srgb(&region.samples(&frame)))
		})
		.collect::<Vec<_>>();

	fn bench(name: &str, group: &mut BenchmarkGroup<WallTime>, counts: &[(String, ColorCounts)], k: u8, trials: u32) {
		for (resolution, counts) in counts {
			group.bench_with_input(BenchmarkId::new(name, resolution), &counts, |b, counts| {
				b.iter(|| {
					hueprobe::from_color_counts(
						counts,
						&KmeansOptions {
							k: black_box(k),
							trials: black_box(trials),
							..KmeansOptions::default()
						},
					)
				});
			});
		}
	}

	group.measurement_time(Duration::from_secs(2));
	bench("default", &mut group, &counts, 5, 1);
	bench("low k", &mut group, &counts, 2, 1);

	group.measurement_time(Duration::from_secs(4));
	bench("high k", &mut group, &counts, 16, 1);
	bench("trials", &mut group, &counts, 5, 4);
}

fn all_steps(c: &mut Criterion) {
	let mut group = create_group(c, "frame");
	group.measurement_time(Duration::from_secs(4));

	let overlay = Overlay::default();
	for (name, frame) in frames() {
		group.bench_with_input(BenchmarkId::from_parameter(name), &frame, |b, frame| {
			b.iter(|| {
				let region = Region::centered(frame.width(), frame.height());
				let dominant = hueprobe::dominant_color(&region.samples(frame), &KmeansOptions::default());
				overlay.render(black_box(frame.clone()), region, dominant)
			});
		});
	}
}

criterion_group!(benches, preprocessing, kmeans, all_steps);
criterion_main!(benches);
