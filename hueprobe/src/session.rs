//! The capture, cluster, render, display loop

use crate::{dominant_color, Composite, KmeansOptions, Overlay, Region};
use image::RgbImage;
use palette::Srgb;
use std::{
	fmt::{self, Display},
	ops::ControlFlow,
	time::{Duration, Instant},
};

/// Record the running time of an expression and log the elapsed time
macro_rules! time {
	($name: literal, $func_call: expr) => {{
		let start = Instant::now();
		let result = $func_call;
		tracing::trace!("{} took {}us", $name, start.elapsed().as_micros());
		result
	}};
}

/// Where frames come from, e.g. a webcam
pub trait FrameSource {
	/// Error returned when a frame could not be acquired
	type Error;

	/// Block until the next frame is available
	fn read(&mut self) -> Result<RgbImage, Self::Error>;
}

/// Where rendered frames go, e.g. a window
pub trait DisplaySink {
	/// Error returned when showing a frame or reading input failed
	type Error;

	/// Present a rendered frame
	fn show(&mut self, composite: &Composite) -> Result<(), Self::Error>;

	/// Wait up to `timeout` for a key press
	fn poll_key(&mut self, timeout: Duration) -> Result<Option<char>, Self::Error>;
}

/// Whether a [`Session`] still processes frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
	/// Frames are being processed
	Running,
	/// The session ended and will not read any more frames
	Stopped,
}

/// Why a [`Session`] stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason<S, D> {
	/// The quit key was pressed
	Quit,
	/// The frame source failed to produce a frame
	ReadFailed(S),
	/// The display sink failed to show a frame or poll for input
	DisplayFailed(D),
	/// [`Session::step`] was called after the session had already stopped
	AlreadyStopped,
}

impl<S: Display, D: Display> Display for StopReason<S, D> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			StopReason::Quit => write!(f, "quit key pressed"),
			StopReason::ReadFailed(e) => write!(f, "failed to grab frame: {e}"),
			StopReason::DisplayFailed(e) => write!(f, "failed to display frame: {e}"),
			StopReason::AlreadyStopped => write!(f, "session already stopped"),
		}
	}
}

/// What happened during one pass through the loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iteration {
	/// The region that was sampled
	pub region: Region,
	/// The dominant color of the region, if it had any pixels
	pub dominant: Option<Srgb<u8>>,
	/// Number of pixels that were sampled
	pub samples: usize,
}

/// The final result of [`Session::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary<S, D> {
	/// Why the session stopped
	pub reason: StopReason<S, D>,
	/// Number of frames that were fully processed and shown
	pub frames: u64,
}

/// Owns a frame source and a display sink and drives frames from one to the other.
///
/// Both are dropped, and so released, as soon as [`Session::run`] returns.
pub struct Session<S, D> {
	/// Frame input
	source: S,
	/// Rendered frame output
	sink: D,
	/// Clustering options for every frame
	kmeans: KmeansOptions,
	/// Rendering options for every frame
	overlay: Overlay,
	/// The key that stops the session
	quit_key: char,
	/// How long to wait for a key press after each frame
	delay: Duration,
	/// Current state
	state: State,
	/// Frames processed so far
	frames: u64,
}

impl<S: FrameSource, D: DisplaySink> Session<S, D> {
	/// Key press that stops a session unless configured otherwise
	pub const DEFAULT_QUIT_KEY: char = 'q';

	/// Key poll timeout unless configured otherwise, which also paces the loop
	pub const DEFAULT_DELAY: Duration = Duration::from_millis(1);

	/// Start a running session over an already opened source and sink
	#[must_use]
	pub fn new(source: S, sink: D) -> Self {
		Self {
			source,
			sink,
			kmeans: KmeansOptions::default(),
			overlay: Overlay::default(),
			quit_key: Self::DEFAULT_QUIT_KEY,
			delay: Self::DEFAULT_DELAY,
			state: State::Running,
			frames: 0,
		}
	}

	/// Use the given clustering options
	#[must_use]
	pub fn with_kmeans(mut self, kmeans: KmeansOptions) -> Self {
		self.kmeans = kmeans;
		self
	}

	/// Use the given rendering options
	#[must_use]
	pub fn with_overlay(mut self, overlay: Overlay) -> Self {
		self.overlay = overlay;
		self
	}

	/// Stop when `key` is pressed
	#[must_use]
	pub fn with_quit_key(mut self, key: char) -> Self {
		self.quit_key = key;
		self
	}

	/// Wait up to `delay` for a key press after each frame
	#[must_use]
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = delay;
		self
	}

	/// The current state
	#[must_use]
	pub fn state(&self) -> State {
		self.state
	}

	/// Number of frames processed so far
	#[must_use]
	pub fn frames(&self) -> u64 {
		self.frames
	}

	/// Sample, cluster, and render a single frame
	#[must_use]
	pub fn process(&self, frame: RgbImage) -> (Composite, Iteration) {
		let (width, height) = frame.dimensions();
		let region = Region::centered(width, height);

		let samples = time!("Sampling", region.samples(&frame));
		let dominant = time!("Clustering", dominant_color(&samples, &self.kmeans));
		let composite = time!("Rendering", self.overlay.render(frame, region, dominant));

		let iteration = Iteration {
			region,
			dominant,
			samples: samples.len(),
		};

		(composite, iteration)
	}

	/// Run one pass of the loop: read, process, show, and poll for the quit key.
	///
	/// Breaks with the reason the session stopped, after which the session is [`State::Stopped`]
	/// and further calls do nothing but break with [`StopReason::AlreadyStopped`].
	pub fn step(&mut self) -> ControlFlow<StopReason<S::Error, D::Error>, Iteration> {
		if self.state == State::Stopped {
			return ControlFlow::Break(StopReason::AlreadyStopped);
		}

		let flow = self.advance();
		if flow.is_break() {
			self.state = State::Stopped;
		}
		flow
	}

	/// [`Session::step`] without the state bookkeeping
	fn advance(&mut self) -> ControlFlow<StopReason<S::Error, D::Error>, Iteration> {
		let frame = match time!("Frame capture", self.source.read()) {
			Ok(frame) => frame,
			Err(e) => return ControlFlow::Break(StopReason::ReadFailed(e)),
		};

		let (composite, iteration) = self.process(frame);

		if let Err(e) = self.sink.show(&composite) {
			return ControlFlow::Break(StopReason::DisplayFailed(e));
		}
		self.frames += 1;

		match self.sink.poll_key(self.delay) {
			Ok(Some(key)) if key == self.quit_key => ControlFlow::Break(StopReason::Quit),
			Ok(_) => ControlFlow::Continue(iteration),
			Err(e) => ControlFlow::Break(StopReason::DisplayFailed(e)),
		}
	}

	/// Process frames until the quit key is pressed or the source or sink fails.
	///
	/// The source and sink are released before this returns, whatever the reason for stopping.
	pub fn run(mut self) -> Summary<S::Error, D::Error> {
		tracing::info!("Starting video stream. Press '{}' to quit.", self.quit_key);

		let reason = loop {
			match self.step() {
				ControlFlow::Continue(iteration) => {
					if let Some(color) = iteration.dominant {
						tracing::debug!(
							frame = self.frames,
							samples = iteration.samples,
							"dominant color (BGR): ({}, {}, {})",
							color.blue,
							color.green,
							color.red
						);
					} else {
						tracing::debug!(frame = self.frames, "no color available");
					}
				},
				ControlFlow::Break(reason) => break reason,
			}
		};

		let frames = self.frames;
		drop(self);

		Summary { reason, frames }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::Rgb;

	/// Hands out copies of one frame forever
	struct Repeat(RgbImage);

	impl FrameSource for Repeat {
		type Error = String;

		fn read(&mut self) -> Result<RgbImage, Self::Error> {
			Ok(self.0.clone())
		}
	}

	/// Presses `key` on the `after`th poll
	struct PressAfter {
		key: char,
		after: usize,
		polls: usize,
	}

	impl DisplaySink for PressAfter {
		type Error = String;

		fn show(&mut self, _: &Composite) -> Result<(), Self::Error> {
			Ok(())
		}

		fn poll_key(&mut self, _: Duration) -> Result<Option<char>, Self::Error> {
			self.polls += 1;
			Ok((self.polls >= self.after).then_some(self.key))
		}
	}

	fn session(key: char, after: usize) -> Session<Repeat, PressAfter> {
		let frame = RgbImage::from_pixel(32, 24, Rgb([40, 80, 120]));
		Session::new(Repeat(frame), PressAfter { key, after, polls: 0 })
	}

	#[test]
	fn process_finds_uniform_color() {
		let (composite, iteration) = session('q', 1).process(RgbImage::from_pixel(32, 24, Rgb([40, 80, 120])));

		assert_eq!(iteration.region, Region::centered(32, 24));
		assert_eq!(iteration.samples, 16 * 12);
		assert_eq!(iteration.dominant, Some(Srgb::new(40, 80, 120)));
		assert_eq!(composite.image.get_pixel(0, 24), &Rgb([40, 80, 120]));
	}

	#[test]
	fn quit_key_stops_session() {
		let mut session = session('q', 3);

		assert!(session.step().is_continue());
		assert!(session.step().is_continue());
		assert_eq!(session.step(), ControlFlow::Break(StopReason::Quit));
		assert_eq!(session.state(), State::Stopped);
		assert_eq!(session.frames(), 3);
	}

	#[test]
	fn other_keys_are_ignored() {
		let mut session = session('x', 1);

		for _ in 0..5 {
			assert!(session.step().is_continue());
		}
		assert_eq!(session.state(), State::Running);
	}

	#[test]
	fn custom_quit_key() {
		let summary = session('x', 2).with_quit_key('x').run();
		assert_eq!(summary, Summary { reason: StopReason::Quit, frames: 2 });
	}

	#[test]
	fn stopped_session_reads_nothing() {
		let mut session = session('q', 1);

		assert_eq!(session.step(), ControlFlow::Break(StopReason::Quit));
		assert_eq!(session.step(), ControlFlow::Break(StopReason::AlreadyStopped));
		assert_eq!(session.frames(), 1);
	}

	/// Fails on every read
	struct Unplugged;

	impl FrameSource for Unplugged {
		type Error = String;

		fn read(&mut self) -> Result<RgbImage, Self::Error> {
			Err("no device".to_owned())
		}
	}

	#[test]
	fn step_after_read_failure_is_not_a_quit() {
		let mut session = Session::new(Unplugged, PressAfter { key: 'q', after: 1, polls: 0 });

		assert_eq!(session.step(), ControlFlow::Break(StopReason::ReadFailed("no device".to_owned())));
		assert_eq!(session.step(), ControlFlow::Break(StopReason::AlreadyStopped));
		assert_eq!(session.state(), State::Stopped);
		assert_eq!(session.frames(), 0);
	}
}
