//! Annotates a frame with its sampled region and a swatch of the dominant color

use crate::Region;
use image::{imageops, Rgb, RgbImage};
use palette::Srgb;

/// Color of the outline drawn around the sampled region
pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Thickness of the region outline in pixels
pub const OUTLINE_THICKNESS: u32 = 2;

/// Default height of the swatch strip below the frame
pub const SWATCH_HEIGHT: u32 = 70;

/// Tallest swatch strip [`Overlay::render`] will produce
pub const MAX_SWATCH_HEIGHT: u32 = 4096;

/// Brightness above which black text is used instead of white
const BRIGHTNESS_THRESHOLD: f32 = 127.0;

/// Perceived brightness of a color in `0.0..=255.0`
#[must_use]
pub fn brightness(color: Srgb<u8>) -> f32 {
	f32::from(color.blue) * 0.114 + f32::from(color.green) * 0.587 + f32::from(color.red) * 0.299
}

/// Black or white, whichever is easier to read on top of `color`
#[must_use]
pub fn text_color_for(color: Srgb<u8>) -> Srgb<u8> {
	if brightness(color) > BRIGHTNESS_THRESHOLD {
		Srgb::new(0, 0, 0)
	} else {
		Srgb::new(255, 255, 255)
	}
}

/// Text to draw on the swatch strip
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
	/// The text itself
	pub text: String,
	/// Fill color for the glyphs
	pub color: Srgb<u8>,
	/// Baseline origin of the text, relative to the top left of the swatch strip
	pub origin: (u32, u32),
}

impl Label {
	/// Where the label text starts on the swatch strip
	pub const ORIGIN: (u32, u32) = (20, 45);

	/// The label describing `color`, with channels listed in blue, green, red order
	#[must_use]
	pub fn for_color(color: Srgb<u8>) -> Self {
		Self {
			text: format!("Dominant Color (BGR): ({}, {}, {})", color.blue, color.green, color.red),
			color: text_color_for(color),
			origin: Self::ORIGIN,
		}
	}
}

/// An annotated frame stacked on top of a swatch strip
#[derive(Debug, Clone)]
pub struct Composite {
	/// The full image, frame and swatch strip together
	pub image: RgbImage,
	/// Text to draw on the swatch strip, if there is a dominant color
	pub label: Option<Label>,
	/// The first row of the swatch strip
	pub swatch_top: u32,
}

impl Composite {
	/// [`Label::origin`] translated into coordinates of the full image
	#[must_use]
	pub fn label_position(&self) -> Option<(u32, u32)> {
		self.label
			.as_ref()
			.map(|label| (label.origin.0, self.swatch_top + label.origin.1))
	}
}

/// Renders the overlay for each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
	/// Height of the swatch strip in pixels, capped at [`MAX_SWATCH_HEIGHT`]
	pub swatch_height: u32,
}

impl Default for Overlay {
	fn default() -> Self {
		Self { swatch_height: SWATCH_HEIGHT }
	}
}

impl Overlay {
	/// Outline `region` on `frame` and stack a swatch of `dominant` below it.
	///
	/// Without a dominant color the swatch is left black and no label is produced.
	#[must_use]
	pub fn render(&self, mut frame: RgbImage, region: Region, dominant: Option<Srgb<u8>>) -> Composite {
		draw_outline(&mut frame, region, OUTLINE_COLOR, OUTLINE_THICKNESS);

		let (width, height) = frame.dimensions();
		let fill = dominant.map_or(Rgb([0, 0, 0]), |c| Rgb([c.red, c.green, c.blue]));

		let swatch_height = self.swatch_height.min(MAX_SWATCH_HEIGHT);
		let mut image = RgbImage::from_pixel(width, height.saturating_add(swatch_height), fill);
		imageops::replace(&mut image, &frame, 0, 0);

		Composite {
			image,
			label: dominant.map(Label::for_color),
			swatch_top: height,
		}
	}
}

/// Draw the outline of `region` onto `frame`, clipped to the frame bounds.
///
/// The outline is drawn inwards from the region edges, where the right and bottom edges are exclusive.
pub fn draw_outline(frame: &mut RgbImage, region: Region, color: Rgb<u8>, thickness: u32) {
	let (width, height) = frame.dimensions();
	let x0 = region.start_x.min(width);
	let y0 = region.start_y.min(height);
	let x1 = region.end_x.min(width);
	let y1 = region.end_y.min(height);

	if x0 >= x1 || y0 >= y1 {
		return;
	}

	let on_edge = |x: u32, y: u32| {
		x - x0 < thickness || x1 - 1 - x < thickness || y - y0 < thickness || y1 - 1 - y < thickness
	};

	for y in y0..y1 {
		for x in x0..x1 {
			if on_edge(x, y) {
				frame.put_pixel(x, y, color);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;

	const GRAY: Rgb<u8> = Rgb([90, 90, 90]);

	#[test]
	fn white_gets_black_text() {
		let white = Srgb::new(255, 255, 255);
		assert_relative_eq!(brightness(white), 255.0, epsilon = 1e-3);
		assert_eq!(text_color_for(white), Srgb::new(0, 0, 0));
	}

	#[test]
	fn black_gets_white_text() {
		let black = Srgb::new(0, 0, 0);
		assert_relative_eq!(brightness(black), 0.0);
		assert_eq!(text_color_for(black), Srgb::new(255, 255, 255));
	}

	#[test]
	fn green_weighs_most() {
		// 0.587 * 255 > 127, but 0.299 * 255 and 0.114 * 255 are not
		assert_eq!(text_color_for(Srgb::new(0, 255, 0)), Srgb::new(0, 0, 0));
		assert_eq!(text_color_for(Srgb::new(255, 0, 0)), Srgb::new(255, 255, 255));
		assert_eq!(text_color_for(Srgb::new(0, 0, 255)), Srgb::new(255, 255, 255));
	}

	#[test]
	fn label_lists_blue_first() {
		let label = Label::for_color(Srgb::new(1, 2, 3));
		assert_eq!(label.text, "Dominant Color (BGR): (3, 2, 1)");
		assert_eq!(label.origin, Label::ORIGIN);
	}

	#[test]
	fn composite_stacks_frame_above_swatch() {
		let frame = RgbImage::from_pixel(16, 12, GRAY);
		let region = Region::centered(16, 12);
		let color = Srgb::new(200, 10, 30);

		let composite = Overlay::default().render(frame, region, Some(color));

		assert_eq!(composite.image.dimensions(), (16, 12 + SWATCH_HEIGHT));
		assert_eq!(composite.swatch_top, 12);
		assert_eq!(composite.image.get_pixel(0, 0), &GRAY);
		assert_eq!(composite.image.get_pixel(0, 12), &Rgb([200, 10, 30]));
		assert_eq!(composite.image.get_pixel(15, 12 + SWATCH_HEIGHT - 1), &Rgb([200, 10, 30]));
		assert_eq!(composite.label_position(), Some((20, 12 + 45)));
		assert_eq!(composite.label.map(|label| label.color), Some(Srgb::new(255, 255, 255)));
	}

	#[test]
	fn missing_color_leaves_swatch_blank() {
		let frame = RgbImage::from_pixel(8, 8, GRAY);
		let overlay = Overlay { swatch_height: 5 };

		let composite = overlay.render(frame, Region::centered(8, 8), None);

		assert!(composite.label.is_none());
		assert_eq!(composite.label_position(), None);
		for y in 8..13 {
			for x in 0..8 {
				assert_eq!(composite.image.get_pixel(x, y), &Rgb([0, 0, 0]));
			}
		}
	}

	#[test]
	fn tall_swatch_is_capped_below_frame() {
		let frame = RgbImage::from_pixel(8, 480, GRAY);
		let overlay = Overlay { swatch_height: u32::MAX - 100 };
		let color = Srgb::new(40, 50, 60);

		let composite = overlay.render(frame, Region::centered(8, 480), Some(color));

		assert_eq!(composite.image.dimensions(), (8, 480 + MAX_SWATCH_HEIGHT));
		assert_eq!(composite.swatch_top, 480);
		assert_eq!(composite.image.get_pixel(0, 479), &GRAY);
		assert_eq!(composite.image.get_pixel(0, 480), &Rgb([40, 50, 60]));
		assert_eq!(composite.label_position(), Some((20, 480 + 45)));
	}

	#[test]
	fn outline_follows_region_edges() {
		let mut frame = RgbImage::from_pixel(8, 8, GRAY);
		draw_outline(&mut frame, Region::centered(8, 8), OUTLINE_COLOR, 1);

		for y in 0..8 {
			for x in 0..8 {
				let inside = (2..6).contains(&x) && (2..6).contains(&y);
				let border = inside && (x == 2 || x == 5 || y == 2 || y == 5);
				let expected = if border { OUTLINE_COLOR } else { GRAY };
				assert_eq!(frame.get_pixel(x, y), &expected, "({x}, {y})");
			}
		}
	}

	#[test]
	fn outline_of_empty_region_draws_nothing() {
		let mut frame = RgbImage::from_pixel(3, 1, GRAY);
		draw_outline(&mut frame, Region::centered(3, 1), OUTLINE_COLOR, OUTLINE_THICKNESS);
		assert!(frame.pixels().all(|&p| p == GRAY));
	}

	#[test]
	fn thick_outline_fills_small_region() {
		let mut frame = RgbImage::from_pixel(8, 8, GRAY);
		draw_outline(&mut frame, Region::centered(8, 8), OUTLINE_COLOR, OUTLINE_THICKNESS);

		for y in 2..6 {
			for x in 2..6 {
				assert_eq!(frame.get_pixel(x, y), &OUTLINE_COLOR);
			}
		}
	}
}
