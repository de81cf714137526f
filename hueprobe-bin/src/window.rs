//! The on-screen display sink

use crate::{convert, error::Error};
use hueprobe::{Composite, DisplaySink};
use opencv::{
    core::{Point, Scalar},
    highgui, imgproc,
};
use std::time::Duration;

/// Font scale of the swatch label
const LABEL_SCALE: f64 = 1.0;

/// Stroke thickness of the swatch label
const LABEL_THICKNESS: i32 = 2;

/// A HighGUI window, destroyed when dropped
pub struct Window {
    /// Window title, which HighGUI also uses as its identifier
    name: String,
}

impl Window {
    /// Create a window titled `name`
    pub fn new(name: &str) -> Result<Self, Error> {
        highgui::named_window(name, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self {
            name: name.to_owned(),
        })
    }
}

/// Clamp a pixel coordinate into OpenCV's `i32` coordinates
fn coordinate(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

impl DisplaySink for Window {
    type Error = Error;

    fn show(&mut self, composite: &Composite) -> Result<(), Self::Error> {
        let mut bgr = convert::rgb_to_bgr_mat(&composite.image)?;

        if let (Some(label), Some((x, y))) = (&composite.label, composite.label_position()) {
            let color = Scalar::new(
                f64::from(label.color.blue),
                f64::from(label.color.green),
                f64::from(label.color.red),
                0.0,
            );

            imgproc::put_text(
                &mut bgr,
                &label.text,
                Point::new(coordinate(x), coordinate(y)),
                imgproc::FONT_HERSHEY_SIMPLEX,
                LABEL_SCALE,
                color,
                LABEL_THICKNESS,
                imgproc::LINE_8,
                false,
            )?;
        }

        highgui::imshow(&self.name, &bgr)?;
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<char>, Self::Error> {
        // a delay of 0 would block until a key is pressed
        let delay = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX).max(1);
        let key = highgui::wait_key(delay)?;

        if key < 0 {
            Ok(None)
        } else {
            Ok(u8::try_from(key & 0xFF).ok().map(char::from))
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.name) {
            tracing::warn!("Failed to close window: {e}");
        }
    }
}
