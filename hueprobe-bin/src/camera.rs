//! The webcam frame source

use crate::{convert, error::Error};
use hueprobe::FrameSource;
use image::RgbImage;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};

/// An opened camera, released when dropped
pub struct Camera {
    /// The OpenCV capture handle
    capture: VideoCapture,
    /// Reused buffer for each captured BGR frame
    frame: Mat,
}

impl Camera {
    /// Open camera `index`, asking for frames of `width` x `height` pixels.
    ///
    /// The camera may pick a different resolution if the requested one is not supported.
    pub fn open(index: i32, width: u32, height: u32) -> Result<Self, Error> {
        let capture = VideoCapture::new(index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::CameraUnavailable { index });
        }

        // from here on the capture is released by Camera's Drop
        let mut camera = Self {
            capture,
            frame: Mat::default(),
        };

        camera
            .capture
            .set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(width))?;
        camera
            .capture
            .set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(height))?;

        let (actual_width, actual_height) = camera.resolution()?;
        tracing::info!(
            index,
            "Opened camera at {actual_width}x{actual_height} (requested {width}x{height})"
        );

        Ok(camera)
    }

    /// The resolution the camera actually delivers
    pub fn resolution(&self) -> Result<(u32, u32), Error> {
        // CAP_PROP values are whole numbers stored as f64
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let get = |prop: i32| {
            self.capture
                .get(prop)
                .map(|value| value.max(0.0) as u32)
        };

        Ok((
            get(videoio::CAP_PROP_FRAME_WIDTH)?,
            get(videoio::CAP_PROP_FRAME_HEIGHT)?,
        ))
    }
}

impl FrameSource for Camera {
    type Error = Error;

    fn read(&mut self) -> Result<RgbImage, Self::Error> {
        if !self.capture.read(&mut self.frame)? || self.frame.empty() {
            return Err(Error::NoFrame);
        }

        convert::bgr_mat_to_rgb(&self.frame)
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        match self.capture.release() {
            Ok(()) => tracing::debug!("Released camera"),
            Err(e) => tracing::warn!("Failed to release camera: {e}"),
        }
    }
}
