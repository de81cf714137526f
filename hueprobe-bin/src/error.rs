//! Errors from the camera and the display window

/// Everything that can go wrong while talking to OpenCV
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The camera could not be opened
    #[error("Could not open video stream from camera {index}")]
    CameraUnavailable {
        /// Index of the camera
        index: i32,
    },
    /// The camera did not return a frame
    #[error("Camera returned no frame")]
    NoFrame,
    /// A frame did not have the expected size or layout
    #[error("Frame of {width}x{height} pixels has an unexpected layout")]
    BadFrame {
        /// Frame width in pixels
        width: i32,
        /// Frame height in pixels
        height: i32,
    },
    /// Any other OpenCV failure
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}
