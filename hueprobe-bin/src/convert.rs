//! Conversion between OpenCV's BGR `Mat`s and RGB images

use crate::error::Error;
use image::RgbImage;
use opencv::{
    core::{self, Mat, Scalar, Size},
    imgproc,
    prelude::*,
};

/// Copy a BGR frame from the camera into an [`RgbImage`]
pub fn bgr_mat_to_rgb(bgr: &Mat) -> Result<RgbImage, Error> {
    let mut rgb = Mat::default();
    imgproc::cvt_color(bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

    let (cols, rows) = (rgb.cols(), rgb.rows());
    let bad_frame = || Error::BadFrame { width: cols, height: rows };

    let width = u32::try_from(cols).map_err(|_| bad_frame())?;
    let height = u32::try_from(rows).map_err(|_| bad_frame())?;

    // freshly converted Mats are continuous, so the bytes are exactly rows * cols * 3
    RgbImage::from_raw(width, height, rgb.data_bytes()?.to_vec()).ok_or_else(bad_frame)
}

/// Copy an [`RgbImage`] into a new BGR `Mat` for display
pub fn rgb_to_bgr_mat(image: &RgbImage) -> Result<Mat, Error> {
    let (width, height) = image.dimensions();
    let bad_frame = || Error::BadFrame {
        width: i32::try_from(width).unwrap_or(i32::MAX),
        height: i32::try_from(height).unwrap_or(i32::MAX),
    };

    let size = Size::new(
        i32::try_from(width).map_err(|_| bad_frame())?,
        i32::try_from(height).map_err(|_| bad_frame())?,
    );

    let mut rgb = Mat::new_size_with_default(size, core::CV_8UC3, Scalar::all(0.0))?;
    rgb.data_bytes_mut()?.copy_from_slice(image.as_raw());

    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0)?;
    Ok(bgr)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;
    use opencv::core::Vec3b;

    #[test]
    fn mat_is_bgr() {
        let image = RgbImage::from_pixel(4, 3, Rgb([10, 20, 30]));
        let mat = rgb_to_bgr_mat(&image).unwrap();

        assert_eq!((mat.cols(), mat.rows()), (4, 3));
        assert_eq!(mat.at_2d::<Vec3b>(2, 3).unwrap().0, [30, 20, 10]);
    }

    #[test]
    fn camera_frame_becomes_rgb() {
        let image = RgbImage::from_fn(5, 2, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            Rgb([x as u8, y as u8, 200])
        });

        let back = bgr_mat_to_rgb(&rgb_to_bgr_mat(&image).unwrap()).unwrap();

        assert_eq!(back, image);
    }
}
