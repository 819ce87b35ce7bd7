//! Image views accepted by the pipeline and the helpers that turn them into
//! owned gray buffers.
//!
//! Callers hand in borrowed buffers (`ImageU8`, `ImageBgr8`) with an explicit
//! stride; every stage works on an owned `image::GrayImage` afterwards.
pub mod bgr;
pub mod f32;
pub mod filters;
pub mod io;
pub mod u8;

pub use self::bgr::ImageBgr8;
pub use self::f32::ImageF32;
pub use self::u8::ImageU8;

use crate::error::DropError;
use image::GrayImage;

/// A frame as supplied by the acquisition side.
#[derive(Clone, Debug)]
pub enum FrameImage<'a> {
    Gray(ImageU8<'a>),
    Bgr(ImageBgr8<'a>),
}

impl<'a> FrameImage<'a> {
    pub fn width(&self) -> usize {
        match self {
            FrameImage::Gray(img) => img.w,
            FrameImage::Bgr(img) => img.w,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            FrameImage::Gray(img) => img.h,
            FrameImage::Bgr(img) => img.h,
        }
    }

    /// Single-channel intensity copy of the frame.
    pub fn to_gray(&self) -> Result<GrayImage, DropError> {
        match self {
            FrameImage::Gray(img) => {
                img.validate().map_err(DropError::InvalidInput)?;
                Ok(img.to_gray_image())
            }
            FrameImage::Bgr(img) => {
                img.validate().map_err(DropError::InvalidInput)?;
                Ok(img.to_gray_image())
            }
        }
    }
}

impl<'a> From<ImageU8<'a>> for FrameImage<'a> {
    fn from(img: ImageU8<'a>) -> Self {
        FrameImage::Gray(img)
    }
}

impl<'a> From<ImageBgr8<'a>> for FrameImage<'a> {
    fn from(img: ImageBgr8<'a>) -> Self {
        FrameImage::Bgr(img)
    }
}
