//! Small separable smoothing filters on 8-bit gray images.
use image::GrayImage;

/// Trait implemented by separable 1D filters.
pub trait SeparableFilter {
    /// Return the 1D taps (in left-to-right order), centred on the middle tap.
    fn taps(&self) -> &[f32];
}

#[derive(Clone, Copy, Debug)]
pub struct StaticSeparableFilter {
    taps: &'static [f32],
}

impl Default for StaticSeparableFilter {
    fn default() -> Self {
        GAUSSIAN_3TAP
    }
}

impl StaticSeparableFilter {
    pub const fn new(taps: &'static [f32]) -> Self {
        Self { taps }
    }
}

impl SeparableFilter for StaticSeparableFilter {
    #[inline]
    fn taps(&self) -> &[f32] {
        self.taps
    }
}

/// Normalised 3-tap Gaussian `[1, 2, 1] / 4`, the 3×3 kernel with automatic sigma.
pub const GAUSSIAN_3TAP: StaticSeparableFilter = StaticSeparableFilter::new(&[0.25, 0.5, 0.25]);

/// Separable convolution with replicated borders, rounding back to `u8`.
pub fn convolve_separable<F: SeparableFilter>(src: &GrayImage, filter: &F) -> GrayImage {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let taps = filter.taps();
    if w == 0 || h == 0 || taps.is_empty() {
        return src.clone();
    }
    let half = (taps.len() / 2) as isize;
    let data = src.as_raw();

    let mut tmp = vec![0f32; w * h];
    for y in 0..h {
        let row = &data[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &t) in taps.iter().enumerate() {
                let xi = (x as isize + k as isize - half).clamp(0, w as isize - 1) as usize;
                acc += t * row[xi] as f32;
            }
            tmp[y * w + x] = acc;
        }
    }

    let mut out = GrayImage::new(w as u32, h as u32);
    let out_data: &mut [u8] = &mut out;
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &t) in taps.iter().enumerate() {
                let yi = (y as isize + k as isize - half).clamp(0, h as isize - 1) as usize;
                acc += t * tmp[yi * w + x];
            }
            out_data[y * w + x] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// 3×3 Gaussian blur used ahead of thresholding.
pub fn blur_3x3(src: &GrayImage) -> GrayImage {
    convolve_separable(src, &GAUSSIAN_3TAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blur_keeps_flat_images_flat() {
        let img = GrayImage::from_pixel(7, 5, image::Luma([120]));
        let out = blur_3x3(&img);
        assert!(out.pixels().all(|p| p.0[0] == 120));
    }

    #[test]
    fn blur_spreads_a_single_spike() {
        let mut img = GrayImage::new(5, 5);
        img.put_pixel(2, 2, image::Luma([160]));
        let out = blur_3x3(&img);
        assert_eq!(out.get_pixel(2, 2).0[0], 40);
        assert_eq!(out.get_pixel(1, 2).0[0], 20);
        assert_eq!(out.get_pixel(1, 1).0[0], 10);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
    }
}
