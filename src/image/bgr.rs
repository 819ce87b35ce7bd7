use image::GrayImage;

/// Luma weights applied to (R, G, B).
const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Borrowed interleaved BGR view (3 bytes per pixel) with a row stride in bytes.
#[derive(Clone, Debug)]
pub struct ImageBgr8<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize,
    pub data: &'a [u8],
}

impl<'a> ImageBgr8<'a> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 3] {
        let i = y * self.stride + 3 * x;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.w == 0 || self.h == 0 {
            return Err(format!("empty image {}x{}", self.w, self.h));
        }
        if self.stride < 3 * self.w {
            return Err(format!(
                "stride {} smaller than 3 * width {}",
                self.stride, self.w
            ));
        }
        let needed = (self.h - 1) * self.stride + 3 * self.w;
        if self.data.len() < needed {
            return Err(format!(
                "buffer holds {} bytes, needs {needed}",
                self.data.len()
            ));
        }
        Ok(())
    }

    /// Convert to single-channel intensity with the usual luma weights.
    pub fn to_gray_image(&self) -> GrayImage {
        let mut out = GrayImage::new(self.w as u32, self.h as u32);
        for y in 0..self.h {
            for x in 0..self.w {
                let [b, g, r] = self.get(x, y);
                let v = LUMA_WEIGHTS[0] * r as f32
                    + LUMA_WEIGHTS[1] * g as f32
                    + LUMA_WEIGHTS[2] * b as f32;
                out.put_pixel(x as u32, y as u32, image::Luma([v.round().clamp(0.0, 255.0) as u8]));
            }
        }
        out
    }
}
