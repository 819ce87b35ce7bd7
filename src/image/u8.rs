use image::GrayImage;

/// Borrowed single-channel 8-bit view with an explicit row stride.
#[derive(Clone, Debug)]
pub struct ImageU8<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize, // bytes between rows
    pub data: &'a [u8],
}

impl<'a> ImageU8<'a> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    /// Checks that `data` covers `h` rows of `stride` bytes with `w <= stride`.
    pub fn validate(&self) -> Result<(), String> {
        if self.w == 0 || self.h == 0 {
            return Err(format!("empty image {}x{}", self.w, self.h));
        }
        if self.stride < self.w {
            return Err(format!("stride {} smaller than width {}", self.stride, self.w));
        }
        let needed = (self.h - 1) * self.stride + self.w;
        if self.data.len() < needed {
            return Err(format!(
                "buffer holds {} bytes, {}x{} with stride {} needs {needed}",
                self.data.len(),
                self.w,
                self.h,
                self.stride
            ));
        }
        Ok(())
    }

    /// Copy into an owned, tightly packed `GrayImage`.
    pub fn to_gray_image(&self) -> GrayImage {
        let mut out = GrayImage::new(self.w as u32, self.h as u32);
        for (y, row) in out.rows_mut().enumerate() {
            let src = &self.data[y * self.stride..y * self.stride + self.w];
            for (px, &v) in row.zip(src.iter()) {
                px.0[0] = v;
            }
        }
        out
    }
}
