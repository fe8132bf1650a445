//! RGB565 bitmaps to printer dots.
//!
//! The pipeline is: nearest neighbor resample down to the head width,
//! luminance, then one of two encodings. Raster mode thresholds the
//! luminance directly; vertical 24-dot mode is Floyd–Steinberg dithered
//! first.

use crate::printer::Error;

/// Dots across the print head
pub const MAX_WIDTH: usize = 384;
/// Rows covered by one vertical bit image pass
pub const PASS_HEIGHT: usize = 24;
/// Blank lines fed after an image so it clears the tear bar
pub const FEED_AFTER_IMAGE: u8 = 25;

/// Luminance below this prints a dot in raster mode
const RASTER_THRESHOLD: u8 = 128;
/// Dither output is white above this
const DITHER_THRESHOLD: i32 = 127;

/// Borrowed RGB565 pixels, row-major with `stride` pixels per row.
#[derive(Clone, Copy, Debug)]
pub struct Bitmap<'a> {
    pixels: &'a [u16],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> Bitmap<'a> {
    pub fn new(pixels: &'a [u16], width: usize, height: usize, stride: usize) -> Result<Self, Error> {
        if pixels.is_empty() {
            return Err(Error::InvalidArgument("empty bitmap"));
        }
        if width == 0 || height == 0 {
            return Err(Error::InvalidArgument("zero bitmap dimension"));
        }
        if stride < width {
            return Err(Error::InvalidArgument("stride is smaller than width"));
        }
        let needed = stride
            .checked_mul(height - 1)
            .and_then(|n| n.checked_add(width))
            .ok_or(Error::InvalidArgument("bitmap dimensions overflow"))?;
        if pixels.len() < needed {
            return Err(Error::InvalidArgument("bitmap has fewer pixels than its dimensions"));
        }
        Ok(Bitmap {
            pixels,
            width,
            height,
            stride,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn pixel(&self, x: usize, y: usize) -> u16 {
        self.pixels[y * self.stride + x]
    }
}

/// Owned RGB565 image, mostly for loading files through the `image` crate.
#[derive(Clone, Debug)]
pub struct Rgb565Buffer {
    pixels: Vec<u16>,
    width: usize,
    height: usize,
}

impl Rgb565Buffer {
    pub fn new(pixels: Vec<u16>, width: usize, height: usize) -> Self {
        Rgb565Buffer {
            pixels,
            width,
            height,
        }
    }

    pub fn as_bitmap(&self) -> Result<Bitmap<'_>, Error> {
        Bitmap::new(&self.pixels, self.width, self.height, self.width)
    }
}

impl From<&image::DynamicImage> for Rgb565Buffer {
    fn from(image: &image::DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        let pixels = rgb
            .pixels()
            .map(|p| rgb565(p.0[0], p.0[1], p.0[2]))
            .collect();
        Rgb565Buffer::new(pixels, rgb.width() as usize, rgb.height() as usize)
    }
}

impl From<image::DynamicImage> for Rgb565Buffer {
    fn from(image: image::DynamicImage) -> Self {
        Rgb565Buffer::from(&image)
    }
}

pub fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

/// Output size for a `width` x `height` source scaled to fit `max_width`,
/// keeping the aspect ratio.
pub fn target_size(width: usize, height: usize, max_width: usize) -> (usize, usize) {
    let target_width = width.min(max_width);
    // round(height * target_width / width)
    let target_height = (height * target_width + width / 2) / width;
    (target_width, target_height.max(1))
}

/// 8-bit luminance of an RGB565 pixel.
pub fn luminance(pixel: u16) -> u8 {
    let r5 = ((pixel >> 11) & 0x1f) as u32;
    let g6 = ((pixel >> 5) & 0x3f) as u32;
    let b5 = (pixel & 0x1f) as u32;
    // c * 255 / max, rounded
    let r = (r5 * 527 + 23) >> 6;
    let g = (g6 * 259 + 33) >> 6;
    let b = (b5 * 527 + 23) >> 6;
    ((r * 299 + g * 587 + b * 114) / 1000) as u8
}

/// 8-bit gray image, 0 is black.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grayscale {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Grayscale {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, Error> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(Error::InvalidArgument("gray buffer size mismatch"));
        }
        Ok(Grayscale {
            width,
            height,
            data,
        })
    }

    /// Resample `bitmap` to at most `max_width` dots across and convert it to
    /// luminance.
    pub fn from_bitmap(bitmap: &Bitmap, max_width: usize) -> Result<Self, Error> {
        if max_width == 0 {
            return Err(Error::InvalidArgument("printer width is zero"));
        }
        let (width, height) = target_size(bitmap.width(), bitmap.height(), max_width);
        if width == 0 || width > max_width {
            return Err(Error::InvalidArgument("image width out of range"));
        }

        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let src_y = y * bitmap.height() / height;
            for x in 0..width {
                let src_x = x * bitmap.width() / width;
                data.push(luminance(bitmap.pixel(src_x, src_y)));
            }
        }
        Ok(Grayscale {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_per_row(&self) -> usize {
        self.width.div_ceil(8)
    }

    /// Floyd–Steinberg error diffusion down to pure black (0) and white (255).
    ///
    /// Pixels are visited left to right, top to bottom; each one hands its
    /// quantization error to the neighbors that haven't been visited yet.
    pub fn dither(&self) -> Grayscale {
        let (w, h) = (self.width, self.height);
        let mut acc: Vec<i32> = self.data.iter().map(|&v| v as i32).collect();
        let mut out = vec![0_u8; w * h];

        for y in 0..h {
            for x in 0..w {
                let i = y * w + x;
                let old = acc[i];
                let new = if old > DITHER_THRESHOLD { 255 } else { 0 };
                out[i] = new as u8;
                let err = old - new;
                // floored shares, the down-right neighbor takes the remainder
                let right = (err * 7).div_euclid(16);
                let down_left = (err * 3).div_euclid(16);
                let down = (err * 5).div_euclid(16);
                let down_right = err - right - down_left - down;

                if x + 1 < w {
                    acc[i + 1] += right;
                }
                if y + 1 < h {
                    let below = i + w;
                    if x > 0 {
                        acc[below - 1] += down_left;
                    }
                    acc[below] += down;
                    if x + 1 < w {
                        acc[below + 1] += down_right;
                    }
                }
            }
        }

        Grayscale {
            width: w,
            height: h,
            data: out,
        }
    }

    /// Rows for the raster bit image command, 8 dots per byte, MSB first.
    pub fn raster_rows(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.data.chunks(self.width).map(|row| {
            let mut bytes = vec![0_u8; row.len().div_ceil(8)];
            for (x, &value) in row.iter().enumerate() {
                if value < RASTER_THRESHOLD {
                    bytes[x / 8] |= 0x80 >> (x % 8);
                }
            }
            bytes
        })
    }

    /// Column data for the vertical 24-dot bit image command, one entry per
    /// 24-row pass.
    ///
    /// Every column is 3 bytes. Bit `k` of the column (byte `k / 8`, bit
    /// `k % 8`) is row `k` of the pass, so the least significant bit of the
    /// first byte is the top row. Rows past the bottom of the image stay
    /// white.
    pub fn vertical_passes(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        (0..self.height).step_by(PASS_HEIGHT).map(move |top| {
            let mut pass = vec![0_u8; self.width * 3];
            let rows = PASS_HEIGHT.min(self.height - top);
            for x in 0..self.width {
                for k in 0..rows {
                    if self.get(x, top + k) < RASTER_THRESHOLD {
                        pass[x * 3 + k / 8] |= 1 << (k % 8);
                    }
                }
            }
            pass
        })
    }
}
