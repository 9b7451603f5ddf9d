use std::num::NonZeroU32;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::{ImageReader, RgbaImage};

use super::context::GlContext;

/// A mipmapped 2D texture.
pub struct Texture {
    id: Option<NonZeroU32>,
    width: u32,
    height: u32,
}

/// Decodes an image file into tightly packed RGBA8 rows.
pub fn decode_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage> {
    let path = path.as_ref();
    let img = ImageReader::open(path)
        .with_context(|| format!("Failed to open image at {:?}", path))?
        .with_guessed_format()?
        .decode()
        .with_context(|| format!("Failed to decode image at {:?}", path))?;
    Ok(img.to_rgba8())
}

impl Texture {
    pub fn from_file<P: AsRef<Path>>(gl: &GlContext, path: P) -> Result<Self> {
        let img = decode_rgba(path.as_ref())?;
        Self::from_image(gl, &img)
    }

    pub fn from_image(_gl: &GlContext, img: &RgbaImage) -> Result<Self> {
        let (width, height) = img.dimensions();

        let mut id = 0;
        unsafe {
            gl::GenTextures(1, &mut id);
        }
        let id = NonZeroU32::new(id).ok_or_else(|| anyhow!("Failed to allocate texture"))?;

        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, id.get());

            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::REPEAT as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::REPEAT as i32);
            gl::TexParameteri(
                gl::TEXTURE_2D,
                gl::TEXTURE_MIN_FILTER,
                gl::LINEAR_MIPMAP_LINEAR as i32,
            );
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as i32);

            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA as i32,
                width as i32,
                height as i32,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                img.as_raw().as_ptr() as *const _,
            );
            gl::GenerateMipmap(gl::TEXTURE_2D);

            gl::BindTexture(gl::TEXTURE_2D, 0);
        }

        Ok(Self {
            id: Some(id),
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Binds the texture to texture unit `unit`.
    pub fn bind(&self, _gl: &GlContext, unit: u32) {
        let Some(id) = self.id else {
            return;
        };
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            gl::BindTexture(gl::TEXTURE_2D, id.get());
        }
    }

    pub fn delete(&mut self, _gl: &GlContext) {
        if let Some(id) = self.id.take() {
            unsafe {
                gl::DeleteTextures(1, &id.get());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_decode_rgba_expands_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        let rgb = image::RgbImage::from_fn(2, 3, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        });
        rgb.save(&path).unwrap();

        let img = decode_rgba(&path).unwrap();
        assert_eq!(img.dimensions(), (2, 3));
        assert_eq!(*img.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*img.get_pixel(1, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode_rgba("assets/does-not-exist.jpg").unwrap_err();
        assert!(err.to_string().contains("Failed to open image"));
    }
}
