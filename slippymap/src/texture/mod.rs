//! Texture decode and upload seam.
//!
//! The pipeline decodes cached tile bytes into a [`TileSurface`] (always
//! RGBA8, regardless of what the file contained) and hands it to a
//! [`TextureUploader`], the external display collaborator. The core never
//! talks to a GPU directly; it only consumes opaque [`TextureHandle`]s.
//!
//! Source images arrive as 24-bit or 32-bit, in RGB/RGBA or the byte-swapped
//! BGR/BGRA orders. Everything is normalized to RGBA8 before upload so
//! uploaders support exactly one layout.

mod error;

pub use error::DecodeError;

use std::path::Path;

/// Opaque display handle produced by a [`TextureUploader`].
///
/// `PLACEHOLDER` is the well-known "not yet loaded / failed" handle; a
/// renderer binding it draws an empty tile. It is distinct from every handle
/// an uploader returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    /// The well-known empty handle.
    pub const PLACEHOLDER: TextureHandle = TextureHandle(0);

    /// Returns true if this is the placeholder handle.
    pub fn is_placeholder(&self) -> bool {
        *self == Self::PLACEHOLDER
    }
}

/// Channel layout of raw pixel data fed to [`TileSurface::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// 24-bit, red first.
    Rgb,
    /// 32-bit, red first.
    Rgba,
    /// 24-bit, blue first.
    Bgr,
    /// 32-bit, blue first.
    Bgra,
}

impl PixelLayout {
    fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelLayout::Rgb | PixelLayout::Bgr => 3,
            PixelLayout::Rgba | PixelLayout::Bgra => 4,
        }
    }
}

/// A decoded tile image, normalized to tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TileSurface {
    /// Decodes an image file into an RGBA8 surface.
    ///
    /// Any layout the decoder understands (grayscale, paletted, 16-bit) is
    /// converted; the uploader only ever sees RGBA8.
    pub fn from_path(path: &Path) -> Result<Self, DecodeError> {
        let img = image::open(path)?.into_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self {
            width,
            height,
            pixels: img.into_raw(),
        })
    }

    /// Builds a surface from raw pixel bytes in the given layout.
    ///
    /// BGR orders are byte-swapped, 24-bit input gains an opaque alpha
    /// channel.
    pub fn from_raw(
        width: u32,
        height: u32,
        layout: PixelLayout,
        bytes: &[u8],
    ) -> Result<Self, DecodeError> {
        let bpp = layout.bytes_per_pixel();
        let expected = width as usize * height as usize * bpp;
        if bytes.len() != expected {
            return Err(DecodeError::InvalidBuffer {
                expected,
                actual: bytes.len(),
            });
        }

        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for px in bytes.chunks_exact(bpp) {
            let (r, g, b, a) = match layout {
                PixelLayout::Rgb => (px[0], px[1], px[2], 0xff),
                PixelLayout::Rgba => (px[0], px[1], px[2], px[3]),
                PixelLayout::Bgr => (px[2], px[1], px[0], 0xff),
                PixelLayout::Bgra => (px[2], px[1], px[0], px[3]),
            };
            pixels.extend_from_slice(&[r, g, b, a]);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 pixel data, row-major, tightly packed.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// External display-upload collaborator.
///
/// Implementations turn a decoded surface into a renderer-visible handle
/// (for a GL renderer, `glGenTextures` + `glTexImage2D`). Called only from
/// the thread that drives [`crate::pipeline::TileLoader::ensure_loaded`],
/// so implementations need not be thread-safe.
pub trait TextureUploader {
    /// Uploads a surface, returning a non-placeholder handle.
    fn upload(&mut self, surface: &TileSurface) -> TextureHandle;
}

/// Uploader that discards pixels and hands out sequential handles.
///
/// Used by the headless CLI (cache warming needs decode validation but no
/// display) and by tests.
#[derive(Debug, Default)]
pub struct NullUploader {
    uploads: u32,
}

impl NullUploader {
    /// Creates a new uploader with no uploads recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of surfaces uploaded so far.
    pub fn upload_count(&self) -> u32 {
        self.uploads
    }
}

impl TextureUploader for NullUploader {
    fn upload(&mut self, surface: &TileSurface) -> TextureHandle {
        debug_assert!(!surface.pixels.is_empty());
        self.uploads += 1;
        // Handles start at 1; 0 is reserved for the placeholder.
        TextureHandle(self.uploads)
    }
}
