//! Error type for tile image decoding.

use thiserror::Error;

/// Errors that can occur while decoding tile bytes into a surface.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The decoder rejected the bytes (corrupt file, unsupported format).
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    /// The file could not be read.
    #[error("I/O error while reading image: {0}")]
    Io(#[from] std::io::Error),

    /// Raw pixel buffer does not match the declared dimensions and layout.
    #[error("pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    InvalidBuffer { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_buffer_display() {
        let err = DecodeError::InvalidBuffer {
            expected: 16,
            actual: 7,
        };
        assert_eq!(
            err.to_string(),
            "pixel buffer size mismatch: expected 16 bytes, got 7"
        );
    }
}
