use thiserror::Error;

/// Failure to turn an image reference into a feature vector.
///
/// `Clone` so a memoized failure can be handed to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// No resource is registered under the reference.
    #[error("Image not found: {url}")]
    NotFound { url: String },
    /// The resource exists but could not be read.
    #[error("Failed to read image {url}: {message}")]
    Read { url: String, message: String },
    /// The bytes are not a decodable image.
    #[error("Failed to decode image {url}: {message}")]
    Decode { url: String, message: String },
    /// The image decoded to zero pixels.
    #[error("Image {url} has no pixels")]
    Empty { url: String },
}
