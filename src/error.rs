//! Compositor error types.

use thiserror::Error;

use crate::canvas::RegionSlot;

#[derive(Debug, Error)]
pub enum CompositorError {
    /// Zero-dimension or undecodable source. Raised before any region is touched.
    #[error("invalid image: {reason}")]
    InvalidImage { reason: String },

    #[error("invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    #[error("region '{0}' is not part of this canvas")]
    UnknownRegion(RegionSlot),

    /// Encoding backend failure. Project state is left as it was.
    #[error("export failed: {0}")]
    Export(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no usable font (tried: {families})")]
    Font { families: String },
}

impl CompositorError {
    pub(crate) fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_parameter(name: &'static str, value: impl ToString) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
        }
    }
}

pub type Result<T, E = CompositorError> = std::result::Result<T, E>;
