//! Virtual-resource path parsing.
//!
//! Path shape: `.../{marker}/{resource_id}/{total_size}`. Only the final two
//! segments are read; anything between the marker and them is ignored.

use thiserror::Error;

/// The resource a stream request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTarget {
    pub resource_id: String,
    pub total_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("expected /{{resource_id}}/{{total_size}} after the stream marker")]
    MissingSegments,

    #[error("resource id is empty")]
    EmptyResourceId,

    #[error("invalid total size '{0}'")]
    InvalidSize(String),
}

impl StreamTarget {
    /// Parse a request path. `Ok(None)` means the path is not a stream path.
    pub fn from_path(path: &str, marker: &str) -> Result<Option<Self>, TargetError> {
        let segments: Vec<&str> = path.split('/').collect();
        let Some(marker_at) = segments.iter().position(|s| *s == marker) else {
            return Ok(None);
        };

        let rest = &segments[marker_at + 1..];
        let [.., resource_id, total_size] = rest else {
            return Err(TargetError::MissingSegments);
        };

        if resource_id.is_empty() {
            return Err(TargetError::EmptyResourceId);
        }
        let total_size = total_size
            .parse::<u64>()
            .map_err(|_| TargetError::InvalidSize(total_size.to_string()))?;

        Ok(Some(Self {
            resource_id: resource_id.to_string(),
            total_size,
        }))
    }
}
