//! Image layers reference externally stored assets by id.

use serde::{Deserialize, Serialize};

/// Upload state of the referenced asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    #[default]
    Pending,
    Saved,
    Error,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Image {
    /// Opaque asset reference; `None` until the host stores the asset.
    pub file_id: Option<String>,
    pub status: ImageStatus,
}
