//! Sticker image catalog schema
//!
//! Metadata only: the image bytes live with the external upload collaborator
//! and are referenced by URL.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for sticker images
pub const STICKER_IMAGE_COLLECTION: &str = "sticker_images";

/// Sticker image document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct StickerImageDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Generated handle (e.g. "sticker_img_2kd9x1m4p"), unique
    pub sticker_image_id: String,

    pub name: String,

    /// Public URL of the full-size image
    pub image_url: String,

    /// Public URL of the derived thumbnail
    pub thumbnail_url: String,

    /// Default stickers are available to everyone and cannot be deleted
    #[serde(default)]
    pub is_default: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Handle of the uploading user (absent for seeded defaults)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<String>,
}

impl IntoIndexes for StickerImageDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "sticker_image_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("sticker_image_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "uploaded_by": 1 },
                Some(
                    IndexOptions::builder()
                        .name("uploaded_by_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for StickerImageDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
