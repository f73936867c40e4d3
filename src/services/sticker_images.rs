//! Sticker image catalog
//!
//! Metadata CRUD for sticker artwork. The image bytes live with the external
//! upload collaborator; this service stores the URLs it hands back.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::db::schemas::{Metadata, StickerImageDoc};
use crate::db::store::StickerImageStore;
use crate::handle;
use crate::services::to_chrono;
use crate::types::{GoalpostError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerImageView {
    pub id: String,
    pub sticker_image_id: String,
    pub name: String,
    pub image_url: String,
    pub thumbnail_url: String,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&StickerImageDoc> for StickerImageView {
    fn from(doc: &StickerImageDoc) -> Self {
        Self {
            id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            sticker_image_id: doc.sticker_image_id.clone(),
            name: doc.name.clone(),
            image_url: doc.image_url.clone(),
            thumbnail_url: doc.thumbnail_url.clone(),
            is_default: doc.is_default,
            category: doc.category.clone(),
            uploaded_by: doc.uploaded_by.clone(),
            created_at: to_chrono(doc.metadata.created_at),
        }
    }
}

pub struct StickerImageService {
    store: Arc<dyn StickerImageStore>,
}

impl StickerImageService {
    pub fn new(store: Arc<dyn StickerImageStore>) -> Self {
        Self { store }
    }

    /// Register an uploaded sticker image. The URLs come from the external
    /// upload collaborator.
    pub async fn create(
        &self,
        name: &str,
        image_url: &str,
        thumbnail_url: &str,
        category: Option<String>,
        uploader: &str,
    ) -> Result<StickerImageView> {
        if name.is_empty() || image_url.is_empty() || thumbnail_url.is_empty() {
            return Err(GoalpostError::Validation(
                "name, imageUrl and thumbnailUrl are required".into(),
            ));
        }

        let doc = self
            .store
            .insert(StickerImageDoc {
                _id: None,
                metadata: Metadata::new(),
                sticker_image_id: handle::sticker_image_handle(),
                name: name.to_string(),
                image_url: image_url.to_string(),
                thumbnail_url: thumbnail_url.to_string(),
                is_default: false,
                category,
                uploaded_by: Some(uploader.to_string()),
            })
            .await?;
        Ok(StickerImageView::from(&doc))
    }

    /// A user's own uploads plus the default set.
    pub async fn list_for_user(&self, user: &str) -> Result<Vec<StickerImageView>> {
        let docs = self.store.find_for_user(user).await?;
        Ok(docs.iter().map(StickerImageView::from).collect())
    }

    pub async fn list_defaults(&self) -> Result<Vec<StickerImageView>> {
        let docs = self.store.find_defaults().await?;
        Ok(docs.iter().map(StickerImageView::from).collect())
    }

    /// Delete an uploaded sticker image. Default images cannot be deleted;
    /// custom images only by their uploader.
    pub async fn remove(&self, sticker_image_id: &str, requester: &str) -> Result<bool> {
        let doc = self
            .store
            .find_by_handle(sticker_image_id)
            .await?
            .ok_or_else(|| GoalpostError::NotFound("sticker image not found".into()))?;

        if doc.is_default {
            return Err(GoalpostError::Forbidden(
                "default sticker images cannot be deleted".into(),
            ));
        }

        if doc.uploaded_by.as_deref() != Some(requester) {
            return Err(GoalpostError::Forbidden(
                "only the uploader may delete this sticker image".into(),
            ));
        }

        self.store.delete_by_handle(sticker_image_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemStickerImageStore;

    fn service_with_store() -> (StickerImageService, Arc<MemStickerImageStore>) {
        let store = Arc::new(MemStickerImageStore::default());
        (StickerImageService::new(store.clone()), store)
    }

    async fn seed_default(store: &Arc<MemStickerImageStore>, name: &str) {
        store
            .insert(StickerImageDoc {
                sticker_image_id: handle::sticker_image_handle(),
                name: name.to_string(),
                image_url: format!("https://cdn.example.com/{name}.png"),
                thumbnail_url: format!("https://cdn.example.com/{name}-thumb.png"),
                is_default: true,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (service, store) = service_with_store();
        seed_default(&store, "star").await;

        service
            .create(
                "my-dog",
                "https://cdn.example.com/dog.png",
                "https://cdn.example.com/dog-thumb.png",
                Some("pets".into()),
                "user_a",
            )
            .await
            .unwrap();

        // Own upload plus the default set.
        let mine = service.list_for_user("user_a").await.unwrap();
        assert_eq!(mine.len(), 2);

        // Another user only sees the defaults.
        let others = service.list_for_user("user_b").await.unwrap();
        assert_eq!(others.len(), 1);
        assert!(others[0].is_default);
    }

    #[tokio::test]
    async fn test_remove_guards() {
        let (service, store) = service_with_store();
        seed_default(&store, "star").await;
        let defaults = service.list_defaults().await.unwrap();

        let err = service
            .remove(&defaults[0].sticker_image_id, "user_a")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::Forbidden(_)));

        let uploaded = service
            .create(
                "my-dog",
                "https://cdn.example.com/dog.png",
                "https://cdn.example.com/dog-thumb.png",
                None,
                "user_a",
            )
            .await
            .unwrap();

        let err = service
            .remove(&uploaded.sticker_image_id, "user_b")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::Forbidden(_)));

        assert!(service
            .remove(&uploaded.sticker_image_id, "user_a")
            .await
            .unwrap());
        let err = service
            .remove(&uploaded.sticker_image_id, "user_a")
            .await
            .unwrap_err();
        assert!(matches!(err, GoalpostError::NotFound(_)));
    }
}
