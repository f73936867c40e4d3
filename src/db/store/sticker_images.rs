//! Sticker image store

use async_trait::async_trait;
use bson::doc;

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{StickerImageDoc, STICKER_IMAGE_COLLECTION};
use crate::types::Result;

#[async_trait]
pub trait StickerImageStore: Send + Sync {
    async fn insert(&self, doc: StickerImageDoc) -> Result<StickerImageDoc>;

    async fn find_by_handle(&self, sticker_image_id: &str) -> Result<Option<StickerImageDoc>>;

    /// A user's own uploads plus the default set, newest first.
    async fn find_for_user(&self, user: &str) -> Result<Vec<StickerImageDoc>>;

    /// Default images, sorted by category then name.
    async fn find_defaults(&self) -> Result<Vec<StickerImageDoc>>;

    async fn delete_by_handle(&self, sticker_image_id: &str) -> Result<bool>;
}

/// MongoDB-backed sticker image store
pub struct MongoStickerImageStore {
    collection: MongoCollection<StickerImageDoc>,
}

impl MongoStickerImageStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: client.collection(STICKER_IMAGE_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl StickerImageStore for MongoStickerImageStore {
    async fn insert(&self, doc: StickerImageDoc) -> Result<StickerImageDoc> {
        let mut saved = doc.clone();
        let id = self.collection.insert_one(doc).await?;
        saved._id = Some(id);
        Ok(saved)
    }

    async fn find_by_handle(&self, sticker_image_id: &str) -> Result<Option<StickerImageDoc>> {
        self.collection
            .find_one(doc! { "sticker_image_id": sticker_image_id })
            .await
    }

    async fn find_for_user(&self, user: &str) -> Result<Vec<StickerImageDoc>> {
        self.collection
            .find_many_sorted(
                doc! { "$or": [ { "uploaded_by": user }, { "is_default": true } ] },
                doc! { "metadata.created_at": -1 },
            )
            .await
    }

    async fn find_defaults(&self) -> Result<Vec<StickerImageDoc>> {
        self.collection
            .find_many_sorted(doc! { "is_default": true }, doc! { "category": 1, "name": 1 })
            .await
    }

    async fn delete_by_handle(&self, sticker_image_id: &str) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "sticker_image_id": sticker_image_id })
            .await?;
        Ok(result.deleted_count > 0)
    }
}
