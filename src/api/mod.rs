pub mod client;

pub use client::HttpClient;

use crate::error::{Error, Result};
use async_trait::async_trait;
use freshfood_types::{
    NewShoppingItem, RecipeDetail, RecipeId, RecipeSummary, ShoppingItem,
};
use std::path::Path;

/// Backend the flows talk to.
///
/// [`HttpClient`] is the real implementation; tests substitute scripted ones.
#[async_trait]
pub trait Api: Send + Sync {
    /// Full shopping list, validated to be an array of `{id, name, quantity}`.
    async fn list_items(&self) -> Result<Vec<ShoppingItem>>;

    /// Create an item; the returned item carries the server-assigned id.
    async fn add_item(&self, item: &NewShoppingItem) -> Result<ShoppingItem>;

    async fn delete_item(&self, id: i64) -> Result<()>;

    async fn update_item_quantity(&self, id: i64, quantity: u32) -> Result<()>;

    /// Ingredient names recognized in an uploaded image.
    async fn recognize_ingredients(&self, image: &ImageUpload) -> Result<Vec<String>>;

    /// Ranked recipes for the given ingredient names.
    async fn recommend(&self, ingredients: &[String]) -> Result<Vec<RecipeSummary>>;

    async fn recipe_detail(&self, recipe_id: &RecipeId) -> Result<RecipeDetail>;

    async fn staples(&self) -> Result<Vec<String>>;

    async fn add_staple(&self, name: &str) -> Result<()>;

    async fn remove_staple(&self, name: &str) -> Result<()>;

    async fn clear_staples(&self) -> Result<()>;
}

/// An image to send to the recognition endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_for(&file_name).to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    /// Read an image from disk. The MIME type comes from the extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::validation(format!("Could not read image {}: {}", path.display(), e)))?;
        if bytes.is_empty() {
            return Err(Error::validation(format!(
                "Image {} is empty. Please capture an image first.",
                path.display()
            )));
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image.jpg")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}
