//! Data model shared by the freshfood client and its tests.
//!
//! Everything here is plain serde data. Field names follow the backend's JSON
//! (snake_case) so the types double as wire payloads.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Smallest quantity the shopping list accepts.
pub const MIN_QUANTITY: u32 = 1;
/// Largest quantity the shopping list accepts.
pub const MAX_QUANTITY: u32 = 10;

/// Clamp a user-entered quantity into `[MIN_QUANTITY, MAX_QUANTITY]`.
pub fn clamp_quantity(quantity: i64) -> u32 {
    quantity.clamp(MIN_QUANTITY as i64, MAX_QUANTITY as i64) as u32
}

/// One row of the remote shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: i64,
    pub name: String,
    pub quantity: u32,
}

/// Body of a shopping list Add request. The server assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShoppingItem {
    pub name: String,
    pub quantity: u32,
}

/// Body of a quantity update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: u32,
}

/// Entry of the working ingredient collection. Ids are local and sequential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: u32,
    pub name: String,
}

/// A recognized ingredient name waiting for the user to confirm it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedIngredient {
    pub name: String,
    #[serde(default)]
    pub selected: bool,
}

impl StagedIngredient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selected: false,
        }
    }
}

/// Recipe identifier. The backend sends either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecipeId(String);

impl RecipeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecipeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for RecipeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => RecipeId(n.to_string()),
            Raw::Text(s) => RecipeId(s),
        })
    }
}

/// Accept a JSON string or number where the backend is inconsistent.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

/// Placeholder the backend uses for recipes without a picture.
pub const NO_IMAGE: &str = "N/A";

fn image_url(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == NO_IMAGE {
        None
    } else {
        Some(trimmed)
    }
}

/// Ranked entry of a recommendation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub recipe_id: RecipeId,
    pub recipe_name: String,
    #[serde(default)]
    pub preparation_time: Option<u32>,
    #[serde(default)]
    pub cooking_time: Option<u32>,
    #[serde(default)]
    pub match_percentage: f64,
    #[serde(default)]
    pub recipe_image: String,
    #[serde(default)]
    pub matched_ingredients: Vec<String>,
    #[serde(default)]
    pub missing_ingredients: Vec<String>,
}

impl RecipeSummary {
    pub fn image_url(&self) -> Option<&str> {
        image_url(&self.recipe_image)
    }

    /// Match percentage bounded to `[0, 100]` for display.
    pub fn match_display(&self) -> f64 {
        self.match_percentage.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub food_name: String,
    #[serde(default)]
    pub ingredient_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDirection {
    pub direction_number: u32,
    pub direction_description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionalInfo {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbohydrate: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    #[serde(deserialize_with = "lenient_text")]
    pub serving_size: Option<String>,
}

/// Full record for one recipe, fetched on selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub recipe_id: RecipeId,
    pub recipe_name: String,
    #[serde(default)]
    pub recipe_description: String,
    #[serde(default)]
    pub recipe_image: String,
    #[serde(default)]
    pub preparation_time: Option<u32>,
    #[serde(default)]
    pub cooking_time: Option<u32>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub serving_size: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub directions: Vec<RecipeDirection>,
    #[serde(default)]
    pub nutritional_info: NutritionalInfo,
}

impl RecipeDetail {
    pub fn image_url(&self) -> Option<&str> {
        image_url(&self.recipe_image)
    }
}

/// Response of the image recognition endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResponse {
    pub ingredients: Vec<String>,
}

/// Body of a recommendation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub ingredients: Vec<String>,
}

/// Response of the recommendation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub recipes: Vec<RecipeSummary>,
}

/// Body of staple add/remove requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StapleRequest {
    pub ingredient_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StaplesResponse {
    #[serde(default)]
    pub staples: Vec<String>,
}
