use super::{Api, ImageUpload};
use crate::config::{ApiConfig, Endpoint};
use crate::error::{Error, Result};
use crate::logging;
use async_trait::async_trait;
use freshfood_types::{
    NewShoppingItem, QuantityUpdate, RecipeDetail, RecipeId, RecipeSummary, RecognitionResponse,
    RecommendRequest, RecommendResponse, ShoppingItem, StapleRequest, StaplesResponse,
};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

/// Multipart field the recognition endpoint reads the image from.
pub const IMAGE_FIELD: &str = "image";

enum Body<'a> {
    Empty,
    Json(Value),
    Image(&'a ImageUpload),
}

/// REST client for the freshfood backend.
///
/// One shared `reqwest::Client` with the configured timeout. No retries: a
/// failed call surfaces immediately as a normalized [`Error`].
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: ApiConfig,
}

impl HttpClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn send(
        &self,
        method: Method,
        endpoint: Endpoint,
        url: String,
        body: Body<'_>,
    ) -> Result<String> {
        logging::set_endpoint(endpoint.as_str());
        let started = Instant::now();

        let mut request = self.client.request(method.clone(), &url);
        request = match body {
            Body::Empty => request.header(header::CONTENT_TYPE, "application/json"),
            Body::Json(value) => request.json(&value),
            Body::Image(image) => {
                let part = Part::bytes(image.bytes.clone())
                    .file_name(image.file_name.clone())
                    .mime_str(&image.mime_type)
                    .map_err(|e| Error::validation(format!("Invalid image type: {}", e)))?;
                request.multipart(Form::new().part(IMAGE_FIELD, part))
            }
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = self.classify(e);
                logging::request(method.as_str(), &url, None, started.elapsed(), &err.to_string());
                return Err(err);
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                let err = self.classify(e);
                logging::request(
                    method.as_str(),
                    &url,
                    Some(status.as_u16()),
                    started.elapsed(),
                    &err.to_string(),
                );
                return Err(err);
            }
        };

        if !is_success(status.as_u16()) {
            logging::request(method.as_str(), &url, Some(status.as_u16()), started.elapsed(), &text);
            return Err(Error::from_response(status.as_u16(), &text));
        }

        logging::request(method.as_str(), &url, Some(status.as_u16()), started.elapsed(), "");
        logging::debug(&format!("response body: {}", text));
        Ok(text)
    }

    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(self.config.timeout())
        } else {
            Error::Network(err.to_string())
        }
    }

    async fn get(&self, endpoint: Endpoint, url: String) -> Result<String> {
        self.send(Method::GET, endpoint, url, Body::Empty).await
    }

    async fn post_json<T: Serialize>(&self, endpoint: Endpoint, url: String, body: &T) -> Result<String> {
        self.send(Method::POST, endpoint, url, Body::Json(encode(body)?)).await
    }
}

/// Success predicate shared by every call.
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn encode<T: Serialize>(body: &T) -> Result<Value> {
    serde_json::to_value(body).map_err(|e| Error::validation(format!("could not encode request: {}", e)))
}

fn decode<T: DeserializeOwned>(text: &str, what: &str) -> Result<T> {
    if text.trim().is_empty() {
        return Err(Error::DataShape(format!("no data received for {}", what)));
    }
    serde_json::from_str(text).map_err(|e| Error::DataShape(format!("{}: {}", what, e)))
}

/// Check the raw shopping list body before decoding it.
pub fn validate_shopping_list(value: &Value) -> Result<()> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::DataShape("shopping list is not an array".to_string()))?;

    for (index, item) in items.iter().enumerate() {
        let obj = item
            .as_object()
            .ok_or_else(|| Error::DataShape(format!("item {} is not an object", index)))?;
        for field in ["id", "name", "quantity"] {
            if !obj.contains_key(field) {
                return Err(Error::DataShape(format!("item {} is missing `{}`", index, field)));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl Api for HttpClient {
    async fn list_items(&self) -> Result<Vec<ShoppingItem>> {
        let url = self.config.endpoint_url(Endpoint::ShoppingList);
        let text = self.get(Endpoint::ShoppingList, url).await?;
        let value: Value = decode(&text, "shopping list")?;
        validate_shopping_list(&value)?;
        serde_json::from_value(value).map_err(|e| Error::DataShape(format!("shopping list: {}", e)))
    }

    async fn add_item(&self, item: &NewShoppingItem) -> Result<ShoppingItem> {
        let url = self.config.endpoint_url(Endpoint::ShoppingList);
        let text = self.post_json(Endpoint::ShoppingList, url, item).await?;
        decode(&text, "created item")
    }

    async fn delete_item(&self, id: i64) -> Result<()> {
        let url = self.config.resource_url(Endpoint::ShoppingList, &id.to_string());
        self.send(Method::DELETE, Endpoint::ShoppingList, url, Body::Empty)
            .await
            .map(|_| ())
    }

    async fn update_item_quantity(&self, id: i64, quantity: u32) -> Result<()> {
        let url = self.config.resource_url(Endpoint::ShoppingList, &id.to_string());
        let body = encode(&QuantityUpdate { quantity })?;
        self.send(Method::PATCH, Endpoint::ShoppingList, url, Body::Json(body))
            .await
            .map(|_| ())
    }

    async fn recognize_ingredients(&self, image: &ImageUpload) -> Result<Vec<String>> {
        let url = self.config.endpoint_url(Endpoint::ImageRecognition);
        let text = self
            .send(Method::POST, Endpoint::ImageRecognition, url, Body::Image(image))
            .await?;
        let response: RecognitionResponse = decode(&text, "recognition response")?;
        Ok(response.ingredients)
    }

    async fn recommend(&self, ingredients: &[String]) -> Result<Vec<RecipeSummary>> {
        let url = self.config.endpoint_url(Endpoint::LeftoverRecommendation);
        let body = RecommendRequest {
            ingredients: ingredients.to_vec(),
        };
        let text = self
            .post_json(Endpoint::LeftoverRecommendation, url, &body)
            .await?;
        let response: RecommendResponse = decode(&text, "recommendation response")?;
        Ok(response.recipes)
    }

    async fn recipe_detail(&self, recipe_id: &RecipeId) -> Result<RecipeDetail> {
        if recipe_id.is_blank() {
            return Err(Error::validation("Recipe id is missing"));
        }
        let segment = urlencoding::encode(recipe_id.as_str().trim());
        let url = self.config.resource_url(Endpoint::RecipeDetail, &segment);
        let text = self.get(Endpoint::RecipeDetail, url).await?;
        decode(&text, "recipe detail")
    }

    async fn staples(&self) -> Result<Vec<String>> {
        let url = self.config.endpoint_url(Endpoint::Staples);
        let text = self.get(Endpoint::Staples, url).await?;
        let response: StaplesResponse = decode(&text, "staples")?;
        Ok(response.staples)
    }

    async fn add_staple(&self, name: &str) -> Result<()> {
        let url = self.config.resource_url(Endpoint::Staples, "add");
        let body = StapleRequest {
            ingredient_name: name.to_string(),
        };
        self.post_json(Endpoint::Staples, url, &body).await.map(|_| ())
    }

    async fn remove_staple(&self, name: &str) -> Result<()> {
        let url = self.config.resource_url(Endpoint::Staples, "remove");
        let body = encode(&StapleRequest {
            ingredient_name: name.to_string(),
        })?;
        self.send(Method::DELETE, Endpoint::Staples, url, Body::Json(body))
            .await
            .map(|_| ())
    }

    async fn clear_staples(&self) -> Result<()> {
        let url = self.config.resource_url(Endpoint::Staples, "clear");
        self.send(Method::DELETE, Endpoint::Staples, url, Body::Empty)
            .await
            .map(|_| ())
    }
}
