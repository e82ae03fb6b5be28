//! One-line wrappers over the matching backend's REST surface.

use std::time::Duration;

use async_trait::async_trait;
use gating::{ApiError, LikeResult, MatchApi, RawPromotion, UserProfile};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

#[derive(Deserialize)]
struct PromotionPage {
    #[serde(default)]
    items: Vec<RawPromotion>,
}

pub struct RestApi {
    client: Client,
    base_url: String,
}

impl RestApi {
    /// `base_url` must end with a `/`; paths below must not start with one.
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("HTTP client misconfigured!");

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(transport)?;

        decode(response).await
    }
}

#[async_trait]
impl MatchApi for RestApi {
    async fn fetch_user_profile(&self, uid: u64) -> Result<UserProfile, ApiError> {
        self.get_json(&format!("user/main/{uid}")).await
    }

    async fn fetch_promotion_list(&self, limit: u32) -> Result<Vec<RawPromotion>, ApiError> {
        let page: PromotionPage = self.get_json(&format!("user/ads?limit={limit}")).await?;

        Ok(page.items)
    }

    async fn fetch_promotion_by_id(&self, id: u32) -> Result<RawPromotion, ApiError> {
        self.get_json(&format!("user/ads/{id}")).await
    }

    async fn submit_like(&self, liker: u64, likee: u64) -> Result<LikeResult, ApiError> {
        let response = self
            .client
            .post(self.url("user/like"))
            .json(&json!({ "liker_id": liker, "likee_id": likee }))
            .send()
            .await
            .map_err(transport)?;

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16()));
    }

    response.json().await.map_err(|e| ApiError::Decode(e.to_string()))
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}
