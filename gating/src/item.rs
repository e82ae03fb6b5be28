//! Promotional item payloads.
//!
//! The upstream endpoints are not consistent about field names: the same
//! logical field arrives as `id`/`ad_id`/`adId`/`advert_id`/`adv_id`
//! depending on which backend copy answered. Everything funnels through
//! [`RawPromotion`] at the boundary and comes out as one typed
//! [`PromotionalItem`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical promotional insert, as the controllers and the UI see it.
///
/// `id` is `None` for anonymous items, which are shown but never registered
/// in the dedup registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionalItem {
    pub id: Option<u32>,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub destination: String,
    pub start_time: Option<i64>,
}

/// Boundary payload with every field-name spelling the backends produce.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPromotion {
    #[serde(
        default,
        alias = "ad_id",
        alias = "adId",
        alias = "advert_id",
        alias = "adv_id"
    )]
    pub id: Option<Value>,

    #[serde(default, alias = "name")]
    pub title: Option<String>,

    #[serde(default, alias = "description")]
    pub desc: Option<String>,

    #[serde(default, alias = "image_url", alias = "cover")]
    pub img: Option<String>,

    #[serde(default, alias = "route", alias = "url", alias = "link")]
    pub destination: Option<String>,

    #[serde(default, alias = "start_time")]
    pub time: Option<Value>,
}

impl RawPromotion {
    pub fn normalize(&self) -> PromotionalItem {
        PromotionalItem {
            id: self.id.as_ref().and_then(coerce_id),
            title: self.title.clone().unwrap_or_default(),
            description: self.desc.clone().unwrap_or_default(),
            image_url: self.img.clone().unwrap_or_default(),
            destination: self.destination.clone().unwrap_or_default(),
            start_time: self.time.as_ref().and_then(coerce_timestamp),
        }
    }
}

/// A usable id is a positive integer, arriving as a JSON number or a numeric
/// string. Anything else normalizes to `None`.
pub(crate) fn coerce_id(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };

    u32::try_from(n).ok().filter(|&n| n > 0)
}

fn coerce_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
