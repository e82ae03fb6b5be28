//! Router capability and promotional destination resolution.

use async_trait::async_trait;
use tracing::warn;
use url::Url;

use crate::error::NavError;
use crate::item::PromotionalItem;

/// Route the upsell page lives under. Sending a user there arms the one-shot
/// suppression flag so the gate does not fire again on their way back.
pub const UPSELL_ROUTE: &str = "/vip-plus";

/// Where to land when an item has neither a destination nor an id.
pub const FALLBACK_ROUTE: &str = "/match";

/// External router capability. Handles both in-app route paths and absolute
/// URLs; callers in this crate swallow its errors, a redundant navigation
/// must never block a gate from closing.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate_to(&self, path: &str, query: &[(String, String)]) -> Result<(), NavError>;
}

pub(crate) fn is_external(destination: &str) -> bool {
    let lower = destination.to_ascii_lowercase();

    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolves where activating a promotional item leads.
///
/// - absolute URLs keep their host and gain a `from=<origin>` param
/// - anything in-app with a usable id is forced onto the canonical
///   `/ad/<id>` detail route
/// - no destination and no id falls back to the match page
pub fn resolve_destination(item: &PromotionalItem, origin: &str) -> (String, Vec<(String, String)>) {
    let mut dest = item.destination.clone();

    if !is_external(&dest) {
        if let Some(id) = item.id {
            dest = format!("/ad/{id}");
        }
    }

    if dest.is_empty() {
        return (
            FALLBACK_ROUTE.to_string(),
            vec![("tab".to_string(), origin.to_string())],
        );
    }

    if is_external(&dest) {
        match Url::parse(&dest) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("from", origin);
                return (url.to_string(), Vec::new());
            }
            Err(e) => {
                warn!("unparseable external destination {dest}: {e}");
                return (dest, Vec::new());
            }
        }
    }

    if !dest.starts_with('/') {
        dest.insert(0, '/');
    }

    (dest, vec![("from".to_string(), origin.to_string())])
}
