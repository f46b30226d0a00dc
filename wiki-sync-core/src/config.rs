use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// German placeholder shown for every page; developer docs are English only.
pub const UNTRANSLATED_NOTICE_DE: &str =
    "<p>Die Entwicklerdokumentation ist nur auf Englisch verfügbar.</p>";

/// Settings that shape the payloads of a sync pass.
///
/// `Default` yields the values the wiki backend expects; every field can be
/// overridden from a YAML settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Well-known category all documentation lives under.
    pub root_category_id: i64,
    /// `fromProductVersion` written on every article.
    pub initial_product_version: String,
    /// Version string of every article version.
    pub doc_version: String,
    /// File name that marks category-level content.
    pub category_marker: String,
    /// Fixed locale id of `en_GB` on the backend.
    pub english_locale_id: i64,
    /// Product every new article is attached to.
    pub product: Product,
    /// German content written in place of a translation.
    pub untranslated_notice: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub label: String,
}

impl Default for Product {
    fn default() -> Self {
        Self {
            id: 4,
            name: "PF".to_string(),
            label: "Shopware Platform".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root_category_id: 50,
            initial_product_version: "6.0.0".to_string(),
            doc_version: "1.0.0".to_string(),
            category_marker: "__categoryInfo".to_string(),
            english_locale_id: 2,
            product: Product::default(),
            untranslated_notice: UNTRANSLATED_NOTICE_DE.to_string(),
        }
    }
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            root_category_id = self.root_category_id,
            doc_version = %self.doc_version,
            initial_product_version = %self.initial_product_version,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}
