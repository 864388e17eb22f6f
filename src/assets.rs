//! Read-only asset stores for the page template.
//!
//! The default store is compiled into the binary via `rust-embed`. A
//! [`MemoryAssets`] store is used when the template is overridden on the
//! command line, and in tests.

use std::borrow::Cow;
use std::collections::HashMap;

/// Logical name of the page template.
pub const TEMPLATE_ASSET: &str = "data/md.template";

/// A process-lifetime map from logical asset name to content.
pub trait AssetStore: Send + Sync {
    /// Get an asset by logical name, or `None` if it does not exist.
    fn get(&self, name: &str) -> Option<Cow<'static, [u8]>>;
}

#[derive(rust_embed::RustEmbed)]
#[folder = "data/"]
#[prefix = "data/"]
struct Embedded;

/// Assets compiled into the binary from the `data/` directory.
pub struct EmbeddedAssets;

impl AssetStore for EmbeddedAssets {
    fn get(&self, name: &str) -> Option<Cow<'static, [u8]>> {
        Embedded::get(name).map(|file| file.data)
    }
}

/// Assets held in memory, keyed by logical name.
#[derive(Debug, Default)]
pub struct MemoryAssets {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an asset.
    pub fn with_asset(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.assets.insert(name.into(), content.into());
        self
    }
}

impl AssetStore for MemoryAssets {
    fn get(&self, name: &str) -> Option<Cow<'static, [u8]>> {
        self.assets
            .get(name)
            .map(|content| Cow::Owned(content.clone()))
    }
}
