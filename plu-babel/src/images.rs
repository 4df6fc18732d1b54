//! Image store boundary and data-URL helpers
//!
//!     The browser keeps a document's images in a persistent blob store; the
//!     converter and the exporter only see it through [`ImageStore`]. The
//!     store is scoped by document (the règlement id), and quota exhaustion
//!     is a distinguishable condition so callers can tell the user to export
//!     and free space instead of showing a generic failure.
//!
//!     Stored images are referenced from structured HTML as
//!     `ressources/<name>`; inside the editor they travel as base64 data
//!     URLs. The helpers here translate between the two.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::collections::HashMap;
use std::fmt;

/// Prefix of external image references in structured HTML.
pub const RESOURCES_PREFIX: &str = "ressources/";

/// One stored image blob.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Failure of the blob store backing the images.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The backing store is out of space. Surfaced to the user with
    /// actionable guidance; never folded into a generic failure.
    QuotaExceeded,
    /// Any other backend failure.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::QuotaExceeded => {
                write!(f, "Storage quota exceeded; export the document to free space")
            }
            StoreError::Backend(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persistent blob store boundary, scoped by document id.
pub trait ImageStore {
    /// Store a blob under `scope`/`name`. Storing under an existing name
    /// replaces the blob.
    fn store(
        &mut self,
        scope: &str,
        name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError>;

    /// All blobs stored under `scope`, in insertion order.
    fn list(&self, scope: &str) -> Vec<StoredImage>;

    /// A single blob, if present.
    fn get(&self, scope: &str, name: &str) -> Option<StoredImage>;
}

/// In-memory store used by tests and the CLI import path. An optional byte
/// quota makes the quota failure reproducible.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    scopes: HashMap<String, Vec<StoredImage>>,
    quota_bytes: Option<usize>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            scopes: HashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn stored_bytes(&self) -> usize {
        self.scopes
            .values()
            .flat_map(|images| images.iter().map(|image| image.bytes.len()))
            .sum()
    }
}

impl ImageStore for MemoryImageStore {
    fn store(
        &mut self,
        scope: &str,
        name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        if let Some(quota) = self.quota_bytes {
            if self.stored_bytes() + bytes.len() > quota {
                return Err(StoreError::QuotaExceeded);
            }
        }
        let images = self.scopes.entry(scope.to_string()).or_default();
        let image = StoredImage {
            name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.to_vec(),
        };
        match images.iter_mut().find(|existing| existing.name == name) {
            Some(existing) => *existing = image,
            None => images.push(image),
        }
        Ok(())
    }

    fn list(&self, scope: &str) -> Vec<StoredImage> {
        self.scopes.get(scope).cloned().unwrap_or_default()
    }

    fn get(&self, scope: &str, name: &str) -> Option<StoredImage> {
        self.scopes
            .get(scope)?
            .iter()
            .find(|image| image.name == name)
            .cloned()
    }
}

/// Split a base64 data URL into content type and decoded bytes.
pub fn parse_data_url(src: &str) -> Option<(String, Vec<u8>)> {
    let rest = src.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let content_type = meta.strip_suffix(";base64")?;
    let bytes = BASE64.decode(payload.trim()).ok()?;
    Some((content_type.to_string(), bytes))
}

/// Encode bytes as a base64 data URL.
pub fn to_data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, BASE64.encode(bytes))
}

/// Rewrite an embedded data URL to a `ressources/<name>` reference when a
/// stored blob matches the payload byte for byte. Anything else comes back
/// unchanged; a miss is a lossy but harmless fallback.
pub fn rewrite_embedded_src(src: &str, store: &dyn ImageStore, scope: &str) -> String {
    let Some((_, bytes)) = parse_data_url(src) else {
        return src.to_string();
    };
    for image in store.list(scope) {
        if image.bytes == bytes {
            return format!("{}{}", RESOURCES_PREFIX, image.name);
        }
    }
    log::debug!("embedded image has no stored counterpart in scope '{}'", scope);
    src.to_string()
}

/// Rehydrate a `ressources/<name>` reference to a data URL. Unknown names
/// are passed through unresolved; the editor cannot render them, which is a
/// documented limitation of the rehydration path.
pub fn rehydrate_resource_src(src: &str, store: &dyn ImageStore, scope: &str) -> String {
    let Some(name) = src.strip_prefix(RESOURCES_PREFIX) else {
        return src.to_string();
    };
    match store.get(scope, name) {
        Some(image) => to_data_url(&image.content_type, &image.bytes),
        None => {
            log::warn!("image '{}' not found in scope '{}'", name, scope);
            src.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCOPE: &str = "14027_PLU_20240101/reglement";

    #[test]
    fn memory_store_round_trips_blobs() {
        let mut store = MemoryImageStore::new();
        store.store(SCOPE, "plan.png", "image/png", &[1, 2, 3]).unwrap();
        let listed = store.list(SCOPE);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "plan.png");
        assert_eq!(store.get(SCOPE, "plan.png").unwrap().bytes, vec![1, 2, 3]);
        assert!(store.get(SCOPE, "autre.png").is_none());
        assert!(store.get("other-scope", "plan.png").is_none());
    }

    #[test]
    fn quota_exhaustion_is_distinguishable() {
        let mut store = MemoryImageStore::with_quota(4);
        store.store(SCOPE, "a.png", "image/png", &[0, 0]).unwrap();
        let err = store
            .store(SCOPE, "b.png", "image/png", &[0, 0, 0])
            .unwrap_err();
        assert_eq!(err, StoreError::QuotaExceeded);
        // The first blob survived the failed store.
        assert_eq!(store.list(SCOPE).len(), 1);
    }

    #[test]
    fn data_url_round_trip() {
        let url = to_data_url("image/png", &[137, 80, 78, 71]);
        let (content_type, bytes) = parse_data_url(&url).unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(bytes, vec![137, 80, 78, 71]);
    }

    #[test]
    fn parse_rejects_non_base64_urls() {
        assert!(parse_data_url("data:text/plain,hello").is_none());
        assert!(parse_data_url("https://example.com/x.png").is_none());
    }

    #[test]
    fn embedded_src_rewrites_on_exact_match() {
        let mut store = MemoryImageStore::new();
        store.store(SCOPE, "plan.png", "image/png", &[9, 8, 7]).unwrap();

        let url = to_data_url("image/png", &[9, 8, 7]);
        assert_eq!(
            rewrite_embedded_src(&url, &store, SCOPE),
            "ressources/plan.png"
        );

        let other = to_data_url("image/png", &[1, 1, 1]);
        assert_eq!(rewrite_embedded_src(&other, &store, SCOPE), other);
    }

    #[test]
    fn resource_src_rehydrates_or_passes_through() {
        let mut store = MemoryImageStore::new();
        store.store(SCOPE, "plan.png", "image/png", &[9, 8, 7]).unwrap();

        let rehydrated = rehydrate_resource_src("ressources/plan.png", &store, SCOPE);
        assert!(rehydrated.starts_with("data:image/png;base64,"));

        assert_eq!(
            rehydrate_resource_src("ressources/absent.png", &store, SCOPE),
            "ressources/absent.png"
        );
    }
}
