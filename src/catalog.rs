//! Whitelisted, schema-validated loading of the JSON catalogs.
//!
//! Only `endpoints.json` and `models.json` may be read, and only from the
//! configured data directory. Errors are collapsed into [`CatalogError`] so
//! that neither file system paths nor schema details reach the caller.

use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::CatalogError;
use crate::models::{EndpointsData, ModelsData};

pub const ENDPOINTS_FILE: &str = "endpoints.json";
pub const MODELS_FILE: &str = "models.json";

const ALLOWED_FILES: [&str; 2] = [ENDPOINTS_FILE, MODELS_FILE];

/// `name.ext` with both parts drawn from `[A-Za-z0-9_-]` (ext without `-`/`_`).
fn is_valid_filename(filename: &str) -> bool {
    let Some((stem, ext)) = filename.split_once('.') else {
        return false;
    };
    !stem.is_empty()
        && !ext.is_empty()
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Read and validate a whitelisted catalog file from `data_dir`.
pub fn load_catalog<T: DeserializeOwned>(data_dir: &Path, filename: &str) -> Result<T, CatalogError> {
    if !is_valid_filename(filename) {
        return Err(CatalogError::InvalidFilename);
    }
    if !ALLOWED_FILES.contains(&filename) {
        return Err(CatalogError::NotAllowed);
    }

    let raw = std::fs::read_to_string(data_dir.join(filename)).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            CatalogError::NotFound
        } else {
            tracing::error!(file = filename, error = %e, "failed to read catalog");
            CatalogError::Invalid
        }
    })?;

    parse_catalog(&raw, filename)
}

/// Parse raw JSON against the catalog schema `T`.
pub fn parse_catalog<T: DeserializeOwned>(raw: &str, filename: &str) -> Result<T, CatalogError> {
    serde_json::from_str(raw).map_err(|e| {
        tracing::error!(file = filename, error = %e, "catalog failed schema validation");
        CatalogError::Invalid
    })
}

pub fn load_endpoints(data_dir: &Path) -> Result<EndpointsData, CatalogError> {
    load_catalog(data_dir, ENDPOINTS_FILE)
}

pub fn load_models(data_dir: &Path) -> Result<ModelsData, CatalogError> {
    load_catalog(data_dir, MODELS_FILE)
}
