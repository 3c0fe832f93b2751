//! Structural validation of catalog payloads
//!
//! The payload is checked as untyped JSON first so that a rejection names
//! the offending field, then deserialized into [`CatalogManifest`].

use market_meta::CatalogManifest;
use serde_json::{Map, Value};

use crate::{CatalogError, Result};

/// Parse and validate a catalog document.
pub fn parse_catalog(body: &[u8]) -> Result<CatalogManifest> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| CatalogError::invalid_format(format!("malformed JSON: {e}")))?;

    check_shape(&value)?;

    let manifest: CatalogManifest = serde_json::from_value(value)
        .map_err(|e| CatalogError::invalid_format(e.to_string()))?;

    let dangling = manifest.dangling_highlights();
    if !dangling.is_empty() {
        tracing::debug!(?dangling, "Catalog highlights unknown extensions");
    }
    Ok(manifest)
}

fn check_shape(value: &Value) -> Result<()> {
    let root = value
        .as_object()
        .ok_or_else(|| CatalogError::invalid_format("catalog is not an object"))?;

    require_string(root, "schemaVersion", "catalog")?;
    require_string(root, "buildTimestamp", "catalog")?;
    optional_string_array(root, "knownCategories", "catalog")?;
    optional_string_array(root, "highlightedExtensions", "catalog")?;

    let extensions = require_array(root, "availableExtensions", "catalog")?;
    for (index, entry) in extensions.iter().enumerate() {
        let context = format!("availableExtensions[{index}]");
        let entry = entry
            .as_object()
            .ok_or_else(|| CatalogError::invalid_format(format!("{context} is not an object")))?;
        check_extension(entry, &context)?;
    }
    Ok(())
}

fn check_extension(entry: &Map<String, Value>, context: &str) -> Result<()> {
    for field in ["uniqueId", "kind", "semanticVersion", "title"] {
        require_string(entry, field, context)?;
    }
    for field in ["tags", "categories", "dependsOnExtensions"] {
        optional_string_array(entry, field, context)?;
    }

    let contents = require_array(entry, "packageContents", context)?;
    for (index, file) in contents.iter().enumerate() {
        let file_context = format!("{context}.packageContents[{index}]");
        let file = file.as_object().ok_or_else(|| {
            CatalogError::invalid_format(format!("{file_context} is not an object"))
        })?;
        for field in ["relativePath", "downloadSource", "targetLocation"] {
            require_string(file, field, &file_context)?;
        }
    }
    Ok(())
}

fn require_string(obj: &Map<String, Value>, field: &str, context: &str) -> Result<()> {
    match obj.get(field) {
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(CatalogError::invalid_format(format!(
            "{context}.{field} must be a string"
        ))),
        None => Err(CatalogError::invalid_format(format!(
            "{context}.{field} is missing"
        ))),
    }
}

fn require_array<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    context: &str,
) -> Result<&'a Vec<Value>> {
    match obj.get(field) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(CatalogError::invalid_format(format!(
            "{context}.{field} must be an array"
        ))),
        None => Err(CatalogError::invalid_format(format!(
            "{context}.{field} is missing"
        ))),
    }
}

fn optional_string_array(obj: &Map<String, Value>, field: &str, context: &str) -> Result<()> {
    let Some(value) = obj.get(field) else {
        return Ok(());
    };
    let items = value.as_array().ok_or_else(|| {
        CatalogError::invalid_format(format!("{context}.{field} must be an array"))
    })?;
    if items.iter().all(Value::is_string) {
        Ok(())
    } else {
        Err(CatalogError::invalid_format(format!(
            "{context}.{field} must contain only strings"
        )))
    }
}
