use std::borrow::Cow;

use rust_embed::RustEmbed;
use thiserror::Error;

use crate::domain::FtaTable;

/// Embed the entire `assets/` directory into the binary.
#[derive(RustEmbed)]
#[folder = "assets"]
struct EmbeddedAssets;

const FTA_CODES: &str = "fta_codes.json";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("embedded asset {0} is missing")]
    Missing(String),
    #[error("embedded asset {0} is not valid UTF-8")]
    NotUtf8(String),
    #[error("embedded asset {path} is malformed: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Country to FTA-code table shipped with the binary.
pub fn fta_table() -> Result<FtaTable, AssetError> {
    let text = load_text(FTA_CODES)?;
    FtaTable::from_json(&text).map_err(|source| AssetError::Malformed {
        path: FTA_CODES.to_string(),
        source,
    })
}

fn load_text(path: &str) -> Result<String, AssetError> {
    let asset = load_asset(path)?;
    String::from_utf8(asset.into_owned()).map_err(|_| AssetError::NotUtf8(path.to_string()))
}

fn load_asset(path: &str) -> Result<Cow<'static, [u8]>, AssetError> {
    let canonical = canonical_asset_path(path);
    EmbeddedAssets::get(&canonical)
        .map(|file| file.data)
        .ok_or_else(|| AssetError::Missing(path.to_string()))
}

fn canonical_asset_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    if let Some(rest) = trimmed.strip_prefix("assets/") {
        rest.to_string()
    } else {
        trimmed.to_string()
    }
}
