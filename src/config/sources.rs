//! Custom route sources.
//!
//! Routes come from the inline `--custom-routes` JSON object and from an
//! optional routes file whose format follows its extension. JSON is always
//! available; YAML and TOML are gated by the `yaml` and `toml` features.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::SignpostError;
use crate::routes::RouteTable;

/// Parse the inline JSON object. Empty input and `{}` give an empty table.
pub fn parse_inline(raw: &str) -> Result<RouteTable, SignpostError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "{}" {
        return Ok(RouteTable::default());
    }
    parse_routes_str("json", raw, "--custom-routes")
}

/// Parse a routes document based on file extension.
pub fn parse_routes_str(
    ext: &str,
    content: &str,
    origin: &str,
) -> Result<RouteTable, SignpostError> {
    let routes: BTreeMap<String, String> = match ext {
        "json" => serde_json::from_str(content).map_err(|e| SignpostError::RoutesParse {
            origin: origin.to_string(),
            source: Box::new(e),
        })?,

        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| SignpostError::RoutesParse {
            origin: origin.to_string(),
            source: Box::new(e),
        })?,

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| SignpostError::RoutesParse {
            origin: origin.to_string(),
            source: Box::new(e),
        })?,

        other => return Err(SignpostError::UnsupportedFormat(other.to_string())),
    };
    Ok(RouteTable::new(routes))
}

pub async fn read_routes_file(path: &Path) -> Result<RouteTable, SignpostError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SignpostError::RoutesFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            SignpostError::Io(e)
        }
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    parse_routes_str(ext, &content, &path.display().to_string())
}
