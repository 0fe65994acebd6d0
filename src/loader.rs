//! Schema and payload loading from files, strings, and HTTP URLs.

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_schema(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_schema_str(&content)
}

/// Load a JSON document from a string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_schema_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load every fragment file, in order.
///
/// # Errors
///
/// Fails on the first file that cannot be loaded.
pub fn load_fragments<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Value>, LoadError> {
    paths.iter().map(|p| load_schema(p.as_ref())).collect()
}

/// Load a schema from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails or the server
/// answers with an error status.
#[cfg(feature = "remote")]
pub fn load_schema_url(url: &str) -> Result<Value, LoadError> {
    let network = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network)?;

    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json())
        .map_err(network)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a schema from a file path or URL.
///
/// # Errors
///
/// Returns `LoadError::RemoteDisabled` for URLs when built without the
/// `remote` feature, otherwise whatever the underlying loader returns.
pub fn load_schema_auto(source: &str) -> Result<Value, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_schema_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::RemoteDisabled {
                url: source.to_string(),
            })
        }
    } else {
        load_schema(Path::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_schema_missing_file() {
        let result = load_schema(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn load_schema_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let result = load_schema(&path);
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_schema_str_valid() {
        let value = load_schema_str(r#"{"type":"object"}"#).unwrap();
        assert_eq!(value, json!({ "type": "object" }));
    }

    #[test]
    fn load_fragments_in_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        fs::write(&a, r#"{"$id":"a"}"#).unwrap();
        fs::write(&b, r#"{"$id":"b"}"#).unwrap();

        let fragments = load_fragments(&[&a, &b]).unwrap();
        assert_eq!(fragments, vec![json!({ "$id": "a" }), json!({ "$id": "b" })]);
    }

    #[test]
    fn load_fragments_stops_on_missing() {
        let result = load_fragments(&["/no/such/fragment.json"]);
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn is_url_detection() {
        assert!(is_url("https://example.com/schema.json"));
        assert!(is_url("http://localhost/schema.json"));
        assert!(!is_url("schema.json"));
        assert!(!is_url("/abs/schema.json"));
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn load_schema_url_valid() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/schema.json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(r#"{"type":"object","$owner":"platform"}"#)
                .create();

            let url = format!("{}/schema.json", server.url());
            let schema = load_schema_url(&url).unwrap();
            assert_eq!(schema["$owner"], "platform");
            mock.assert();
        }

        #[test]
        fn load_schema_url_404() {
            let mut server = mockito::Server::new();
            let _mock = server.mock("GET", "/missing.json").with_status(404).create();

            let url = format!("{}/missing.json", server.url());
            let result = load_schema_url(&url);
            assert!(matches!(result, Err(LoadError::NetworkError { .. })));
        }

        #[test]
        fn load_schema_auto_url() {
            let mut server = mockito::Server::new();
            let _mock = server
                .mock("GET", "/s.json")
                .with_status(200)
                .with_body(r#"{"type":"string"}"#)
                .create();

            let result = load_schema_auto(&format!("{}/s.json", server.url()));
            assert_eq!(result.unwrap(), json!({ "type": "string" }));
        }
    }
}
