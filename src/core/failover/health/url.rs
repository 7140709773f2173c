//! URL construction for candidate servers
//!
//! Candidates are identified by their base URL (scheme://host[:port], no
//! `/api` suffix). Endpoint paths are appended to the normalized base.

use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    #[error("Invalid URL format: {0}")]
    ParseError(#[from] url::ParseError),
    #[error("Missing host in URL")]
    MissingHost,
}

/// Normalize base URL by trimming trailing slashes
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Append an absolute endpoint path to a base URL
///
/// # Examples
/// - `http://localhost:3000` + `/api/health` → `http://localhost:3000/api/health`
/// - `https://a.onrender.com/` + `api/gemini-key` → `https://a.onrender.com/api/gemini-key`
pub fn build_endpoint_url(base_url: &str, path: &str) -> String {
    let normalized = normalize_base_url(base_url);
    let path = path.trim();
    if path.starts_with('/') {
        format!("{}{}", normalized, path)
    } else {
        format!("{}/{}", normalized, path)
    }
}

/// Validate a configured base URL and return its normalized form
pub fn validate_base_url(base_url: &str) -> Result<String, UrlError> {
    let normalized = normalize_base_url(base_url);
    let url = Url::parse(&normalized)?;
    url.host_str().ok_or(UrlError::MissingHost)?;
    Ok(normalized)
}

/// Human-readable server label: `Port 3001` for localhost, the host otherwise
pub fn server_identifier(base_url: &str) -> String {
    match Url::parse(base_url) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default();
            match url.port() {
                Some(port) if host == "localhost" || host == "127.0.0.1" => {
                    format!("Port {}", port)
                }
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            }
        }
        Err(_) => normalize_base_url(base_url),
    }
}
