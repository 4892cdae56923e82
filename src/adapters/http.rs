use indexmap::IndexMap;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

/// Adds per-endpoint headers and timeout to a request. There is no retry layer.
pub fn with_options(
    mut request: RequestBuilder,
    headers: &IndexMap<String, String>,
    timeout_seconds: Option<u64>,
) -> RequestBuilder {
    for (key, value) in headers {
        request = request.header(key, value);
    }

    if let Some(timeout) = timeout_seconds {
        request = request.timeout(Duration::from_secs(timeout));
    }

    request
}

pub fn default_client() -> Client {
    Client::new()
}

/// Truncated response body for error messages.
pub fn body_excerpt(body: &str) -> String {
    const LIMIT: usize = 512;
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_excerpt_truncates_long_bodies() {
        let long = "x".repeat(600);
        let excerpt = body_excerpt(&long);
        assert_eq!(excerpt.len(), 515);
        assert!(excerpt.ends_with("..."));
        assert_eq!(body_excerpt("short"), "short");
    }
}
