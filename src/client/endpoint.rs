//! Base URL validation and request URL building

use crate::error::{Error, Result};
use url::Url;

/// Validate a base URL and make it end with `/`
///
/// Surrounding whitespace is trimmed. The URL must use `http` or `https` and
/// carry a host.
pub fn validate_base_url(url: &str) -> Result<String> {
    let mut sanitized = url.trim().to_string();
    if sanitized.is_empty() {
        return Err(Error::invalid_url("URL cannot be empty"));
    }

    let parsed = match Url::parse(&sanitized) {
        Ok(parsed) => parsed,
        Err(url::ParseError::EmptyHost) => {
            return Err(Error::invalid_url(format!(
                "URL must contain a valid domain, got {url}"
            )));
        }
        Err(e) => {
            return Err(Error::invalid_url(format!(
                "URL must have a valid scheme (http or https), got {url}: {e}"
            )));
        }
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::invalid_url(format!(
            "URL must have a valid scheme (http or https), got {url}"
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(Error::invalid_url(format!(
            "URL must contain a valid domain, got {url}"
        )));
    }

    if !sanitized.ends_with('/') {
        sanitized.push('/');
    }
    Ok(sanitized)
}

/// Join `endpoint` onto `base_url` and append `params` as a query string
///
/// Leading slashes of the endpoint are dropped so it always resolves below
/// the base path.
pub fn build_url(base_url: &str, endpoint: &str, params: &[(String, String)]) -> Result<String> {
    let base = Url::parse(base_url)
        .map_err(|e| Error::invalid_url(format!("cannot parse base URL '{base_url}': {e}")))?;
    let mut url = base.join(endpoint.trim_start_matches('/')).map_err(|e| {
        Error::invalid_url(format!("cannot join endpoint '{endpoint}' to '{base_url}': {e}"))
    })?;

    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("https://api.example.com", "https://api.example.com/" ; "appends slash")]
    #[test_case("https://api.example.com/", "https://api.example.com/" ; "keeps slash")]
    #[test_case("https://api.example.com//", "https://api.example.com//" ; "keeps double slash")]
    #[test_case(" https://api.example.com", "https://api.example.com/" ; "leading whitespace")]
    #[test_case("https://api.example.com  ", "https://api.example.com/" ; "trailing whitespace")]
    #[test_case("http://localhost:8080/ODataV4", "http://localhost:8080/ODataV4/" ; "port and path")]
    fn test_validate_base_url_ok(input: &str, expected: &str) {
        assert_eq!(validate_base_url(input).unwrap(), expected);
    }

    #[test_case("", "empty" ; "empty")]
    #[test_case("   ", "empty" ; "blank")]
    #[test_case("nohttps", "scheme" ; "no scheme")]
    #[test_case("ftp://example.com", "scheme" ; "ftp scheme")]
    #[test_case("mailto:someone@example.com", "scheme" ; "mailto")]
    #[test_case("http://", "domain" ; "no host")]
    fn test_validate_base_url_err(input: &str, rule: &str) {
        let err = validate_base_url(input).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
        assert!(err.to_string().contains(rule), "{err}");
    }

    #[test]
    fn test_build_url_relative_join() {
        let base = "https://api.example.com/v2.0/tenant/ODataV4/";
        assert_eq!(
            build_url(base, "Company('CRONUS')/items", &[]).unwrap(),
            "https://api.example.com/v2.0/tenant/ODataV4/Company('CRONUS')/items"
        );
        // A leading slash does not escape the base path
        assert_eq!(
            build_url(base, "/items", &[]).unwrap(),
            "https://api.example.com/v2.0/tenant/ODataV4/items"
        );
    }

    #[test]
    fn test_build_url_with_params() {
        let params = vec![
            ("$top".to_string(), "10".to_string()),
            ("$filter".to_string(), "no eq 'A B'".to_string()),
        ];
        assert_eq!(
            build_url("https://api.example.com/", "items", &params).unwrap(),
            "https://api.example.com/items?%24top=10&%24filter=no+eq+%27A+B%27"
        );
    }

    #[test]
    fn test_build_url_appends_to_existing_query() {
        let params = vec![("$top".to_string(), "1".to_string())];
        assert_eq!(
            build_url("https://api.example.com/", "items?company=X", &params).unwrap(),
            "https://api.example.com/items?company=X&%24top=1"
        );
    }
}
