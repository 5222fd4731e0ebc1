//! URL 校验与规范化

use url::Url;

#[derive(Debug, PartialEq, Eq)]
pub enum UrlValidationError {
    EmptyUrl,
    InvalidFormat(String),
    MissingScheme,
    MissingHost,
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::InvalidFormat(msg) => write!(f, "Invalid URL format: {}", msg),
            Self::MissingScheme => write!(f, "URL must be absolute (scheme required)"),
            Self::MissingHost => write!(f, "URL must contain a host"),
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// 校验并返回规范化后的 URL
///
/// 规范化只做首尾去空白；解析结果仅用于校验，避免 `Url` 序列化时补 `/`
/// 导致同一输入得到不同的短码。
pub fn normalize_url(raw: &str) -> Result<String, UrlValidationError> {
    let url = raw.trim();

    if url.is_empty() {
        return Err(UrlValidationError::EmptyUrl);
    }

    let parsed = Url::parse(url).map_err(|e| match e {
        url::ParseError::RelativeUrlWithoutBase => UrlValidationError::MissingScheme,
        other => UrlValidationError::InvalidFormat(other.to_string()),
    })?;

    if !parsed.has_host() || parsed.host_str().is_some_and(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls_are_trimmed_only() {
        assert_eq!(
            normalize_url("  https://example.com ").unwrap(),
            "https://example.com"
        );
        assert_eq!(
            normalize_url("http://localhost:8080/a?b=1#c").unwrap(),
            "http://localhost:8080/a?b=1#c"
        );
        assert_eq!(normalize_url("ftp://files.example.org").unwrap(), "ftp://files.example.org");
    }

    #[test]
    fn test_empty_url() {
        assert_eq!(normalize_url(""), Err(UrlValidationError::EmptyUrl));
        assert_eq!(normalize_url("   "), Err(UrlValidationError::EmptyUrl));
    }

    #[test]
    fn test_relative_url_rejected() {
        assert_eq!(
            normalize_url("example.com/path"),
            Err(UrlValidationError::MissingScheme)
        );
        assert_eq!(normalize_url("/just/a/path"), Err(UrlValidationError::MissingScheme));
    }

    #[test]
    fn test_url_without_host_rejected() {
        assert_eq!(
            normalize_url("mailto:someone@example.com"),
            Err(UrlValidationError::MissingHost)
        );
        assert_eq!(normalize_url("data:text/plain,hi"), Err(UrlValidationError::MissingHost));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            normalize_url("http://exa mple.com"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }
}
