use thiserror::Error;
use url::Url;

/// Errors from link validation before handing a URL to the system
/// browser.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Validates a link before `open::that`.
///
/// The feed fragment is server-rendered, but links inside it are scraped
/// from the wider internet; anything that is not plain http(s) —
/// `file://`, `javascript:`, custom protocol handlers — must never reach
/// the OS opener. Private and loopback hosts are fine here: the reader
/// itself usually lives on the LAN.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_and_https_accepted() {
        assert!(validate_url_for_open("https://example.com/post").is_ok());
        assert!(validate_url_for_open("http://reader.lan:5000/").is_ok());
    }

    #[test]
    fn local_hosts_accepted_for_open() {
        assert!(validate_url_for_open("http://127.0.0.1:5000/saved").is_ok());
        assert!(validate_url_for_open("http://192.168.1.10/feed").is_ok());
    }

    #[test]
    fn non_http_schemes_rejected() {
        assert!(validate_url_for_open("file:///etc/passwd").is_err());
        assert!(validate_url_for_open("javascript:alert(1)").is_err());
        assert!(validate_url_for_open("ftp://example.com").is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!(validate_url_for_open("not a url").is_err());
        assert!(validate_url_for_open("").is_err());
    }
}
