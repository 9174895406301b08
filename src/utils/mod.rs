use regex::Regex;
use url::Url;

use crate::domain::{Field, ValidationError};

const URL_CHARSET: &str = r"^[a-zA-Z0-9\-._~:/?#\[\]@!$&'()*+,;=%]+$";
const PROCESS_CHARSET: &str = r"^[a-zA-Z0-9äöüÄÖÜß\-_]+$";

fn matches(pattern: &str, text: &str) -> bool {
    Regex::new(pattern)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// Check the shape of a download URL
pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ValidationError::new(
            Field::Url,
            "Please enter a valid URL (starting with 'http://' or 'https://').",
        ));
    }

    if !matches(URL_CHARSET, url) || url.matches('.').count() < 2 || Url::parse(url).is_err() {
        return Err(ValidationError::new(Field::Url, "The URL is not valid."));
    }

    Ok(())
}

/// Check the process filter: a single word of letters, digits, umlauts, '-' and '_'
pub fn validate_process_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new(
            Field::ProcessName,
            "The process name must not be empty.",
        ));
    }

    if name.contains(' ') {
        return Err(ValidationError::new(
            Field::ProcessName,
            "The process name must not contain spaces.",
        ));
    }

    if !matches(PROCESS_CHARSET, name) {
        return Err(ValidationError::new(
            Field::ProcessName,
            "Allowed characters: a-z, A-Z, 0-9, äöü, ÄÖÜ, ß, hyphens and underscores.",
        ));
    }

    Ok(())
}

/// Run both validators and collect every failure
pub fn validate_request(url: &str, process_name: &str) -> Vec<ValidationError> {
    [validate_url(url), validate_process_name(process_name)]
        .into_iter()
        .filter_map(Result::err)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/my_file.zip").is_ok());
        assert!(validate_url("http://127.0.0.1:8080/setup.exe").is_ok());

        let err = validate_url("ftp://example.com/file").unwrap_err();
        assert_eq!(err.field, Field::Url);
        assert!(err.message.contains("http://"));

        assert!(validate_url("https://localhost/file").is_err());
        assert!(validate_url("https://exa mple.com/file.zip").is_err());
        assert!(validate_url("https://example.com/file<1>.zip").is_err());
    }

    #[test]
    fn test_validate_process_name() {
        assert!(validate_process_name("notepad").is_ok());
        assert!(validate_process_name("Größe_2-x").is_ok());

        assert!(validate_process_name("").is_err());
        let err = validate_process_name("my process").unwrap_err();
        assert_eq!(err.field, Field::ProcessName);
        assert!(err.message.contains("spaces"));
        assert!(validate_process_name("setup.exe").is_err());
    }

    #[test]
    fn test_validate_request_collects_both() {
        let errors = validate_request("nope", "a b");
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec![Field::Url, Field::ProcessName]);

        assert!(validate_request("https://example.com/a.exe", "setup").is_empty());
    }
}
