/// Input validation for user-supplied names and feed URLs
pub mod validation {
    use url::Url;

    const MAX_URL_LEN: usize = 2048;
    const MAX_NAME_LEN: usize = 200;

    /// Validate feed URL format
    pub fn validate_url(url: &str) -> Result<(), String> {
        if url.is_empty() {
            return Err("URL cannot be empty".to_string());
        }

        if url.len() > MAX_URL_LEN {
            return Err(format!("URL too long (max {MAX_URL_LEN} characters)"));
        }

        let parsed = Url::parse(url).map_err(|e| format!("Invalid URL: {e}"))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => return Err(format!("Unsupported URL scheme '{scheme}'. Must be HTTP or HTTPS")),
        }

        if parsed.host_str().map_or(true, str::is_empty) {
            return Err("URL has no host".to_string());
        }

        Ok(())
    }

    /// Validate a user or feed display name
    pub fn validate_name(name: &str) -> Result<(), String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err("Name cannot be empty".to_string());
        }

        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(format!("Name too long (max {MAX_NAME_LEN} characters)"));
        }

        if trimmed.chars().any(char::is_control) {
            return Err("Name contains control characters".to_string());
        }

        Ok(())
    }

}
