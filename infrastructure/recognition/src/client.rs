use reqwest::Client;

/// Shared HTTP configuration for the recognition service.
pub struct RecognitionHttpClient {
    pub client: Client,
    pub api_key: String,
    pub base_url: String,
}

impl RecognitionHttpClient {
    /// Per-request timeouts come from each attempt, so the client itself only
    /// bounds connection setup.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> reqwest::Result<Self> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Builds the authorization header value.
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Returns the identification endpoint URL.
    pub fn identify_url(&self) -> String {
        format!("{}/identify", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_identify_url_without_double_slash() {
        let client = RecognitionHttpClient::new("https://recognition.example.com/v1/", "key").unwrap();

        assert_eq!(
            client.identify_url(),
            "https://recognition.example.com/v1/identify"
        );
        assert_eq!(client.auth_header(), "Bearer key");
    }
}
