//! HTTP adapter for the feature-flag service.

use serde::Deserialize;

use crate::error::FeatureFlagError;
use crate::feature_flags::FeatureFlagService;

#[derive(Debug, Clone)]
pub struct FlagClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for FlagClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: None,
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpFeatureFlagClient {
    config: FlagClientConfig,
    client: reqwest::blocking::Client,
}

impl HttpFeatureFlagClient {
    pub fn new(config: FlagClientConfig) -> Result<Self, FeatureFlagError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn flag_url(&self, office_id: i64, flag: &str) -> String {
        format!(
            "{}/offices/{}/flags/{}",
            self.config.base_url.trim_end_matches('/'),
            office_id,
            flag
        )
    }

    fn fetch(&self, office_id: i64, flag: &str) -> Result<FlagResponse, FeatureFlagError> {
        let mut request = self.client.get(self.flag_url(office_id, flag));
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let body = request
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<FlagResponse>())?;
        Ok(body)
    }
}

impl FeatureFlagService for HttpFeatureFlagClient {
    fn is_feature_enabled_for_office(&self, office_id: i64, flag: &str) -> Result<bool, FeatureFlagError> {
        Ok(self.fetch(office_id, flag)?.enabled)
    }

    fn get_feature_flag_string_value_for_office(
        &self,
        office_id: i64,
        flag: &str,
        default: &str,
    ) -> Result<String, FeatureFlagError> {
        let body = self.fetch(office_id, flag)?;
        Ok(body.value.unwrap_or_else(|| default.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct FlagResponse {
    #[serde(default)]
    enabled: bool,
    value: Option<String>,
}
