use super::Tags;
use serde::{Deserialize, Serialize};

/// Account-wide settings shared by every service of an environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Cloud account identifier
    pub account_id: String,

    /// Default region for provider calls
    pub region: String,

    /// Tag keys every taggable service must carry
    #[serde(default)]
    pub required_tags: Vec<String>,

    /// Tags applied to resources the tool itself creates
    #[serde(default)]
    pub resource_tags: Tags,

    /// Provider-specific settings, interpreted by deployers only
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AccountConfig {
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            ..Default::default()
        }
    }

    pub fn with_required_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Get a provider-specific setting as a specific type
    pub fn get_extra<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.extra
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
