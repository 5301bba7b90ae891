//! Tag resolution and required-tag enforcement

use crate::model::{ServiceContext, Tags};

/// Tag key carrying the application name
pub const APP_TAG: &str = "app";

/// Tag key carrying the environment name
pub const ENV_TAG: &str = "env";

/// Tags applied to a service's resources
///
/// Application-level tags, overridden by service-level tags, overridden by the
/// built-in `app` / `env` tags. User tags never replace the built-in ones.
pub fn effective_tags(service: &ServiceContext) -> Tags {
    let mut tags = service.tags.clone();
    tags.extend(service.params.tags.clone());
    tags.insert(APP_TAG.to_string(), service.app_name.clone());
    tags.insert(ENV_TAG.to_string(), service.environment_name.clone());
    tags
}

/// Messages for every required tag missing from the service's effective tags
pub fn missing_required_tags(service: &ServiceContext, required: &[String]) -> Vec<String> {
    let tags = effective_tags(service);
    required
        .iter()
        .filter(|tag| !tags.contains_key(tag.as_str()))
        .map(|tag| {
            format!(
                "Tagging - {} - Missing required tag '{}'. You can apply this tag at either the application or service level.",
                service.service_name, tag
            )
        })
        .collect()
}
