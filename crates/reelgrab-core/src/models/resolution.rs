use serde::Serialize;

/// Outcome of one resolution pass over the provider registry.
///
/// Created per request and dropped once the response is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Name of the provider that produced the result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Providers that were issued a request, in registry order.
    pub attempted_providers: Vec<String>,
}

impl ResolutionResult {
    pub fn resolved(
        media_url: impl Into<String>,
        title: Option<String>,
        provider: impl Into<String>,
        attempted_providers: Vec<String>,
    ) -> Self {
        Self {
            success: true,
            media_url: Some(media_url.into()),
            title,
            provider: Some(provider.into()),
            error: None,
            attempted_providers,
        }
    }

    pub fn failed(error: impl Into<String>, attempted_providers: Vec<String>) -> Self {
        Self {
            success: false,
            media_url: None,
            title: None,
            provider: None,
            error: Some(error.into()),
            attempted_providers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_shape() {
        let result = ResolutionResult::failed(
            "no provider could resolve",
            vec!["a".to_string(), "b".to_string()],
        );
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "no provider could resolve");
        assert_eq!(json["attemptedProviders"], serde_json::json!(["a", "b"]));
        assert!(json.get("mediaUrl").is_none());
    }

    #[test]
    fn test_resolved_result_shape() {
        let result = ResolutionResult::resolved(
            "https://cdn.example/v.mp4",
            None,
            "tikwm",
            vec!["tikwm".to_string()],
        );
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["mediaUrl"], "https://cdn.example/v.mp4");
        assert_eq!(json["provider"], "tikwm");
        assert!(json.get("title").is_none());
        assert!(json.get("error").is_none());
    }
}
