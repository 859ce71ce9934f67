//! Provider descriptors: one third-party extraction endpoint as data.

use reelgrab_core::{HeaderError, HeaderSet, Platform};

use crate::transform::{ExtractedMedia, ResponseTransform};

/// Placeholder replaced by the percent-encoded source URL in URL templates.
pub const URL_PLACEHOLDER: &str = "{url}";
/// Placeholder replaced by the source URL verbatim.
pub const RAW_URL_PLACEHOLDER: &str = "{raw_url}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request body template. String values may contain the URL placeholders;
/// they are substituted verbatim since the encoder escapes them.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    None,
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
}

/// Static definition of one provider. Built once at startup and shared
/// read-only by every request.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub name: String,
    pub platform: Platform,
    pub method: HttpMethod,
    pub url_template: String,
    pub body: RequestBody,
    /// Overrides merged on top of the engine's browser header set.
    pub headers: HeaderSet,
    /// Origin used to absolutize relative media paths. Providers without one
    /// never produce a usable relative result.
    pub base_origin: Option<String>,
    /// When non-empty, the source URL must be https on one of these hosts or
    /// a subdomain. Set for descriptors that fetch the source URL itself.
    pub source_hosts: Vec<String>,
    pub transform: ResponseTransform,
}

impl ProviderDescriptor {
    pub fn get(
        name: impl Into<String>,
        platform: Platform,
        url_template: impl Into<String>,
        transform: ResponseTransform,
    ) -> Self {
        Self {
            name: name.into(),
            platform,
            method: HttpMethod::Get,
            url_template: url_template.into(),
            body: RequestBody::None,
            headers: HeaderSet::new(),
            base_origin: None,
            source_hosts: Vec::new(),
            transform,
        }
    }

    pub fn post(
        name: impl Into<String>,
        platform: Platform,
        url_template: impl Into<String>,
        body: RequestBody,
        transform: ResponseTransform,
    ) -> Self {
        Self {
            name: name.into(),
            platform,
            method: HttpMethod::Post,
            url_template: url_template.into(),
            body,
            headers: HeaderSet::new(),
            base_origin: None,
            source_hosts: Vec::new(),
            transform,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_base_origin(mut self, origin: impl Into<String>) -> Self {
        self.base_origin = Some(origin.into());
        self
    }

    pub fn with_source_host(mut self, host: impl Into<String>) -> Self {
        self.source_hosts.push(host.into());
        self
    }

    /// Whether this descriptor may be used for `source_url`.
    pub fn accepts_source(&self, source_url: &str) -> bool {
        if self.source_hosts.is_empty() {
            return true;
        }
        let Ok(url) = reqwest::Url::parse(source_url) else {
            return false;
        };
        if url.scheme() != "https" {
            return false;
        }
        let Some(host) = url.host_str().map(str::to_lowercase) else {
            return false;
        };
        self.source_hosts.iter().any(|allowed| {
            let allowed = allowed.to_lowercase();
            host == allowed || host.ends_with(&format!(".{}", allowed))
        })
    }

    pub fn render_url(&self, source_url: &str) -> String {
        fill(
            &self.url_template,
            source_url,
            &urlencoding::encode(source_url),
        )
    }

    pub fn render_body(&self, source_url: &str) -> RequestBody {
        match &self.body {
            RequestBody::None => RequestBody::None,
            RequestBody::Form(fields) => RequestBody::Form(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), substitute(v, source_url)))
                    .collect(),
            ),
            RequestBody::Json(template) => RequestBody::Json(substitute_json(template, source_url)),
        }
    }

    /// Build the outbound request for `source_url`.
    pub fn build_request(
        &self,
        client: &reqwest::Client,
        base_headers: &HeaderSet,
        source_url: &str,
    ) -> Result<reqwest::RequestBuilder, HeaderError> {
        let url = self.render_url(source_url);
        let headers = base_headers.merged(&self.headers).to_header_map()?;

        let builder = match self.method {
            HttpMethod::Get => client.get(url),
            HttpMethod::Post => client.post(url),
        }
        .headers(headers);

        Ok(match self.render_body(source_url) {
            RequestBody::None => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Json(value) => builder.json(&value),
        })
    }

    /// Apply the transform and absolutize the media URL.
    pub fn normalize(&self, body: &str) -> Option<ExtractedMedia> {
        let extracted = self.transform.apply(body)?;
        let media_url = self.absolutize(&extracted.media_url)?;
        Some(ExtractedMedia {
            media_url,
            title: extracted.title,
        })
    }

    fn absolutize(&self, url: &str) -> Option<String> {
        let url = url.trim();
        if url.starts_with("http://") || url.starts_with("https://") {
            Some(url.to_string())
        } else if let Some(rest) = url.strip_prefix("//") {
            Some(format!("https://{}", rest))
        } else if url.starts_with('/') {
            self.base_origin
                .as_deref()
                .map(|origin| format!("{}{}", origin.trim_end_matches('/'), url))
        } else {
            None
        }
    }
}

/// Replace both placeholders in one left-to-right pass, so placeholder text
/// inside the substituted URL is never expanded again.
fn fill(template: &str, raw: &str, encoded: &str) -> String {
    let mut out = String::with_capacity(template.len() + raw.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix(RAW_URL_PLACEHOLDER) {
            out.push_str(raw);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(URL_PLACEHOLDER) {
            out.push_str(encoded);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

fn substitute(template: &str, source_url: &str) -> String {
    fill(template, source_url, source_url)
}

fn substitute_json(template: &serde_json::Value, source_url: &str) -> serde_json::Value {
    use serde_json::Value;
    match template {
        Value::String(s) => Value::String(substitute(s, source_url)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| substitute_json(v, source_url))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_json(v, source_url)))
                .collect(),
        ),
        other => other.clone(),
    }
}
