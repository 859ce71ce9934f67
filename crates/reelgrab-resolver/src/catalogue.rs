//! Built-in provider catalogue.
//!
//! Order within a platform is priority order. These endpoints belong to third
//! parties and change without notice; a descriptor that stops matching simply
//! falls through to the next one.

use reelgrab_core::Platform;

use crate::descriptor::{ProviderDescriptor, RequestBody};
use crate::transform::ResponseTransform;

pub const TIKWM: &str = "tikwm";
pub const SSSTIK: &str = "ssstik";
pub const TIKTOK_WEB: &str = "tiktok-web";
pub const IGRAM: &str = "igram";
pub const INSTADOWNLOADER: &str = "instadownloader";

/// JSON API; `data.play` is sometimes a path relative to the tikwm origin.
pub fn tikwm() -> ProviderDescriptor {
    ProviderDescriptor::get(
        TIKWM,
        Platform::TikTok,
        "https://www.tikwm.com/api/?url={url}",
        ResponseTransform::json_pointer("/data/play", Some("/data/title")),
    )
    .with_header("Accept", "application/json")
    .with_header("Referer", "https://www.tikwm.com/")
    .with_base_origin("https://www.tikwm.com")
}

pub fn ssstik() -> ProviderDescriptor {
    ProviderDescriptor::post(
        SSSTIK,
        Platform::TikTok,
        "https://ssstik.io/abc?url=dl",
        RequestBody::Form(vec![
            ("id".to_string(), "{raw_url}".to_string()),
            ("locale".to_string(), "fr".to_string()),
            ("tt".to_string(), "0".to_string()),
        ]),
        ResponseTransform::json_pointer("/url", None),
    )
    .with_header("Origin", "https://ssstik.io")
    .with_header("Referer", "https://ssstik.io/fr")
    .with_base_origin("https://ssstik.io")
}

/// Last resort: the post page itself embeds the play address in its state JSON.
/// This one fetches the caller's URL directly, so it only runs for https
/// tiktok.com sources.
pub fn tiktok_web() -> ProviderDescriptor {
    ProviderDescriptor::get(
        TIKTOK_WEB,
        Platform::TikTok,
        "{raw_url}",
        ResponseTransform::text_pattern("playAddr", Some("desc")),
    )
    .with_header("Referer", "https://www.tiktok.com/")
    .with_source_host("tiktok.com")
}

pub fn igram() -> ProviderDescriptor {
    ProviderDescriptor::get(
        IGRAM,
        Platform::Instagram,
        "https://igram.io/api/ig?url={url}",
        ResponseTransform::json_pointer("/url", Some("/title")),
    )
    .with_header("Accept", "application/json")
    .with_base_origin("https://igram.io")
}

pub fn instadownloader() -> ProviderDescriptor {
    ProviderDescriptor::get(
        INSTADOWNLOADER,
        Platform::Instagram,
        "https://instadownloader.co/api/?url={url}",
        ResponseTransform::json_pointer("/video", Some("/title")),
    )
    .with_header("Accept", "application/json")
}

/// Every built-in descriptor, grouped by platform in priority order.
pub fn builtin() -> Vec<ProviderDescriptor> {
    vec![tikwm(), ssstik(), tiktok_web(), igram(), instadownloader()]
}
