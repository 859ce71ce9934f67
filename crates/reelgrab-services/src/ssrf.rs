//! Outbound URL checks for media acquisition.
//!
//! Resolved media URLs come from third-party responses, so they are treated as
//! untrusted: loopback, private, link-local and internal hostnames are refused,
//! and hostnames are resolved so a public name pointing at a private address
//! is refused too.

use std::net::{IpAddr, Ipv6Addr};

use tokio::net::lookup_host;

/// Validate `url` before the server fetches it.
///
/// With `allow_private_ips` only the scheme and host presence are checked.
pub async fn validate_url_for_ssrf(
    url: &reqwest::Url,
    allow_private_ips: bool,
) -> Result<(), String> {
    check_host(url, allow_private_ips)?;
    if allow_private_ips {
        return Ok(());
    }

    let host = bare_host(url).ok_or_else(|| "URL must have a host".to_string())?;
    if host.parse::<IpAddr>().is_ok() {
        return Ok(());
    }

    let port = url.port_or_known_default().unwrap_or(443);
    match lookup_host((host, port)).await {
        Ok(addrs) => {
            for addr in addrs {
                if is_private_ip(&addr.ip()) {
                    return Err(format!(
                        "Hostname resolves to private/internal IP address: {}",
                        addr.ip()
                    ));
                }
            }
        }
        Err(e) => {
            // The request itself will fail on an unresolvable host.
            tracing::warn!(host = %host, error = %e, "Failed to resolve hostname for SSRF validation");
        }
    }

    Ok(())
}

/// Checks that need no DNS: scheme, literal IPs and internal hostnames.
pub fn check_host(url: &reqwest::Url, allow_private_ips: bool) -> Result<(), String> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err("URL must start with http:// or https://".to_string());
    }

    let host = bare_host(url)
        .ok_or_else(|| "URL must have a host".to_string())?
        .to_lowercase();
    if allow_private_ips {
        return Ok(());
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err("Private/internal IP addresses are not allowed".to_string());
        }
        return Ok(());
    }

    if host == "localhost"
        || host.ends_with(".localhost")
        || host.ends_with(".local")
        || host.contains(".internal")
        || host.contains(".corp")
    {
        return Err("Localhost and internal hostnames are not allowed".to_string());
    }

    Ok(())
}

/// Redirect policy that applies `check_host` to every hop.
pub fn redirect_policy(allow_private_ips: bool) -> reqwest::redirect::Policy {
    reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= 10 {
            return attempt.error("too many redirects");
        }
        match check_host(attempt.url(), allow_private_ips) {
            Ok(()) => attempt.follow(),
            Err(reason) => attempt.error(reason),
        }
    })
}

fn bare_host(url: &reqwest::Url) -> Option<&str> {
    url.host_str()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']'))
        .filter(|h| !h.is_empty())
}

/// Loopback, RFC 1918, link-local, CGNAT, multicast, broadcast and the
/// IPv6 equivalents, including IPv4-mapped IPv6 addresses.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            octets[0] == 10
                || (octets[0] == 172 && (16..=31).contains(&octets[1]))
                || (octets[0] == 192 && octets[1] == 168)
                || octets[0] == 127
                || (octets[0] == 169 && octets[1] == 254)
                || (octets[0] == 100 && (64..=127).contains(&octets[1]))
                || (224..=239).contains(&octets[0])
                || octets[0] == 0
                || ipv4.is_broadcast()
        }
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(mapped));
            }
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                || ipv6.is_multicast()
                || is_ipv6_link_local(ipv6)
                || is_ipv6_unique_local(ipv6)
        }
    }
}

/// fe80::/10
fn is_ipv6_link_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xffc0 == 0xfe80
}

/// fc00::/7
fn is_ipv6_unique_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xfe00 == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn url(s: &str) -> reqwest::Url {
        reqwest::Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_rejects_loopback_and_private_literals() {
        for target in [
            "http://127.0.0.1:8080/secret",
            "http://localhost/v.mp4",
            "http://[::1]/v.mp4",
            "http://[::ffff:127.0.0.1]/v.mp4",
            "http://10.0.0.5/x?ref=tiktok.com",
            "http://172.16.0.1/v.mp4",
            "http://192.168.1.1/v.mp4",
            "http://169.254.169.254/latest/meta-data/",
            "http://0.0.0.0/v.mp4",
        ] {
            assert!(
                validate_url_for_ssrf(&url(target), false).await.is_err(),
                "{target} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_rejects_internal_hostnames() {
        for target in [
            "http://media.service.local/v.mp4",
            "http://cache.internal/v.mp4",
            "http://files.corp/v.mp4",
        ] {
            assert!(validate_url_for_ssrf(&url(target), false).await.is_err());
        }
    }

    #[tokio::test]
    async fn test_rejects_non_http_schemes() {
        assert!(validate_url_for_ssrf(&url("file:///etc/passwd"), true)
            .await
            .is_err());
        assert!(validate_url_for_ssrf(&url("ftp://example.com/v.mp4"), false)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_public_literal_accepted() {
        assert!(validate_url_for_ssrf(&url("https://93.184.215.14/v.mp4"), false)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_private_allowed_when_enabled() {
        assert!(validate_url_for_ssrf(&url("http://127.0.0.1:9/v.mp4"), true)
            .await
            .is_ok());
    }

    #[test]
    fn test_is_private_ip() {
        assert!(is_private_ip(&IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))));
        assert!(is_private_ip(&IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))));
        assert!(is_private_ip(&IpAddr::V4(Ipv4Addr::new(100, 64, 0, 1))));
        assert!(is_private_ip(&IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert!(is_private_ip(&IpAddr::V6(Ipv6Addr::UNSPECIFIED)));
        assert!(is_private_ip(&"fd00::1".parse().unwrap()));
        assert!(is_private_ip(&"fe80::1".parse().unwrap()));

        assert!(!is_private_ip(&IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))));
        assert!(!is_private_ip(&IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1))));
        assert!(!is_private_ip(&"2606:4700::1111".parse().unwrap()));
    }
}
