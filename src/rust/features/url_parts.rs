use lazy_static::lazy_static;
use regex::Regex;
use std::net::Ipv6Addr;

lazy_static! {
    /// Generic URI split (RFC 3986, Appendix B) with a stricter scheme rule:
    /// a scheme must start with a letter and only use `[A-Za-z0-9+.-]`.
    static ref URL_SPLIT: Regex = Regex::new(
        r"(?s)^(?:([A-Za-z][A-Za-z0-9+.\-]*):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$"
    ).expect("URL split pattern is valid");
}

/// Schemes whose last path segment may carry `;params`.
const SCHEMES_WITH_PARAMS: &[&str] = &[
    "", "ftp", "hdl", "prospero", "http", "imap", "https", "shttp", "rtsp",
    "rtsps", "rtspu", "sip", "sips", "mms", "sftp", "tel",
];

/// The components of a URL that feature extraction looks at.
///
/// Every component is an empty string when it is absent or when the URL could
/// not be split at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    /// Lower-cased scheme, e.g. `https`
    pub scheme: String,
    /// The full authority exactly as written: `[userinfo@]host[:port]`
    pub netloc: String,
    /// Lower-cased host name without userinfo or port
    pub host: String,
    /// Path without query, fragment or `;params`
    pub path: String,
    /// Raw query string without the leading `?`
    pub query: String,
}

impl UrlParts {
    /// Splits `url` into its components.
    ///
    /// This never fails: anything that cannot be split yields empty parts.
    pub fn parse(url: &str) -> Self {
        Self::try_parse(url).unwrap_or_default()
    }

    fn try_parse(url: &str) -> Option<Self> {
        let cleaned: String = url
            .trim_start_matches(|c: char| c <= ' ')
            .chars()
            .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
            .collect();

        let caps = URL_SPLIT.captures(&cleaned)?;
        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");

        let scheme = group(1).to_ascii_lowercase();
        let netloc = group(2).to_string();
        let mut path = group(3);
        let query = group(4).to_string();

        // An unbalanced bracket in the authority is a malformed IPv6 literal.
        if netloc.contains('[') != netloc.contains(']') {
            return None;
        }

        if SCHEMES_WITH_PARAMS.contains(&scheme.as_str()) {
            path = strip_params(path);
        }

        let host = host_from_netloc(&netloc)?;

        Some(Self {
            scheme,
            netloc,
            host,
            path: path.to_string(),
            query,
        })
    }
}

/// Drops `;params` from the last path segment.
fn strip_params(path: &str) -> &str {
    let search_from = path.rfind('/').unwrap_or(0);
    match path[search_from..].find(';') {
        Some(offset) => &path[..search_from + offset],
        None => path,
    }
}

/// Extracts the lower-cased host name from an authority component.
///
/// Returns `None` when a bracketed host is not a valid IPv6 literal.
fn host_from_netloc(netloc: &str) -> Option<String> {
    let host_info = netloc.rsplit_once('@').map(|(_, h)| h).unwrap_or(netloc);

    let host = match (host_info.find('['), host_info.find(']')) {
        (Some(open), Some(_)) => {
            let inner = &host_info[open + 1..];
            let inner = inner.split(']').next().unwrap_or("");
            if !is_valid_bracketed_host(inner) {
                return None;
            }
            inner
        }
        _ => host_info.split(':').next().unwrap_or(""),
    };

    Some(host.to_lowercase())
}

fn is_valid_bracketed_host(host: &str) -> bool {
    if let Some(future) = host.strip_prefix('v').or_else(|| host.strip_prefix('V')) {
        // IPvFuture: v<hex>.<unreserved / sub-delims / ":">
        return match future.split_once('.') {
            Some((version, rest)) => {
                !version.is_empty()
                    && version.chars().all(|c| c.is_ascii_hexdigit())
                    && !rest.is_empty()
            }
            None => false,
        };
    }
    let address = host.split('%').next().unwrap_or("");
    address.parse::<Ipv6Addr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url() {
        let parts = UrlParts::parse("HTTPS://User:pw@Sub.Example.COM:8443/a/b;x=1?q=1&r=2#frag");
        assert_eq!(parts.scheme, "https");
        assert_eq!(parts.netloc, "User:pw@Sub.Example.COM:8443");
        assert_eq!(parts.host, "sub.example.com");
        assert_eq!(parts.path, "/a/b");
        assert_eq!(parts.query, "q=1&r=2");
    }

    #[test]
    fn test_no_scheme() {
        let parts = UrlParts::parse("example.com/login");
        assert_eq!(parts.scheme, "");
        assert_eq!(parts.netloc, "");
        assert_eq!(parts.host, "");
        assert_eq!(parts.path, "example.com/login");
    }

    #[test]
    fn test_ipv6_host() {
        let parts = UrlParts::parse("http://[::1]:8080/x");
        assert_eq!(parts.host, "::1");
        assert_eq!(parts.netloc, "[::1]:8080");
    }

    #[test]
    fn test_malformed_ipv6_yields_empty_parts() {
        assert_eq!(UrlParts::parse("http://[::1/x"), UrlParts::default());
        assert_eq!(UrlParts::parse("http://[not-an-ip]/x"), UrlParts::default());
    }

    #[test]
    fn test_params_only_stripped_from_last_segment() {
        assert_eq!(UrlParts::parse("http://a.com/p;v=1/q").path, "/p;v=1/q");
        assert_eq!(UrlParts::parse("http://a.com/p/q;v=1").path, "/p/q");
        assert_eq!(UrlParts::parse("mailto:x;y").path, "x;y");
    }

    #[test]
    fn test_control_characters_removed() {
        let parts = UrlParts::parse("  http://exa\tmple.com/\npath");
        assert_eq!(parts.host, "example.com");
        assert_eq!(parts.path, "/path");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(UrlParts::parse(""), UrlParts::default());
    }
}
