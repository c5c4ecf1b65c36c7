use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use super::lexicon::Lexicon;
use super::map::FeatureMap;
use super::url_parts::UrlParts;
use super::utils::{flag, shannon_entropy};

/// Names of every feature the extractor produces, in output order.
pub const FEATURE_NAMES: &[&str] = &[
    "url_length",
    "num_dots",
    "num_hyphens",
    "num_digits",
    "https",
    "domain_length",
    "has_subdomain",
    "tld_length",
    "has_at_symbol",
    "has_port",
    "num_query_params",
    "has_ip",
    "special_char_count",
    "suspicious_tld",
    "path_length",
    "path_depth",
    "hyphen_in_domain",
    "userinfo_in_netloc",
    "suspicious_word_count",
    "is_shortener",
    "host_entropy",
];

const SPECIAL_CHARS: &[char] = &['@', '?', '=', '&', '%', '$'];

lazy_static! {
    static ref DOTTED_QUAD: Regex =
        Regex::new(r"^\d{1,3}(?:\.\d{1,3}){3}$").expect("IPv4 pattern is valid");
    static ref DEFAULT_EXTRACTOR: FeatureExtractor = FeatureExtractor::default();
}

/// Derives lexical and structural features from a URL string.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    lexicon: Lexicon,
}

impl FeatureExtractor {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Computes every feature in [`FEATURE_NAMES`] for `url`.
    ///
    /// Never fails: a URL that cannot be split is treated as having empty
    /// components, so structural features take their absent defaults.
    pub fn extract(&self, url: &str) -> FeatureMap {
        let parts = UrlParts::parse(url);
        let host = parts.host.as_str();
        let netloc = parts.netloc.as_str();
        let path = parts.path.as_str();

        let count = |s: &str, c: char| s.chars().filter(|&x| x == c).count() as f64;

        let mut feats = FeatureMap::with_capacity(FEATURE_NAMES.len());
        feats.insert("url_length", url.chars().count() as f64);
        feats.insert("num_dots", count(url, '.'));
        feats.insert("num_hyphens", count(url, '-'));
        feats.insert(
            "num_digits",
            url.chars().filter(|c| c.is_ascii_digit()).count() as f64,
        );
        feats.insert("https", flag(parts.scheme == "https"));

        feats.insert("domain_length", host.chars().count() as f64);
        feats.insert("has_subdomain", flag(count(host, '.') >= 2.0));
        feats.insert("tld_length", tld_length(host) as f64);
        feats.insert("has_at_symbol", flag(url.contains('@')));
        feats.insert(
            "has_port",
            flag(netloc.contains(':') && !netloc.ends_with(':')),
        );
        feats.insert("num_query_params", count_query_keys(&parts.query) as f64);
        feats.insert("has_ip", flag(DOTTED_QUAD.is_match(host)));
        feats.insert(
            "special_char_count",
            url.chars().filter(|c| SPECIAL_CHARS.contains(c)).count() as f64,
        );
        feats.insert("suspicious_tld", flag(self.lexicon.has_suspicious_tld(host)));

        feats.insert("path_length", path.chars().count() as f64);
        feats.insert("path_depth", count(path, '/'));
        feats.insert("hyphen_in_domain", flag(host.contains('-')));
        feats.insert("userinfo_in_netloc", flag(netloc.contains('@')));

        feats.insert(
            "suspicious_word_count",
            self.lexicon.suspicious_word_count(url) as f64,
        );
        feats.insert("is_shortener", flag(self.lexicon.is_shortener(host)));
        feats.insert("host_entropy", shannon_entropy(host));

        feats
    }
}

/// Extracts features with the built-in lexicon.
pub fn extract(url: &str) -> FeatureMap {
    DEFAULT_EXTRACTOR.extract(url)
}

fn tld_length(host: &str) -> usize {
    match host.rsplit_once('.') {
        Some((_, tld)) => tld.chars().count(),
        None => 0,
    }
}

/// Counts distinct query keys that carry a non-empty value.
///
/// Pairs are split on `&`; keys and values are percent-decoded with `+` as
/// space. A pair without `=` or with an empty value is ignored.
fn count_query_keys(query: &str) -> usize {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, _)| key.into_owned())
        .collect::<HashSet<_>>()
        .len()
}
