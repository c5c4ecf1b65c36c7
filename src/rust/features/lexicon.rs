use serde::{Deserialize, Serialize};

/// Version of the built-in lexicon. Bump whenever one of the lists changes,
/// since models trained on the old lists will see different feature values.
pub const LEXICON_VERSION: u32 = 1;

const SUSPICIOUS_TLDS: &[&str] = &["xyz", "top", "tk", "ml", "cf", "gq"];

const SUSPICIOUS_WORDS: &[&str] = &[
    "login", "signin", "verify", "update", "secure", "account", "bank", "invoice", "wallet",
];

const SHORTENERS: &[&str] = &[
    "bit.ly",
    "tinyurl.com",
    "t.co",
    "goo.gl",
    "ow.ly",
    "is.gd",
    "buff.ly",
    "adf.ly",
    "cutt.ly",
    "shorturl.at",
];

/// Word and domain lists consulted by the feature extractor.
///
/// Kept apart from the extraction logic so the lists can be versioned and
/// swapped without touching how features are computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexicon {
    pub version: u32,
    /// Top-level domains abused by throwaway phishing sites
    pub suspicious_tlds: Vec<String>,
    /// Words commonly used to lure credential entry
    pub suspicious_words: Vec<String>,
    /// Known link-shortening services
    pub shorteners: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            version: LEXICON_VERSION,
            suspicious_tlds: owned(SUSPICIOUS_TLDS),
            suspicious_words: owned(SUSPICIOUS_WORDS),
            shorteners: owned(SHORTENERS),
        }
    }
}

impl Lexicon {
    /// True if `host` ends with one of the suspicious TLDs.
    ///
    /// Both the dotted (`.tk`) and the bare (`tk`) suffix count.
    pub fn has_suspicious_tld(&self, host: &str) -> bool {
        self.suspicious_tlds
            .iter()
            .any(|tld| host.ends_with(&format!(".{}", tld)) || host.ends_with(tld.as_str()))
    }

    /// Number of distinct suspicious words present in `text` (case-insensitive).
    pub fn suspicious_word_count(&self, text: &str) -> usize {
        let lowered = text.to_lowercase();
        self.suspicious_words
            .iter()
            .filter(|word| lowered.contains(word.as_str()))
            .count()
    }

    /// True if `host` contains a known shortener domain.
    pub fn is_shortener(&self, host: &str) -> bool {
        self.shorteners.iter().any(|s| host.contains(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lexicon_version() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.version, LEXICON_VERSION);
        assert_eq!(lexicon.suspicious_words.len(), 9);
        assert_eq!(lexicon.shorteners.len(), 10);
    }

    #[test]
    fn test_suspicious_tld_bare_suffix() {
        let lexicon = Lexicon::default();
        assert!(lexicon.has_suspicious_tld("free-prizes.tk"));
        assert!(lexicon.has_suspicious_tld("xyz"));
        // Bare suffix match also catches hosts that merely end in the letters
        assert!(lexicon.has_suspicious_tld("html"));
        assert!(!lexicon.has_suspicious_tld("example.com"));
    }

    #[test]
    fn test_words_counted_once_each() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.suspicious_word_count("LOGIN/login/Secure-Account"), 3);
        assert_eq!(lexicon.suspicious_word_count("https://example.com"), 0);
    }

    #[test]
    fn test_shortener_substring() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_shortener("bit.ly"));
        assert!(lexicon.is_shortener("microsoft.com")); // contains "t.co"
        assert!(!lexicon.is_shortener("example.org"));
    }

    #[test]
    fn test_lexicon_roundtrips_through_json() {
        let lexicon = Lexicon::default();
        let json = serde_json::to_string(&lexicon).unwrap();
        let parsed: Lexicon = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, lexicon);
    }
}
