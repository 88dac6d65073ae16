//! Script-based language detection for the translation bridge.
//!
//! The completion endpoint works best in English, so Kazakh input is bridged
//! kk -> en before the request and the reply en -> kk after. Detection is by
//! script: Kazakh-specific Cyrillic letters first, then general Cyrillic,
//! then Han, then Latin.

use std::sync::OnceLock;

use regex::Regex;

/// Detected input language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    Kazakh,
    Russian,
    Chinese,
    English,
}

impl Lang {
    /// Two-letter code used by the translation endpoint.
    pub fn code(&self) -> &'static str {
        match self {
            Lang::Kazakh => "kk",
            Lang::Russian => "ru",
            Lang::Chinese => "zh",
            Lang::English => "en",
        }
    }
}

fn kazakh_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("(?i)[әғқңөұүһі]").expect("valid regex"))
}

fn cyrillic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("(?i)[а-яё]").expect("valid regex"))
}

fn han_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("[一-鿿]").expect("valid regex"))
}

/// Detect the dominant script of `text`. Defaults to English.
pub fn detect(text: &str) -> Lang {
    if kazakh_re().is_match(text) {
        return Lang::Kazakh;
    }
    if cyrillic_re().is_match(text) {
        return Lang::Russian;
    }
    if han_re().is_match(text) {
        return Lang::Chinese;
    }
    Lang::English
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kazakh() {
        assert_eq!(detect("Ертең жаңбыр жауады"), Lang::Kazakh);
        assert_eq!(detect("Қолшатырды ұмытпаңыз"), Lang::Kazakh);
    }

    #[test]
    fn test_detect_russian() {
        assert_eq!(detect("завтра будет дождь"), Lang::Russian);
    }

    #[test]
    fn test_detect_chinese() {
        assert_eq!(detect("明天下雨"), Lang::Chinese);
    }

    #[test]
    fn test_detect_english_and_default() {
        assert_eq!(detect("it will rain tomorrow"), Lang::English);
        assert_eq!(detect("1234 !?"), Lang::English);
    }

    #[test]
    fn test_codes() {
        assert_eq!(Lang::Kazakh.code(), "kk");
        assert_eq!(Lang::English.code(), "en");
    }
}
