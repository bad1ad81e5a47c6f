//! Share codes and share links.
//!
//! A share code names one classroom's row in the remote store and doubles
//! as the sync session key. Codes are meant to be read aloud and typed by
//! hand (`푸른하늘-1234`), so they are short and not guaranteed unique.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Query parameter carrying the share code in a share link.
pub const LINK_PARAM: &str = "class";

const ADJECTIVES: &[&str] = &[
    "밝은", "기쁜", "행복한", "푸른", "빛나는", "함께하는", "꿈꾸는", "싱그러운",
];
const NOUNS: &[&str] = &["새싹", "열매", "나무", "하늘", "별빛", "구름", "햇살", "바다"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShareCodeError {
    #[error("Share code is empty")]
    Empty,

    #[error("Share code '{0}' contains a reserved character")]
    ReservedCharacter(String),
}

/// A validated, trimmed share code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShareCode(String);

impl ShareCode {
    pub fn parse(raw: &str) -> Result<Self, ShareCodeError> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(ShareCodeError::Empty);
        }
        if code.contains(['/', '?', '&', '#']) {
            return Err(ShareCodeError::ReservedCharacter(code.to_string()));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShareCode {
    type Err = ShareCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShareCode {
    type Error = ShareCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShareCode> for String {
    fn from(code: ShareCode) -> Self {
        code.0
    }
}

/// Source of fresh share codes.
pub trait ShareCodeGenerator {
    fn generate(&self) -> ShareCode;
}

/// Generates `<adjective><noun>-<4 digits>` codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCodeGenerator;

impl ShareCodeGenerator for WordCodeGenerator {
    fn generate(&self) -> ShareCode {
        let mut rng = rand::rng();
        let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("밝은");
        let noun = NOUNS.choose(&mut rng).copied().unwrap_or("새싹");
        let number: u16 = rng.random_range(1000..=9999);
        ShareCode(format!("{}{}-{}", adjective, noun, number))
    }
}

/// Builds a link that opens the class identified by `code`.
pub fn share_link(base_url: &str, code: &ShareCode) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}{}={}",
        base_url,
        separator,
        LINK_PARAM,
        urlencoding::encode(code.as_str())
    )
}

/// Extracts the share code from a share link, if it carries one.
pub fn code_from_link(url: &str) -> Option<ShareCode> {
    let query = url.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or(query);

    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key != LINK_PARAM {
            return None;
        }
        let spaced = value.replace('+', " ");
        let decoded = urlencoding::decode(&spaced).ok()?;
        ShareCode::parse(&decoded).ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let code = ShareCode::parse("  푸른하늘-1234 ").unwrap();
        assert_eq!(code.as_str(), "푸른하늘-1234");
    }

    #[test]
    fn test_parse_rejects_empty_and_reserved() {
        assert_eq!(ShareCode::parse("   "), Err(ShareCodeError::Empty));
        assert!(matches!(
            ShareCode::parse("a/b"),
            Err(ShareCodeError::ReservedCharacter(_))
        ));
        assert!(ShareCode::parse("a?b").is_err());
    }

    #[test]
    fn test_generated_code_shape() {
        let code = WordCodeGenerator.generate();
        let (words, digits) = code.as_str().rsplit_once('-').unwrap();
        assert!(ADJECTIVES.iter().any(|a| words.starts_with(a)));
        assert!(NOUNS.iter().any(|n| words.ends_with(n)));
        let number: u16 = digits.parse().unwrap();
        assert!((1000..=9999).contains(&number));
    }

    #[test]
    fn test_share_link_roundtrip() {
        let code = ShareCode::parse("빛나는별빛-4821").unwrap();
        let link = share_link("https://dreamclass.app/", &code);
        assert!(link.starts_with("https://dreamclass.app/?class="));
        assert!(link.is_ascii());
        assert_eq!(code_from_link(&link), Some(code));
    }

    #[test]
    fn test_share_link_appends_to_existing_query() {
        let code = ShareCode::parse("abc-1000").unwrap();
        let link = share_link("https://dreamclass.app/?lang=ko", &code);
        assert_eq!(link, "https://dreamclass.app/?lang=ko&class=abc-1000");
    }

    #[test]
    fn test_code_from_link_ignores_other_params() {
        assert_eq!(
            code_from_link("https://x.test/?view=calendar&class=abc-1000#top"),
            Some(ShareCode::parse("abc-1000").unwrap())
        );
        assert_eq!(code_from_link("https://x.test/?view=calendar"), None);
        assert_eq!(code_from_link("https://x.test/"), None);
        assert_eq!(code_from_link("https://x.test/?class="), None);
    }

    #[test]
    fn test_code_from_link_decodes_plus_and_percent() {
        assert_eq!(
            code_from_link("https://x.test/?class=%ED%91%B8%EB%A5%B8%ED%95%98%EB%8A%98-1234"),
            Some(ShareCode::parse("푸른하늘-1234").unwrap())
        );
        assert_eq!(
            code_from_link("https://x.test/?class=my+class-1000"),
            Some(ShareCode::parse("my class-1000").unwrap())
        );
    }

    #[test]
    fn test_share_code_serde_validates() {
        let code: ShareCode = serde_json::from_str("\"abc-1000\"").unwrap();
        assert_eq!(code.as_str(), "abc-1000");
        assert!(serde_json::from_str::<ShareCode>("\"  \"").is_err());
    }
}
