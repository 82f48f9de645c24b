//! Deterministic slot extraction.
//!
//! Phone: first run of ten or more consecutive digits. Name: whatever
//! text remains once the phone, punctuation and filler words are removed.
//! Intent is never classified as `Refuse` here; refusal handling needs
//! the model extractor.

use async_trait::async_trait;
use regex::Regex;

use super::{is_valid_name, is_valid_phone, Extraction, Extractor, Intent};

/// Filler vocabulary that must not be mistaken for a name. Keeps generic
/// text like "Hello there" or "I will not share my number" from producing
/// a false positive.
const FILLER_WORDS: &[&str] = &[
    "hi", "hello", "hey", "there", "good", "morning", "afternoon", "evening", "thanks", "thank",
    "you", "please", "my", "name", "is", "and", "the", "a", "an", "i", "am", "this", "it", "its",
    "number", "phone", "mobile", "contact", "no", "yes", "ok", "okay", "sure", "will", "not",
    "wont", "dont", "can", "cant", "share", "give", "provide", "details", "here", "call", "me",
    "at", "on",
];

pub struct PatternExtractor {
    phone_re: Regex,
}

impl PatternExtractor {
    pub fn new() -> Self {
        Self {
            phone_re: Regex::new(r"\d{10,}").expect("phone pattern is valid"),
        }
    }

    fn extract_phone(&self, text: &str) -> Option<String> {
        self.phone_re.find(text).map(|m| m.as_str().to_string())
    }

    fn extract_name(&self, text: &str) -> Option<String> {
        let without_phone = self.phone_re.replace_all(text, " ");

        let cleaned: String = without_phone
            .chars()
            .map(|c| if c.is_alphabetic() { c } else { ' ' })
            .collect();

        let words: Vec<&str> = cleaned
            .split_whitespace()
            .filter(|word| !FILLER_WORDS.contains(&word.to_lowercase().as_str()))
            .collect();

        if words.is_empty() {
            return None;
        }

        let candidate = words.join(" ");
        is_valid_name(&candidate).then_some(candidate)
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for PatternExtractor {
    async fn extract(&self, text: &str) -> Extraction {
        let phone_number = self.extract_phone(text).filter(|p| is_valid_phone(p));
        let name = self.extract_name(text);

        let intent = if name.is_some() || phone_number.is_some() {
            Intent::ProvideData
        } else {
            Intent::Other
        };

        Extraction {
            name,
            phone_number,
            intent,
        }
    }
}
