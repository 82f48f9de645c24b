//! Slot extraction: pulls a visitor's name and phone number out of free
//! text during the qualification script.
//!
//! Two strategies exist behind the same trait — a deterministic pattern
//! extractor and a model-backed one. A deployment runs exactly one,
//! selected by `extractor` in config.

mod model;
mod pattern;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use model::ModelExtractor;
pub use pattern::PatternExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ProvideData,
    Refuse,
    Other,
}

/// What one extraction pass found. Ephemeral, produced once per
/// waiting-for-data turn.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub intent: Intent,
}

impl Extraction {
    pub fn nothing() -> Self {
        Self {
            name: None,
            phone_number: None,
            intent: Intent::Other,
        }
    }
}

/// Extraction never errors past this boundary: strategies degrade to an
/// empty `Other` result instead.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, text: &str) -> Extraction;
}

/// A name is valid with more than two alphabetic characters.
pub fn is_valid_name(name: &str) -> bool {
    name.chars().filter(|c| c.is_alphabetic()).count() > 2
}

/// A phone number is valid with at least ten digits.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.chars().filter(|c| c.is_ascii_digit()).count() >= 10
}

/// Digits present anywhere in the input; drives the "number too short"
/// corrective prompt.
pub fn count_digits(text: &str) -> usize {
    text.chars().filter(|c| c.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_needs_more_than_two_letters() {
        assert!(is_valid_name("Raj"));
        assert!(is_valid_name("John Doe"));
        assert!(!is_valid_name("Jo"));
        assert!(!is_valid_name("12"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn phone_needs_at_least_ten_digits() {
        assert!(is_valid_phone("9876543210"));
        assert!(is_valid_phone("+91 98765 43210"));
        assert!(!is_valid_phone("98765"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn digit_counting_ignores_letters() {
        assert_eq!(count_digits("call me at 98765"), 5);
        assert_eq!(count_digits("no numbers here"), 0);
    }
}
