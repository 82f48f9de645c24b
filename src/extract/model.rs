//! Model-backed slot extraction.
//!
//! Delegates to the completion client with a strict-JSON extraction
//! prompt. Parse or call failures degrade to an empty `Other` result;
//! nothing escapes this boundary.

use async_trait::async_trait;
use serde::Deserialize;

use super::{is_valid_name, is_valid_phone, Extraction, Extractor, Intent};
use crate::llm::{ChatMessage, CompletionClient};

pub struct ModelExtractor {
    completion: CompletionClient,
}

#[derive(Deserialize)]
struct ExtractionPayload {
    name: Option<String>,
    #[serde(rename = "phoneNumber")]
    phone_number: Option<String>,
    intent: Option<String>,
}

impl ModelExtractor {
    pub fn new(completion: CompletionClient) -> Self {
        Self { completion }
    }

    fn extraction_prompt(message: &str) -> String {
        format!(
            "Analyze the following user message effectively to extract Name and Phone Number.\n\
             \n\
             User Message: \"{message}\"\n\
             \n\
             Rules:\n\
             1. Extract the **Name** if provided. It should be a proper name (e.g., \"John Doe\", \"Rahul\"). Ignore common words or refusal phrases.\n\
             2. Extract the **Phone Number** if provided. It must be at least 10 digits.\n\
             3. Determine the **Intent**:\n\
                - 'provide_data': if the user is providing name or phone number.\n\
                - 'refuse': if the user explicitly refuses to provide information (e.g., \"I will not give my number\").\n\
                - 'other': if the user says something else unrelated.\n\
             \n\
             Respond ONLY in JSON format:\n\
             {{\n\
                 \"name\": \"extracted name or null\",\n\
                 \"phoneNumber\": \"extracted phone or null\",\n\
                 \"intent\": \"provide_data | refuse | other\"\n\
             }}",
        )
    }

    fn parse_response(raw: &str) -> Option<Extraction> {
        let cleaned = raw.replace("```json", "").replace("```", "");
        let payload: ExtractionPayload = serde_json::from_str(cleaned.trim()).ok()?;

        let intent = match payload.intent.as_deref() {
            Some("provide_data") => Intent::ProvideData,
            Some("refuse") => Intent::Refuse,
            _ => Intent::Other,
        };

        Some(Extraction {
            name: payload
                .name
                .filter(|n| !n.eq_ignore_ascii_case("null"))
                .filter(|n| is_valid_name(n)),
            phone_number: payload
                .phone_number
                .filter(|p| !p.eq_ignore_ascii_case("null"))
                .filter(|p| is_valid_phone(p)),
            intent,
        })
    }
}

#[async_trait]
impl Extractor for ModelExtractor {
    async fn extract(&self, text: &str) -> Extraction {
        let prompt = Self::extraction_prompt(text);
        let messages = vec![ChatMessage::system(prompt)];

        match self.completion.invoke(messages).await {
            Ok(raw) => Self::parse_response(&raw).unwrap_or_else(|| {
                tracing::warn!("Extraction response was not valid JSON, treating as 'other'");
                Extraction::nothing()
            }),
            Err(err) => {
                tracing::warn!("Extraction call failed, treating as 'other': {}", err);
                Extraction::nothing()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let raw = r#"{"name": "John Doe", "phoneNumber": "9876543210", "intent": "provide_data"}"#;
        let result = ModelExtractor::parse_response(raw).expect("parse");
        assert_eq!(result.name.as_deref(), Some("John Doe"));
        assert_eq!(result.phone_number.as_deref(), Some("9876543210"));
        assert_eq!(result.intent, Intent::ProvideData);
    }

    #[test]
    fn strips_code_fences() {
        let raw = "```json\n{\"name\": \"Rahul\", \"phoneNumber\": null, \"intent\": \"provide_data\"}\n```";
        let result = ModelExtractor::parse_response(raw).expect("parse");
        assert_eq!(result.name.as_deref(), Some("Rahul"));
        assert!(result.phone_number.is_none());
    }

    #[test]
    fn refusal_intent_survives_parsing() {
        let raw = r#"{"name": null, "phoneNumber": null, "intent": "refuse"}"#;
        let result = ModelExtractor::parse_response(raw).expect("parse");
        assert_eq!(result.intent, Intent::Refuse);
        assert!(result.name.is_none());
    }

    #[test]
    fn short_phone_from_model_is_dropped() {
        let raw = r#"{"name": "Rahul", "phoneNumber": "98765", "intent": "provide_data"}"#;
        let result = ModelExtractor::parse_response(raw).expect("parse");
        assert!(result.phone_number.is_none());
    }

    #[test]
    fn literal_null_strings_are_dropped() {
        let raw = r#"{"name": "null", "phoneNumber": "null", "intent": "other"}"#;
        let result = ModelExtractor::parse_response(raw).expect("parse");
        assert!(result.name.is_none());
        assert!(result.phone_number.is_none());
    }

    #[test]
    fn garbage_fails_soft() {
        assert!(ModelExtractor::parse_response("not json at all").is_none());
    }
}
