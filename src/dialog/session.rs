use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::extract::{is_valid_name, is_valid_phone, Extraction};

/// Qualification-script progression. Stages only ever advance in this
/// order; the only way back is a full reset onto a fresh session key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Greeting,
    DataCollection,
    WaitingForData,
    Identification,
    OpenChat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    New,
    Existing,
}

/// Collected visitor identity. Fields fill monotonically: once a field
/// holds a valid value it is never overwritten until reset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserData {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub user_type: Option<UserType>,
}

impl UserData {
    pub fn has_valid_name(&self) -> bool {
        self.name.as_deref().is_some_and(is_valid_name)
    }

    pub fn has_valid_phone(&self) -> bool {
        self.phone_number.as_deref().is_some_and(is_valid_phone)
    }

    pub fn is_complete(&self) -> bool {
        self.has_valid_name() && self.has_valid_phone()
    }

    /// Merges extracted fields in, keeping any already-valid field.
    pub fn merge(&mut self, extraction: &Extraction) {
        if !self.has_valid_name() {
            if let Some(name) = &extraction.name {
                self.name = Some(name.clone());
            }
        }
        if !self.has_valid_phone() {
            if let Some(phone) = &extraction.phone_number {
                self.phone_number = Some(phone.clone());
            }
        }
    }
}

/// One transcript entry; doubles as LLM conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            options: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            options: None,
        }
    }

    pub fn assistant_with_options(content: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            options: Some(options),
        }
    }
}

/// One visitor's continuous conversation.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub stage: Stage,
    pub user_data: UserData,
    /// Append-only transcript.
    pub messages: Vec<ChatTurn>,
    pub last_activity: Instant,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stage: Stage::Greeting,
            user_data: UserData::default(),
            messages: Vec::new(),
            last_activity: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatTurn::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatTurn::assistant(content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Intent;

    fn extraction(name: Option<&str>, phone: Option<&str>) -> Extraction {
        Extraction {
            name: name.map(String::from),
            phone_number: phone.map(String::from),
            intent: Intent::ProvideData,
        }
    }

    #[test]
    fn stages_order_forward() {
        assert!(Stage::Greeting < Stage::DataCollection);
        assert!(Stage::DataCollection < Stage::WaitingForData);
        assert!(Stage::WaitingForData < Stage::Identification);
        assert!(Stage::Identification < Stage::OpenChat);
    }

    #[test]
    fn merge_fills_missing_fields() {
        let mut data = UserData::default();
        data.merge(&extraction(Some("Rahul"), None));
        assert_eq!(data.name.as_deref(), Some("Rahul"));
        assert!(!data.is_complete());

        data.merge(&extraction(None, Some("9876543210")));
        assert!(data.is_complete());
    }

    #[test]
    fn merge_never_overwrites_a_valid_field() {
        let mut data = UserData::default();
        data.merge(&extraction(Some("Rahul"), Some("9876543210")));
        data.merge(&extraction(Some("Someone Else"), Some("1112223334")));

        assert_eq!(data.name.as_deref(), Some("Rahul"));
        assert_eq!(data.phone_number.as_deref(), Some("9876543210"));
    }

    #[test]
    fn invalid_stored_name_can_be_replaced() {
        let mut data = UserData {
            name: Some("Jo".to_string()),
            ..UserData::default()
        };
        assert!(!data.has_valid_name());

        data.merge(&extraction(Some("John Doe"), None));
        assert_eq!(data.name.as_deref(), Some("John Doe"));
    }
}
