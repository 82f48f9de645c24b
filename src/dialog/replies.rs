//! The fixed qualification-script texts, parameterised by institution.
//!
//! Corrective prompts are deterministic in `(user_data, digit_count)`:
//! same inputs, same message, every time.

use crate::core::config::InstitutionConfig;

pub const OPTION_MENU: [&str; 5] = [
    "Explore Courses",
    "Apply for Admission",
    "Access LMS / Student Login",
    "Talk to a counsellor",
    "Ask a Question",
];

#[derive(Clone)]
pub struct ScriptedReplies {
    institution: String,
}

impl ScriptedReplies {
    pub fn new(institution: &InstitutionConfig) -> Self {
        Self {
            institution: institution.name.clone(),
        }
    }

    pub fn greeting(&self) -> String {
        format!(
            "Hey! 👋 Welcome to {}!\n\nHow can I help you today?",
            self.institution
        )
    }

    pub fn ask_for_details(&self) -> String {
        "Before we proceed, please enter your Name and Phone Number (e.g., John Doe, 9876543210)."
            .to_string()
    }

    pub fn refusal_reprompt(&self) -> String {
        "I understand. However, I need your Name and Phone Number to assist you further with course details or admissions. Can you please provide them?"
            .to_string()
    }

    pub fn option_menu_message(&self, name: &str) -> String {
        format!("Thanks {}! Please select an option below:", name)
    }

    pub fn options(&self) -> Vec<String> {
        OPTION_MENU.iter().map(|s| s.to_string()).collect()
    }

    pub fn existing_user_reply(&self) -> String {
        "As an existing student, do you need help with your login or course materials?".to_string()
    }

    pub fn new_user_reply(&self) -> String {
        "Great! We can help you with admissions and guidance. What course are you interested in?"
            .to_string()
    }

    pub fn open_chat_invitation(&self) -> String {
        format!(
            "No problem! Feel free to ask me anything about {}'s courses and admissions.",
            self.institution
        )
    }

    /// Neither field valid, 1–9 digits seen in the input.
    pub fn number_too_short(&self, digit_count: usize) -> String {
        format!(
            "That phone number looks too short — I only see {} digits. Please provide your Name and a valid 10-digit Phone Number.",
            digit_count
        )
    }

    /// Neither field valid, no partial digits.
    pub fn generic_request(&self) -> String {
        "Please provide your Name and a valid 10-digit Phone Number.".to_string()
    }

    /// Name valid, phone missing. Includes the too-short count when the
    /// input carried partial digits.
    pub fn need_phone(&self, name: &str, partial_digits: Option<usize>) -> String {
        match partial_digits {
            Some(count) => format!(
                "Thanks {}! That number is too short — I only see {} digits. Please provide your 10-digit Phone Number.",
                name, count
            ),
            None => format!("Thanks {}! Please provide your 10-digit Phone Number.", name),
        }
    }

    /// Phone valid, name missing.
    pub fn need_name(&self) -> String {
        "Thanks for the number! Please provide your Name.".to_string()
    }
}
