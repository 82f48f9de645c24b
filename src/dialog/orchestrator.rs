//! The per-session state machine.
//!
//! Given a session and an incoming message, decides the next bot turn:
//! fixed scripted replies during qualification, extraction while waiting
//! for contact details, and retrieval + completion once in open chat.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::replies::ScriptedReplies;
use super::session::{ChatTurn, Session, Stage, UserType};
use super::store::SessionStore;
use crate::core::errors::ApiError;
use crate::db::Database;
use crate::extract::{count_digits, Extractor, Intent};
use crate::llm::{ChatMessage, CompletionClient};
use crate::rag::KnowledgeRetriever;

/// The bot's side of one turn.
#[derive(Debug, Clone)]
pub struct BotReply {
    pub message: String,
    pub options: Option<Vec<String>>,
}

impl BotReply {
    fn text(message: String) -> Self {
        Self {
            message,
            options: None,
        }
    }
}

pub struct DialogOrchestrator {
    sessions: Arc<dyn SessionStore>,
    extractor: Arc<dyn Extractor>,
    retriever: KnowledgeRetriever,
    completion: CompletionClient,
    database: Database,
    replies: ScriptedReplies,
}

impl DialogOrchestrator {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        extractor: Arc<dyn Extractor>,
        retriever: KnowledgeRetriever,
        completion: CompletionClient,
        database: Database,
        replies: ScriptedReplies,
    ) -> Self {
        Self {
            sessions,
            extractor,
            retriever,
            completion,
            database,
            replies,
        }
    }

    /// Handles one incoming turn. The session lock is held from load to
    /// reply, so turns for the same key serialize.
    pub async fn handle(&self, session_id: &str, text: &str) -> Result<BotReply, ApiError> {
        let handle = self.sessions.get_or_create(session_id).await;
        let mut session = handle.lock().await;
        session.touch();

        match session.stage {
            Stage::Greeting => Ok(self.greet(&mut session)),
            Stage::DataCollection => Ok(self.request_details(&mut session, text)),
            Stage::WaitingForData => Ok(self.collect_details(&mut session, text).await),
            Stage::Identification => Ok(self.identify(&mut session, text)),
            Stage::OpenChat => Ok(self.answer(&mut session, text).await),
        }
    }

    /// Allocates a fresh session already past the greeting, independent
    /// of whichever session triggered the reset.
    pub async fn reset(&self) -> (String, BotReply) {
        let session_id = Uuid::new_v4().to_string();
        let mut session = Session::new(session_id.clone());

        let greeting = self.replies.greeting();
        session.push_assistant(&greeting);
        session.stage = Stage::DataCollection;

        self.sessions.insert(session).await;
        (session_id, BotReply::text(greeting))
    }

    /// The triggering message is consumed but not recorded; the greeting
    /// plays regardless of what it said.
    fn greet(&self, session: &mut Session) -> BotReply {
        let greeting = self.replies.greeting();
        session.push_assistant(&greeting);
        session.stage = Stage::DataCollection;
        BotReply::text(greeting)
    }

    fn request_details(&self, session: &mut Session, text: &str) -> BotReply {
        session.push_user(text);
        let ask = self.replies.ask_for_details();
        session.push_assistant(&ask);
        session.stage = Stage::WaitingForData;
        BotReply::text(ask)
    }

    async fn collect_details(&self, session: &mut Session, text: &str) -> BotReply {
        session.push_user(text);

        let extraction = self.extractor.extract(text).await;

        if extraction.intent == Intent::Refuse {
            let reply = self.replies.refusal_reprompt();
            session.push_assistant(&reply);
            return BotReply::text(reply);
        }

        session.user_data.merge(&extraction);

        if session.user_data.is_complete() {
            let name = session.user_data.name.clone().unwrap_or_default();
            let phone = session.user_data.phone_number.clone().unwrap_or_default();

            if let Err(err) = self.database.save_user(&name, &phone).await {
                tracing::warn!("Failed to persist lead: {}", err);
            }

            let message = self.replies.option_menu_message(&name);
            let options = self.replies.options();
            session
                .messages
                .push(ChatTurn::assistant_with_options(&message, options.clone()));
            session.stage = Stage::Identification;

            return BotReply {
                message,
                options: Some(options),
            };
        }

        let reply = self.corrective_prompt(session, text);
        session.push_assistant(&reply);
        BotReply::text(reply)
    }

    /// The corrective-prompt decision table. Deterministic in the
    /// accumulated user data and the digit count of this input.
    fn corrective_prompt(&self, session: &Session, text: &str) -> String {
        let has_name = session.user_data.has_valid_name();
        let has_phone = session.user_data.has_valid_phone();
        let digits = count_digits(text);
        let partial_digits = (1..=9).contains(&digits).then_some(digits);

        if has_name && !has_phone {
            let name = session.user_data.name.as_deref().unwrap_or_default();
            self.replies.need_phone(name, partial_digits)
        } else if has_phone && !has_name {
            self.replies.need_name()
        } else if let Some(count) = partial_digits {
            self.replies.number_too_short(count)
        } else {
            self.replies.generic_request()
        }
    }

    fn identify(&self, session: &mut Session, text: &str) -> BotReply {
        session.push_user(text);

        let (user_type, reply) = if text.contains("LMS") || text.contains("Login") {
            (UserType::Existing, self.replies.existing_user_reply())
        } else if text.contains("Explore") || text.contains("Admission") || text.contains("counsellor")
        {
            (UserType::New, self.replies.new_user_reply())
        } else {
            (UserType::New, self.replies.open_chat_invitation())
        };

        session.user_data.user_type = Some(user_type);
        session.push_assistant(&reply);
        session.stage = Stage::OpenChat;
        BotReply::text(reply)
    }

    async fn answer(&self, session: &mut Session, text: &str) -> BotReply {
        // History is snapshotted before this turn is appended; the
        // completion client gets its own copy, never the live transcript.
        let history: Vec<ChatMessage> = session
            .messages
            .iter()
            .map(|turn| ChatMessage {
                role: turn.role.clone(),
                content: turn.content.clone(),
            })
            .collect();

        session.push_user(text);

        let retrieved = self.retriever.retrieve(text).await;
        let outcome = self
            .completion
            .complete(&retrieved.context, &history, text)
            .await;

        session.push_assistant(&outcome.text);

        self.database
            .log_event(
                "CHAT_RESPONSE",
                json!({
                    "sessionId": session.id,
                    "userMessage": text,
                    "botMessage": outcome.text,
                    "confidence": retrieved.confidence,
                    "passages": retrieved.passage_count,
                    "ok": outcome.ok,
                    "userData": session.user_data,
                }),
            )
            .await;

        BotReply::text(outcome.text)
    }
}
