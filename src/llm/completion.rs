use std::sync::Arc;

use super::provider::LlmProvider;
use super::types::{ChatMessage, ChatRequest};
use crate::core::config::{InstitutionConfig, LlmConfig};
use crate::core::errors::ApiError;

/// Fixed reply when the provider call fails. Provider errors are absorbed
/// here and never surface to the chat consumer.
pub const APOLOGY: &str = "I'm sorry, I encountered an error processing your request.";

#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub text: String,
    pub ok: bool,
}

/// Wraps the language-model provider with prompt assembly.
///
/// History is passed in by value per call; this client never holds a
/// reference into a live session transcript.
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn LlmProvider>,
    chat_model: String,
    temperature: f64,
    bot_name: String,
    institution_name: String,
}

impl CompletionClient {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        llm: &LlmConfig,
        institution: &InstitutionConfig,
    ) -> Self {
        Self {
            provider,
            chat_model: llm.chat_model.clone(),
            temperature: llm.temperature,
            bot_name: institution.bot_name.clone(),
            institution_name: institution.name.clone(),
        }
    }

    /// Generates the assistant reply for an open-chat turn.
    ///
    /// The system prompt carries the persona and the retrieved context;
    /// history is replayed in order and the new user message goes last.
    /// A failed provider call degrades to the fixed apology.
    pub async fn complete(
        &self,
        context: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> CompletionOutcome {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt(context)));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(user_message));

        match self.invoke(messages).await {
            Ok(text) => CompletionOutcome { text, ok: true },
            Err(err) => {
                tracing::warn!("Completion call failed: {}", err);
                CompletionOutcome {
                    text: APOLOGY.to_string(),
                    ok: false,
                }
            }
        }
    }

    /// Single round-trip to the chat model. Used for the open-chat reply
    /// and by the model-based extractor.
    pub async fn invoke(&self, messages: Vec<ChatMessage>) -> Result<String, ApiError> {
        let request = ChatRequest::new(messages).with_temperature(self.temperature);
        self.provider.chat(request, &self.chat_model).await
    }

    fn system_prompt(&self, context: &str) -> String {
        format!(
            "You are {bot}, a helpful assistant for {institution}. You help with courses, admissions.\n\
             \n\
             Use the following context to answer the user's question.\n\
             \n\
             Important Instructions:\n\
             - Multilingual Support: Detect the language of the user's message and reply in the SAME language.\n\
             - Moderation: If the user uses abusive, offensive, or inappropriate language, strictly warn them to be respectful and DO NOT answer their query.\n\
             - Answer directly and professionally.\n\
             - Do NOT use phrases like \"mentioned in the text\", \"according to the documents\", or \"as shared\".\n\
             - Speak as if you possess this knowledge naturally.\n\
             - If the answer is not in the context, just say you don't know based on the provided information, or provide general helpful info if appropriate.\n\
             \n\
             Context:\n\
             {context}",
            bot = self.bot_name,
            institution = self.institution_name,
            context = context,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct RecordingProvider {
        reply: Result<String, ()>,
        seen: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(true)
        }

        async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
            *self.seen.lock().unwrap() = request.messages;
            self.reply
                .clone()
                .map_err(|_| ApiError::Internal("provider down".to_string()))
        }

        async fn embed(&self, _inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn client(provider: Arc<dyn LlmProvider>) -> CompletionClient {
        CompletionClient::new(
            provider,
            &LlmConfig::default(),
            &InstitutionConfig::default(),
        )
    }

    #[tokio::test]
    async fn replays_history_between_system_prompt_and_new_message() {
        let provider = Arc::new(RecordingProvider {
            reply: Ok("answer".to_string()),
            seen: Mutex::new(Vec::new()),
        });
        let completion = client(provider.clone());

        let history = vec![
            ChatMessage::user("What courses do you offer?"),
            ChatMessage::assistant("We offer CPA and CMA."),
        ];
        let outcome = completion.complete("ctx passage", &history, "And fees?").await;

        assert!(outcome.ok);
        assert_eq!(outcome.text, "answer");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0].role, "system");
        assert!(seen[0].content.contains("ctx passage"));
        assert_eq!(seen[1].content, "What courses do you offer?");
        assert_eq!(seen[2].role, "assistant");
        assert_eq!(seen[3].content, "And fees?");
    }

    #[tokio::test]
    async fn empty_context_still_attempts_completion() {
        let provider = Arc::new(RecordingProvider {
            reply: Ok("general answer".to_string()),
            seen: Mutex::new(Vec::new()),
        });
        let completion = client(provider.clone());

        let outcome = completion.complete("", &[], "hello").await;
        assert!(outcome.ok);

        let seen = provider.seen.lock().unwrap();
        assert!(seen[0].content.ends_with("Context:\n"));
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_apology() {
        let provider = Arc::new(RecordingProvider {
            reply: Err(()),
            seen: Mutex::new(Vec::new()),
        });
        let completion = client(provider);

        let outcome = completion.complete("", &[], "hello").await;
        assert!(!outcome.ok);
        assert_eq!(outcome.text, APOLOGY);
    }
}
