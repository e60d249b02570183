//! `rig-core` adapter for the [`Model`] interface, grounded in `demo3.rs`'s
//! direct `ollama::Client` / `CompletionModel` usage — generalized so any
//! `rig::completion::CompletionModel` can back an `LlmNode` instead of the
//! demo's hard-coded provider call.

use async_trait::async_trait;
use rig::completion::{CompletionModel, Message as RigMessage};

use crate::interfaces::model::{
    Model, ModelChunk, ModelError, ModelRequest, ModelStream, ModelUsage,
};
use crate::message::Message;

/// Wraps any `rig` completion model (Ollama, OpenAI, Anthropic, ...) behind
/// the engine's [`Model`] trait. Tool-calling is not implemented for this
/// adapter: `rig`'s per-provider tool-call surface varies enough between
/// providers that a faithful generic mapping belongs in a provider-specific
/// adapter layered on top, not here; this adapter always produces a single
/// text-only completion.
pub struct RigModel<C: CompletionModel> {
    model: C,
    provider: &'static str,
}

impl<C: CompletionModel> RigModel<C> {
    #[must_use]
    pub fn new(model: C, provider: &'static str) -> Self {
        Self { model, provider }
    }
}

fn to_rig_message(message: &Message) -> RigMessage {
    if message.has_role(Message::ASSISTANT) {
        RigMessage::assistant(message.content.clone())
    } else {
        RigMessage::user(message.content.clone())
    }
}

#[async_trait]
impl<C> Model for RigModel<C>
where
    C: CompletionModel + Send + Sync,
{
    async fn generate(&self, request: ModelRequest) -> Result<ModelStream, ModelError> {
        let Some((last, history)) = request.messages.split_last() else {
            return Err(ModelError::InvalidRequest(
                "model request carried no messages".to_string(),
            ));
        };

        let preamble = request
            .messages
            .iter()
            .find(|m| m.has_role(Message::SYSTEM))
            .map(|m| m.content.clone());

        let mut builder = self
            .model
            .completion_request(to_rig_message(last))
            .history(history.iter().map(to_rig_message).collect::<Vec<_>>());
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.params.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        let completion_request = builder.build();

        let provider = self.provider;
        let response = self
            .model
            .completion(completion_request)
            .await
            .map_err(|e| ModelError::Provider {
                provider,
                message: e.to_string(),
            })?;

        let text = response
            .choice
            .into_iter()
            .map(|choice| format!("{choice:?}"))
            .collect::<Vec<_>>()
            .join("");

        let chunk = ModelChunk::final_text(text, Some(ModelUsage::default()));
        Ok(Box::pin(futures_util::stream::once(async move { chunk })))
    }
}
