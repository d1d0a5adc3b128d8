//! Conversions between ragchat prompt types and async-openai types.

use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    CreateChatCompletionStreamResponse,
};

use crate::error::{ModelError, Result};
use crate::request::{GenerationRequest, PromptMessage, Role};

fn build_error(e: OpenAIError) -> ModelError {
    ModelError::Request(format!("Failed to build request: {e}"))
}

pub(crate) fn to_message(message: &PromptMessage) -> Result<ChatCompletionRequestMessage> {
    let content = message.content.clone();
    let converted = match message.role {
        Role::System => {
            ChatCompletionRequestSystemMessageArgs::default().content(content).build()?.into()
        }
        Role::User => {
            ChatCompletionRequestUserMessageArgs::default().content(content).build()?.into()
        }
        Role::Assistant => {
            ChatCompletionRequestAssistantMessageArgs::default().content(content).build()?.into()
        }
    };
    Ok(converted)
}

pub(crate) fn build_request(
    model: &str,
    request: &GenerationRequest,
    stream: bool,
) -> Result<CreateChatCompletionRequest> {
    let messages = request.messages.iter().map(to_message).collect::<Result<Vec<_>>>()?;

    let mut builder = CreateChatCompletionRequestArgs::default();
    builder.model(model).messages(messages).stream(stream);

    if let Some(config) = &request.config {
        if let Some(temp) = config.temperature {
            builder.temperature(temp);
        }
        if let Some(top_p) = config.top_p {
            builder.top_p(top_p);
        }
        if let Some(max_tokens) = config.max_output_tokens {
            builder.max_tokens(max_tokens);
        }
    }

    builder.build().map_err(build_error)
}

/// Text carried by one streamed chunk, if any.
pub(crate) fn fragment_from_chunk(chunk: &CreateChatCompletionStreamResponse) -> Option<String> {
    let text: String =
        chunk.choices.iter().filter_map(|choice| choice.delta.content.as_deref()).collect();
    if text.is_empty() { None } else { Some(text) }
}

impl From<OpenAIError> for ModelError {
    fn from(e: OpenAIError) -> Self {
        build_error(e)
    }
}
