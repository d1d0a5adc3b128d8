//! Prompt templates for the rewrite and answer calls.

use ragchat_model::{GenerationRequest, PromptMessage};
use ragchat_retrieval::RetrievedDocument;

use crate::history::ConversationHistory;

pub(crate) const CONTEXTUALIZE_INSTRUCTION: &str = "\
Given the chat history and the latest user question, which might reference \
context in the chat history, formulate a standalone question that can be \
understood without the chat history. Do NOT answer the question. Only \
reformulate it if needed, and otherwise return it as is.";

pub(crate) const ANSWER_INSTRUCTION: &str = "\
You are an assistant for question-answering tasks. Use the following pieces \
of retrieved context to answer the question. If you don't know the answer, \
say that you don't know. Answer in the language of the question.";

pub(crate) const NO_CONTEXT_NOTICE: &str = "\
The knowledge base returned nothing relevant to this question. Say so, and \
only answer if you are confident without it.";

/// Request asking the model to turn `user_text` into a standalone question.
pub fn contextualize_request(history: &ConversationHistory, user_text: &str) -> GenerationRequest {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::system(CONTEXTUALIZE_INSTRUCTION));
    messages.extend(history.to_prompt_messages());
    messages.push(PromptMessage::user(user_text));
    GenerationRequest::new(messages)
}

/// Request asking the model to answer `user_text` from `documents`.
///
/// Documents are numbered from 1 in retrieval order, with their source
/// when one is known.
pub fn answer_request(
    history: &ConversationHistory,
    documents: &[RetrievedDocument],
    user_text: &str,
) -> GenerationRequest {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::system(render_system(documents)));
    messages.extend(history.to_prompt_messages());
    messages.push(PromptMessage::user(user_text));
    GenerationRequest::new(messages)
}

fn render_system(documents: &[RetrievedDocument]) -> String {
    if documents.is_empty() {
        return format!("{ANSWER_INSTRUCTION}\n\n{NO_CONTEXT_NOTICE}");
    }

    let mut system = format!("{ANSWER_INSTRUCTION}\n\nContext:\n");
    for (n, doc) in documents.iter().enumerate() {
        match doc.source() {
            Some(source) => system.push_str(&format!("\n[{}] (source: {source})\n", n + 1)),
            None => system.push_str(&format!("\n[{}]\n", n + 1)),
        }
        system.push_str(doc.text().trim());
        system.push('\n');
    }
    system
}
