//! Query pipeline: retrieve, then generate.
//!
//! 1. **retrieve**: embed the question and take the `retrieval.top_k`
//!    nearest chunks by cosine distance.
//! 2. **generate**: join the hits' text (in search order) into a context
//!    string, render the prompt, and ask the chat model.
//!
//! There is no branching between the two steps and no retry around them.

use anyhow::{bail, Result};
use serde::Serialize;
use std::time::Instant;

use crate::chat::ChatMessage;
use crate::models::StoredChunk;
use crate::pipeline::Pipeline;

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    /// The chunks the answer was conditioned on, nearest first.
    pub context: Vec<StoredChunk>,
}

/// Trim the question and reject it when nothing is left.
pub fn normalize_question(question: &str) -> Option<&str> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

pub async fn answer_question(pipeline: &Pipeline, question: &str) -> Result<Answer> {
    let question = match normalize_question(question) {
        Some(q) => q,
        None => bail!("question must not be empty"),
    };

    let started = Instant::now();
    let context = retrieve(pipeline, question).await?;
    let answer = generate(pipeline, question, &context).await?;

    tracing::info!(
        hits = context.len(),
        answer_chars = answer.chars().count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "answered question"
    );

    Ok(Answer { answer, context })
}

pub async fn retrieve(pipeline: &Pipeline, question: &str) -> Result<Vec<StoredChunk>> {
    let query_vec = pipeline.embedder().embed_query(question).await?;
    let hits = pipeline
        .store()
        .similarity_search(&query_vec, pipeline.config().retrieval.top_k)
        .await?;

    tracing::debug!(
        hits = hits.len(),
        nearest = hits.first().map(|h| h.distance),
        "retrieved context"
    );
    Ok(hits)
}

pub async fn generate(pipeline: &Pipeline, question: &str, context: &[StoredChunk]) -> Result<String> {
    let context_text = build_context(context);
    let messages = pipeline.prompt().render(question, &context_text)?;

    tracing::debug!(
        model = pipeline.chat().model_name(),
        prompt_chars = prompt_chars(&messages),
        "generating answer"
    );
    pipeline.chat().complete(&messages).await
}

/// Length of the rendered prompt in characters, not bytes.
fn prompt_chars(messages: &[ChatMessage]) -> usize {
    messages.iter().map(|m| m.content.chars().count()).sum()
}

/// Concatenate hit texts, one per line, in the order given.
pub fn build_context(hits: &[StoredChunk]) -> String {
    hits.iter()
        .map(|h| h.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
