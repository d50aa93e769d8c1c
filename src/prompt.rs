//! Prompt template for the generate step.
//!
//! The template is a Handlebars document with two variables, `question` and
//! `context`. Rendering is strict (an unknown variable is an error) and
//! unescaped, since the output goes to a language model and not a browser.
//! The rendered text becomes a single user message.

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;

use crate::chat::ChatMessage;

/// The stock question-answering prompt.
pub const DEFAULT_TEMPLATE: &str = include_str!("../prompts/rag.hbs");

const TEMPLATE_NAME: &str = "rag";

#[derive(Serialize)]
struct PromptVars<'a> {
    question: &'a str,
    context: &'a str,
}

pub struct PromptTemplate {
    registry: Handlebars<'static>,
}

impl PromptTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(TEMPLATE_NAME, template)
            .context("Invalid prompt template")?;
        Ok(Self { registry })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let template = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt template: {}", path.display()))?;
        Self::parse(&template)
    }

    /// Load `path` if given, otherwise the built-in template.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::parse(DEFAULT_TEMPLATE),
        }
    }

    pub fn render(&self, question: &str, context: &str) -> Result<Vec<ChatMessage>> {
        let rendered = self
            .registry
            .render(TEMPLATE_NAME, &PromptVars { question, context })
            .context("Failed to render prompt template")?;
        Ok(vec![ChatMessage::user(rendered.trim_end())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;

    #[test]
    fn test_default_template_substitutes_both_vars() {
        let prompt = PromptTemplate::load(None).unwrap();
        let messages = prompt
            .render("Who wrote Dune?", "title: Dune\nauthor: Frank Herbert")
            .unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        let text = &messages[0].content;
        assert!(text.starts_with("You are an assistant for question-answering tasks."));
        assert!(text.contains("Question: Who wrote Dune? \n"));
        assert!(text.contains("Context: title: Dune\nauthor: Frank Herbert \n"));
        assert!(text.ends_with("Answer:"));
    }

    #[test]
    fn test_no_html_escaping() {
        let prompt = PromptTemplate::parse("{{question}}|{{context}}").unwrap();
        let messages = prompt.render("a < b & \"c\"", "<tag>").unwrap();
        assert_eq!(messages[0].content, "a < b & \"c\"|<tag>");
    }

    #[test]
    fn test_strict_mode_rejects_unknown_variable() {
        let prompt = PromptTemplate::parse("{{question}} {{history}}").unwrap();
        assert!(prompt.render("q", "c").is_err());
    }

    #[test]
    fn test_invalid_template_errors() {
        assert!(PromptTemplate::parse("{{#if question}}unclosed").is_err());
    }

    #[test]
    fn test_template_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("custom.hbs");
        std::fs::write(&path, "Q={{question}} C={{context}}").unwrap();
        let prompt = PromptTemplate::load(Some(&path)).unwrap();
        assert_eq!(prompt.render("x", "y").unwrap()[0].content, "Q=x C=y");
    }
}
