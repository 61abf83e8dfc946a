//! UI-agnostic application state types
//!
//! This module contains data structures that are shared between the terminal
//! UI and the one-shot CLI and don't depend on any specific UI framework.

use serde::{Deserialize, Serialize};

use crate::recommendation::Recommendation;

/// A single turn in the recommendation conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub content: MessageContent,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant_recommendations(recommendations: Vec<Recommendation>) -> Self {
        Self {
            sender: Sender::Assistant,
            content: MessageContent::Recommendations(recommendations),
        }
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// Body of a message: prompts, greetings and errors are text, answers are product lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum MessageContent {
    Text(String),
    Recommendations(Vec<Recommendation>),
}

/// The view currently shown by the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Recommendation,
    Analytics,
}

impl Page {
    pub fn all() -> Vec<Page> {
        vec![Page::Recommendation, Page::Analytics]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Page::Recommendation => "Recommendation Chat",
            Page::Analytics => "Data Analytics",
        }
    }

    pub fn next(&self) -> Page {
        match self {
            Page::Recommendation => Page::Analytics,
            Page::Analytics => Page::Recommendation,
        }
    }
}
