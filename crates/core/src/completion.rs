//! Normalized provider output.

/// The result of one chat completion call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// The assistant's answer.
    pub content: String,
    /// The reasoning trace, for providers that surface one.
    pub reasoning: Option<String>,
}

impl Completion {
    /// Create a completion with content only.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            reasoning: None,
        }
    }
}

/// One normalized streaming increment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    /// Content delta, possibly empty.
    pub content: String,
    /// Reasoning delta, possibly empty.
    pub reasoning: String,
}

impl Delta {
    /// Whether neither field carries text.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.reasoning.is_empty()
    }
}

/// Accumulates streaming deltas into a [`Completion`].
#[derive(Debug, Default)]
pub struct CompletionBuilder {
    content: String,
    reasoning: String,
}

impl CompletionBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a delta from the stream. Returns whether it carried content.
    pub fn accept(&mut self, delta: &Delta) -> bool {
        self.reasoning.push_str(&delta.reasoning);
        self.content.push_str(&delta.content);
        !delta.content.is_empty()
    }

    /// The content accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Build the completion.
    pub fn build(self) -> Completion {
        Completion {
            content: self.content,
            reasoning: (!self.reasoning.is_empty()).then_some(self.reasoning),
        }
    }
}
