//! Quick text operations on selected page text.

use serde::{Deserialize, Serialize};

/// Target language when a translation does not name one.
pub const DEFAULT_TARGET_LANGUAGE: &str = "Chinese";

/// An operation offered by the floating toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Translate the text.
    Translate,
    /// Summarize the text.
    Summarize,
    /// Analyze the text.
    Analyze,
    /// Explain the text.
    Explain,
}

impl Operation {
    /// Parse the toolbar's operation name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "translate" => Some(Self::Translate),
            "summarize" => Some(Self::Summarize),
            "analyze" => Some(Self::Analyze),
            "explain" => Some(Self::Explain),
            _ => None,
        }
    }

    /// The prompt sent to the model for `text`.
    pub fn prompt(&self, text: &str, language: Option<&str>) -> String {
        let text = text.trim();
        match self {
            Self::Translate => {
                let language = language
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .unwrap_or(DEFAULT_TARGET_LANGUAGE);
                format!(
                    "Translate the following text into {language}. \
                     Reply with the translation only.\n\n{text}"
                )
            }
            Self::Summarize => format!(
                "Summarize the key points of the following text concisely.\n\n{text}"
            ),
            Self::Analyze => format!(
                "Analyze the following text: its main argument and any \
                 notable assumptions.\n\n{text}"
            ),
            Self::Explain => format!(
                "Explain the following text in plain language, defining any \
                 technical terms.\n\n{text}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_defaults_to_chinese() {
        let prompt = Operation::Translate.prompt(" hello ", None);
        assert!(prompt.contains("into Chinese"));
        assert!(prompt.ends_with("\n\nhello"));
        let prompt = Operation::Translate.prompt("hello", Some("French"));
        assert!(prompt.contains("into French"));
    }

    #[test]
    fn parse_names() {
        assert_eq!(Operation::parse("Summarize"), Some(Operation::Summarize));
        assert_eq!(Operation::parse("rewrite"), None);
    }
}
