//! Fenced code-block extraction and language mapping.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::Message;

use super::error::{SandboxError, SandboxResult};

/// A fenced block found in message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Info-string after the opening fence, lowercased; `None` when absent.
    pub language: Option<String>,
    pub code: String,
    /// Target file named by a leading `# filename: <path>` line.
    pub filename: Option<String>,
}

impl CodeBlock {
    pub fn new(language: Option<&str>, code: impl Into<String>) -> Self {
        let code = code.into();
        let filename = filename_hint(&code);
        Self {
            language: language.map(|l| l.to_ascii_lowercase()),
            code,
            filename,
        }
    }
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+.\-]*)[ \t]*\r?\n(.*?)```")
            .expect("fence regex is valid")
    })
}

fn filename_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:#|//)\s*filename:\s*(\S+)").expect("filename regex is valid")
    })
}

fn filename_hint(code: &str) -> Option<String> {
    let first = code.lines().next()?;
    filename_regex()
        .captures(first)
        .map(|c| c[1].to_string())
}

/// Extract every fenced code block from `text`, in order of appearance.
pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    fence_regex()
        .captures_iter(text)
        .map(|cap| {
            let lang = cap.get(1).map(|m| m.as_str()).filter(|s| !s.is_empty());
            CodeBlock::new(lang, &cap[2])
        })
        .collect()
}

/// Code blocks from the most recent message in `window` that has any.
pub fn latest_code_blocks(window: &[Message]) -> Vec<CodeBlock> {
    window
        .iter()
        .rev()
        .map(|m| extract_code_blocks(&m.content))
        .find(|blocks| !blocks.is_empty())
        .unwrap_or_default()
}

/// Interpreters a code block can be run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptLanguage {
    Python,
    Shell,
    Bash,
}

impl ScriptLanguage {
    /// Map a fence info-string to a language.
    pub fn from_tag(tag: &str) -> SandboxResult<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "python" | "py" | "python3" => Ok(Self::Python),
            "sh" => Ok(Self::Shell),
            "bash" | "shell" => Ok(Self::Bash),
            other => Err(SandboxError::UnsupportedLanguage(other.to_string())),
        }
    }

    /// Language for a block, inferring from its content when untagged.
    pub fn for_block(block: &CodeBlock) -> SandboxResult<Self> {
        match &block.language {
            Some(tag) => Self::from_tag(tag),
            None => Ok(Self::infer(&block.code)),
        }
    }

    fn infer(code: &str) -> Self {
        const SHELL_HEADS: &[&str] = &["pip", "python", "python3", "ls", "cd", "echo", "mkdir"];
        let first = code.trim_start();
        let head = first.split_whitespace().next().unwrap_or_default();
        if first.starts_with("#!/bin/sh") || SHELL_HEADS.contains(&head) {
            Self::Shell
        } else {
            Self::Python
        }
    }

    pub fn interpreter(&self) -> &'static str {
        match self {
            Self::Python => "python3",
            Self::Shell => "sh",
            Self::Bash => "bash",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Python => "py",
            Self::Shell | Self::Bash => "sh",
        }
    }
}

impl std::fmt::Display for ScriptLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Python => write!(f, "python"),
            Self::Shell => write!(f, "sh"),
            Self::Bash => write!(f, "bash"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageKind, Transcript};

    #[test]
    fn test_extract_single_block_with_language() {
        let text = "Here you go:\n```python\nprint('hi')\n```\nDone.";
        let blocks = extract_code_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language.as_deref(), Some("python"));
        assert_eq!(blocks[0].code, "print('hi')\n");
        assert!(blocks[0].filename.is_none());
    }

    #[test]
    fn test_extract_multiple_blocks_in_order() {
        let text = "```sh\necho one\n```\ntext\n```bash\necho two\n```";
        let blocks = extract_code_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language.as_deref(), Some("sh"));
        assert_eq!(blocks[1].language.as_deref(), Some("bash"));
    }

    #[test]
    fn test_extract_untagged_block() {
        let blocks = extract_code_blocks("```\nx = 1\n```");
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].language.is_none());
    }

    #[test]
    fn test_filename_hint() {
        let blocks = extract_code_blocks("```python\n# filename: convert.py\nprint(1)\n```");
        assert_eq!(blocks[0].filename.as_deref(), Some("convert.py"));
    }

    #[test]
    fn test_no_blocks_in_plain_text() {
        assert!(extract_code_blocks("no code here").is_empty());
    }

    #[test]
    fn test_latest_code_blocks_prefers_most_recent() {
        let mut t = Transcript::new();
        t.append("Programmer", MessageKind::Text, "```sh\necho old\n```");
        t.append("Programmer", MessageKind::Text, "```sh\necho new\n```");
        t.append("Tester", MessageKind::Text, "looks fine");
        let blocks = latest_code_blocks(t.messages());
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].code.contains("new"));
    }

    #[test]
    fn test_language_mapping() {
        assert_eq!(ScriptLanguage::from_tag("py").unwrap(), ScriptLanguage::Python);
        assert_eq!(ScriptLanguage::from_tag("SHELL").unwrap(), ScriptLanguage::Bash);
        assert_eq!(ScriptLanguage::from_tag("bash").unwrap(), ScriptLanguage::Bash);
        assert!(matches!(
            ScriptLanguage::from_tag("java").unwrap_err(),
            SandboxError::UnsupportedLanguage(l) if l == "java"
        ));
    }

    #[test]
    fn test_language_inference_for_untagged() {
        let shell = CodeBlock::new(None, "pip install requests\n");
        assert_eq!(ScriptLanguage::for_block(&shell).unwrap(), ScriptLanguage::Shell);
        let py = CodeBlock::new(None, "import os\n");
        assert_eq!(ScriptLanguage::for_block(&py).unwrap(), ScriptLanguage::Python);
        let listing = CodeBlock::new(None, "ls\n");
        assert_eq!(ScriptLanguage::for_block(&listing).unwrap(), ScriptLanguage::Shell);
        for code in ["lst = [1, 2]\nprint(lst)\n", "lstrip_all(lines)\n", "echoes = []\n"] {
            let block = CodeBlock::new(None, code);
            assert_eq!(
                ScriptLanguage::for_block(&block).unwrap(),
                ScriptLanguage::Python,
                "{code:?}"
            );
        }
    }
}
