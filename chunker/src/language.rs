use std::path::Path;

use crate::error::{ChunkerError, Result};

/// Languages the chunker has a grammar for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Go,
    JavaScript,
    TypeScript,
    Tsx,
    Python,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "go" => Some(Language::Go),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "mts" | "cts" => Some(Language::TypeScript),
            "tsx" => Some(Language::Tsx),
            "py" => Some(Language::Python),
            _ => None,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Python => "python",
        }
    }

    /// Get Tree-sitter language instance
    pub fn grammar(self) -> tree_sitter::Language {
        match self {
            Language::Go => tree_sitter_go::LANGUAGE.into(),
            Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Language::Python => tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// A parser ready for this language.
    pub fn parser(self) -> Result<tree_sitter::Parser> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.grammar())
            .map_err(|e| ChunkerError::Grammar {
                language: self.as_str(),
                message: e.to_string(),
            })?;
        Ok(parser)
    }

    /// Node kinds that become chunks.
    pub fn chunk_kinds(self) -> &'static [&'static str] {
        match self {
            Language::Go => &["function_declaration", "method_declaration"],
            Language::JavaScript => &[
                "function_declaration",
                "function_expression",
                "arrow_function",
                "method_definition",
                "class_declaration",
            ],
            Language::TypeScript | Language::Tsx => &[
                "function_declaration",
                "method_definition",
                "class_declaration",
            ],
            Language::Python => &["function_definition", "class_definition"],
        }
    }

    /// Whether a leading `#!` line should be blanked before parsing.
    pub fn allows_shebang(self) -> bool {
        matches!(
            self,
            Language::JavaScript | Language::TypeScript | Language::Tsx
        )
    }
}
