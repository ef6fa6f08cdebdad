//! AST-based chunk extraction.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use tree_sitter::Node;

use crate::error::{ChunkerError, Result};
use crate::language::Language;

/// One function, method or class cut out of a source file.
///
/// Serialized with the keys the embedding step reads (`id`, `file`, `code`)
/// plus location metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeChunk {
    pub id: String,
    pub file: String,
    pub code: String,
    pub symbol: String,
    pub start_line: usize,
    pub end_line: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub language: String,
}

/// Cuts source files into chunks, numbering them across every file it sees.
#[derive(Debug, Default)]
pub struct Chunker {
    next_id: usize,
}

impl Chunker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunk the file at `path`, reported under the name `file`.
    pub fn chunk_file(&mut self, path: &Path, file: &str) -> Result<Vec<CodeChunk>> {
        let language =
            Language::from_path(path).ok_or_else(|| ChunkerError::Unsupported(path.into()))?;
        let bytes = std::fs::read(path).map_err(|source| ChunkerError::Read {
            path: path.into(),
            source,
        })?;
        self.chunk_source(file, language, &String::from_utf8_lossy(&bytes))
    }

    /// Chunk `source`, keeping every node of the language's chunk kinds.
    ///
    /// Nested matches (a class and its methods) each become a chunk, in
    /// document order. Whitespace-only chunks are dropped.
    pub fn chunk_source(
        &mut self,
        file: &str,
        language: Language,
        source: &str,
    ) -> Result<Vec<CodeChunk>> {
        let source = sanitize(source, language);
        let mut parser = language.parser()?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| ChunkerError::Parse(file.to_string()))?;

        let nodes = collect_nodes(tree.root_node(), language.chunk_kinds());
        if nodes.is_empty() {
            debug!("No chunkable nodes found in {file}");
        }

        let mut chunks = Vec::with_capacity(nodes.len());
        for (ordinal, node) in nodes.into_iter().enumerate() {
            let Ok(code) = node.utf8_text(source.as_bytes()) else {
                continue;
            };
            if code.trim().is_empty() {
                debug!("Skipped empty chunk from {file}");
                continue;
            }

            let id = format!("chunk_{}", self.next_id);
            self.next_id += 1;
            debug!("{file} - {id} - {} chars", code.len());

            chunks.push(CodeChunk {
                id,
                file: file.to_string(),
                code: code.to_string(),
                symbol: symbol_name(node, source.as_bytes())
                    .unwrap_or_else(|| format!("anonymous_{ordinal}")),
                start_line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
                kind: node.kind().to_string(),
                language: language.as_str().to_string(),
            });
        }
        Ok(chunks)
    }
}

/// Normalize line endings and blank a leading shebang, keeping line numbers.
fn sanitize(source: &str, language: Language) -> String {
    let mut cleaned = source.replace("\r\n", "\n").replace('\r', "\n");
    if language.allows_shebang() && cleaned.starts_with("#!") {
        let end = cleaned.find('\n').unwrap_or(cleaned.len());
        cleaned.replace_range(..end, "");
    }
    cleaned
}

/// Pre-order walk collecting every node whose kind is in `kinds`.
fn collect_nodes<'tree>(root: Node<'tree>, kinds: &[&str]) -> Vec<Node<'tree>> {
    let mut found = Vec::new();
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if kinds.contains(&node.kind()) {
            found.push(node);
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return found;
            }
        }
    }
}

fn symbol_name(node: Node<'_>, source: &[u8]) -> Option<String> {
    match node.kind() {
        "function_declaration"
        | "method_declaration"
        | "method_definition"
        | "class_declaration"
        | "function_definition"
        | "class_definition" => node
            .child_by_field_name("name")?
            .utf8_text(source)
            .ok()
            .map(str::to_string),
        _ => None,
    }
}
