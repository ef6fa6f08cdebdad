use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "repoqa",
    version,
    about = "Semantic code search via OpenAI embeddings"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file overriding embedding settings (model, dimension, concurrency, ...)
    #[arg(long, global = true, env = "REPOQA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Index file written by `embed` and read by `query` and `ask`
    #[arg(
        long,
        global = true,
        env = "REPOQA_INDEX",
        default_value = "data/.index.json"
    )]
    pub index: PathBuf,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, global = true, env = "REPOQA_BASE_URL")]
    pub base_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split a source tree into function and class chunks
    Index {
        /// Directory to chunk
        path: PathBuf,

        /// Where to write the newline-delimited JSON chunks
        #[arg(long, env = "REPOQA_CHUNKS", default_value = "data/chunked.jsonl")]
        chunks: PathBuf,
    },

    /// Read chunked JSONL, embed code and write the index
    Embed {
        /// Newline-delimited JSON chunks ({"id", "file", "code"} per line)
        #[arg(long, env = "REPOQA_CHUNKS", default_value = "data/chunked.jsonl")]
        chunks: PathBuf,
    },

    /// Find the chunks most similar to a query
    Query {
        /// Natural language or code query
        query: String,

        /// Number of top matching chunks to return
        #[arg(short, long, default_value_t = 3)]
        top: usize,

        /// Output results as raw JSON for parsing
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Answer a question about the codebase from the best matching chunks
    Ask {
        /// Question to answer
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Number of chunks given to the model
        #[arg(short, long, default_value_t = 3)]
        top: usize,

        /// Chat model used to write the answer
        #[arg(long, env = "REPOQA_CHAT_MODEL", default_value = "gpt-4")]
        model: String,

        /// Seconds to wait for the chat completion
        #[arg(long, env = "REPOQA_CHAT_TIMEOUT", default_value_t = 60)]
        timeout: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_query_defaults() {
        let cli = Cli::try_parse_from(["repoqa", "query", "where is the parser"]).unwrap();
        match cli.command {
            Command::Query { query, top, json } => {
                assert_eq!(query, "where is the parser");
                assert_eq!(top, 3);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_index_defaults() {
        let cli = Cli::try_parse_from(["repoqa", "index", "../service"]).unwrap();
        match cli.command {
            Command::Index { path, chunks } => {
                assert_eq!(path, PathBuf::from("../service"));
                assert_eq!(chunks, PathBuf::from("data/chunked.jsonl"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_ask_joins_words_and_accepts_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "repoqa", "ask", "what", "does", "main", "do", "-t", "5", "--index", "idx.json",
        ])
        .unwrap();
        assert_eq!(cli.index, PathBuf::from("idx.json"));
        match cli.command {
            Command::Ask {
                question,
                top,
                timeout,
                ..
            } => {
                assert_eq!(question.join(" "), "what does main do");
                assert_eq!(top, 5);
                assert_eq!(timeout, 60);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
