//! CLI type definitions
//!
//! Clap command structures for the `vectorcase` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::models::UseCase;

#[derive(Parser)]
#[command(name = "vectorcase")]
#[command(about = "Vectorcase - retrieval core for generative-AI use cases", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .vectorcase/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a text file into overlapping fragments (no network access)
    Chunk {
        /// Text file to split
        file: PathBuf,

        /// Window size in characters (defaults to chunking.chunk_size)
        #[arg(short, long)]
        size: Option<usize>,

        /// Overlap in characters (defaults to chunking.overlap)
        #[arg(short, long)]
        overlap: Option<usize>,
    },

    /// Chunk, embed and store a text document
    IndexDocument {
        /// Text file to index
        file: PathBuf,
    },

    /// Store telemetry records from a JSON array or JSON-lines file
    IngestRecords {
        /// Records file
        file: PathBuf,
    },

    /// Retrieve the fragments most relevant to a query
    Search {
        /// Natural-language query
        #[arg(required_unless_present_any = ["device_id", "user_id"])]
        query: Option<String>,

        /// Index profile to search
        #[arg(short, long, default_value = "iot")]
        use_case: UseCase,

        /// Number of fragments to return (defaults to retrieval.final_count)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Look up records of one device instead of searching
        #[arg(long, conflicts_with_all = ["user_id", "query"])]
        device_id: Option<String>,

        /// Look up records of one user instead of searching
        #[arg(long, conflicts_with = "query")]
        user_id: Option<String>,
    },

    /// Answer a question from retrieved fragments
    Ask {
        /// Question to answer
        question: String,

        /// Index profile to search
        #[arg(short, long, default_value = "documents")]
        use_case: UseCase,

        /// JSON file with prior conversation messages ([{"role", "content"}])
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Summarize the fragments stored in an index
    Summarize {
        /// Index profile to summarize
        #[arg(short, long, default_value = "documents")]
        use_case: UseCase,

        /// Maximum number of stored fragments to read
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },

    /// Generate a read-only SQL query for a question
    Sql {
        /// Question about the telemetry table
        question: String,
    },

    /// Delete fragments by id
    Delete {
        /// Fragment ids (comma-separated)
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<String>,

        /// Index profile to delete from
        #[arg(short, long, default_value = "documents")]
        use_case: UseCase,
    },
}
