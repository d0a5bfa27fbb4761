use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{output, ChunkOutput};
use crate::domain::models::Config;
use crate::services::TextChunker;

/// Handle the chunk command. Works offline.
pub async fn execute(
    file: &Path,
    size: Option<usize>,
    overlap: Option<usize>,
    config: &Config,
    json: bool,
) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let chunk_size = size.unwrap_or(config.chunking.chunk_size);
    let overlap = overlap.unwrap_or(config.chunking.overlap);
    let chunker = TextChunker::new(chunk_size, overlap)?;

    let result = ChunkOutput {
        chunk_size,
        overlap,
        fragments: chunker.chunk(&text),
    };
    output(&result, json);
    Ok(())
}
