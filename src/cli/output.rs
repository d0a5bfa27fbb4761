//! Output formatting for CLI commands.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

use crate::domain::models::Fragment;
use crate::services::RetrievalOutcome;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate to `max_len` characters, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

/// A borderless list table with upper-case headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

fn numbered_table(texts: &[String], width: usize) -> Table {
    let mut table = list_table(&["#", "text"]);
    for (i, text) in texts.iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(truncate(text, width))]);
    }
    table
}

#[derive(Debug, Serialize)]
pub struct ChunkOutput {
    pub chunk_size: usize,
    pub overlap: usize,
    pub fragments: Vec<String>,
}

impl CommandOutput for ChunkOutput {
    fn to_human(&self) -> String {
        if self.fragments.is_empty() {
            return "No fragments produced.".to_string();
        }
        format!(
            "{} fragments (size {}, overlap {}):\n{}",
            self.fragments.len(),
            self.chunk_size,
            self.overlap,
            numbered_table(&self.fragments, 100)
        )
    }
}

#[derive(Debug, Serialize)]
pub struct StoredOutput {
    pub index: String,
    pub ids: Vec<String>,
}

impl CommandOutput for StoredOutput {
    fn to_human(&self) -> String {
        if self.ids.is_empty() {
            return format!("Nothing stored in {}.", self.index);
        }
        let mut table = list_table(&["id"]);
        for id in &self.ids {
            table.add_row(vec![id]);
        }
        format!("Stored {} fragments in {}:\n{table}", self.ids.len(), self.index)
    }
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub index: String,
    #[serde(flatten)]
    pub outcome: RetrievalOutcome,
}

impl CommandOutput for SearchOutput {
    fn to_human(&self) -> String {
        if self.outcome.fragments.is_empty() {
            return format!("No fragments found in {}.", self.index);
        }
        let path = match (self.outcome.used_filter, self.outcome.used_fallback) {
            (true, _) => "metadata filter",
            (false, true) => "similarity search (filter fallback)",
            (false, false) => "similarity search",
        };
        format!(
            "{} fragments from {} via {path}:\n{}",
            self.outcome.fragments.len(),
            self.index,
            numbered_table(&self.outcome.fragments, 120)
        )
    }
}

#[derive(Debug, Serialize)]
pub struct LookupOutput {
    pub index: String,
    pub field: String,
    pub value: String,
    pub fragments: Vec<Fragment>,
}

impl CommandOutput for LookupOutput {
    fn to_human(&self) -> String {
        if self.fragments.is_empty() {
            return format!("No records with {} = {}.", self.field, self.value);
        }
        let mut table = list_table(&["id", "text"]);
        for fragment in &self.fragments {
            table.add_row(vec![Cell::new(&fragment.id), Cell::new(fragment.preview())]);
        }
        format!(
            "{} records with {} = {}:\n{table}",
            self.fragments.len(),
            self.field,
            self.value
        )
    }
}

#[derive(Debug, Serialize)]
pub struct AnswerOutput {
    pub question: String,
    pub answer: String,
    pub contexts: usize,
}

impl CommandOutput for AnswerOutput {
    fn to_human(&self) -> String {
        self.answer.clone()
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryOutput {
    pub index: String,
    pub documents: usize,
    pub summary: String,
}

impl CommandOutput for SummaryOutput {
    fn to_human(&self) -> String {
        self.summary.clone()
    }
}

#[derive(Debug, Serialize)]
pub struct SqlOutput {
    pub question: String,
    pub sql: String,
}

impl CommandOutput for SqlOutput {
    fn to_human(&self) -> String {
        self.sql.clone()
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteOutput {
    pub index: String,
    pub deleted: usize,
}

impl CommandOutput for DeleteOutput {
    fn to_human(&self) -> String {
        format!("Deleted {} fragments from {}.", self.deleted, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ñandú ñandú ñandú", 8), "ñandú...");
    }

    #[test]
    fn test_search_output_json_is_flat() {
        let out = SearchOutput {
            index: "iot".to_string(),
            outcome: RetrievalOutcome {
                fragments: vec!["a".to_string()],
                used_filter: true,
                used_fallback: false,
            },
        };
        let json = out.to_json();
        assert_eq!(json["index"], "iot");
        assert_eq!(json["fragments"][0], "a");
        assert_eq!(json["used_filter"], true);
        assert!(out.to_human().contains("metadata filter"));
    }

    #[test]
    fn test_empty_outputs() {
        let out = StoredOutput {
            index: "docs".to_string(),
            ids: Vec::new(),
        };
        assert_eq!(out.to_human(), "Nothing stored in docs.");
    }
}
