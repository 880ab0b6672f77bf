//! Rendering of search matches

use std::collections::BTreeSet;
use std::io::{self, Write};
use strum::{Display, EnumString};

use crate::models::{display_value, SearchMatch};
use crate::search::SearchQuery;

/// Printed instead of an empty table or list
pub const NO_MATCHES: &str = "No matching events found.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
    Values,
}

/// Render matches in the given format, without any header line
pub fn render(matches: &[SearchMatch], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => render_table(matches),
        OutputFormat::Json => render_json(matches),
        OutputFormat::Csv => render_csv(matches),
        OutputFormat::Values => render_values(matches),
    }
}

fn render_table(matches: &[SearchMatch]) -> String {
    let values: Vec<String> = matches.iter().map(|m| display_value(&m.value)).collect();
    let id_width = matches.iter().map(|m| m.event_id.chars().count()).max().unwrap_or(0);
    let value_width = values.iter().map(|v| v.chars().count()).max().unwrap_or(0);

    let mut lines = Vec::with_capacity(matches.len() + 2);
    lines.push(format!("{:<id_width$} | {:<value_width$} | File", "Event ID", "Value"));
    lines.push("-".repeat(id_width + value_width + 50));
    for (m, value) in matches.iter().zip(&values) {
        lines.push(format!(
            "{:<id_width$} | {:<value_width$} | {}",
            m.event_id,
            value,
            m.file_path.display()
        ));
    }
    lines.join("\n")
}

fn render_json(matches: &[SearchMatch]) -> String {
    // Serializing plain strings, paths and JSON values cannot fail
    serde_json::to_string_pretty(matches).unwrap_or_else(|_| "[]".to_string())
}

fn render_csv(matches: &[SearchMatch]) -> String {
    let mut lines = vec!["event_id,prop_path,value,file_path".to_string()];
    lines.extend(matches.iter().map(|m| {
        format!(
            "{},{},{},{}",
            m.event_id,
            m.prop_path,
            display_value(&m.value).replace(',', ";"),
            m.file_path.display()
        )
    }));
    lines.join("\n")
}

fn render_values(matches: &[SearchMatch]) -> String {
    let unique: BTreeSet<String> = matches.iter().map(|m| display_value(&m.value)).collect();
    unique.into_iter().collect::<Vec<_>>().join("\n")
}

/// Write the lines announcing what is about to be searched
pub fn write_search_header<W: Write>(
    out: &mut W,
    file_count: usize,
    query: &SearchQuery,
) -> io::Result<()> {
    writeln!(out, "Searching {file_count} event files for Custom Prop: {}", query.prop_path)?;
    if let Some(filter) = query.value_filter.as_deref().filter(|f| !f.is_empty()) {
        let sensitivity = if query.case_sensitive {
            "case-sensitive"
        } else {
            "case-insensitive"
        };
        writeln!(out, "Filtering by value: '{filter}' ({sensitivity})")?;
    }
    Ok(())
}

/// Write the match count header followed by the rendered matches
pub fn write_results<W: Write>(
    out: &mut W,
    matches: &[SearchMatch],
    format: OutputFormat,
) -> io::Result<()> {
    if matches.is_empty() {
        return writeln!(out, "\n{NO_MATCHES}");
    }

    writeln!(out, "\nFound {} matching event(s):\n", matches.len())?;
    writeln!(out, "{}", render(matches, format))
}
