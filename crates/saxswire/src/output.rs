use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line.
    Json,
    /// A table printed once all rows are collected.
    Table,
    /// One human-readable line per row.
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A report row that can be rendered in every [`OutputFormat`].
pub trait Row: Serialize {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;

    fn pretty(&self) -> String;
}

/// Streams rows to stdout in the chosen format.
///
/// JSON and pretty rows are printed as they arrive so a long decode shows
/// progress; table rows are held until [`finish`](Self::finish).
pub struct Printer {
    format: OutputFormat,
    table: Option<Table>,
}

impl Printer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            table: None,
        }
    }

    pub fn emit<R: Row>(&mut self, row: &R) {
        match self.format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string(row).unwrap_or_else(|_| "{}".to_string())
            ),
            OutputFormat::Pretty => println!("{}", row.pretty()),
            OutputFormat::Table => {
                let table = self.table.get_or_insert_with(|| {
                    let mut table = Table::new();
                    table
                        .load_preset(UTF8_FULL)
                        .set_content_arrangement(ContentArrangement::Dynamic)
                        .set_header(R::HEADERS.to_vec());
                    table
                });
                table.add_row(row.cells());
            }
        }
    }

    pub fn finish(self) {
        if let Some(table) = self.table {
            println!("{table}");
        }
    }
}

/// Render a float range compactly for tables.
pub fn range(values: &[f64]) -> String {
    if values.is_empty() {
        return "-".to_string();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    format!("{min:.4}..{max:.4}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_formats_bounds() {
        assert_eq!(range(&[0.3, 0.1, 0.2]), "0.1000..0.3000");
        assert_eq!(range(&[]), "-");
    }
}
