//! Terminal output helpers
//!
//! Diagnostics go to stderr so that `--json` output on stdout stays parseable.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};

pub fn error(msg: &str) {
    eprintln!("{} {}", "error:".red().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

/// Dimmed follow-up line under a listing
pub fn hint(msg: &str) {
    println!("{}", msg.dimmed());
}

/// Table with the given header, wrapped to the terminal width
pub fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}
