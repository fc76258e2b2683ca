//! Terminal output for search results and structured citations.
//!
//! Provides colored, width-aware rendering of raw citation lists, structured
//! records, disambiguation options, and error notices, plus a spinner for
//! in-flight requests.

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::models::{StructuredCitation, TopicKind, TopicOption, UNKNOWN_BOOK};
use crate::sort::SortedCitation;
use crate::utils::clean_citation;
use crate::ParsedCitationMap;

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Truncate text to fit within `max_width` columns, unicode-aware, appending
/// an ellipsis when something was cut.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let width_of = |c: char| unicode_width::UnicodeWidthChar::width(c).unwrap_or(1);
    let total: usize = text.chars().map(width_of).sum();
    if total <= max_width {
        return text.to_string();
    }

    let mut used = 0;
    let mut kept = String::new();
    for c in text.chars() {
        let w = width_of(c);
        if used + w > max_width - 3 {
            break;
        }
        used += w;
        kept.push(c);
    }
    format!("{}...", kept)
}

/// Spinner shown while a request is in flight; a no-op off-terminal.
pub fn request_spinner(message: &str) -> Option<indicatif::ProgressBar> {
    if !is_terminal() {
        return None;
    }
    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    Some(spinner)
}

/// Print the results header: resolved page title and citation count.
pub fn print_results_header(page_title: &str, count: usize) {
    println!();
    println!(
        "{} {}",
        "━━━".cyan(),
        page_title.bold().cyan()
    );
    println!(
        "{} citation{}",
        count.to_string().green().bold(),
        if count == 1 { "" } else { "s" }
    );
    println!();
}

/// Notice for a successful search that carried no citations.
pub fn print_no_results() {
    println!();
    println!(
        "{}",
        "No books with ISBN numbers found for this topic.".yellow()
    );
}

/// Print raw citations in display order, numbered by display position.
pub fn print_raw_citations(view: &[SortedCitation<'_>], limit: usize, clean: bool) {
    let width = terminal_width().saturating_sub(6);
    let shown = effective_limit(view.len(), limit);

    for (position, item) in view.iter().take(shown).enumerate() {
        let text = display_text(item.citation, clean);
        println!(
            "{:>3}  {}",
            (position + 1).to_string().dimmed(),
            truncate_with_ellipsis(&text, width)
        );
    }

    print_overflow(view.len(), shown);
}

/// Print citations with their structured records where available, falling
/// back to the raw string for unparsed indices.
pub fn print_structured_citations(
    view: &[SortedCitation<'_>],
    parsed: Option<&ParsedCitationMap>,
    limit: usize,
    clean: bool,
) {
    let shown = effective_limit(view.len(), limit);

    for (position, item) in view.iter().take(shown).enumerate() {
        let number = format!("{:>3}", position + 1);
        match parsed.and_then(|map| map.get(&item.original_index)) {
            Some(record) => print_record(&number, record),
            None => {
                let text = display_text(item.citation, clean);
                println!(
                    "{}  {}",
                    number.dimmed(),
                    truncate_with_ellipsis(&text, terminal_width().saturating_sub(6))
                );
            }
        }
    }

    print_overflow(view.len(), shown);
}

fn print_record(number: &str, record: &StructuredCitation) {
    match record {
        StructuredCitation::Work(work) => {
            println!("{}  {}", number.dimmed(), record.primary_title().bold().blue());
            println!("     Author: {}", record.primary_authors());
            if let Some(editor) = work.editor.as_deref() {
                println!("     Editor: {}", editor);
            }
        }
        StructuredCitation::Chapter(chapter) => {
            let book = chapter.book_title.as_deref().unwrap_or(UNKNOWN_BOOK);
            println!("{}  {}", number.dimmed(), book.bold().blue());
            if let Some(book_authors) = chapter.book_authors.as_deref() {
                println!("     Book Authors: {}", book_authors);
            }
            println!("     Chapter: {}", chapter.chapter_title.italic());
            println!("     Chapter Author: {}", record.primary_authors());
        }
    }
    if let Some(year) = record.year() {
        println!("     Year: {}", year.yellow());
    }
    if let Some(isbn) = record.isbn() {
        println!("     ISBN: {}", isbn);
    }
    if let Some(rest) = record.remaining_text() {
        println!("     {}", rest.dimmed());
    }
}

/// Render the structured view as a table.
pub fn citations_table(
    view: &[SortedCitation<'_>],
    parsed: Option<&ParsedCitationMap>,
    limit: usize,
    clean: bool,
) -> comfy_table::Table {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["#", "Kind", "Title", "Authors", "Year", "ISBN"]);

    let shown = effective_limit(view.len(), limit);
    for (position, item) in view.iter().take(shown).enumerate() {
        match parsed.and_then(|map| map.get(&item.original_index)) {
            Some(record) => {
                table.add_row(vec![
                    Cell::new(position + 1),
                    Cell::new(if record.is_chapter() { "chapter" } else { "work" }),
                    Cell::new(truncate_with_ellipsis(record.primary_title(), 50)),
                    Cell::new(truncate_with_ellipsis(record.primary_authors(), 30)),
                    Cell::new(record.year().unwrap_or("")),
                    Cell::new(record.isbn().unwrap_or("")),
                ]);
            }
            None => {
                let text = display_text(item.citation, clean);
                table.add_row(vec![
                    Cell::new(position + 1),
                    Cell::new("raw"),
                    Cell::new(truncate_with_ellipsis(&text, 86)),
                    Cell::new(""),
                    Cell::new(""),
                    Cell::new(""),
                ]);
            }
        }
    }

    table
}

/// Print disambiguation or suggestion options with selection numbers.
pub fn print_topic_options(kind: TopicKind, options: &[TopicOption]) {
    println!();
    let heading = match kind {
        TopicKind::Disambiguation => "The topic is ambiguous; did you mean:",
        TopicKind::Suggestions => "No exact match; closest topics:",
    };
    println!("{}", heading.bold());
    for (index, option) in options.iter().enumerate() {
        if option.display_text.is_some() {
            println!(
                "{:>3}  {} {}",
                (index + 1).to_string().cyan(),
                option.title.bold(),
                format!("— {}", option.label()).dimmed()
            );
        } else {
            println!("{:>3}  {}", (index + 1).to_string().cyan(), option.title.bold());
        }
    }
}

/// Print an error notice.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a non-fatal warning notice.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

fn display_text(citation: &str, clean: bool) -> String {
    if clean {
        clean_citation(citation)
    } else {
        citation.to_string()
    }
}

fn effective_limit(len: usize, limit: usize) -> usize {
    if limit == 0 {
        len
    } else {
        limit.min(len)
    }
}

fn print_overflow(total: usize, shown: usize) {
    if total > shown {
        println!("{}", format!("     … and {} more", total - shown).dimmed());
    }
}
