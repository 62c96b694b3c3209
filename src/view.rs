//! Renderer collaborator seams.
//!
//! The controllers publish outcomes through these traits and never touch
//! markup themselves, so the orchestration logic runs the same against the
//! console renderer, a web view, or the recording fakes used in tests.

use colored::Colorize;

use crate::model::{Collection, ResultItem, SearchOutcome, Suggestion};

/// Pagination controls derived from a search outcome. `None` is rendered
/// (nothing) when a single page covers the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageControls {
    pub current: u32,
    pub total_pages: u32,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

impl PageControls {
    /// Page numbers to display, in order.
    pub fn pages(&self) -> std::ops::RangeInclusive<u32> {
        1..=self.total_pages
    }
}

/// Transient banners and navigation shared by the auth-gated flows.
pub trait StatusView: Send + Sync {
    fn notify_success(&self, message: &str);
    fn show_error(&self, message: &str);
    /// Navigate away (login redirects). Terminal for the current flow.
    fn redirect(&self, location: &str);
}

/// Consumer of search outcomes.
pub trait SearchView: Send + Sync {
    fn loading_started(&self);
    fn loading_finished(&self);
    fn render_results(&self, outcome: &SearchOutcome);
    /// Informational empty state; not an error.
    fn render_empty(&self);
    fn render_pagination(&self, controls: Option<&PageControls>);
    fn show_error(&self, message: &str);
    fn redirect(&self, location: &str);
}

/// Consumer of query suggestions.
pub trait SuggestView: Send + Sync {
    fn render_suggestions(&self, suggestions: &[Suggestion]);
    fn hide_suggestions(&self);
}

/// Consumer of the saved-collections list.
pub trait CollectionsView: StatusView {
    fn render_collections(&self, collections: &[Collection]);
    fn collections_empty(&self);
    /// Inline error in the collections container.
    fn collections_error(&self, message: &str);
}

/// Consumer of dynamic filter options.
pub trait FilterView: Send + Sync {
    fn render_filter_options(&self, key: &str, options: &[String]);
}

/// Terminal renderer used by the `psearch` binary.
#[derive(Debug, Default)]
pub struct ConsoleView;

impl ConsoleView {
    fn print_result(&self, item: &ResultItem) {
        println!("{}", item.title.bold());
        let mut badges = vec![item.kind.clone().unwrap_or_else(|| "unknown".into())];
        if let Some(details) = &item.study_details {
            if let Some(phase) = &details.phase {
                badges.push(format!("phase {phase}"));
            }
            if let Some(status) = &details.status {
                badges.push(format!("status {status}"));
            }
            if let Some(drug) = &details.drug {
                badges.push(format!("drug {drug}"));
            }
            if let Some(risk) = &details.risk_level {
                badges.push(format!("risk {risk}"));
            }
        }
        println!("  {}", badges.join(" | ").cyan());
        if let Some(description) = &item.description {
            println!("  {description}");
        }
        if let Some(details) = &item.study_details {
            if let Some(institution) = &details.institution {
                println!("  institution: {institution}");
            }
            if let Some(count) = details.participant_count {
                println!("  participants: {count}");
            }
            if let (Some(start), Some(end)) = (&details.start_date, &details.end_date) {
                println!("  {start} .. {end}");
            }
            if let Some(duration) = details.duration {
                println!("  duration: {duration} days");
            }
        }
        for dp in &item.data_products {
            println!(
                "  {} {} ({}, {}, {})",
                "data:".dimmed(),
                dp.title,
                dp.kind,
                dp.format.as_deref().unwrap_or("N/A"),
                dp.access_level.as_deref().unwrap_or("Public"),
            );
        }
    }
}

impl StatusView for ConsoleView {
    fn notify_success(&self, message: &str) {
        println!("{}", message.green());
    }

    fn show_error(&self, message: &str) {
        eprintln!("{}", message.red());
    }

    fn redirect(&self, location: &str) {
        eprintln!("{} {}", "login required:".yellow(), location);
    }
}

impl SearchView for ConsoleView {
    fn loading_started(&self) {
        eprintln!("{}", "searching...".dimmed());
    }

    fn loading_finished(&self) {}

    fn render_results(&self, outcome: &SearchOutcome) {
        for item in &outcome.results {
            self.print_result(item);
            println!();
        }
        println!(
            "{} results, page {} ({} per page)",
            outcome.total, outcome.page, outcome.per_page
        );
    }

    fn render_empty(&self) {
        println!("No results found. Try a different search term or adjust your filters.");
    }

    fn render_pagination(&self, controls: Option<&PageControls>) {
        if let Some(controls) = controls {
            println!("page {} of {}", controls.current, controls.total_pages);
        }
    }

    fn show_error(&self, message: &str) {
        StatusView::show_error(self, message);
    }

    fn redirect(&self, location: &str) {
        StatusView::redirect(self, location);
    }
}

impl SuggestView for ConsoleView {
    fn render_suggestions(&self, suggestions: &[Suggestion]) {
        for s in suggestions {
            println!("{} ({})", s.text, s.kind.dimmed());
        }
    }

    fn hide_suggestions(&self) {}
}

impl CollectionsView for ConsoleView {
    fn render_collections(&self, collections: &[Collection]) {
        for c in collections {
            match &c.description {
                Some(desc) => println!("[{}] {}: {}", c.id, c.title.bold(), desc),
                None => println!("[{}] {}", c.id, c.title.bold()),
            }
        }
    }

    fn collections_empty(&self) {
        println!("No collections yet. Create your first collection.");
    }

    fn collections_error(&self, message: &str) {
        eprintln!("{}", message.red());
    }
}

impl FilterView for ConsoleView {
    fn render_filter_options(&self, key: &str, options: &[String]) {
        println!("{}: {}", key.bold(), options.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_controls_enumerate_pages() {
        let controls = PageControls {
            current: 2,
            total_pages: 4,
            prev_enabled: true,
            next_enabled: true,
        };
        assert_eq!(controls.pages().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }
}
