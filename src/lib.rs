pub mod collections;
pub mod config;
pub mod controller;
pub mod error;
pub mod filters;
pub mod history;
pub mod model;
pub mod request;
pub mod suggest;
pub mod tokens;
pub mod transport;
pub mod view;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::collections::CollectionLoader;
use crate::config::ClientConfig;
use crate::controller::SearchController;
use crate::filters::FilterCatalog;
use crate::history::SavedSearches;
use crate::model::{AddTerm, Category, FilterValue, SearchState};
use crate::suggest::SuggestionController;
use crate::tokens::TokenStore;
use crate::transport::HttpTransport;
use crate::view::ConsoleView;

fn parse_category(s: &str) -> Result<Category, String> {
    s.parse()
}

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "psearch",
    version,
    about = "Search client for the research portal API"
)]
pub struct Cli {
    /// Override the portal base URL (also PORTAL_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a search (up to three terms, OR-combined)
    Search {
        terms: Vec<String>,

        #[arg(long, default_value = "clinical_study", value_parser = parse_category)]
        category: Category,

        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Status filter; repeat for multiple values
        #[arg(long)]
        status: Vec<String>,

        #[arg(long)]
        phase: Option<String>,

        #[arg(long)]
        drug: Option<String>,

        #[arg(long)]
        start_date: Option<String>,

        #[arg(long)]
        end_date: Option<String>,

        #[arg(long)]
        indication_category: Option<String>,

        #[arg(long)]
        severity: Option<String>,

        #[arg(long)]
        procedure_category: Option<String>,

        #[arg(long)]
        risk_level: Option<String>,

        /// Minimum duration in days
        #[arg(long)]
        min_duration: Option<String>,

        /// Maximum duration in days
        #[arg(long)]
        max_duration: Option<String>,
    },
    /// Fetch query suggestions
    Suggest {
        query: String,

        #[arg(long, default_value = "clinical_study", value_parser = parse_category)]
        category: Category,
    },
    /// List your saved collections
    Collections,
    /// Add items to a collection
    CollectionAdd {
        id: i64,
        item_ids: Vec<String>,
    },
    /// Create a collection
    CollectionCreate {
        title: String,

        #[arg(long)]
        description: Option<String>,
    },
    /// Save a search to your history
    Save {
        terms: Vec<String>,

        #[arg(long, default_value = "clinical_study", value_parser = parse_category)]
        category: Category,

        #[arg(long, default_value_t = 0)]
        results_count: usize,
    },
    /// Show the dynamic filter options for clinical studies
    Filters,
}

fn build_state(
    terms: &[String],
    category: Category,
    page: u32,
    status: Vec<String>,
    text_filters: Vec<(&str, Option<String>)>,
    duration: (Option<String>, Option<String>),
) -> SearchState {
    let mut state = SearchState::new(category);
    for term in terms {
        if state.add_term(term) == AddTerm::LimitReached {
            eprintln!("Maximum 3 search terms allowed; ignoring '{term}'");
        }
    }
    if !status.is_empty() {
        state.set_filter("status", FilterValue::Many(status));
    }
    for (key, value) in text_filters {
        if let Some(value) = value {
            state.set_filter(key, FilterValue::Text(value));
        }
    }
    let (min, max) = duration;
    if min.is_some() || max.is_some() {
        state.set_filter("duration", FilterValue::Range { min, max });
    }
    state.set_page(page);
    state
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = ClientConfig::from_env();
    if let Some(base) = cli.base_url {
        cfg.base_url = base.trim_end_matches('/').to_string();
    }

    let transport = Arc::new(HttpTransport::new(&cfg)?);
    let tokens = Arc::new(TokenStore::new(transport.clone(), &cfg));
    let view = Arc::new(ConsoleView);

    match cli.command {
        Commands::Search {
            terms,
            category,
            page,
            status,
            phase,
            drug,
            start_date,
            end_date,
            indication_category,
            severity,
            procedure_category,
            risk_level,
            min_duration,
            max_duration,
        } => {
            let state = build_state(
                &terms,
                category,
                page,
                status,
                vec![
                    ("phase", phase),
                    ("drug", drug),
                    ("start_date", start_date),
                    ("end_date", end_date),
                    ("indication_category", indication_category),
                    ("severity", severity),
                    ("procedure_category", procedure_category),
                    ("risk_level", risk_level),
                ],
                (min_duration, max_duration),
            );
            let controller = SearchController::new(transport, tokens, view, &cfg);
            controller.search(&state).await;
        }
        Commands::Suggest { query, category } => {
            let controller = SuggestionController::new(transport, tokens, view, &cfg);
            controller.on_input(&query, category).await;
        }
        Commands::Collections => {
            let loader = CollectionLoader::new(transport, tokens, view, &cfg);
            loader.load().await;
        }
        Commands::CollectionAdd { id, item_ids } => {
            let loader = CollectionLoader::new(transport, tokens, view, &cfg);
            loader.add_items(id, &item_ids).await;
        }
        Commands::CollectionCreate { title, description } => {
            let loader = CollectionLoader::new(transport, tokens, view, &cfg);
            loader.create(&title, description.as_deref()).await;
        }
        Commands::Save {
            terms,
            category,
            results_count,
        } => {
            let mut state = SearchState::new(category);
            for term in &terms {
                state.add_term(term);
            }
            let saver = SavedSearches::new(transport, tokens, view, &cfg);
            saver.save_current(&state, results_count).await;
        }
        Commands::Filters => {
            let catalog = FilterCatalog::new(transport, tokens, view);
            catalog.populate(Category::ClinicalStudy).await;
        }
    }

    Ok(())
}
