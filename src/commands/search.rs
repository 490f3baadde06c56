//! Search command - query a collection or a domain adapter

use anyhow::{Context, Result};
use colored::Colorize;

use bizrag::{AdapterKind, BackendMode, DomainAdapter, HarmonicEmbedder, Query, Retriever, SearchResult, Settings};

use super::open_catalog;

pub struct SearchRequest {
    pub query: String,
    pub k: Option<usize>,
    pub module: Option<String>,
    pub tags: Option<String>,
    pub adapter: Option<AdapterKind>,
    pub collection: Option<String>,
    pub fallback: bool,
}

/// Run search command
pub fn run(settings: &Settings, request: &SearchRequest, json: bool) -> Result<()> {
    let mut settings = settings.clone();
    if request.fallback {
        settings.backend = BackendMode::Keyword;
    }
    let catalog = open_catalog(&settings);

    let (results, backend) = match request.adapter {
        Some(kind) => {
            let adapter = DomainAdapter::open(kind, catalog, &settings, Box::new(HarmonicEmbedder::new()))
                .with_context(|| format!("Failed to open {} adapter", kind))?;
            let results = adapter.search(&request.query, request.k)?;
            (results, adapter.retriever().active_backend())
        }
        None => {
            let collection = request
                .collection
                .clone()
                .unwrap_or_else(|| AdapterKind::General.collection().to_string());
            let retriever = Retriever::open(&collection, catalog, &settings, Box::new(HarmonicEmbedder::new()))
                .with_context(|| format!("Failed to open collection {}", collection))?;

            let mut query = Query::new(&request.query).with_k(request.k.unwrap_or(settings.default_k));
            if let Some(module) = &request.module {
                query = query.with_module(module);
            }
            if let Some(tags) = &request.tags {
                query = query.with_tags(tags);
            }
            let results = retriever.search(&query)?;
            (results, retriever.active_backend())
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&request.query, &results, backend);
    }

    Ok(())
}

fn print_results(query: &str, results: &[SearchResult], backend: &str) {
    if backend == "keyword" {
        println!(
            "{} Using keyword search (similarity index not available)",
            "!".yellow()
        );
        println!();
    }

    if results.is_empty() {
        println!("{} No results found for: {}", "→".dimmed(), query.cyan());
        return;
    }

    println!(
        "{} {} results for: {}",
        "→".dimmed(),
        results.len(),
        query.cyan()
    );
    println!();

    for (i, result) in results.iter().enumerate() {
        let score_str = format!("{:.2}", result.score);
        let score_colored = if result.score > 0.8 {
            score_str.green()
        } else if result.score > 0.6 {
            score_str.yellow()
        } else {
            score_str.dimmed()
        };

        println!(
            "{}. [{}] #{} {}",
            (i + 1).to_string().bold(),
            score_colored,
            result.doc_id,
            result.path.cyan()
        );
        println!("   {}", result.excerpt.replace('\n', " ").dimmed());
        if result.tags.is_empty() {
            println!("   {}", result.module);
        } else {
            println!("   {} | {}", result.module, result.tags.join(", "));
        }
        println!();
    }
}
