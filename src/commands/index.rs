//! Index command - build similarity index collections

use anyhow::{Context, Result};
use colored::Colorize;

use bizrag::search::{BuildReport, VectorStore};
use bizrag::{BackendMode, HarmonicEmbedder, Retriever, Settings};

use super::{open_catalog, Target};

/// Run index command
pub fn run(settings: &Settings, targets: &[Target], status_only: bool, rebuild: bool, json: bool) -> Result<()> {
    if status_only {
        return show_status(settings, json);
    }

    if !settings.catalog_path.exists() {
        anyhow::bail!("Document catalogue not found: {}", settings.catalog_path.display());
    }

    // Indexing is pointless without the index, so never degrade silently here
    let settings = Settings {
        backend: BackendMode::Vector,
        ..settings.clone()
    };
    let catalog = open_catalog(&settings);

    let mut reports = Vec::new();
    for target in targets {
        let collection = target.collection();
        if !json {
            println!("{} Building {}...", "→".dimmed(), collection.cyan());
        }

        let mut retriever = Retriever::open(
            collection,
            catalog.clone(),
            &settings,
            Box::new(HarmonicEmbedder::new()),
        )
        .with_context(|| format!("Failed to open index for {}", collection))?;

        let mut report = retriever.last_build().cloned().unwrap_or_default();
        if rebuild && report.already_populated {
            if let Some(rebuilt) = retriever.rebuild()? {
                report = rebuilt;
            }
        }
        let entries = retriever.entry_count()?;
        retriever.close()?;

        reports.push((collection.to_string(), report, entries));
    }

    if json {
        let json_reports: Vec<_> = reports
            .iter()
            .map(|(collection, report, entries)| {
                serde_json::json!({
                    "collection": collection,
                    "already_populated": report.already_populated,
                    "documents_indexed": report.documents_indexed,
                    "documents_skipped": report.documents_skipped,
                    "chunks_written": report.chunks_written,
                    "batches_failed": report.batches_failed,
                    "entries": entries,
                    "duration_ms": report.duration_ms,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_reports)?);
    } else {
        println!();
        for (collection, report, entries) in &reports {
            print_report(collection, report, *entries);
        }
        println!(
            "  {} Index saved to: {}",
            "→".dimmed(),
            settings.index_path.display()
        );
    }

    Ok(())
}

fn print_report(collection: &str, report: &BuildReport, entries: usize) {
    if report.already_populated {
        println!(
            "{} {} already holds {} chunks (use {} to reindex)",
            "✓".green().bold(),
            collection.cyan(),
            entries,
            "--rebuild".cyan()
        );
        return;
    }

    println!(
        "{} Indexed {} documents into {} ({} chunks) in {:.2}s",
        "✓".green().bold(),
        report.documents_indexed.to_string().cyan(),
        collection.cyan(),
        report.chunks_written,
        report.duration_ms as f64 / 1000.0
    );
    if report.documents_skipped > 0 {
        println!(
            "  {} {} documents skipped (missing or empty)",
            "→".dimmed(),
            report.documents_skipped
        );
    }
    if report.batches_failed > 0 {
        println!("  {} {} batches failed", "✗".red(), report.batches_failed);
    }
}

/// Show index status
fn show_status(settings: &Settings, json: bool) -> Result<()> {
    let db_path = &settings.index_path;
    if !db_path.exists() {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "exists": false,
                    "error": "Index not found"
                })
            );
        } else {
            println!(
                "{} Index not found. Run {} first.",
                "!".yellow().bold(),
                "bizrag index".cyan()
            );
        }
        return Ok(());
    }

    let store = VectorStore::open(db_path)?;
    let stats = store.stats()?;
    let file_size = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    if json {
        let collections: Vec<_> = stats
            .iter()
            .map(|s| {
                serde_json::json!({
                    "collection": s.name,
                    "chunk_count": s.chunk_count,
                    "document_count": s.document_count,
                    "last_indexed": s.last_indexed,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "exists": true,
                "file_size_bytes": file_size,
                "collections": collections,
            })
        );
        return Ok(());
    }

    println!("{}", "Index Status".bold());
    println!();
    if stats.is_empty() {
        println!("  {} No collections indexed yet", "→".dimmed());
    }
    for s in &stats {
        let last = s
            .last_indexed
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        println!(
            "  {} {}: {} chunks from {} documents (last indexed {})",
            "→".dimmed(),
            s.name.cyan(),
            s.chunk_count,
            s.document_count,
            last
        );
    }
    println!(
        "  {} Size: {:.2} KB",
        "→".dimmed(),
        file_size as f64 / 1024.0
    );

    Ok(())
}
