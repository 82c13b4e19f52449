//! Interactive search session - prompt loop, reload flow, paged results

use anyhow::{bail, Result};
use colored::Colorize;
use inquire::error::{InquireError, InquireResult};
use inquire::Text;
use std::path::{Path, PathBuf};

use crate::core::config::PatternConfig;
use crate::search::embedding::HtpEmbedder;
use crate::search::engine::SearchSession;
use crate::search::pager::ResultPager;
use crate::search::ranker::DocumentScore;

const PROMPT: &str = "Enter a search string, '!load' to reload files, or 'exit' to quit";

/// Run the interactive search session
pub fn run(config_path: PathBuf, cache_path: PathBuf, page_size: usize) -> Result<()> {
    // The pattern file must exist up front; it is re-read on every reload
    // and search so edits are picked up without restarting.
    PatternConfig::load(&config_path)?;

    let mut session = SearchSession::open(HtpEmbedder::new(), cache_path)?;

    print_status(&session);

    loop {
        let line = match Text::new(PROMPT).prompt() {
            InquireResult::Ok(line) => line,
            InquireResult::Err(
                InquireError::OperationCanceled | InquireError::OperationInterrupted,
            ) => break,
            InquireResult::Err(err) => bail!("An error occurred: {}", err),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            break;
        }
        if input == "!load" {
            reload(&mut session, &config_path)?;
            continue;
        }

        search(&session, input, &config_path, page_size)?;
    }

    println!("{} Exiting.", "→".dimmed());
    Ok(())
}

/// Show cache status on startup
fn print_status(session: &SearchSession<HtpEmbedder>) {
    println!("{}", "docsim interactive search".bold());
    println!();

    if session.has_embeddings() {
        let cache = session.cache();
        println!(
            "  {} {} documents cached ({} segments)",
            "→".dimmed(),
            cache.document_count().to_string().cyan(),
            cache.segment_count()
        );
        println!(
            "  {} Last loaded: {}",
            "→".dimmed(),
            cache.built_at.format("%Y-%m-%d %H:%M:%S")
        );
    } else {
        println!(
            "  {} No embeddings cached. Enter {} to embed the configured documents.",
            "!".yellow().bold(),
            "'!load'".cyan()
        );
    }
    println!();
}

/// Re-resolve the configured patterns and rebuild the embedding cache
fn reload(session: &mut SearchSession<HtpEmbedder>, config_path: &Path) -> Result<()> {
    let config = PatternConfig::load(config_path)?;
    let paths = config.resolve()?;

    match inquire::prompt_confirmation(format!(
        "You are about to embed {} documents. Do you want to proceed?",
        paths.len()
    )) {
        InquireResult::Ok(true) => {}
        InquireResult::Ok(false)
        | InquireResult::Err(
            InquireError::OperationCanceled | InquireError::OperationInterrupted,
        ) => {
            println!("{} Loading cancelled.", "→".dimmed());
            return Ok(());
        }
        InquireResult::Err(err) => bail!("An error occurred: {}", err),
    }

    println!("{} Embedding documents...", "→".dimmed());

    match session.rebuild(&paths) {
        Ok(stats) => {
            println!(
                "{} Embedded {} documents ({} segments) in {:.2}s",
                "✓".green().bold(),
                stats.documents.to_string().cyan(),
                stats.segments,
                stats.duration_ms as f64 / 1000.0
            );
        }
        Err(err) => {
            println!("{} Reload failed: {}", "✗".red(), err);
            println!(
                "  {} The previous cache, if any, was left unchanged.",
                "→".dimmed()
            );
        }
    }
    println!();
    Ok(())
}

/// Rank the configured documents against a query and page through the results
fn search(
    session: &SearchSession<HtpEmbedder>,
    query: &str,
    config_path: &Path,
    page_size: usize,
) -> Result<()> {
    if !session.has_embeddings() {
        println!(
            "{} No embeddings found. Enter {} to embed the configured documents.",
            "!".yellow().bold(),
            "'!load'".cyan()
        );
        return Ok(());
    }

    let config = PatternConfig::load(config_path)?;
    let paths = config.resolve()?;

    let results = match session.query(query, &paths) {
        Ok(results) => results,
        Err(err) => {
            println!("{} Search failed: {}", "✗".red(), err);
            return Ok(());
        }
    };

    if results.is_empty() {
        println!("{} No results found for: {}", "→".dimmed(), query.cyan());
        println!();
        return Ok(());
    }

    println!(
        "{} {} results for: {}",
        "→".dimmed(),
        results.len(),
        query.cyan()
    );
    println!();

    let pager = ResultPager::new(results, page_size);
    let mut offset = 0;

    loop {
        let page = pager.page(offset);
        for (i, result) in page.entries.iter().enumerate() {
            print_result(page.start + i + 1, result);
        }
        if !page.has_more() {
            break;
        }

        match inquire::prompt_confirmation(format!(
            "{} more results. Show next page?",
            page.remaining
        )) {
            InquireResult::Ok(true) => {
                offset += pager.page_size();
                println!();
            }
            InquireResult::Ok(false)
            | InquireResult::Err(
                InquireError::OperationCanceled | InquireError::OperationInterrupted,
            ) => break,
            InquireResult::Err(err) => bail!("An error occurred: {}", err),
        }
    }

    println!();
    Ok(())
}

fn print_result(rank: usize, result: &DocumentScore) {
    let score_str = format!("{:.2}", result.score);
    let score_colored = if result.score > 0.8 {
        score_str.green()
    } else if result.score > 0.6 {
        score_str.yellow()
    } else {
        score_str.dimmed()
    };

    println!(
        "{}. [{}] {}",
        rank.to_string().bold(),
        score_colored,
        result.path.cyan()
    );
}
