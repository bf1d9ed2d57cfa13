//! Embed command implementation.

use std::time::Instant;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use kz_sched::{
    EmbeddingRepository, JsonEmbeddingStore, SchedError, find_one_to_one_embedding,
};

use super::common::{create_registry, load_config, pick_sampler};

/// Execute the embed command.
pub async fn execute(
    config_path: Option<&str>,
    ring_size: usize,
    sampler: Option<&str>,
    save: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let registry = create_registry(&config).await;
    let sampler = pick_sampler(&registry, sampler)?;

    println!(
        "{} Embedding a {}-spin ring on {}",
        style("→").cyan().bold(),
        style(ring_size).green(),
        style(sampler.name()).yellow()
    );
    if sampler.is_classical() {
        println!("  Note: the classical sampler runs without an embedding");
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Searching for a cycle...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let edges = sampler.properties().topology.edges.clone();
    let timeout = config.embedding_timeout();
    let start = Instant::now();
    let result = tokio::task::spawn_blocking(move || {
        find_one_to_one_embedding(ring_size, &edges, timeout)
    })
    .await
    .map_err(|e| anyhow::anyhow!("Embedding search task failed: {e}"))?;
    spinner.finish_and_clear();

    let embedding = match result {
        Ok(embedding) => embedding,
        Err(e @ (SchedError::EmbeddingNotFound(_) | SchedError::EmbeddingTimeout { .. })) => {
            println!("  {} {}", style("✗").red().bold(), e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "  {} Found in {:.2?}",
        style("✓").green().bold(),
        start.elapsed()
    );
    let qubits: Vec<String> = (0..ring_size as u32)
        .filter_map(|spin| embedding.qubit(spin))
        .map(|q| q.to_string())
        .collect();
    println!("  Qubits: {}", qubits.join(" "));

    if save {
        let store = JsonEmbeddingStore::new(&config.embeddings_dir).await?;
        let mut cache = store.load(sampler.name()).await?;
        cache.merge_discovered(ring_size, embedding);
        store.save(sampler.name(), &cache).await?;
        println!(
            "  Saved to {}",
            style(store.cache_path(sampler.name()).display()).dim()
        );
    }

    Ok(())
}
