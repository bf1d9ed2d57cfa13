//! Simulate command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use kz_physics::theoretical_kink_density;
use kz_sched::{
    CycleSearchFinder, JsonEmbeddingStore, ParameterUpdate, ProblemKind, Session, SubmitState,
};

use super::common::{create_registry, load_config};

/// Arguments of the simulate command.
pub struct SimulateArgs {
    pub ring_size: usize,
    pub coupling_strength: f64,
    pub anneal_time_ns: u32,
    pub sampler: Option<String>,
    pub zne: bool,
}

/// Execute the simulate command.
pub async fn execute(config_path: Option<&str>, args: SimulateArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let registry = create_registry(&config).await;
    let repository = Arc::new(JsonEmbeddingStore::new(&config.embeddings_dir).await?);
    let finder = Arc::new(CycleSearchFinder::new(config.embedding_timeout()));

    let mut session = Session::new(config, registry, repository, finder);
    session.start().await?;
    if let Some(name) = &args.sampler {
        session.select_sampler(name).await?;
    }
    let Some(sampler_name) = session.sampler_name().map(str::to_string) else {
        anyhow::bail!("No sampler available");
    };

    let kind = if args.zne {
        ProblemKind::ZeroNoise
    } else {
        ProblemKind::KibbleZurek
    };
    session.set_parameters(ParameterUpdate {
        ring_size: Some(args.ring_size),
        coupling_strength: Some(args.coupling_strength),
        anneal_time_ns: Some(args.anneal_time_ns),
        kind: Some(kind),
        ..Default::default()
    })?;

    println!(
        "{} Simulating a {}-spin ring, J = {}, {} ns on {}",
        style("→").cyan().bold(),
        style(args.ring_size).green(),
        args.coupling_strength,
        args.anneal_time_ns,
        style(&sampler_name).yellow()
    );
    println!(
        "  Schedule: {} ({:?})",
        session.schedule().file_name,
        session.schedule().quality
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut state = session.submit().await?;
    if session.classical_warning() {
        spinner.println(format!(
            "  {} The classical sampler does not show the Kibble-Zurek mechanism",
            style("!").yellow().bold()
        ));
    }
    while !session.timer().disabled {
        let (percent, _) = state.progress();
        spinner.set_message(format!("{state} ({percent}%)"));
        tokio::time::sleep(Duration::from_millis(session.timer().interval_ms)).await;
        state = session.tick().await?;
    }
    spinner.finish_and_clear();

    if state != SubmitState::Completed {
        let reason = session.last_error().unwrap_or("no samples returned");
        anyhow::bail!("Job ended in state {state}: {reason}");
    }
    let Some(result) = session.last_result() else {
        anyhow::bail!("Job completed without samples");
    };

    println!("  {} {}", style("✓").green().bold(), state);
    if let Some(id) = &session.job().id {
        println!("  Job: {}", style(id).dim());
    }
    println!(
        "  Kink density: {}",
        style(format!("{:.5}", result.stats.mean_kink_density)).bold()
    );

    let j_theory = if args.zne {
        session.config().j_baseline
    } else {
        args.coupling_strength
    };
    match theoretical_kink_density(
        &[f64::from(args.anneal_time_ns)],
        j_theory,
        &session.schedule().schedule,
    ) {
        Ok(theory) => println!("  Theory:       {:.5}", theory[0]),
        Err(e) => println!("  Theory:       unavailable ({e})"),
    }

    if let Some(lambda) = result.lambda {
        println!("  Lambda:       {lambda:.4}");
    }
    if let Some(estimate) = session.zne_estimates().get(&args.anneal_time_ns) {
        println!("  ZNE estimate: {estimate:.5}");
    }
    if let Some(error) = session.last_error() {
        println!("  {} {}", style("!").yellow().bold(), error);
    }

    Ok(())
}
