//! Samplers command implementation.

use anyhow::Result;
use console::style;

use super::common::{create_registry, load_config};

/// Execute the samplers command.
pub async fn execute(config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let registry = create_registry(&config).await;

    println!("{} Available samplers:\n", style("kz").cyan().bold());

    if registry.is_empty() {
        println!("  {} {}", style("○").red(), style("NO SOLVER").bold());
        println!("    Set KZ_API_ENDPOINT and KZ_API_TOKEN, or enable use_classical");
        return Ok(());
    }

    for (i, sampler) in registry.iter().enumerate() {
        let properties = sampler.properties();
        println!(
            "  {} {} {}",
            style("●").green(),
            style(sampler.name()).bold(),
            if properties.is_classical {
                "(local)"
            } else if i == 0 {
                "(default)"
            } else {
                ""
            }
        );
        println!(
            "    Qubits: {}, couplers: {}",
            properties.topology.num_qubits(),
            properties.topology.edges.len()
        );
        let (min, max) = properties.anneal_time_range_us;
        println!("    Anneal time: {min} - {max} us");
        println!("    Max reads: {}", properties.max_num_reads);
        println!();
    }

    Ok(())
}
