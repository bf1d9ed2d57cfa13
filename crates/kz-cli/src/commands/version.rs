//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - Kibble-Zurek experiments on quantum annealers",
        style("kz").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  kz-hal        Sampler abstraction layer");
    println!("  kz-physics    Ring model, kink statistics, schedules, lambda/ZNE fits");
    println!("  kz-sched      Embedding cache and job lifecycle");
    println!("  kz-dashboard  HTTP back-end for the dashboard");
    println!("  kz-cli        Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style("https://github.com/kz-lab/kibble-zurek").underlined()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}
