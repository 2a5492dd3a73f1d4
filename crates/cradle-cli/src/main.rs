//! # crdl — cradle CLI
//!
//! Minimal single-container runtime: namespaces, `pivot_root`, cgroup v2
//! memory limits, and bridged networking behind one binary.

mod commands;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
