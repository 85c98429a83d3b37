// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! etcdocker: keep Docker containers in line with their etcd definitions.

use std::io::IsTerminal;

use anyhow::Context;
use clap::Parser;
use ed_daemon::{lifecycle, Config};
use tracing_subscriber::EnvFilter;

const VERBOSE_FILTER: &str = "etcdocker=info,ed_daemon=info,ed_engine=info,ed_adapters=info";

#[derive(Parser)]
#[command(name = "etcdocker", version, about = "Run Docker containers described in etcd")]
struct Cli {
    /// etcd directory holding one subdirectory per container
    #[arg(value_name = "/etcd/path")]
    base_dir: String,

    /// Log reconciliation progress
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load();
    lifecycle::run(&config, &cli.base_dir)
        .await
        .with_context(|| format!("etcdocker failed for {}", cli.base_dir))?;
    Ok(())
}

/// `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_ansi(std::io::stdout().is_terminal())
        .init();
}
