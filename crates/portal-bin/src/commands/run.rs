// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use tracing::info;

use crate::cli::{Cli, RunArgs};
use crate::error::BinResult;
use crate::runtime::RuntimeBuilder;

/// Executes the `run` command to start the portal.
pub async fn run(cli: &Cli, args: RunArgs) -> BinResult<()> {
    info!(config = %cli.config.display(), dev = args.dev, "Starting portal");

    let runtime = RuntimeBuilder::new()
        .config_path(&cli.config)
        .dev_mode(args.dev)
        .port(args.port)
        .seed_path(args.seed)
        .build()?;

    runtime.run().await
}
