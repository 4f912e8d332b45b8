// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Portal server entry point.

use portal_bin::{commands, error::report_error_and_exit, init_logging, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    let file_logging = cli.logging_from_config_file();
    init_logging(
        &cli.effective_log_level(file_logging.as_ref()),
        cli.effective_log_format(file_logging.as_ref()),
    );

    if let Err(e) = commands::execute(cli).await {
        report_error_and_exit(e);
    }
}
