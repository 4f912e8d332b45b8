// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use portal_config::PortalConfig;
use serde_json::{json, Value};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};

const REDACTED: &str = "***";

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    if !config_path.exists() {
        return Err(BinError::config(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    let config = portal_config::load_config(config_path)
        .map_err(|e| BinError::from(e).with_context("Configuration validation failed"))?;

    let warnings = config.warnings();

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  Environment: {}", config.server.environment.as_str());
            println!("  Listen:      {}", config.server.socket_addr());
            println!("  SSO:         {}", enabled(config.sso.enabled));
            println!("  AI proxy:    {}", enabled(config.ai.enabled));
            println!(
                "  Rate limit:  {} ({} requests / {}s)",
                enabled(config.security.rate_limit.enabled),
                config.security.rate_limit.max_requests,
                config.security.rate_limit.window_secs
            );
            println!("  Audit:       {}", enabled(config.security.audit.enabled));

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!(
                    "{}",
                    serde_json::to_string_pretty(&redacted(&config))
                        .unwrap_or_else(|_| "(serialization error)".to_string())
                );
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "environment": config.server.environment.as_str(),
                    "listen": config.server.socket_addr().to_string(),
                    "sso_enabled": config.sso.enabled,
                    "ai_enabled": config.ai.enabled,
                    "rate_limit_enabled": config.security.rate_limit.enabled,
                    "audit_enabled": config.security.audit.enabled,
                },
                "warnings": warnings,
                "config": if args.show_config { Some(redacted(&config)) } else { None },
            });
            let text = serde_json::to_string_pretty(&output)
                .map_err(|e| BinError::Output(e.to_string()))?;
            println!("{}", text);
        }
    }

    if args.strict && !warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

/// Serializes the configuration with secrets masked.
fn redacted(config: &PortalConfig) -> Value {
    let mut value = serde_json::to_value(config).unwrap_or(Value::Null);
    for pointer in ["/security/jwt/secret", "/ai/api_key"] {
        if let Some(secret) = value.pointer_mut(pointer) {
            if !secret.is_null() {
                *secret = Value::String(REDACTED.to_string());
            }
        }
    }
    value
}
