// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Proteus CLI entrypoint.
//!
//! Serves MCP over stdio. Configuration comes from the environment (see
//! `config`); the flags below override individual settings for local runs.

use std::error::Error;
use std::path::PathBuf;

use proteus::config::Config;
use proteus::mcp::ProteusMcp;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--state-dir <dir>] [--require-approval]\n\nServes MCP over stdio. Required environment: N8N_HOST, N8N_API_KEY.\nOptional: PROTEUS_TIMEOUT_MS, PROTEUS_STATE_DIR, PROTEUS_REQUIRE_APPROVAL.\n\n--state-dir overrides the snapshot/audit root.\n--require-approval starts with the two-phase approval gate on."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    state_dir: Option<PathBuf>,
    require_approval: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--state-dir" => {
                if options.state_dir.is_some() {
                    return Err(());
                }
                let dir = args.next().ok_or(())?;
                options.state_dir = Some(PathBuf::from(dir));
            }
            "--require-approval" => {
                if options.require_approval {
                    return Err(());
                }
                options.require_approval = true;
            }
            _ => return Err(()),
        }
    }

    Ok(options)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "proteus".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        // stdout is the MCP channel; logs go to stderr.
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();

        let mut config = Config::from_env()?;
        if let Some(state_dir) = options.state_dir {
            config.state_dir = state_dir;
        }
        if options.require_approval {
            config.require_approval = true;
        }

        tracing::info!(
            host = %config.host,
            state_dir = %config.state_dir.display(),
            approval = config.require_approval,
            "starting proteus"
        );

        let mcp = ProteusMcp::new(&config);
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        runtime.block_on(mcp.serve_stdio())?;
        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("proteus: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_options, CliOptions};
    use std::path::PathBuf;

    #[test]
    fn parses_empty_args() {
        let options = parse_options(std::iter::empty()).expect("parse options");
        assert_eq!(options, CliOptions::default());
    }

    #[test]
    fn parses_state_dir() {
        let options =
            parse_options(["--state-dir".to_owned(), "/tmp/proteus".to_owned()].into_iter())
                .expect("parse options");
        assert_eq!(options.state_dir, Some(PathBuf::from("/tmp/proteus")));
        assert!(!options.require_approval);
    }

    #[test]
    fn parses_require_approval() {
        let options = parse_options(["--require-approval".to_owned()].into_iter())
            .expect("parse options");
        assert!(options.require_approval);
    }

    #[test]
    fn rejects_unknown_args() {
        parse_options(["--nope".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn rejects_duplicate_flags() {
        parse_options(
            ["--require-approval".to_owned(), "--require-approval".to_owned()].into_iter(),
        )
        .unwrap_err();

        parse_options(
            [
                "--state-dir".to_owned(),
                "a".to_owned(),
                "--state-dir".to_owned(),
                "b".to_owned(),
            ]
            .into_iter(),
        )
        .unwrap_err();
    }

    #[test]
    fn rejects_missing_state_dir_value() {
        parse_options(["--state-dir".to_owned()].into_iter()).unwrap_err();
    }
}
