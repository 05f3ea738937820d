//! # hostbox — host-integrated containers
//!
//! Creates containers that share the user's home, devices and sessions
//! with the host, and exports their applications back to the host.

#![allow(clippy::print_stderr, clippy::print_stdout)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;
use hostbox_common::error::{EXIT_FAILURE, HostboxError};
use tracing_subscriber::EnvFilter;

use crate::commands::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match commands::execute(cli) {
        Ok(code) => exit_status(code),
        Err(e) => {
            output::report_error(&e);
            exit_status(
                e.downcast_ref::<HostboxError>()
                    .map_or(EXIT_FAILURE, HostboxError::exit_code),
            )
        }
    }
}

fn exit_status(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
