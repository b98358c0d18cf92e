//! `loanctl` entry point.
//!
//! Parsing and command execution live in the library; this binary wires up
//! logging, prompts for a missing password without echoing it, and maps
//! failures to an exit code. A password piped on stdin is read as one line.

use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::process::ExitCode;

use clap::Parser;
use dialoguer::Password;
use loan_client::{Cli, ClientError, Command, TokenStore, run};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let mut cli = Cli::parse();
    let home = env::var("HOME").ok();
    let store = TokenStore::new(cli.token_path(home.as_deref()));

    let outcome = match prompt_password(&mut cli) {
        Ok(()) => run(&cli, &store, &mut io::stdout().lock()).await,
        Err(err) => Err(err),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Err(write_err) = writeln!(io::stderr().lock(), "loanctl: {err}") {
                drop(write_err);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOANCTL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .is_err()
    {
        // A subscriber is already installed.
    }
}

fn prompt_password(cli: &mut Cli) -> Result<(), ClientError> {
    let Command::Login { password, .. } = &mut cli.command else {
        return Ok(());
    };
    if password.is_some() {
        return Ok(());
    }
    let entered = if io::stdin().is_terminal() {
        Password::new()
            .with_prompt("Password")
            .allow_empty_password(true)
            .interact()
            .map_err(io::Error::other)?
    } else {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_owned()
    };
    if entered.is_empty() {
        return Err(ClientError::MissingPassword);
    }
    *password = Some(entered);
    Ok(())
}
