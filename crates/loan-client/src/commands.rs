//! Execution of parsed `loanctl` commands.
//!
//! Output goes to the supplied writer so commands can be exercised without a
//! terminal. A rejected session clears the stored token before the error is
//! returned.

use std::io::Write;

use tracing::{info, warn};

use crate::api::{ApiClient, StatusChange};
use crate::cli::{Cli, Command};
use crate::derive::{LocalSummary, units_to_cents};
use crate::error::ClientError;
use crate::render::{render_dashboard, render_payments};
use crate::token_store::{StoredToken, TokenStore};

/// Run `cli.command` against the service, writing results to `out`.
///
/// # Errors
/// Returns the first failure; [`ClientError::Unauthorized`] additionally
/// removes the stored token.
pub async fn run(cli: &Cli, store: &TokenStore, out: &mut impl Write) -> Result<(), ClientError> {
    let result = dispatch(cli, store, out).await;
    if result.as_ref().is_err_and(ClientError::clears_session) {
        warn!(path = %store.path(), "discarding rejected session");
        store.clear()?;
    }
    result
}

async fn dispatch(
    cli: &Cli,
    store: &TokenStore,
    out: &mut impl Write,
) -> Result<(), ClientError> {
    match &cli.command {
        Command::Login { username, password } => {
            let secret = password.as_deref().ok_or(ClientError::MissingPassword)?;
            let session = ApiClient::new(&cli.api_url)?
                .login(username, secret)
                .await?;
            store.save(&StoredToken {
                token: session.token,
                username: session.username.clone(),
            })?;
            info!(username = %session.username, "logged in");
            writeln!(out, "Logged in as {}", session.username)?;
        }
        Command::Logout => {
            let message = if store.clear()? {
                "Logged out"
            } else {
                "No stored session"
            };
            writeln!(out, "{message}")?;
        }
        Command::Whoami => {
            let identity = authorised(cli, store)?.me().await?;
            let access = if identity.can_edit {
                "can edit"
            } else {
                "read only"
            };
            writeln!(out, "{} ({}, {access})", identity.username, identity.role)?;
        }
        Command::Status => {
            show_dashboard(&authorised(cli, store)?, out).await?;
        }
        Command::Payments => {
            let client = authorised(cli, store)?;
            let (loan, payments) = tokio::try_join!(client.loan(), client.payments())?;
            render_payments(out, units_to_cents(loan.principal), &payments)?;
        }
        Command::Mark {
            month,
            state,
            date,
            note,
        } => {
            let client = authorised(cli, store)?;
            let change = StatusChange {
                status: (*state).into(),
                paid_at: date.map(|day| day.format("%Y-%m-%d").to_string()),
                note: note.clone(),
            };
            apply(&client, *month, &change, out).await?;
        }
        Command::Toggle { month } => {
            let client = authorised(cli, store)?;
            let payments = client.payments().await?;
            let current = payments
                .iter()
                .find(|payment| payment.month == *month)
                .ok_or(ClientError::UnknownMonth { month: *month })?;
            apply(&client, *month, &StatusChange::toggle(current), out).await?;
        }
    }
    Ok(())
}

fn authorised(cli: &Cli, store: &TokenStore) -> Result<ApiClient, ClientError> {
    let stored = store.load()?.ok_or(ClientError::NotLoggedIn)?;
    ApiClient::with_token(&cli.api_url, &stored.token)
}

async fn apply(
    client: &ApiClient,
    month: u32,
    change: &StatusChange,
    out: &mut impl Write,
) -> Result<(), ClientError> {
    let updated = client.set_status(month, change).await?;
    writeln!(
        out,
        "Month {} marked {}",
        updated.month,
        updated.status.as_str()
    )?;
    show_dashboard(client, out).await
}

async fn show_dashboard(client: &ApiClient, out: &mut impl Write) -> Result<(), ClientError> {
    let (loan, payments) = tokio::try_join!(client.loan(), client.payments())?;
    let summary = LocalSummary::derive(&loan, &payments);
    let mismatched = summary.discrepancies(&loan);
    if !mismatched.is_empty() {
        warn!(fields = ?mismatched, "server summary disagrees with the schedule");
    }
    render_dashboard(out, &loan, &summary)?;
    Ok(())
}
