//! inbox-console - Administrator inbox on the terminal
//!
//! Replays an inbox snapshot through the same load, reconcile and action
//! paths the mobile apps use, then prints the resulting threads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use log::{error, info, warn};

use inbox::{
    ActionHandler, ActionStatus, AdminCredentials, AuthToken, ConsoleSettings, InMemoryInboxApi,
    InboxStore, LoadOptions, ReconcilePolicy, ThreadFilter, get_thread_detail, list_store_threads,
};

mod args;
mod render;

use args::{Cli, Command};

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn resolve_token(cli: &Cli) -> Result<AuthToken> {
    if let Some(token) = &cli.token {
        return Ok(AuthToken::new(token.clone()));
    }

    match AdminCredentials::load() {
        Ok(creds) => Ok(creds.token),
        Err(e) => {
            warn!("Admin token not found: {}", e);
            if let Some(path) = AdminCredentials::default_credentials_path() {
                warn!(
                    "To configure access, either:\n\
                     1. Write {{\"token\": \"...\"}} to: {}\n\
                     2. Or set the INBOX_ADMIN_TOKEN environment variable",
                    path.display()
                );
            }
            Err(e)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let settings = ConsoleSettings::load().unwrap_or_else(|e| {
        warn!("Ignoring unreadable console settings: {:#}", e);
        ConsoleSettings::default()
    });

    let snapshot: PathBuf = cli
        .snapshot
        .clone()
        .or_else(|| settings.snapshot_path.clone())
        .context("No snapshot given (use --snapshot or set snapshotPath in console-settings.json)")?;

    let token = resolve_token(cli)?;
    let api = Arc::new(InMemoryInboxApi::from_snapshot_file(token.clone(), &snapshot)?);
    info!("Replaying inbox snapshot {}", snapshot.display());

    let handler = ActionHandler::new(api.clone(), token);
    let options = LoadOptions {
        policy: cli.policy.unwrap_or(settings.reconcile_policy),
        ..LoadOptions::default()
    };

    let mut store = InboxStore::new();
    handler.refresh(&mut store, &options)?;

    let output = Output {
        filter: cli.filter.unwrap_or(settings.default_filter),
        json: cli.json,
    };
    let result = execute(&cli.command(), &handler, &mut store, options.policy, &output);

    if cli.save {
        save_snapshot(&api, &snapshot, result)
    } else {
        result
    }
}

/// How results are printed
struct Output {
    filter: ThreadFilter,
    json: bool,
}

fn execute(
    command: &Command,
    handler: &ActionHandler,
    store: &mut InboxStore,
    policy: ReconcilePolicy,
    output: &Output,
) -> Result<()> {
    let now = Utc::now();
    match command {
        Command::List => {
            let rows = list_store_threads(store, output.filter);
            if output.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    println!("{}", render::summary_line(row, now));
                }
                println!(
                    "\n{} thread(s) [{}], {} unread",
                    rows.len(),
                    output.filter,
                    store.global_unread()
                );
            }
        }
        Command::Show { id } => {
            let detail = get_thread_detail(store, (*id).into())
                .with_context(|| format!("No thread for correspondent {}", id))?;
            if output.json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                println!("{}", render::detail(&detail, now));
            }
        }
        Command::Read { id } => {
            let outcome = handler.mark_thread_read(store, (*id).into())?;
            println!("Marked {} message(s) read", outcome.marked);
            if let Some(e) = outcome.error() {
                return Err(e.into());
            }
        }
        Command::Reply { id, text } => match handler.send_reply(store, (*id).into(), &text.join(" "))? {
            None => println!("Nothing to send"),
            Some(attempt) if attempt.status == ActionStatus::Confirmed => {
                println!("Reply sent ({} message(s) marked read)", attempt.marked_read);
            }
            Some(attempt) => match attempt.error {
                Some(e) => return Err(e.into()),
                None => bail!("Reply was not confirmed"),
            },
        },
        Command::Delete { id } => {
            handler.delete_thread(store, (*id).into())?;
            println!("Deleted thread {}", id);
        }
        Command::Reconcile { id } => {
            let added = handler.reconcile(store, (*id).into(), policy)?;
            println!("Merged {} reply message(s)", added);
        }
    }
    Ok(())
}

/// Write the backend state to `path`, then return the command's result
///
/// Actions the server confirmed before a failure are persisted too.
fn save_snapshot(api: &InMemoryInboxApi, path: &Path, result: Result<()>) -> Result<()> {
    let saved = api
        .snapshot()
        .and_then(|snapshot| config::save_json_file(path, &snapshot));
    match &saved {
        Ok(()) => info!("Saved inbox snapshot to {}", path.display()),
        Err(e) if result.is_err() => error!("Failed to save inbox snapshot: {:#}", e),
        Err(_) => {}
    }
    result.and(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use inbox::{CorrespondentId, MessageId};
    use inbox::api::types::{InboxMessage, SenderInfo};
    use inbox::api::{ApiOperation, FailureMode, InboxSnapshot};

    fn unread(id: i64, minutes: i64) -> InboxMessage {
        InboxMessage {
            id: Some(MessageId(id)),
            correspondent_id: Some(CorrespondentId(5)),
            sender: Some(SenderInfo {
                name: Some("Customer 5".to_string()),
                email: None,
            }),
            content: format!("message {}", id),
            created_at: Some(Utc.with_ymd_and_hms(2024, 5, 10, 9, minutes as u32, 0).unwrap()),
            is_read: false,
        }
    }

    #[test]
    fn test_save_keeps_confirmed_reads_after_partial_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.json");

        let api = Arc::new(InMemoryInboxApi::from_snapshot(
            "token",
            InboxSnapshot {
                messages: vec![unread(1, 0), unread(2, 5)],
                replies: Vec::new(),
            },
        ));
        api.fail_for(ApiOperation::MarkRead, MessageId(2), FailureMode::Error);

        let handler = ActionHandler::new(api.clone(), AuthToken::new("token"));
        let mut store = InboxStore::new();
        handler.refresh(&mut store, &LoadOptions::default()).unwrap();

        let output = Output {
            filter: ThreadFilter::All,
            json: false,
        };
        let result = execute(
            &Command::Read { id: 5 },
            &handler,
            &mut store,
            ReconcilePolicy::default(),
            &output,
        );
        assert!(result.is_err());
        assert!(save_snapshot(&api, &path, result).is_err());

        let saved: InboxSnapshot = config::load_json_file(&path).unwrap();
        let read: Vec<bool> = saved.messages.iter().map(|m| m.is_read).collect();
        assert_eq!(read, vec![true, false]);
    }

    #[test]
    fn test_save_reports_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.json");
        let api = InMemoryInboxApi::new("token");

        assert!(save_snapshot(&api, &path, Ok(())).is_ok());
        assert!(path.exists());
    }
}
