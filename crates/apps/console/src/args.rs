//! Command-line parsing

use clap::{Parser, Subcommand};
use inbox::{ReconcilePolicy, ThreadFilter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "inbox-console", version, about = "Administrator inbox on the terminal")]
pub struct Cli {
    /// Inbox snapshot to replay
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Thread filter: all, unread or replied
    #[arg(long, global = true, value_parser = parse_filter)]
    pub filter: Option<ThreadFilter>,

    /// Administrator token (defaults to the stored credentials)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Reply reconciliation: replace_administrator or append_all
    #[arg(long, global = true, value_parser = parse_policy)]
    pub policy: Option<ReconcilePolicy>,

    /// Write the snapshot back after the command
    #[arg(long, global = true)]
    pub save: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The command to run, `list` when none was given
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::List)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List threads
    List,
    /// Show one thread
    Show { id: i64 },
    /// Mark a thread read
    Read { id: i64 },
    /// Send a reply
    Reply {
        id: i64,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Delete a thread
    Delete { id: i64 },
    /// Refetch the replies of a thread
    Reconcile { id: i64 },
}

fn parse_filter(value: &str) -> Result<ThreadFilter, String> {
    Ok(ThreadFilter::parse(value))
}

fn parse_policy(value: &str) -> Result<ReconcilePolicy, String> {
    match value {
        "replace_administrator" | "replace" => Ok(ReconcilePolicy::ReplaceAdministrator),
        "append_all" | "append" => Ok(ReconcilePolicy::AppendAll),
        other => Err(format!("unknown reconcile policy '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("inbox-console").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.command(), Command::List);
        assert!(cli.filter.is_none());
        assert!(!cli.json);
        assert!(!cli.save);
    }

    #[test]
    fn test_reply_keeps_words() {
        let cli = parse(&["--snapshot", "inbox.json", "reply", "7", "see", "you", "soon"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::Reply {
                id: 7,
                text: vec!["see".into(), "you".into(), "soon".into()],
            }
        );
        assert_eq!(cli.snapshot, Some(PathBuf::from("inbox.json")));
    }

    #[test]
    fn test_filter_and_policy() {
        let cli = parse(&["--filter", "unread", "--policy", "append_all", "--json"]).unwrap();
        assert_eq!(cli.filter, Some(ThreadFilter::Unread));
        assert_eq!(cli.policy, Some(ReconcilePolicy::AppendAll));
        assert!(cli.json);
    }

    #[test]
    fn test_options_after_subcommand() {
        let cli = parse(&["read", "3", "--save", "--token", "secret"]).unwrap();
        assert_eq!(cli.command(), Command::Read { id: 3 });
        assert!(cli.save);
        assert_eq!(cli.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_errors() {
        assert!(parse(&["show"]).is_err());
        assert!(parse(&["show", "abc"]).is_err());
        assert!(parse(&["reply", "7"]).is_err());
        assert!(parse(&["archive", "1"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
        assert!(parse(&["--policy", "merge"]).is_err());
    }

    #[test]
    fn test_help_and_version_are_handled_by_clap() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        let err = parse(&["--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
