//! Command-line surface
//!
//! A bare invocation is hook mode (stdin/stdout). Subcommands expose the
//! cache maintenance operations and the active config for inspection.
//! Installation into a host settings file is deliberately not handled
//! here.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use crate::cache::{DecisionCache, FileCacheStore};
use crate::config::WardenConfig;
use crate::core::Verdict;

#[derive(Debug, Parser)]
#[command(
    name = "toolwarden",
    about = "Fail-closed permission hook for coding-agent tool calls",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect or clear the decision cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
    /// Show the active configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// List cached decisions, newest first
    List {
        /// Only show decisions scoped to this project root
        #[arg(long)]
        project: Option<PathBuf>,
        /// Maximum number of entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Remove cached decisions
    Clear {
        /// Only remove entries with this decision
        #[arg(long, value_enum)]
        decision: Option<DecisionArg>,
        /// Remove the entry with this exact key
        #[arg(long)]
        key: Option<String>,
        /// Remove entries whose tool, reason, or input contains this text
        #[arg(long)]
        grep: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the active configuration document
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DecisionArg {
    Allow,
    Deny,
}

impl From<DecisionArg> for Verdict {
    fn from(arg: DecisionArg) -> Self {
        match arg {
            DecisionArg::Allow => Verdict::Allow,
            DecisionArg::Deny => Verdict::Deny,
        }
    }
}

/// Execute a subcommand against the config directory
pub fn execute(command: Command, config_dir: &Path) -> Result<()> {
    match command {
        Command::Cache { command } => run_cache(command, config_dir),
        Command::Config { command } => run_config(command, config_dir),
    }
}

fn open_cache(config_dir: &Path) -> DecisionCache {
    let config = WardenConfig::load(config_dir);
    let store = FileCacheStore::new(WardenConfig::cache_path(config_dir));
    DecisionCache::new(Box::new(store), config.cache.ttl_hours)
}

fn run_cache(command: CacheCommand, config_dir: &Path) -> Result<()> {
    let cache = open_cache(config_dir);
    match command {
        CacheCommand::List { project, limit } => {
            let entries = cache.list(project.as_deref());
            if entries.is_empty() {
                println!("cache is empty");
                return Ok(());
            }
            for entry in entries.iter().take(limit) {
                let decision = match entry.decision {
                    Verdict::Allow => "allow".green(),
                    Verdict::Deny => "deny".red(),
                };
                println!(
                    "{}  {}  {:5}  {:10}  {}",
                    &entry.key[..12],
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    decision,
                    entry.tool_name,
                    entry.reason
                );
            }
            if entries.len() > limit {
                println!("... and {} more", entries.len() - limit);
            }
        }
        CacheCommand::Clear { decision, key, grep } => {
            if let Some(key) = key {
                if cache.clear_by_key(&key) {
                    println!("removed 1 entry");
                } else {
                    println!("no entry with that key");
                }
            } else if let Some(needle) = grep {
                println!("removed {} entries", cache.clear_by_grep(&needle));
            } else if let Some(decision) = decision {
                println!("removed {} entries", cache.clear_by_decision(decision.into()));
            } else {
                println!("removed {} entries", cache.clear_all());
            }
        }
    }
    Ok(())
}

fn run_config(command: ConfigCommand, config_dir: &Path) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let config = WardenConfig::load(config_dir);
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_decision_arg_maps_to_verdict() {
        assert_eq!(Verdict::from(DecisionArg::Allow), Verdict::Allow);
        assert_eq!(Verdict::from(DecisionArg::Deny), Verdict::Deny);
    }

    #[test]
    fn test_parse_cache_clear() {
        let cli = Cli::try_parse_from(["toolwarden", "cache", "clear", "--decision", "deny"]).unwrap();
        match cli.command {
            Some(Command::Cache {
                command: CacheCommand::Clear { decision, key, grep },
            }) => {
                assert!(matches!(decision, Some(DecisionArg::Deny)));
                assert!(key.is_none());
                assert!(grep.is_none());
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_bare_invocation_is_hook_mode() {
        let cli = Cli::try_parse_from(["toolwarden"]).unwrap();
        assert!(cli.command.is_none());
    }
}
