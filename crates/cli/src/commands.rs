//! CLI commands

use anyhow::{Context, Result};
use clap::Subcommand;
use ppm_core::{
    AppConfig, EmployeeRole, FixedClock, FnRefresher, MemoryTokenStorage, Navigation,
    NavigationGuard, RefreshError, Route, Router, SessionSnapshot, SystemClock, TokenClaims,
    TokenStatus, View, decode_claims, inspect_token, ppm_route_table,
};
use serde::Serialize;
use std::cell::Cell;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Print the route table
    Routes {
        /// Print as JSON instead of an indented list
        #[arg(long)]
        json: bool,
    },

    /// Resolve a path to its route chain and parameters
    Resolve { path: String },

    /// Dry-run a navigation through the guard
    Check {
        /// Target path, optionally with query and fragment
        path: String,

        /// Path the navigation starts from
        #[arg(long, default_value = "/")]
        from: String,

        /// Employee role held by the session
        #[arg(long)]
        role: Option<String>,

        /// Mark the session as needing login
        #[arg(long)]
        need_login: bool,

        /// Access token held by the session
        #[arg(long)]
        token: Option<String>,

        /// Token persisted in storage under the configured key
        #[arg(long)]
        stored_token: Option<String>,

        /// Make the simulated refresh fail
        #[arg(long)]
        refresh_fails: bool,

        /// Evaluate expiry at this Unix timestamp instead of now
        #[arg(long)]
        now: Option<i64>,
    },

    /// Decode a token and report its expiry
    Token {
        token: String,

        /// Evaluate expiry at this Unix timestamp instead of now
        #[arg(long)]
        now: Option<i64>,
    },

    /// Configuration file operations
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the effective configuration as TOML
    Generate {
        /// Output file path (prints to stdout when omitted)
        output: Option<PathBuf>,
    },
}

impl Commands {
    pub async fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let config = AppConfig::load(config_path).context("Failed to load configuration")?;

        let output = match self {
            Commands::Routes { json } => routes(json)?,
            Commands::Resolve { path } => resolve(&path)?,
            Commands::Check {
                path,
                from,
                role,
                need_login,
                token,
                stored_token,
                refresh_fails,
                now,
            } => {
                let session = SessionSnapshot {
                    employee_role: role.map(EmployeeRole::from),
                    need_login,
                    access_token: token,
                };
                let simulation = Simulation {
                    stored_token,
                    refresh_fails,
                    now,
                };
                let report = check(&config, &path, &from, session, simulation).await?;
                serde_json::to_string_pretty(&report)?
            }
            Commands::Token { token, now } => {
                serde_json::to_string_pretty(&token_report(&token, now)?)?
            }
            Commands::Config { command } => return command.execute(&config),
        };

        println!("{output}");
        Ok(())
    }
}

impl ConfigCommands {
    pub fn execute(self, config: &AppConfig) -> Result<()> {
        match self {
            ConfigCommands::Generate { output } => {
                let rendered = config.to_toml_string()?;
                if let Some(path) = output {
                    if let Some(parent) = path.parent()
                        && !parent.as_os_str().is_empty()
                    {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Generated configuration at {}", path.display());
                } else {
                    print!("{rendered}");
                }
                Ok(())
            }
        }
    }
}

fn routes(json: bool) -> Result<String> {
    let table = ppm_route_table()?;
    if json {
        let rows: Vec<RouteRow> = table.flatten().into_iter().map(RouteRow::from).collect();
        return Ok(serde_json::to_string_pretty(&rows)?);
    }

    fn render(routes: &[Route<View>], depth: usize, out: &mut String) {
        for route in routes {
            let target = match (route.view(), route.redirect()) {
                (_, Some(to)) => format!("-> {to}"),
                (Some(view), None) => view.to_string(),
                (None, None) => String::new(),
            };
            let _ = writeln!(
                out,
                "{:indent$}{:<32} {:<16} {}",
                "",
                route.path(),
                route.name(),
                target,
                indent = depth * 2
            );
            render(route.children(), depth + 1, out);
        }
    }

    let mut out = String::new();
    render(table.routes(), 0, &mut out);
    Ok(out.trim_end().to_string())
}

#[derive(Serialize)]
struct RouteRow<'a> {
    path: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    view: Option<View>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'a str>,
}

impl<'a> From<&'a Route<View>> for RouteRow<'a> {
    fn from(route: &'a Route<View>) -> Self {
        Self {
            path: route.path(),
            name: route.name(),
            view: route.view().copied(),
            redirect: route.redirect(),
        }
    }
}

fn resolve(path: &str) -> Result<String> {
    let table = ppm_route_table()?;
    let target = ppm_core::NavigationTarget::parse(path);
    match table.resolve(&target.path) {
        Some(matched) => Ok(serde_json::to_string_pretty(&matched)?),
        None => anyhow::bail!("No route matches {}", target.path),
    }
}

/// Storage and refresh behavior for a dry run
#[derive(Debug, Default)]
struct Simulation {
    stored_token: Option<String>,
    refresh_fails: bool,
    now: Option<i64>,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    #[serde(flatten)]
    navigation: Navigation<View>,
    refresh_calls: u32,
}

async fn check(
    config: &AppConfig,
    path: &str,
    from: &str,
    session: SessionSnapshot,
    simulation: Simulation,
) -> Result<CheckReport> {
    let storage = Rc::new(MemoryTokenStorage::new());
    if let Some(stored) = simulation.stored_token {
        storage.set(config.guard.storage_key.clone(), stored);
    }

    let refresh_calls = Rc::new(Cell::new(0));
    let refresher = {
        let storage = storage.clone();
        let calls = refresh_calls.clone();
        let key = config.guard.storage_key.clone();
        let issued = session.access_token.clone();
        let fails = simulation.refresh_fails;
        FnRefresher::new(move || {
            let storage = storage.clone();
            let calls = calls.clone();
            let key = key.clone();
            let issued = issued.clone();
            async move {
                calls.set(calls.get() + 1);
                if fails {
                    return Err(RefreshError::Failed("simulated refresh failure".to_string()));
                }
                if let Some(token) = issued {
                    storage.set(key, token);
                }
                Ok(())
            }
        })
    };

    let guard = NavigationGuard::new(config.guard.clone(), storage, refresher);
    let guard = match simulation.now {
        Some(now) => guard.with_clock(fixed_clock(now)?),
        None => guard,
    };
    let router = Router::new(ppm_route_table()?, guard, config.router.clone());

    let navigation = router.navigate(path, from, &session).await?;
    Ok(CheckReport {
        navigation,
        refresh_calls: refresh_calls.get(),
    })
}

#[derive(Debug, Serialize)]
struct TokenReport {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    claims: Option<TokenClaims>,
}

fn token_report(token: &str, now: Option<i64>) -> Result<TokenReport> {
    let status = match now {
        Some(now) => inspect_token(Some(token), &fixed_clock(now)?),
        None => inspect_token(Some(token), &SystemClock),
    };

    let report = match status {
        TokenStatus::Missing => TokenReport {
            status: "missing",
            expires_at: None,
            error: None,
            claims: None,
        },
        TokenStatus::Valid { expires_at } => TokenReport {
            status: "valid",
            expires_at: Some(expires_at.to_rfc3339()),
            error: None,
            claims: decode_claims(token).ok(),
        },
        TokenStatus::Expired { expired_at } => TokenReport {
            status: "expired",
            expires_at: Some(expired_at.to_rfc3339()),
            error: None,
            claims: decode_claims(token).ok(),
        },
        TokenStatus::Invalid(err) => TokenReport {
            status: "invalid",
            expires_at: None,
            error: Some(err.to_string()),
            claims: None,
        },
    };
    Ok(report)
}

fn fixed_clock(now: i64) -> Result<FixedClock> {
    FixedClock::at_timestamp(now).with_context(|| format!("Timestamp {now} is out of range"))
}
