use std::io::Read as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;

use ledger_core::models::{PlayerEntry, SessionDraft};
use ledger_core::ranks::RankLadder;
use ledger_core::settings::{Command, Preferences, Settings};
use ledger_core::time_utils::TimezoneHandler;
use ledger_data::quick_entry::{normalize_amount, QuickDate, QuickEntry, QuickSessionOptions};
use ledger_data::store::{open_store, StoreConfig};
use ledger_runtime::ledger::{LedgerService, ViewContext};

use crate::render;

/// Parse a `NAME:BUYIN:CASHOUT` argument. The name may itself contain `:`.
pub fn parse_player_arg(arg: &str) -> Result<PlayerEntry> {
    let mut parts = arg.rsplitn(3, ':');
    let (Some(cash_out), Some(buy_in), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("expected NAME:BUYIN:CASHOUT, got \"{arg}\"");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("player name is empty in \"{arg}\"");
    }
    let buy_in =
        normalize_amount(buy_in).with_context(|| format!("invalid buy-in in \"{arg}\""))?;
    let cash_out =
        normalize_amount(cash_out).with_context(|| format!("invalid cash-out in \"{arg}\""))?;
    Ok(PlayerEntry::new(name, buy_in, cash_out))
}

fn parse_players(args: &[String]) -> Result<Vec<PlayerEntry>> {
    args.iter().map(String::as_str).map(parse_player_arg).collect()
}

fn store_config(settings: &Settings) -> StoreConfig {
    StoreConfig {
        data_file: settings.data_path(),
        sync_key: settings.sync_key.clone(),
        cloud_url: settings.cloud_url.clone(),
        cloud_key: settings.cloud_key.clone(),
    }
}

async fn open_ledger(config: &StoreConfig) -> Result<LedgerService> {
    let store = open_store(config)?;
    let mut ledger = LedgerService::new(store);
    ledger.refresh().await;
    if let Some(err) = ledger.last_error() {
        eprintln!("warning: could not load sessions from {} store: {err}", ledger.store_name());
    }
    Ok(ledger)
}

fn read_quick_text(text: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("could not read quick-entry text from stdin")?;
    Ok(buf)
}

/// Point future runs at the cloud partition `key`, or back at the local
/// file when `key` is `None`.
fn set_sync_key(config_path: &Path, key: Option<&str>) -> Result<()> {
    let mut prefs = Preferences::load_from(config_path);
    prefs.sync_key = key.map(str::trim).filter(|k| !k.is_empty()).map(str::to_string);
    prefs.save_to(config_path)?;
    Ok(())
}

fn set_avatar(config_path: &Path, name: &str, emoji: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("player name is empty");
    }
    let mut prefs = Preferences::load_from(config_path);
    prefs.avatars.insert(name.to_string(), emoji.trim().to_string());
    prefs.save_to(config_path)?;
    Ok(())
}

pub async fn run(settings: &Settings) -> Result<()> {
    let command = settings
        .command
        .clone()
        .unwrap_or(Command::Stats { json: false });

    // Commands that never touch the session store.
    match &command {
        Command::Rank { profit } => {
            print!("{}", render::rank_info(*profit, &RankLadder::default()));
            return Ok(());
        }
        Command::Avatar { name, emoji } => {
            set_avatar(&Preferences::config_path(), name, emoji)?;
            println!("{emoji} {}", name.trim());
            return Ok(());
        }
        Command::Unsync => {
            set_sync_key(&Preferences::config_path(), None)?;
            println!("Using local sessions at {}", settings.data_path().display());
            return Ok(());
        }
        _ => {}
    }

    let mut config = store_config(settings);
    if let Command::Sync { key } = &command {
        config.sync_key = Some(key.trim().to_string());
        // Fail before saving when the cloud is not configured.
        let ledger = open_ledger(&config).await?;
        set_sync_key(&Preferences::config_path(), Some(key))?;
        println!(
            "Synced with \"{}\": {} sessions",
            key.trim(),
            ledger.sessions().len()
        );
        return Ok(());
    }

    let mut ledger = open_ledger(&config).await?;
    let tz = settings.tz();
    let now = Utc::now();
    let ctx = ViewContext {
        period: settings.resolve_period()?,
        now,
        tz,
        avatars: &settings.avatars,
    };
    tracing::debug!(period = %ctx.period, timezone = %tz, "resolved view context");

    match command {
        Command::Stats { json } => {
            let stats = ledger.stats(&ctx);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", render::stats_table(&stats, ledger.ladder(), &tz));
            }
        }
        Command::Dashboard { top } => {
            let view = ledger.dashboard(&ctx, top);
            print!("{}", render::dashboard(&view, ledger.ladder()));
        }
        Command::Player { name } => {
            let stats = ledger.stats(&ctx);
            let Some(stat) = stats.iter().find(|s| s.name == name.trim()) else {
                bail!("no sessions for player \"{}\" in {}", name.trim(), ctx.period);
            };
            let history = ledger.player_history(&name);
            print!("{}", render::player_detail(stat, &history, ledger.ladder(), &tz));
        }
        Command::History => {
            print!("{}", render::history(&ledger.history(&ctx), &tz));
        }
        Command::Quick {
            text,
            file,
            yesterday,
            location,
            dry_run,
        } => {
            let quick = QuickEntry::parse(&read_quick_text(text, file.as_deref())?);
            print!("{}", render::quick_preview(&quick));
            if dry_run {
                return Ok(());
            }
            let options = QuickSessionOptions {
                date: if yesterday {
                    QuickDate::Yesterday
                } else {
                    QuickDate::Today
                },
                location,
                ..QuickSessionOptions::default()
            };
            let session = quick.into_session(&options, now, &tz)?;
            let id = session.id.clone();
            ledger.add(session).await?;
            println!("Saved session {id}");
        }
        Command::Add {
            entries,
            date,
            location,
            duration,
            notes,
        } => {
            let date = match date {
                Some(d) => parse_when(&settings.timezone, &d)?,
                None => now,
            };
            let session = SessionDraft {
                id: None,
                date,
                location: location.unwrap_or_default(),
                duration_minutes: duration,
                notes,
                players: parse_players(&entries)?,
            }
            .build(now)?;
            let id = session.id.clone();
            ledger.add(session).await?;
            println!("Saved session {id}");
        }
        Command::Edit {
            id,
            players,
            date,
            location,
            duration,
            notes,
        } => {
            let Some(existing) = ledger.find(&id).cloned() else {
                bail!("session {id} not found");
            };
            let players = if players.is_empty() {
                existing.players
            } else {
                parse_players(&players)?
            };
            let date = match date {
                Some(d) => parse_when(&settings.timezone, &d)?,
                None => existing.date,
            };
            let session = SessionDraft {
                id: Some(existing.id),
                date,
                location: location.unwrap_or(existing.location),
                duration_minutes: duration.unwrap_or(existing.duration_minutes),
                notes: notes.or(existing.notes),
                players,
            }
            .build(now)?;
            ledger.update(session).await?;
            println!("Updated session {id}");
        }
        Command::Delete { id, yes } => {
            let Some(existing) = ledger.find(&id).cloned() else {
                bail!("session {id} not found");
            };
            if !yes {
                print!("{}", render::history(std::slice::from_ref(&existing), &tz));
                println!("Run again with --yes to delete this session.");
                return Ok(());
            }
            ledger.remove(&id).await?;
            println!("Deleted session {id}");
        }
        Command::Players => {
            print!("{}", render::player_list(&ledger.player_names(), &settings.avatars));
        }
        Command::Rank { .. } | Command::Avatar { .. } | Command::Sync { .. } | Command::Unsync => {}
    }

    Ok(())
}

fn parse_when(timezone: &str, s: &str) -> Result<chrono::DateTime<Utc>> {
    TimezoneHandler::new(timezone)
        .parse_timestamp(s)
        .with_context(|| format!("could not parse date \"{s}\""))
}
