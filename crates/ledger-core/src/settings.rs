use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use clap::{CommandFactory, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::periods::{DateRange, Period};
use crate::time_utils::{parse_date, TimezoneHandler};

/// Name of the per-user directory under `$HOME`.
pub const LEDGER_DIR: &str = ".poker-ledger";

/// `~/.poker-ledger`, or `./.poker-ledger` when no home directory is known.
pub fn ledger_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(LEDGER_DIR)
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Poker bankroll ledger: record home games and rank the table
#[derive(Parser, Debug, Clone)]
#[command(
    name = "poker-ledger",
    about = "Poker bankroll ledger: record home games and rank the table",
    version
)]
pub struct Settings {
    /// Time window for statistics and history
    #[arg(
        long,
        global = true,
        default_value = "all",
        value_parser = ["all", "today", "yesterday", "week", "month", "year"]
    )]
    pub period: String,

    /// First day of a custom range (YYYY-MM-DD); overrides --period
    #[arg(long, global = true, requires = "to")]
    pub from: Option<String>,

    /// Last day of a custom range (YYYY-MM-DD), inclusive
    #[arg(long, global = true, requires = "from")]
    pub to: Option<String>,

    /// Timezone for calendar periods (auto-detected if not specified)
    #[arg(long, global = true, default_value = "auto")]
    pub timezone: String,

    /// Local sessions file (defaults to ~/.poker-ledger/sessions.json)
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,

    /// Shared cloud partition key; sessions are stored remotely when set
    #[arg(long, global = true)]
    pub sync_key: Option<String>,

    /// Base URL of the cloud REST endpoint
    #[arg(long, global = true, env = "POKER_LEDGER_CLOUD_URL")]
    pub cloud_url: Option<String>,

    /// API key for the cloud REST endpoint
    #[arg(long, global = true, env = "POKER_LEDGER_CLOUD_KEY", hide_env_values = true)]
    pub cloud_key: Option<String>,

    /// Logging level
    #[arg(long, global = true, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Clear saved preferences
    #[arg(long, global = true)]
    pub clear: bool,

    /// Per-player avatar emoji, loaded from preferences.
    #[arg(skip)]
    pub avatars: HashMap<String, String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands; `stats` runs when none is given.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Player leaderboard with ranks
    Stats {
        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Session count, volume, top players and win/loss split
    Dashboard {
        /// Number of players on the leaderboard
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// One player's totals and cumulative profit history
    Player { name: String },
    /// Sessions in the selected period, newest first
    History,
    /// Add a session from free text, one player per line
    Quick {
        /// Text to parse (reads --file or stdin when absent)
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        /// File to read the text from
        #[arg(long)]
        file: Option<PathBuf>,
        /// Date the session last night instead of tonight
        #[arg(long)]
        yesterday: bool,
        /// Venue
        #[arg(long)]
        location: Option<String>,
        /// Show the parsed preview without saving
        #[arg(long)]
        dry_run: bool,
    },
    /// Add a session from explicit NAME:BUYIN:CASHOUT entries
    Add {
        #[arg(required = true, value_name = "NAME:BUYIN:CASHOUT")]
        entries: Vec<String>,
        /// When the game took place (defaults to now)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Length in minutes
        #[arg(long, default_value_t = 180)]
        duration: u32,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change an existing session
    Edit {
        id: String,
        /// Replacement player list
        #[arg(long = "player", value_name = "NAME:BUYIN:CASHOUT")]
        players: Vec<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a session
    Delete {
        id: String,
        /// Confirm the deletion; without it the session is only shown
        #[arg(long)]
        yes: bool,
    },
    /// Show the rank tier for a profit amount
    Rank {
        #[arg(allow_hyphen_values = true)]
        profit: f64,
    },
    /// Set a player's avatar emoji
    Avatar { name: String, emoji: String },
    /// Store sessions in the shared cloud partition KEY from now on
    Sync { key: String },
    /// Go back to the local sessions file
    Unsync,
    /// Every player name on record, with avatars
    Players,
}

// ── Preferences ────────────────────────────────────────────────────────────────

/// Persisted preferences saved to `~/.poker-ledger/preferences.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Preferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_key: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub avatars: HashMap<String, String>,
}

impl Preferences {
    pub fn config_path() -> PathBuf {
        ledger_home().join("preferences.json")
    }

    /// Preferences path rooted at `base_dir` instead of `$HOME`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(LEDGER_DIR).join("preferences.json")
    }

    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write preferences, creating parent directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn clear_at(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Record the values of this run, keeping the avatar map. An unknown
    /// timezone is not saved over the last good one.
    fn remember(&mut self, settings: &Settings) {
        self.period = Some(settings.period.clone());
        if TimezoneHandler::validate_timezone(&settings.timezone) {
            self.timezone = Some(settings.timezone.clone());
        } else {
            tracing::warn!("Not saving unknown timezone \"{}\"", settings.timezone);
        }
        self.sync_key = settings.sync_key.clone();
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge persisted preferences where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_preferences() -> Self {
        Self::load_with_preferences_impl(std::env::args_os().collect(), &Preferences::config_path())
    }

    /// Same as [`Settings::load_with_preferences`] with explicit arguments and
    /// preferences path.
    pub fn load_with_preferences_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = Preferences::clear_at(config_path);
            return Self::resolve_auto_values(settings);
        }

        let mut prefs = Preferences::load_from(config_path);

        if !is_arg_explicitly_set(&matches, "period") {
            if let Some(v) = prefs.period.clone() {
                settings.period = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = prefs.timezone.clone() {
                settings.timezone = v;
            }
        }
        if settings.sync_key.is_none() {
            settings.sync_key = prefs.sync_key.clone();
        }
        settings.avatars = prefs.avatars.clone();

        settings = Self::resolve_auto_values(settings);

        prefs.remember(&settings);
        if let Err(e) = prefs.save_to(config_path) {
            tracing::warn!("Could not save preferences to {}: {}", config_path.display(), e);
        }

        settings
    }

    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone.eq_ignore_ascii_case("auto") {
            settings.timezone = crate::time_utils::get_system_timezone();
        }
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// The selected time window; `--from`/`--to` take precedence over
    /// `--period`.
    pub fn resolve_period(&self) -> Result<Period> {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => {
                let start = parse_date(from)
                    .ok_or_else(|| LedgerError::TimestampParse(from.clone()))?;
                let end =
                    parse_date(to).ok_or_else(|| LedgerError::TimestampParse(to.clone()))?;
                Ok(Period::Custom(DateRange::new(start, end)?))
            }
            (None, None) => self.period.parse(),
            _ => Err(LedgerError::Config(
                "--from and --to must be given together".to_string(),
            )),
        }
    }

    /// Timezone used for calendar periods and quick-entry dates.
    pub fn tz(&self) -> Tz {
        TimezoneHandler::new(&self.timezone).default_tz()
    }

    /// Path of the local sessions file.
    pub fn data_path(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| ledger_home().join("sessions.json"))
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        Preferences::config_path_in(tmp.path())
    }

    fn load(tmp: &TempDir, args: &[&str]) -> Settings {
        let mut argv: Vec<std::ffi::OsString> = vec!["poker-ledger".into()];
        argv.extend(args.iter().map(|a| a.into()));
        Settings::load_with_preferences_impl(argv, &tmp_config_path(tmp))
    }

    #[test]
    fn test_preferences_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let mut prefs = Preferences {
            period: Some("month".to_string()),
            timezone: Some("Asia/Ho_Chi_Minh".to_string()),
            sync_key: Some("team-a".to_string()),
            ..Default::default()
        };
        prefs.avatars.insert("Dat".to_string(), "🦈".to_string());
        prefs.save_to(&path).expect("save");

        assert_eq!(Preferences::load_from(&path), prefs);
    }

    #[test]
    fn test_preferences_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        assert_eq!(Preferences::load_from(&path), Preferences::default());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Preferences::load_from(&path), Preferences::default());
    }

    #[test]
    fn test_preferences_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        Preferences::default().save_to(&path).expect("save");
        assert!(path.exists());
        Preferences::clear_at(&path).expect("clear");
        assert!(!path.exists());
        // Clearing twice is fine.
        Preferences::clear_at(&path).expect("clear again");
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["poker-ledger"]);
        assert_eq!(settings.period, "all");
        assert_eq!(settings.timezone, "auto");
        assert_eq!(settings.log_level, "WARNING");
        assert!(settings.from.is_none());
        assert!(settings.sync_key.is_none());
        assert!(settings.command.is_none());
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_parses_subcommands() {
        let settings = Settings::parse_from(["poker-ledger", "stats", "--json", "--period", "week"]);
        assert_eq!(settings.command, Some(Command::Stats { json: true }));
        assert_eq!(settings.period, "week");

        let settings = Settings::parse_from(["poker-ledger", "players"]);
        assert_eq!(settings.command, Some(Command::Players));

        let settings = Settings::parse_from(["poker-ledger", "rank", "-2500000"]);
        assert_eq!(settings.command, Some(Command::Rank { profit: -2_500_000.0 }));

        let settings =
            Settings::parse_from(["poker-ledger", "add", "Dat:2000:5000", "Tung:4k:1k"]);
        match settings.command {
            Some(Command::Add { entries, duration, .. }) => {
                assert_eq!(entries, vec!["Dat:2000:5000", "Tung:4k:1k"]);
                assert_eq!(duration, 180);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_settings_from_requires_to() {
        assert!(Settings::try_parse_from(["poker-ledger", "--from", "2024-01-01"]).is_err());
    }

    #[test]
    fn test_load_merges_persisted_period_and_timezone() {
        let tmp = TempDir::new().expect("tempdir");
        Preferences {
            period: Some("month".to_string()),
            timezone: Some("Asia/Ho_Chi_Minh".to_string()),
            ..Default::default()
        }
        .save_to(&tmp_config_path(&tmp))
        .expect("save");

        let settings = load(&tmp, &[]);
        assert_eq!(settings.period, "month");
        assert_eq!(settings.timezone, "Asia/Ho_Chi_Minh");
    }

    #[test]
    fn test_load_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        Preferences {
            period: Some("month".to_string()),
            sync_key: Some("old-key".to_string()),
            ..Default::default()
        }
        .save_to(&tmp_config_path(&tmp))
        .expect("save");

        let settings = load(&tmp, &["--period", "year", "--sync-key", "new-key"]);
        assert_eq!(settings.period, "year");
        assert_eq!(settings.sync_key.as_deref(), Some("new-key"));
    }

    #[test]
    fn test_load_keeps_avatars_when_persisting() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let mut prefs = Preferences::default();
        prefs.avatars.insert("Dat".to_string(), "🐯".to_string());
        prefs.save_to(&path).expect("save");

        let settings = load(&tmp, &["--period", "week", "--timezone", "UTC"]);
        assert_eq!(settings.avatars.get("Dat").map(String::as_str), Some("🐯"));

        let saved = Preferences::load_from(&path);
        assert_eq!(saved.period.as_deref(), Some("week"));
        assert_eq!(saved.timezone.as_deref(), Some("UTC"));
        assert_eq!(saved.avatars.get("Dat").map(String::as_str), Some("🐯"));
    }

    #[test]
    fn test_load_does_not_persist_unknown_timezone() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        Preferences {
            timezone: Some("Asia/Ho_Chi_Minh".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let settings = load(&tmp, &["--timezone", "Mars/Olympus_Mons"]);
        assert_eq!(settings.tz(), Tz::UTC);
        let saved = Preferences::load_from(&path);
        assert_eq!(saved.timezone.as_deref(), Some("Asia/Ho_Chi_Minh"));
    }

    #[test]
    fn test_load_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        Preferences {
            period: Some("year".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let settings = load(&tmp, &["--clear"]);
        assert!(!path.exists());
        assert_eq!(settings.period, "all");
    }

    #[test]
    fn test_load_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = load(&tmp, &["--debug"]);
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_resolves_auto_timezone() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = load(&tmp, &[]);
        assert_ne!(settings.timezone, "auto");
    }

    #[test]
    fn test_resolve_period_named_and_custom() {
        let settings = Settings::parse_from(["poker-ledger", "--period", "month"]);
        assert_eq!(settings.resolve_period().unwrap(), Period::Month);

        let settings =
            Settings::parse_from(["poker-ledger", "--from", "2024-01-01", "--to", "2024-01-31"]);
        let expected = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap();
        assert_eq!(settings.resolve_period().unwrap(), Period::Custom(expected));
    }

    #[test]
    fn test_resolve_period_rejects_bad_range() {
        let settings =
            Settings::parse_from(["poker-ledger", "--from", "2024-02-01", "--to", "2024-01-01"]);
        assert!(matches!(
            settings.resolve_period(),
            Err(LedgerError::InvalidDateRange { .. })
        ));

        let settings =
            Settings::parse_from(["poker-ledger", "--from", "yesterday", "--to", "2024-01-01"]);
        assert!(matches!(
            settings.resolve_period(),
            Err(LedgerError::TimestampParse(_))
        ));
    }

    #[test]
    fn test_data_path_override() {
        let settings = Settings::parse_from(["poker-ledger", "--data-file", "/tmp/s.json"]);
        assert_eq!(settings.data_path(), PathBuf::from("/tmp/s.json"));
    }
}
