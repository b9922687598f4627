//! Configuration — read once at startup, immutable for the process life.
//!
//! Runtime settings come from the environment; the category table comes
//! from a JSON file when `CATEGORY_CONFIG_PATH` is set, otherwise from
//! the single-category defaults (`SHEET_ID` + `TARGET_GROUP`). Anything
//! malformed fails here, never per-message.

use std::path::Path;

use chrono::FixedOffset;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::extract::{FieldRule, FieldSpec};
use crate::router::{CategoryRule, CategoryTable, ChatId};

/// Default health server port.
const DEFAULT_PORT: u16 = 5000;

/// Default reference timezone offset (IST).
const DEFAULT_TZ_OFFSET: &str = "+05:30";

/// Process-wide relay settings.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Telegram bot token.
    pub bot_token: String,
    /// Chat the relay listens to.
    pub source_chat: ChatId,
    /// Bearer token for the Sheets API. Absent disables recording.
    pub sheets_token: Option<SecretString>,
    /// Health server port.
    pub port: u16,
    /// Public base URL for the keep-alive self-ping.
    pub service_url: Option<String>,
    /// Fixed reference timezone for row date stamps.
    pub tz: FixedOffset,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = require_env("TELEGRAM_BOT_TOKEN")?;

        let source_chat = require_env("SOURCE_CHAT")?
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "SOURCE_CHAT".into(),
                message: "expected a numeric chat id".into(),
            })?;

        let sheets_token = std::env::var("SHEETS_ACCESS_TOKEN")
            .ok()
            .filter(|s| !s.is_empty())
            .map(SecretString::from);

        let port = match std::env::var("PORT") {
            Ok(s) => s.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".into(),
                message: format!("not a valid port: {s}"),
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let service_url = std::env::var("SERVICE_URL").ok().filter(|s| !s.is_empty());

        let tz_raw =
            std::env::var("TZ_OFFSET").unwrap_or_else(|_| DEFAULT_TZ_OFFSET.to_string());
        let tz = parse_tz_offset(&tz_raw)?;

        Ok(Self {
            bot_token,
            source_chat,
            sheets_token,
            port,
            service_url,
            tz,
        })
    }

    /// Build the category table: from `CATEGORY_CONFIG_PATH` if set,
    /// otherwise the single-category env defaults.
    pub fn category_table(&self) -> Result<CategoryTable, ConfigError> {
        match std::env::var("CATEGORY_CONFIG_PATH") {
            Ok(path) if !path.is_empty() => load_category_table(Path::new(&path)),
            _ => default_table_from_env(),
        }
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse a `+HH:MM` / `-HH:MM` offset into a fixed timezone.
pub fn parse_tz_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: "TZ_OFFSET".into(),
        message: format!("expected +HH:MM or -HH:MM, got {raw:?}"),
    };

    let (sign, rest) = match raw.split_at_checked(1) {
        Some(("+", rest)) => (1i32, rest),
        Some(("-", rest)) => (-1i32, rest),
        _ => return Err(invalid()),
    };

    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Split a comma-separated destination list into chat ids.
/// Empty input yields an empty list; a malformed id is a startup error.
pub fn parse_destinations(raw: &str) -> Result<Vec<ChatId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|_| ConfigError::InvalidValue {
                key: "forward_to".into(),
                message: format!("not a numeric chat id: {s:?}"),
            })
        })
        .collect()
}

// ── Category config file ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawCategoryFile {
    /// Deployment-wide field schema. Empty means the standard sales schema.
    #[serde(default)]
    fields: Vec<RawField>,
    categories: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    /// Label text if it differs from the field name.
    label: Option<String>,
    /// Present for price-style fields with a parenthetical abbreviation.
    price_abbrev: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    id: String,
    #[serde(default)]
    keywords: Vec<String>,
    sheet_id: Option<String>,
    /// Comma-separated chat ids. Empty disables forwarding.
    #[serde(default)]
    forward_to: String,
}

/// Load and compile the category table from a JSON file.
pub fn load_category_table(path: &Path) -> Result<CategoryTable, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let file: RawCategoryFile = serde_json::from_str(&raw)?;
    compile_table(file)
}

fn compile_table(file: RawCategoryFile) -> Result<CategoryTable, ConfigError> {
    if file.categories.is_empty() {
        return Err(ConfigError::ParseError(
            "category config defines no categories".into(),
        ));
    }

    let fields = if file.fields.is_empty() {
        FieldSpec::sales_default()
    } else {
        let rules = file
            .fields
            .iter()
            .map(|f| {
                let label = f.label.as_deref().unwrap_or(&f.name);
                match f.price_abbrev.as_deref() {
                    Some(abbrev) => FieldRule::price(&f.name, label, abbrev),
                    None => FieldRule::with_label(&f.name, label),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        FieldSpec::new(rules)
    };

    let rules = file
        .categories
        .into_iter()
        .map(|c| {
            let forward_to = parse_destinations(&c.forward_to)?;
            Ok(CategoryRule {
                id: c.id,
                keywords: c.keywords,
                sheet_id: c.sheet_id,
                forward_to,
                fields: fields.clone(),
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok(CategoryTable::new(rules))
}

/// Single-category defaults: a `mobile` category keyed on the word
/// "mobile", recording to `SHEET_ID` and forwarding to `TARGET_GROUP`.
fn default_table_from_env() -> Result<CategoryTable, ConfigError> {
    let sheet_id = std::env::var("SHEET_ID").ok().filter(|s| !s.is_empty());
    let forward_to = match std::env::var("TARGET_GROUP") {
        Ok(raw) if !raw.is_empty() => parse_destinations(&raw)?,
        _ => Vec::new(),
    };

    Ok(CategoryTable::new(vec![CategoryRule {
        id: "mobile".into(),
        keywords: vec!["mobile".into()],
        sheet_id,
        forward_to,
        fields: FieldSpec::sales_default(),
    }]))
}
