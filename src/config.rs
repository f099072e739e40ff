use std::net::IpAddr;

use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub sink: SinkConfig,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub server_validation: bool,
    pub rate_limit: u32,
    pub rate_limit_window_secs: u64,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub enum SinkConfig {
    Sheets(SheetsConfig),
    Memory,
}

#[derive(Clone)]
pub struct SheetsConfig {
    pub client_email: String,
    pub private_key: String,
    pub sheet_id: String,
    pub range: String,
    pub token_uri: String,
    pub api_base: String,
    pub value_input: ValueInput,
}

/// How Sheets interprets appended cells. `UserEntered` evaluates text that
/// looks like a formula; `Raw` stores every cell as typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueInput {
    #[default]
    UserEntered,
    Raw,
}

impl ValueInput {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueInput::UserEntered => "USER_ENTERED",
            ValueInput::Raw => "RAW",
        }
    }

    fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_uppercase().as_str() {
            "USER_ENTERED" => Ok(ValueInput::UserEntered),
            "RAW" => Ok(ValueInput::Raw),
            other => Err(format!("Invalid GOOGLE_SHEET_VALUE_INPUT: '{other}' (expected USER_ENTERED or RAW)")),
        }
    }
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("sheet_id", &self.sheet_id)
            .field("range", &self.range)
            .field("token_uri", &self.token_uri)
            .field("api_base", &self.api_base)
            .field("value_input", &self.value_input)
            .finish()
    }
}

pub const DEFAULT_RANGE: &str = "Evaluations!A1:F1";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("EVALFORM_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid EVALFORM_HOST: {e}"))?;

        let port: u16 = env_or("EVALFORM_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid EVALFORM_PORT: {e}"))?;

        let sink = match env_or("EVALFORM_SINK", "sheets").as_str() {
            "sheets" => SinkConfig::Sheets(SheetsConfig::from_env()?),
            "memory" => SinkConfig::Memory,
            other => return Err(format!("Invalid EVALFORM_SINK: '{other}' (expected sheets or memory)")),
        };

        let max_body_size: usize = env_or("EVALFORM_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid EVALFORM_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("EVALFORM_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid EVALFORM_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let server_validation = parse_bool("EVALFORM_SERVER_VALIDATION", &env_or("EVALFORM_SERVER_VALIDATION", "true"))?;

        let rate_limit: u32 = env_or("EVALFORM_RATE_LIMIT", "10")
            .parse()
            .map_err(|e| format!("Invalid EVALFORM_RATE_LIMIT: {e}"))?;

        let rate_limit_window_secs: u64 = env_or("EVALFORM_RATE_LIMIT_WINDOW_SECS", "60")
            .parse()
            .map_err(|e| format!("Invalid EVALFORM_RATE_LIMIT_WINDOW_SECS: {e}"))?;

        let log_level = env_or("EVALFORM_LOG_LEVEL", "info");

        Ok(Config {
            host,
            port,
            sink,
            max_body_size,
            trusted_proxies,
            server_validation,
            rate_limit,
            rate_limit_window_secs,
            log_level,
        })
    }
}

impl SheetsConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(SheetsConfig {
            client_email: env_required("GOOGLE_CLIENT_EMAIL")?,
            private_key: unescape_newlines(&env_required("GOOGLE_PRIVATE_KEY")?),
            sheet_id: env_required("GOOGLE_SHEET_ID")?,
            range: env_or("GOOGLE_SHEET_RANGE", DEFAULT_RANGE),
            token_uri: env_or("GOOGLE_TOKEN_URI", DEFAULT_TOKEN_URI),
            api_base: env_or("GOOGLE_SHEETS_API_BASE", DEFAULT_API_BASE),
            value_input: ValueInput::parse(&env_or("GOOGLE_SHEET_VALUE_INPUT", "USER_ENTERED"))?,
        })
    }
}

/// Keys pasted into a single-line env var carry `\n` escapes instead of line breaks.
pub fn unescape_newlines(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!("Invalid {key}: '{other}'")),
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
