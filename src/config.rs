//! Pizzeria identity and bot tuning parameters.

/// Identity block shown in greetings, info replies, and checkout
/// summaries. Each field can be overridden via environment variables
/// (loaded from `.env` if present).
#[derive(Debug, Clone)]
pub struct PizzeriaInfo {
    pub name: String,
    pub address: String,
    pub hours: String,
    pub phone: String,
}

impl Default for PizzeriaInfo {
    fn default() -> Self {
        Self {
            name: "Pizzeria Da Mario".into(),
            address: "Via Roma 123, Milano".into(),
            hours: "11:00 - 23:00".into(),
            phone: "+39 02 1234567".into(),
        }
    }
}

impl PizzeriaInfo {
    /// Defaults with `PIZZERIA_NAME` / `PIZZERIA_ADDRESS` /
    /// `PIZZERIA_HOURS` / `PIZZERIA_PHONE` overrides applied.
    pub fn from_env() -> Self {
        let mut info = Self::default();
        if let Ok(v) = std::env::var("PIZZERIA_NAME") {
            info.name = v;
        }
        if let Ok(v) = std::env::var("PIZZERIA_ADDRESS") {
            info.address = v;
        }
        if let Ok(v) = std::env::var("PIZZERIA_HOURS") {
            info.hours = v;
        }
        if let Ok(v) = std::env::var("PIZZERIA_PHONE") {
            info.phone = v;
        }
        info
    }
}

/// All tuneable parameters for the bot and the chat widget.
///
/// Use [`Default::default()`] for sensible defaults.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Number of recent history entries fed to the intent classifier.
    pub history_window: usize,
    /// Simulated typing-indicator delay before a reply is shown (ms).
    pub typing_delay_ms: u64,
    /// Lower bound for the pickup ETA in minutes.
    pub eta_min_minutes: i64,
    /// Upper bound for the pickup ETA in minutes.
    pub eta_max_minutes: i64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            history_window: 6,
            typing_delay_ms: 900,
            eta_min_minutes: 15,
            eta_max_minutes: 30,
        }
    }
}
