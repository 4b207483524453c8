use serde::{Deserialize, Serialize};

/// Per-user warmup knobs edited from the settings page. The backend reads
/// them; nothing here acts on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmupSettings {
    pub enabled: bool,
    /// Warmup emails per account per day once fully ramped.
    pub daily_limit: u32,
    /// Daily volume increase while ramping.
    pub ramp_up_step: u32,
    /// Percentage of warmup emails that get a reply.
    pub reply_rate: u32,
}

impl Default for WarmupSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_limit: 40,
            ramp_up_step: 5,
            reply_rate: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Enabled,
    DailyLimit,
    RampUpStep,
    ReplyRate,
}

impl SettingsField {
    pub const ALL: [SettingsField; 4] = [
        SettingsField::Enabled,
        SettingsField::DailyLimit,
        SettingsField::RampUpStep,
        SettingsField::ReplyRate,
    ];

    /// Document key of the field.
    pub fn key(self) -> &'static str {
        match self {
            SettingsField::Enabled => "enabled",
            SettingsField::DailyLimit => "dailyLimit",
            SettingsField::RampUpStep => "rampUpStep",
            SettingsField::ReplyRate => "replyRate",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::Enabled => "Warmup enabled",
            SettingsField::DailyLimit => "Daily limit",
            SettingsField::RampUpStep => "Ramp-up per day",
            SettingsField::ReplyRate => "Reply rate (%)",
        }
    }
}

impl WarmupSettings {
    /// Value of `field` after nudging it by `delta`. Booleans flip,
    /// the reply rate stays within 0..=100.
    pub fn adjusted(&self, field: SettingsField, delta: i64) -> serde_json::Value {
        let bump = |v: u32, max: u32| (i64::from(v) + delta).clamp(0, i64::from(max)) as u32;
        match field {
            SettingsField::Enabled => serde_json::Value::Bool(!self.enabled),
            SettingsField::DailyLimit => bump(self.daily_limit, 10_000).into(),
            SettingsField::RampUpStep => bump(self.ramp_up_step, 1_000).into(),
            SettingsField::ReplyRate => bump(self.reply_rate, 100).into(),
        }
    }

    pub fn display(&self, field: SettingsField) -> String {
        match field {
            SettingsField::Enabled => (if self.enabled { "on" } else { "off" }).to_string(),
            SettingsField::DailyLimit => self.daily_limit.to_string(),
            SettingsField::RampUpStep => self.ramp_up_step.to_string(),
            SettingsField::ReplyRate => format!("{}%", self.reply_rate),
        }
    }
}
