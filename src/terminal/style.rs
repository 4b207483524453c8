use ratatui::style::Color;

use crate::domain::account::AccountStatus;
use crate::domain::log::LogStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub label: &'static str,
    pub symbol: &'static str,
    pub color: Color,
}

pub fn account_status(status: AccountStatus) -> StatusStyle {
    let label = status.label();
    match status {
        AccountStatus::Active => StatusStyle {
            label,
            symbol: "●",
            color: Color::Green,
        },
        AccountStatus::Paused => StatusStyle {
            label,
            symbol: "‖",
            color: Color::Yellow,
        },
        AccountStatus::Error => StatusStyle {
            label,
            symbol: "✖",
            color: Color::Red,
        },
        AccountStatus::Connecting => StatusStyle {
            label,
            symbol: "…",
            color: Color::Cyan,
        },
    }
}

pub fn log_status(status: LogStatus) -> StatusStyle {
    match status {
        LogStatus::Success => StatusStyle {
            label: "success",
            symbol: "✔",
            color: Color::Green,
        },
        LogStatus::Warning => StatusStyle {
            label: "warning",
            symbol: "!",
            color: Color::Yellow,
        },
        LogStatus::Error => StatusStyle {
            label: "error",
            symbol: "✖",
            color: Color::Red,
        },
    }
}
