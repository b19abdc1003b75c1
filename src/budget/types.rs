//! Data structures for AI provider spend and budget settings.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// AI provider identifier as stored in settings.
///
/// Unknown identifiers are kept verbatim instead of being rejected, so a
/// typo in settings still renders as what the user typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderId {
    Claude,
    OpenAi,
    DeepSeek,
    None,
    Unrecognized(String),
}

impl ProviderId {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "claude" => ProviderId::Claude,
            "openai" => ProviderId::OpenAi,
            "deepseek" => ProviderId::DeepSeek,
            "none" | "" => ProviderId::None,
            _ => ProviderId::Unrecognized(raw.to_string()),
        }
    }

    /// Settings identifier
    pub fn as_str(&self) -> &str {
        match self {
            ProviderId::Claude => "claude",
            ProviderId::OpenAi => "openai",
            ProviderId::DeepSeek => "deepseek",
            ProviderId::None => "none",
            ProviderId::Unrecognized(raw) => raw,
        }
    }

    /// Human-readable label
    pub fn display_name(&self) -> &str {
        match self {
            ProviderId::Claude => "Claude",
            ProviderId::OpenAi => "OpenAI",
            ProviderId::DeepSeek => "DeepSeek",
            ProviderId::None => "None",
            ProviderId::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for ProviderId {
    fn from(raw: String) -> Self {
        ProviderId::parse(&raw)
    }
}

impl From<ProviderId> for String {
    fn from(id: ProviderId) -> Self {
        id.as_str().to_string()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Spend per provider for one window, in USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderCosts {
    pub claude: Decimal,
    pub openai: Decimal,
    pub deepseek: Decimal,
    /// Sum of the three providers. Sources may get this wrong; see `reconciled`.
    pub total: Decimal,
}

impl ProviderCosts {
    pub fn new(claude: Decimal, openai: Decimal, deepseek: Decimal) -> Self {
        Self {
            claude,
            openai,
            deepseek,
            total: checked_sum(claude, openai, deepseek),
        }
    }

    /// Provider sum, saturating at the decimal range limits.
    pub fn sum(&self) -> Decimal {
        checked_sum(self.claude, self.openai, self.deepseek)
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.sum()
    }

    /// Copy with `total` recomputed from the provider fields.
    pub fn reconciled(&self) -> Self {
        if !self.is_consistent() {
            log::warn!(
                "ProviderCosts: reported total {} does not match provider sum {}, recomputing",
                self.total,
                self.sum()
            );
        }
        Self::new(self.claude, self.openai, self.deepseek)
    }

    /// Spend for a single provider. `None` for ids without a cost column.
    pub fn for_provider(&self, provider: &ProviderId) -> Option<Decimal> {
        match provider {
            ProviderId::Claude => Some(self.claude),
            ProviderId::OpenAi => Some(self.openai),
            ProviderId::DeepSeek => Some(self.deepseek),
            ProviderId::None | ProviderId::Unrecognized(_) => None,
        }
    }
}

fn checked_sum(claude: Decimal, openai: Decimal, deepseek: Decimal) -> Decimal {
    match claude
        .checked_add(openai)
        .and_then(|partial| partial.checked_add(deepseek))
    {
        Some(total) => total,
        None => {
            log::warn!(
                "ProviderCosts: sum of {} + {} + {} overflows, saturating",
                claude,
                openai,
                deepseek
            );
            claude.saturating_add(openai).saturating_add(deepseek)
        }
    }
}

/// Budget configuration as read from the add-on's settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BudgetSettings {
    /// Daily ceiling in USD. Zero or negative means no ceiling.
    pub daily_limit: Decimal,
    /// Monthly ceiling in USD. Zero or negative means no ceiling.
    pub monthly_limit: Decimal,
    /// When set, AI actions are simulated and nothing is enforced
    pub dry_run_mode: bool,
    pub primary_provider: ProviderId,
    pub fallback_provider: ProviderId,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            daily_limit: Decimal::ZERO,
            monthly_limit: Decimal::ZERO,
            dry_run_mode: true,
            primary_provider: ProviderId::Claude,
            fallback_provider: ProviderId::None,
        }
    }
}

/// Spend figures and settings captured for one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSnapshot {
    pub daily: ProviderCosts,
    pub monthly: ProviderCosts,
    #[serde(default)]
    pub settings: BudgetSettings,
    /// Unix milliseconds when the figures were computed
    pub last_updated_millis: i64,
}

impl BudgetSnapshot {
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.last_updated_millis)
    }
}

/// Budget tier, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BudgetStatus {
    WithinBudget,
    Approaching,
    Near,
    Critical,
}

impl BudgetStatus {
    /// Ordinal rank, 0 (within budget) to 3 (critical)
    pub fn severity(&self) -> u8 {
        match self {
            BudgetStatus::WithinBudget => 0,
            BudgetStatus::Approaching => 1,
            BudgetStatus::Near => 2,
            BudgetStatus::Critical => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BudgetStatus::WithinBudget => "Within budget",
            BudgetStatus::Approaching => "Approaching limit",
            BudgetStatus::Near => "Near limit",
            BudgetStatus::Critical => "Critical",
        }
    }
}
