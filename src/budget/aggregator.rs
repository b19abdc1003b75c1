//! Turns raw spend and limits into percentages and status tiers.
//!
//! Everything here is pure. Totals coming from the cost source are never
//! trusted; each window is reconciled before any percentage is computed.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::types::{BudgetSettings, BudgetSnapshot, BudgetStatus, ProviderCosts};

/// Percent used at which the status becomes `Approaching`
const APPROACHING_PERCENT: i64 = 50;
/// Percent used at which the status becomes `Near`
const NEAR_PERCENT: i64 = 75;
/// Percent used at which the status becomes `Critical`
const CRITICAL_PERCENT: i64 = 90;

/// `(total / limit) * 100`, rounded half-up to one decimal place.
///
/// A limit of zero or below means no ceiling is configured and yields 0.
pub fn percent_used(total: Decimal, limit: Decimal) -> Decimal {
    if limit <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    total
        .checked_div(limit)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::MAX)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

pub fn compute_status(percent: Decimal) -> BudgetStatus {
    if percent >= Decimal::from(CRITICAL_PERCENT) {
        BudgetStatus::Critical
    } else if percent >= Decimal::from(NEAR_PERCENT) {
        BudgetStatus::Near
    } else if percent >= Decimal::from(APPROACHING_PERCENT) {
        BudgetStatus::Approaching
    } else {
        BudgetStatus::WithinBudget
    }
}

/// Spend against one limit (daily or monthly).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowUsage {
    /// Provider costs with a recomputed total
    pub costs: ProviderCosts,
    pub limit: Decimal,
    pub percent_used: Decimal,
    pub status: BudgetStatus,
}

impl WindowUsage {
    pub fn from_costs(costs: &ProviderCosts, limit: Decimal) -> Self {
        let costs = costs.reconciled();
        let percent_used = percent_used(costs.total, limit);
        Self {
            costs,
            limit,
            percent_used,
            status: compute_status(percent_used),
        }
    }

    pub fn has_limit(&self) -> bool {
        self.limit > Decimal::ZERO
    }
}

/// Both windows of a snapshot, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetReport {
    pub daily: WindowUsage,
    pub monthly: WindowUsage,
    pub settings: BudgetSettings,
    pub last_updated_millis: i64,
}

impl BudgetReport {
    /// The more severe of the daily and monthly statuses.
    pub fn overall_status(&self) -> BudgetStatus {
        self.daily.status.max(self.monthly.status)
    }
}

pub fn aggregate(snapshot: &BudgetSnapshot) -> BudgetReport {
    let daily = WindowUsage::from_costs(&snapshot.daily, snapshot.settings.daily_limit);
    let monthly = WindowUsage::from_costs(&snapshot.monthly, snapshot.settings.monthly_limit);

    log::debug!(
        "BudgetAggregator: daily {}% ({:?}), monthly {}% ({:?})",
        daily.percent_used,
        daily.status,
        monthly.percent_used,
        monthly.status
    );

    BudgetReport {
        daily,
        monthly,
        settings: snapshot.settings.clone(),
        last_updated_millis: snapshot.last_updated_millis,
    }
}
