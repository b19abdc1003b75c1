//! AI provider spend tracking against configured budgets.
//!
//! This module provides:
//! - Data structures for per-provider costs and budget settings
//! - Percentage and status-tier aggregation
//! - The cost source seam and a JSON file implementation

mod aggregator;
mod source;
mod types;

pub use aggregator::{aggregate, compute_status, percent_used, BudgetReport, WindowUsage};
pub use source::{CostSource, CostSourceError, JsonFileCostSource};
pub use types::{BudgetSettings, BudgetSnapshot, BudgetStatus, ProviderCosts, ProviderId};
