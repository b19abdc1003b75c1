//! Text rendering of a budget snapshot.
//!
//! Two modes:
//! - **Verbose**: multi-line breakdown for a settings panel or log
//! - **Condensed**: one line that fits a toast notification
//!
//! Rendering is a pure function of the snapshot.

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::budget::{
    aggregate, BudgetReport, BudgetSnapshot, BudgetStatus, CostSource, CostSourceError,
    ProviderId, WindowUsage,
};

/// Maximum length of a condensed line, in characters
pub const CONDENSED_MAX_CHARS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderMode {
    #[default]
    Verbose,
    Condensed,
}

/// Render `snapshot` with the default condensed budget.
pub fn render(snapshot: &BudgetSnapshot, mode: RenderMode) -> String {
    let report = aggregate(snapshot);
    match mode {
        RenderMode::Verbose => render_verbose(&report),
        RenderMode::Condensed => render_condensed(&report, CONDENSED_MAX_CHARS),
    }
}

pub fn render_verbose(report: &BudgetReport) -> String {
    let settings = &report.settings;
    let mut lines = vec![
        format!("💰 AI Budget Status: {}", report.overall_status().label()),
        String::new(),
    ];

    push_window(&mut lines, "Today", &report.daily);
    lines.push(String::new());
    push_window(&mut lines, "This month", &report.monthly);
    lines.push(String::new());

    lines.push("⚙️ Settings".to_string());
    lines.push(format!("  Daily limit: {}", format_limit(settings.daily_limit)));
    lines.push(format!(
        "  Monthly limit: {}",
        format_limit(settings.monthly_limit)
    ));
    lines.push(format!(
        "  Mode: {}",
        if settings.dry_run_mode { "Dry run" } else { "Live" }
    ));
    lines.push(format!(
        "  Primary provider: {}",
        settings.primary_provider.display_name()
    ));
    lines.push(format!(
        "  Fallback provider: {}",
        settings.fallback_provider.display_name()
    ));
    lines.push(String::new());

    lines.push(format!(
        "Last updated: {}",
        format_timestamp(report.last_updated_millis)
    ));

    lines.join("\n")
}

/// One line, at most `max_chars` characters.
///
/// The dry-run/live indicator leads the line so it survives any cut. Figures
/// are shown to the cent when they fit, otherwise in compact form ($1.2k,
/// $10M); whatever is still too long is cut with an ellipsis.
pub fn render_condensed(report: &BudgetReport, max_chars: usize) -> String {
    let full = condensed_line(report, format_usd);
    if full.chars().count() <= max_chars {
        return full;
    }
    let compact = condensed_line(report, format_usd_compact);
    truncate_chars(&compact, max_chars)
}

fn condensed_line(report: &BudgetReport, money: fn(Decimal) -> String) -> String {
    let mode = if report.settings.dry_run_mode {
        "DRY RUN"
    } else {
        "LIVE"
    };
    format!(
        "{} | Day {}/{} | Month {}/{}",
        mode,
        money(report.daily.costs.total),
        format_limit_short(report.daily.limit, money),
        money(report.monthly.costs.total),
        format_limit_short(report.monthly.limit, money),
    )
}

fn push_window(lines: &mut Vec<String>, title: &str, usage: &WindowUsage) {
    let ceiling = if usage.has_limit() {
        format!(
            "{} / {} ({}%)",
            format_usd(usage.costs.total),
            format_usd(usage.limit),
            format_percent(usage.percent_used)
        )
    } else {
        format!("{} (no limit)", format_usd(usage.costs.total))
    };

    lines.push(format!(
        "{}: {} {} {}",
        title,
        ceiling,
        status_emoji(usage.status),
        usage.status.label()
    ));
    for provider in [ProviderId::Claude, ProviderId::OpenAi, ProviderId::DeepSeek] {
        let spent = usage.costs.for_provider(&provider).unwrap_or_default();
        lines.push(format!(
            "  {}: {}",
            provider.display_name(),
            format_usd(spent)
        ));
    }
}

fn status_emoji(status: BudgetStatus) -> &'static str {
    match status {
        BudgetStatus::WithinBudget => "🟢",
        BudgetStatus::Approaching => "🟡",
        BudgetStatus::Near => "🟠",
        BudgetStatus::Critical => "🔴",
    }
}

fn format_usd(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    format!("${}", rounded)
}

/// Whole dollars below $1000, then one decimal with a k/M/B suffix.
fn format_usd_compact(amount: Decimal) -> String {
    const UNITS: [(i64, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "k")];

    for (unit, suffix) in UNITS {
        let unit = Decimal::from(unit);
        if amount.abs() >= unit {
            let scaled = (amount / unit)
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
                .normalize();
            return format!("${}{}", scaled, suffix);
        }
    }
    let whole = amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    format!("${}", whole)
}

fn format_percent(percent: Decimal) -> String {
    let mut rounded = percent;
    rounded.rescale(1);
    rounded.to_string()
}

fn format_limit(limit: Decimal) -> String {
    if limit > Decimal::ZERO {
        format_usd(limit)
    } else {
        "none".to_string()
    }
}

fn format_limit_short(limit: Decimal, money: fn(Decimal) -> String) -> String {
    if limit > Decimal::ZERO {
        money(limit)
    } else {
        "∞".to_string()
    }
}

fn format_timestamp(millis: i64) -> String {
    match chrono::DateTime::<chrono::Utc>::from_timestamp_millis(millis) {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "unknown".to_string(),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(max_chars - 1).collect();
    cut.push('…');
    cut
}

/// Pulls a snapshot from a cost source and renders it.
pub struct Dashboard {
    source: Arc<dyn CostSource>,
    condensed_max_chars: usize,
}

impl Dashboard {
    pub fn new(source: Arc<dyn CostSource>) -> Self {
        Self::with_condensed_limit(source, CONDENSED_MAX_CHARS)
    }

    pub fn with_condensed_limit(source: Arc<dyn CostSource>, condensed_max_chars: usize) -> Self {
        Self {
            source,
            condensed_max_chars,
        }
    }

    pub async fn report(&self) -> Result<BudgetReport, CostSourceError> {
        let snapshot = self.source.snapshot().await?;
        Ok(aggregate(&snapshot))
    }

    pub async fn render(&self, mode: RenderMode) -> Result<String, CostSourceError> {
        let report = self.report().await?;
        Ok(match mode {
            RenderMode::Verbose => render_verbose(&report),
            RenderMode::Condensed => render_condensed(&report, self.condensed_max_chars),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::{BudgetSettings, ProviderCosts};

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn example_snapshot() -> BudgetSnapshot {
        BudgetSnapshot {
            daily: ProviderCosts::new(d("20.00"), d("15.00"), d("10.00")),
            monthly: ProviderCosts::new(d("600.00"), d("300.00"), d("50.00")),
            settings: BudgetSettings {
                daily_limit: d("100.00"),
                monthly_limit: d("1000.00"),
                dry_run_mode: false,
                primary_provider: ProviderId::Claude,
                fallback_provider: ProviderId::OpenAi,
            },
            // 2025-10-15T12:00:00Z
            last_updated_millis: 1_760_529_600_000,
        }
    }

    #[test]
    fn test_verbose_contains_breakdown_and_settings() {
        let text = render(&example_snapshot(), RenderMode::Verbose);

        assert!(text.contains("Today: $45.00 / $100.00 (45.0%)"), "{}", text);
        assert!(text.contains("Within budget"));
        assert!(text.contains("This month: $950.00 / $1000.00 (95.0%)"));
        assert!(text.contains("Critical"));
        assert!(text.contains("  Claude: $20.00"));
        assert!(text.contains("  OpenAI: $300.00"));
        assert!(text.contains("  DeepSeek: $50.00"));
        assert!(text.contains("Mode: Live"));
        assert!(text.contains("Primary provider: Claude"));
        assert!(text.contains("Fallback provider: OpenAI"));
        assert!(text.contains("Last updated: 2025-10-15 12:00:00 UTC"));
    }

    #[test]
    fn test_verbose_renders_unknown_provider_verbatim() {
        let mut snapshot = example_snapshot();
        snapshot.settings.fallback_provider = ProviderId::parse("grok-beta");
        let text = render(&snapshot, RenderMode::Verbose);
        assert!(text.contains("Fallback provider: grok-beta"));
    }

    #[test]
    fn test_verbose_zero_limit_shows_no_limit() {
        let mut snapshot = example_snapshot();
        snapshot.settings.daily_limit = Decimal::ZERO;
        let text = render(&snapshot, RenderMode::Verbose);
        assert!(text.contains("Today: $45.00 (no limit)"));
        assert!(text.contains("Daily limit: none"));
    }

    #[test]
    fn test_condensed_is_single_line_without_breakdown() {
        let text = render(&example_snapshot(), RenderMode::Condensed);
        assert_eq!(text, "LIVE | Day $45.00/$100.00 | Month $950.00/$1000.00");
        assert!(!text.contains('\n'));
        assert!(!text.contains("Claude"));
    }

    #[test]
    fn test_condensed_dry_run_indicator() {
        let mut snapshot = example_snapshot();
        snapshot.settings.dry_run_mode = true;
        assert!(render(&snapshot, RenderMode::Condensed).starts_with("DRY RUN | "));
    }

    #[test]
    fn test_condensed_switches_to_compact_figures_before_cutting() {
        let mut snapshot = example_snapshot();
        snapshot.settings.dry_run_mode = true;
        let report = aggregate(&snapshot);

        let text = render_condensed(&report, 48);
        assert_eq!(text, "DRY RUN | Day $45/$100 | Month $950/$1k");
    }

    #[test]
    fn test_condensed_keeps_indicator_with_eight_digit_limits() {
        let mut snapshot = example_snapshot();
        snapshot.daily = ProviderCosts::new(d("9999.99"), Decimal::ZERO, Decimal::ZERO);
        snapshot.monthly = ProviderCosts::new(d("9999.99"), Decimal::ZERO, Decimal::ZERO);
        snapshot.settings.daily_limit = d("10000000.00");
        snapshot.settings.monthly_limit = d("10000000.00");
        snapshot.settings.dry_run_mode = true;

        let text = render(&snapshot, RenderMode::Condensed);
        assert!(text.chars().count() <= CONDENSED_MAX_CHARS, "{}", text);
        assert_eq!(text, "DRY RUN | Day $10k/$10M | Month $10k/$10M");
    }

    #[test]
    fn test_indicator_survives_hard_truncation() {
        let mut snapshot = example_snapshot();
        snapshot.settings.dry_run_mode = true;
        let report = aggregate(&snapshot);

        let text = render_condensed(&report, 12);
        assert_eq!(text.chars().count(), 12);
        assert!(text.starts_with("DRY RUN"));
        assert!(text.ends_with('…'));
    }

    #[test]
    fn test_overflowing_provider_sum_still_renders() {
        let mut snapshot = example_snapshot();
        snapshot.daily = ProviderCosts {
            claude: Decimal::MAX,
            openai: Decimal::MAX,
            deepseek: Decimal::ZERO,
            total: Decimal::ZERO,
        };

        let verbose = render(&snapshot, RenderMode::Verbose);
        assert!(verbose.contains("Critical"), "{}", verbose);

        let condensed = render(&snapshot, RenderMode::Condensed);
        assert!(condensed.starts_with("LIVE | Day $"), "{}", condensed);
        assert!(condensed.chars().count() <= CONDENSED_MAX_CHARS);
    }

    #[test]
    fn test_condensed_fits_budget_for_large_values() {
        let mut snapshot = example_snapshot();
        snapshot.daily = ProviderCosts::new(d("3333.33"), d("3333.33"), d("3333.33"));
        snapshot.monthly = ProviderCosts::new(d("9999.99"), Decimal::ZERO, Decimal::ZERO);
        snapshot.settings.daily_limit = d("99999.99");
        snapshot.settings.monthly_limit = d("99999.99");
        snapshot.settings.dry_run_mode = true;

        let text = render(&snapshot, RenderMode::Condensed);
        assert!(text.chars().count() <= CONDENSED_MAX_CHARS, "{}", text);
        assert!(text.contains("$9999.99"));
        assert!(text.starts_with("DRY RUN"));
    }

    #[test]
    fn test_condensed_truncates_to_custom_budget() {
        let report = aggregate(&example_snapshot());
        let text = render_condensed(&report, 20);
        assert_eq!(text.chars().count(), 20);
        assert!(text.ends_with('…'));
    }

    #[test]
    fn test_rendered_totals_ignore_bad_source_total() {
        let mut snapshot = example_snapshot();
        snapshot.daily.total = d("1.00");
        let text = render(&snapshot, RenderMode::Condensed);
        assert!(text.starts_with("LIVE | Day $45.00/"));
    }

    #[test]
    fn test_format_usd_pads_and_rounds() {
        assert_eq!(format_usd(d("5")), "$5.00");
        assert_eq!(format_usd(d("0.125")), "$0.13");
        assert_eq!(format_usd(d("12.3")), "$12.30");
    }

    #[test]
    fn test_format_usd_compact() {
        assert_eq!(format_usd_compact(d("45.00")), "$45");
        assert_eq!(format_usd_compact(d("999.49")), "$999");
        assert_eq!(format_usd_compact(d("1250.00")), "$1.3k");
        assert_eq!(format_usd_compact(d("10000000.00")), "$10M");
        assert_eq!(format_usd_compact(d("2500000000")), "$2.5B");
    }

    #[test]
    fn test_unparseable_timestamp() {
        assert_eq!(format_timestamp(i64::MAX), "unknown");
    }
}
