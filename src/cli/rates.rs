use super::ui;
use crate::core::convert::format_ves;
use crate::core::{ReadOutcome, RefreshOutcome, RateSnapshot, RateSource, RateSources};
use comfy_table::{Cell, Color};

struct RateRow {
    label: &'static str,
    value: f64,
    source: Option<RateSource>,
}

fn rows(snapshot: &RateSnapshot, sources: Option<&RateSources>) -> Vec<RateRow> {
    let mut rows = vec![
        RateRow {
            label: "BCV (USD)",
            value: snapshot.bcv,
            source: sources.map(|s| s.bcv),
        },
        RateRow {
            label: "Binance P2P (USDT)",
            value: snapshot.binance,
            source: sources.map(|s| s.binance),
        },
    ];
    if let Some(euro) = snapshot.euro {
        rows.push(RateRow {
            label: "Euro (EUR)",
            value: euro,
            source: sources.and_then(|s| s.euro),
        });
    }
    rows
}

fn source_cell(source: RateSource) -> Cell {
    match source {
        RateSource::Live => Cell::new(source.to_string()).fg(Color::Green),
        RateSource::Fallback => Cell::new(source.to_string()).fg(Color::Yellow),
    }
}

fn render(snapshot: &RateSnapshot, sources: Option<&RateSources>) -> String {
    let mut table = ui::new_styled_table();
    let mut header = vec![ui::header_cell("Rate"), ui::header_cell("Bs. per unit")];
    if sources.is_some() {
        header.push(ui::header_cell("Source"));
    }
    table.set_header(header);

    for row in rows(snapshot, sources) {
        let mut cells = vec![Cell::new(row.label), ui::amount_cell(row.value, format_ves)];
        if let Some(source) = row.source {
            cells.push(source_cell(source));
        }
        table.add_row(cells);
    }

    let updated = snapshot.updated_at.as_deref().unwrap_or("never");
    format!(
        "{}\n\n{}\n\n{} {}",
        ui::style_text("Exchange rates", ui::StyleType::Title),
        table,
        ui::style_text("Updated:", ui::StyleType::Label),
        ui::style_text(updated, ui::StyleType::Subtle),
    )
}

/// Table for the cached snapshot.
pub fn display_cached(outcome: &ReadOutcome) -> String {
    let mut output = render(&outcome.snapshot, None);
    if !outcome.cached {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                "No rates cached yet. Run `vesrates refresh` to populate the cache.",
                ui::StyleType::Warning
            )
        ));
    }
    output
}

/// Table for a freshly written snapshot, with live/fallback tags.
pub fn display_refreshed(outcome: &RefreshOutcome) -> String {
    render(&outcome.snapshot, Some(&outcome.sources))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> RateSnapshot {
        RateSnapshot {
            bcv: 36.5,
            binance: 1234.5,
            euro: Some(39.42),
            updated_at: Some("2025-01-31T12:00:00.000Z".to_string()),
        }
    }

    #[test]
    fn test_display_cached() {
        let output = display_cached(&ReadOutcome {
            snapshot: snapshot(),
            cached: true,
        });

        assert!(output.contains("BCV (USD)"));
        assert!(output.contains("36,50"));
        assert!(output.contains("1.234,50"));
        assert!(output.contains("Euro (EUR)"));
        assert!(output.contains("2025-01-31T12:00:00.000Z"));
        assert!(!output.contains("No rates cached yet"));
        assert!(!output.contains("Source"));
    }

    #[test]
    fn test_display_not_cached() {
        let output = display_cached(&ReadOutcome {
            snapshot: RateSnapshot::empty(),
            cached: false,
        });

        assert!(output.contains("N/A"));
        assert!(output.contains("never"));
        assert!(output.contains("No rates cached yet"));
        assert!(!output.contains("Euro (EUR)"));
    }

    #[test]
    fn test_display_refreshed_shows_sources() {
        let output = display_refreshed(&RefreshOutcome {
            snapshot: snapshot(),
            sources: RateSources {
                bcv: RateSource::Live,
                binance: RateSource::Fallback,
                euro: Some(RateSource::Live),
            },
        });

        assert!(output.contains("Source"));
        assert!(output.contains("fallback"));
        assert!(output.contains("live"));
    }
}
