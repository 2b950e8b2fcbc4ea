use super::ui;
use crate::core::ReadOutcome;
use crate::core::convert::{convert, format_ves};
use anyhow::{Result, anyhow};
use comfy_table::{Cell, CellAlignment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Usd,
    Eur,
}

impl Currency {
    fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

/// Converts `amount` to bolívares at every cached rate for `currency`.
pub fn display_conversion(outcome: &ReadOutcome, amount: f64, currency: Currency) -> Result<String> {
    if !outcome.cached {
        return Err(anyhow!(
            "No rates cached yet. Run `vesrates refresh` first"
        ));
    }
    let snapshot = &outcome.snapshot;

    let rates: Vec<(&str, f64)> = match currency {
        Currency::Usd => vec![("BCV", snapshot.bcv), ("Binance P2P", snapshot.binance)],
        Currency::Eur => {
            let euro = snapshot
                .euro
                .ok_or_else(|| anyhow!("No EUR rate cached; enable the fx provider"))?;
            vec![("BCV (EUR)", euro)]
        }
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Rate"),
        ui::header_cell("Bs. per unit"),
        ui::header_cell("Amount (Bs.)"),
    ]);
    for (label, rate) in rates {
        table.add_row(vec![
            Cell::new(label),
            ui::amount_cell(rate, format_ves),
            Cell::new(format_ves(convert(amount, rate))).set_alignment(CellAlignment::Right),
        ]);
    }

    Ok(format!(
        "{} {}\n\n{}",
        ui::style_text(&format_ves(amount.max(0.0)), ui::StyleType::Value),
        ui::style_text(currency.code(), ui::StyleType::Label),
        table
    ))
}
