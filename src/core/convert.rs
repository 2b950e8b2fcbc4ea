//! Conversion arithmetic and es-VE number formatting

/// `amount * rate`, or `0` for non-positive or non-finite amounts.
pub fn convert(amount: f64, rate: f64) -> f64 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0.0;
    }
    amount * rate
}

/// Two decimals with `.` thousands and `,` decimal separators, e.g. `1.234,56`.
pub fn format_ves(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped},{frac_part}")
}
