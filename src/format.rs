//! Fixed pt-BR presentation rules for money and timestamps.

use chrono::NaiveDateTime;

/// Format a value as Brazilian reais: `.` groups thousands, `,` separates
/// the two decimals. `1234.5` becomes `R$ 1.234,50`.
pub fn format_currency(value: f64) -> String {
    format!("R$ {}", format_decimal(value))
}

/// The number part of [`format_currency`].
pub fn format_decimal(value: f64) -> String {
    if value.is_nan() {
        return "nan".into();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.into();
    }
    let rounded = format!("{:.2}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((&rounded, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    // -0.001 rounds to 0,00 and must not keep its sign
    let sign = if value < 0.0 && rounded.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped},{frac_part}")
}

/// Timestamp shown in the report header, e.g. `05/01/2023 às 14:30`.
pub fn format_generated_at(at: NaiveDateTime) -> String {
    at.format("%d/%m/%Y às %H:%M").to_string()
}
