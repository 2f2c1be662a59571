use rust_decimal::{Decimal, RoundingStrategy};

pub const PESO_SIGN: char = '₱';

/// Two decimal places with comma thousands separators: `15,420.50`.
pub fn group_thousands(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let plain = format!("{:.2}", rounded.abs());
    let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, digit) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{fraction}")
}

pub fn format_peso(amount: Decimal) -> String {
    let grouped = group_thousands(amount);
    match grouped.strip_prefix('-') {
        Some(rest) => format!("-{PESO_SIGN}{rest}"),
        None => format!("{PESO_SIGN}{grouped}"),
    }
}

/// ASCII currency form for printers without the peso glyph.
pub fn format_php(amount: Decimal) -> String {
    format!("PHP {}", group_thousands(amount))
}

#[cfg(test)]
#[path = "tests/money_tests.rs"]
mod tests;
