//! Text formatting shared by the report commands.

use costeo_core::Severity;
use rust_decimal::Decimal;

pub fn money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

pub fn percent(value: Decimal) -> String {
    format!("{:.1}%", value.round_dp(1))
}

/// Signed percentage-point change.
pub fn points(change: Decimal) -> String {
    let sign = if change.is_sign_negative() { "" } else { "+" };
    format!("{sign}{:.1} pts", change.round_dp(1))
}

pub fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_owned())
}

pub const fn severity(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "HIGH",
        Severity::Medium => "MEDIUM",
        Severity::Low => "LOW",
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_money_pads_and_rounds() {
        assert_eq!(money(dec!(3.6)), "$3.60");
        assert_eq!(money(dec!(26)), "$26.00");
        assert_eq!(money(dec!(1.234)), "$1.23");
    }

    #[test]
    fn test_percent_and_points() {
        assert_eq!(percent(dec!(10)), "10.0%");
        assert_eq!(percent(dec!(-20)), "-20.0%");
        assert_eq!(points(dec!(5.25)), "+5.2 pts");
        assert_eq!(points(dec!(-3)), "-3.0 pts");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some(money(dec!(1)))), "$1.00");
    }
}
