use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use tera::{to_value, Value};

/// `{{ amount | money }}` renders "KES 12,500.00". Accepts numbers and the
/// string form `rust_decimal` serializes to.
pub fn money(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let amount = match value {
        Value::Null => Decimal::ZERO,
        Value::String(s) => Decimal::from_str(s).map_err(|e| tera::Error::msg(format!("money: {}", e)))?,
        Value::Number(n) => Decimal::from_str(&n.to_string()).map_err(|e| tera::Error::msg(format!("money: {}", e)))?,
        other => return Err(tera::Error::msg(format!("money: unsupported value {}", other))),
    };
    let currency = args
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or("KES");
    Ok(to_value(format!("{} {}", currency, format_amount(amount)))?)
}

fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_amount(Decimal::new(1250000, 2)), "12,500.00");
        assert_eq!(format_amount(Decimal::new(100, 0)), "100.00");
        assert_eq!(format_amount(Decimal::new(123456789, 1)), "12,345,678.90");
        assert_eq!(format_amount(Decimal::new(-50000, 2)), "-500.00");
    }

    #[test]
    fn money_filter_accepts_strings_and_numbers() {
        let args = HashMap::new();
        assert_eq!(money(&Value::String("1500.5".into()), &args).unwrap(), "KES 1,500.50");
        assert_eq!(money(&serde_json::json!(42), &args).unwrap(), "KES 42.00");
        assert_eq!(money(&Value::Null, &args).unwrap(), "KES 0.00");
        assert!(money(&serde_json::json!([1]), &args).is_err());
    }
}
