//! Area coverage per order.
//!
//! Products are sold by the square metre, so the amount of material in an
//! order is recovered from either a `coverage` property on the line item or
//! an area token such as `10m²` in its variant or product title.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::MappingError;
use crate::models::{LineItem, decimal_value, parse_decimal};

/// A decimal number followed by an area unit.
///
/// Accepted units: `m²`, `m2`, `sqm`, `sq m`, `sq. m`, `sq metres`,
/// `square metre(s)` / `square meter(s)`. A comma is read as the decimal
/// separator.
static AREA_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(\d+(?:[.,]\d+)?)\s*",
        r"(?:m²|m2\b|sq\.?\s*m(?:etres?|eters?)?\b|square\s+met(?:re|er)s?\b)",
    ))
    .expect("Invalid area regex pattern")
});

/// Extracts the first area quantity from free text, in square metres
pub fn parse_area(text: &str) -> Option<Decimal> {
    let captures = AREA_PATTERN.captures(text)?;
    parse_decimal(captures.get(1)?.as_str())
}

/// Value of the first property whose name mentions coverage
pub fn coverage_property(item: &LineItem) -> Option<Decimal> {
    item.properties
        .iter()
        .filter(|p| p.name.to_lowercase().contains("coverage"))
        .find_map(|p| decimal_value(&p.value))
        .filter(|v| !v.is_sign_negative())
}

/// Coverage of a single unit of `item`, if any source yields one
pub fn unit_coverage(item: &LineItem) -> Option<Decimal> {
    coverage_property(item).or_else(|| {
        [&item.variant_title, &item.title, &item.name]
            .into_iter()
            .flatten()
            .find_map(|text| parse_area(text))
    })
}

/// Sum of unit coverage × quantity across `items`, rounded to the cent.
///
/// Items with no recognisable coverage contribute zero. A total too large to
/// represent is a [`MappingError::LoadTooLarge`].
pub fn total_coverage(items: &[LineItem]) -> Result<Decimal, MappingError> {
    let mut total = Decimal::ZERO;

    for item in items {
        let Some(per_unit) = unit_coverage(item) else {
            tracing::warn!(
                title = item.title.as_deref().unwrap_or(""),
                variant = item.variant_title.as_deref().unwrap_or(""),
                "No coverage found for line item, skipping"
            );
            continue;
        };

        let quantity = Decimal::from(item.quantity.unwrap_or(1));
        total = per_unit
            .checked_mul(quantity)
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| MappingError::LoadTooLarge(format!("{} x {}", quantity, per_unit)))?;
    }

    Ok(round_half_up(total))
}

/// Rounds to two decimals, halves away from zero
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Property;
    use rstest::rstest;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    fn item(quantity: u32, variant_title: Option<&str>, title: Option<&str>) -> LineItem {
        LineItem {
            quantity: Some(quantity),
            variant_title: variant_title.map(String::from),
            title: title.map(String::from),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("10m²", "10")]
    #[case("10 m²", "10")]
    #[case("2.5m2", "2.5")]
    #[case("2,5 M2", "2.5")]
    #[case("Oak / 1.44 sqm per pack", "1.44")]
    #[case("3 sq m", "3")]
    #[case("3 sq. m", "3")]
    #[case("12 sq metres", "12")]
    #[case("7 square metres", "7")]
    #[case("7 Square Meter", "7")]
    #[case("Pack of 4 - 2.2m² coverage", "2.2")]
    fn accepts_area_tokens(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(parse_area(text), Some(dec(expected)));
    }

    #[rstest]
    #[case("")]
    #[case("Large")]
    #[case("10mm thick")]
    #[case("20 m")]
    #[case("5 metres")]
    #[case("m² only")]
    #[case("10 m3")]
    #[case("10m2x")]
    fn rejects_text_without_area_tokens(#[case] text: &str) {
        assert_eq!(parse_area(text), None);
    }

    #[test]
    fn coverage_property_takes_priority_over_title() {
        let mut line = item(1, Some("10m²"), None);
        line.properties = vec![Property { name: "Pack Coverage".into(), value: json!("1.86") }];

        assert_eq!(unit_coverage(&line), Some(dec("1.86")));
    }

    #[test]
    fn numeric_and_invalid_coverage_properties() {
        let mut line = item(1, Some("4m²"), None);
        line.properties = vec![Property { name: "coverage".into(), value: json!(3) }];
        assert_eq!(coverage_property(&line), Some(dec("3")));

        line.properties = vec![Property { name: "coverage".into(), value: json!("lots") }];
        assert_eq!(coverage_property(&line), None);
        assert_eq!(unit_coverage(&line), Some(dec("4")));

        line.properties = vec![Property { name: "coverage".into(), value: json!("-2") }];
        assert_eq!(coverage_property(&line), None);
    }

    #[test]
    fn unrepresentable_coverage_property_falls_back_to_title() {
        let mut line = item(1, Some("4m²"), None);
        line.properties = vec![Property { name: "coverage".into(), value: json!("1e300") }];

        assert_eq!(coverage_property(&line), None);
        assert_eq!(unit_coverage(&line), Some(dec("4")));
    }

    #[test]
    fn title_is_used_when_variant_has_no_token() {
        let line = item(1, Some("Natural Oak"), Some("Engineered Flooring 1.5m2"));
        assert_eq!(unit_coverage(&line), Some(dec("1.5")));
    }

    #[test]
    fn parsing_is_idempotent() {
        let line = item(3, Some("1.33 m²"), None);
        assert_eq!(unit_coverage(&line), unit_coverage(&line));
        assert_eq!(
            total_coverage(std::slice::from_ref(&line)).unwrap(),
            total_coverage(&[line]).unwrap()
        );
    }

    #[test]
    fn total_multiplies_by_quantity_and_skips_unknown_items() {
        let items = vec![
            item(2, Some("10m²"), None),
            item(3, Some("Sample swatch"), Some("Free sample")),
            item(1, None, Some("Underlay 15 sqm roll")),
        ];
        assert_eq!(total_coverage(&items).unwrap(), dec("35"));
    }

    #[test]
    fn missing_quantity_counts_as_one() {
        let mut line = item(1, Some("2.5m²"), None);
        line.quantity = None;
        assert_eq!(total_coverage(&[line]).unwrap(), dec("2.5"));
    }

    #[test]
    fn total_is_rounded_to_two_decimals() {
        let items = vec![item(3, Some("1.111m²"), None)];
        assert_eq!(total_coverage(&items).unwrap(), dec("3.33"));
        assert_eq!(total_coverage(&[]).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn total_too_large_to_represent_is_rejected() {
        let mut line = item(u32::MAX, None, None);
        line.properties = vec![Property {
            name: "coverage".into(),
            value: json!("79000000000000000000000000000"),
        }];

        assert!(matches!(total_coverage(&[line]), Err(MappingError::LoadTooLarge(_))));
    }

    #[rstest]
    #[case("1.005", "1.01")]
    #[case("2.675", "2.68")]
    #[case("0.124", "0.12")]
    #[case("0.125", "0.13")]
    #[case("20", "20")]
    fn rounds_half_up(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(round_half_up(dec(value)), dec(expected));
    }
}
