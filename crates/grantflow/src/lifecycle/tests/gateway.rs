use crate::lifecycle::gateway::{AmountError, MinorUnits};

#[test]
fn parses_whole_amounts() {
    assert_eq!(MinorUnits::parse_decimal("10"), Ok(MinorUnits(1000)));
    assert_eq!(MinorUnits::parse_decimal("0"), Ok(MinorUnits(0)));
    assert_eq!(MinorUnits::parse_decimal(" 250 "), Ok(MinorUnits(25000)));
}

#[test]
fn parses_fractional_amounts_without_float_drift() {
    assert_eq!(MinorUnits::parse_decimal("10.5"), Ok(MinorUnits(1050)));
    assert_eq!(MinorUnits::parse_decimal("12.50"), Ok(MinorUnits(1250)));
    // 0.1 and 19.99 are classic binary-float troublemakers.
    assert_eq!(MinorUnits::parse_decimal("0.1"), Ok(MinorUnits(10)));
    assert_eq!(MinorUnits::parse_decimal("19.99"), Ok(MinorUnits(1999)));
    assert_eq!(MinorUnits::parse_decimal(".75"), Ok(MinorUnits(75)));
}

#[test]
fn rejects_overly_precise_amounts() {
    assert!(matches!(
        MinorUnits::parse_decimal("12.345"),
        Err(AmountError::TooPrecise(_))
    ));
}

#[test]
fn rejects_malformed_amounts() {
    for raw in ["", " ", "abc", "12.3x", "-5", "1,5", "."] {
        match MinorUnits::parse_decimal(raw) {
            Err(AmountError::Malformed(_)) => {}
            other => panic!("expected malformed for {raw:?}, got {other:?}"),
        }
    }
}

#[test]
fn rejects_amounts_beyond_range() {
    assert!(matches!(
        MinorUnits::parse_decimal("999999999999999999999"),
        Err(AmountError::Overflow(_))
    ));
}

#[test]
fn renders_as_decimal_string() {
    assert_eq!(MinorUnits(1050).to_string(), "10.50");
    assert_eq!(MinorUnits(5).to_string(), "0.05");
    assert_eq!(MinorUnits(1999).to_string(), "19.99");
}
