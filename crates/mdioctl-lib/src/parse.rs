//! Numeric argument parsing.
//!
//! Integers follow the C literal convention: `0x`/`0X` prefix for hex, a
//! leading `0` for octal, decimal otherwise, with an optional sign. No
//! surrounding whitespace and no trailing characters.

use crate::error::{MdioctlError, Result};

/// Parse a C-style integer literal. Returns `None` on any malformed input.
pub fn parse_c_int(s: &str) -> Option<i64> {
    let (negative, body) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits) = if let Some(hex) = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
    {
        (16, hex)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..])
    } else {
        (10, body)
    };

    // from_str_radix tolerates a sign; reject it here so "0x-1" fails.
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse a C-style integer and check it against `[min, max]`.
pub fn parse_ranged(s: &str, field: &'static str, min: i64, max: i64) -> Result<i64> {
    let v = parse_c_int(s).ok_or_else(|| MdioctlError::Parse(format!("{field} '{s}'")))?;
    if v < min || v > max {
        return Err(MdioctlError::OutOfRange { field, value: v });
    }
    Ok(v)
}

/// Parse a comma-separated list of byte values, e.g. `"1,2,0xff"`.
///
/// An empty string is an empty list. Empty elements (`"1,,2"`) are rejected.
pub fn parse_byte_list(s: &str) -> Result<Vec<u8>> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(',')
        .map(|token| {
            let v = parse_c_int(token)
                .ok_or_else(|| MdioctlError::Parse(format!("byte list '{s}' at '{token}'")))?;
            u8::try_from(v).map_err(|_| MdioctlError::OutOfRange {
                field: "byte value",
                value: v,
            })
        })
        .collect()
}

/// Parse exactly one byte value through the byte-list grammar.
pub fn parse_single_value(s: &str) -> Result<u8> {
    match parse_byte_list(s)?.as_slice() {
        [v] => Ok(*v),
        values => Err(MdioctlError::Parse(format!(
            "expected exactly one value in '{s}', got {}",
            values.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_int_decimal() {
        assert_eq!(parse_c_int("0"), Some(0));
        assert_eq!(parse_c_int("42"), Some(42));
        assert_eq!(parse_c_int("-7"), Some(-7));
        assert_eq!(parse_c_int("+7"), Some(7));
    }

    #[test]
    fn c_int_hex() {
        assert_eq!(parse_c_int("0x1234"), Some(0x1234));
        assert_eq!(parse_c_int("0XfF"), Some(255));
        assert_eq!(parse_c_int("0x"), None);
        assert_eq!(parse_c_int("0x-1"), None);
    }

    #[test]
    fn c_int_octal() {
        assert_eq!(parse_c_int("010"), Some(8));
        assert_eq!(parse_c_int("0777"), Some(0o777));
        assert_eq!(parse_c_int("08"), None);
    }

    #[test]
    fn c_int_rejects_garbage() {
        assert_eq!(parse_c_int(""), None);
        assert_eq!(parse_c_int("-"), None);
        assert_eq!(parse_c_int("12a"), None);
        assert_eq!(parse_c_int(" 12"), None);
        assert_eq!(parse_c_int("12 "), None);
        assert_eq!(parse_c_int("0x1g"), None);
    }

    #[test]
    fn c_int_overflow_is_none() {
        assert_eq!(parse_c_int("0xFFFFFFFFFFFFFFFFFF"), None);
    }

    #[test]
    fn ranged_accepts_bounds() {
        assert_eq!(parse_ranged("31", "register", 0, 31).unwrap(), 31);
        assert_eq!(parse_ranged("0", "register", 0, 31).unwrap(), 0);
    }

    #[test]
    fn ranged_rejects_out_of_range() {
        let err = parse_ranged("32", "register", 0, 31).unwrap_err();
        assert!(matches!(
            err,
            MdioctlError::OutOfRange {
                field: "register",
                value: 32
            }
        ));
    }

    #[test]
    fn ranged_rejects_malformed() {
        let err = parse_ranged("x", "register", 0, 31).unwrap_err();
        assert!(matches!(err, MdioctlError::Parse(_)));
    }

    #[test]
    fn byte_list_mixed_bases() {
        assert_eq!(parse_byte_list("1,2,0xff").unwrap(), vec![1, 2, 255]);
        assert_eq!(parse_byte_list("010,0x10,10").unwrap(), vec![8, 16, 10]);
    }

    #[test]
    fn byte_list_empty() {
        assert!(parse_byte_list("").unwrap().is_empty());
    }

    #[test]
    fn byte_list_empty_element() {
        assert!(matches!(
            parse_byte_list("1,,2"),
            Err(MdioctlError::Parse(_))
        ));
        assert!(parse_byte_list("1,").is_err());
        assert!(parse_byte_list(",1").is_err());
    }

    #[test]
    fn byte_list_trailing_garbage() {
        assert!(parse_byte_list("1,2x").is_err());
        assert!(parse_byte_list("1, 2").is_err());
    }

    #[test]
    fn byte_list_value_too_large() {
        let err = parse_byte_list("1,256").unwrap_err();
        assert!(matches!(
            err,
            MdioctlError::OutOfRange {
                field: "byte value",
                value: 256
            }
        ));
        assert!(parse_byte_list("-1").is_err());
    }

    #[test]
    fn single_value() {
        assert_eq!(parse_single_value("0x0c").unwrap(), 0x0C);
    }

    #[test]
    fn single_value_requires_exactly_one() {
        assert!(parse_single_value("").is_err());
        assert!(parse_single_value("1,2").is_err());
    }
}
