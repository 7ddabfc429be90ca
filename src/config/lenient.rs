//! Weakly-typed scalar decoding.
//!
//! Operators hand-edit these files, and the service has always accepted
//! `port = 8086` where a string is expected or `num_peers_threshold = "2"` where
//! a number is expected. These helpers are used as `deserialize_with` targets so
//! that scalars convert between text, integers, floats and booleans. A value that
//! cannot be converted (e.g. `"many"` for an integer) is still a mapping error.

use serde::de::{self, Deserializer, Unexpected, Visitor};
use std::fmt;

/// Decode a string field, accepting any scalar and rendering it as text.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringVisitor;

    impl<'de> Visitor<'de> for StringVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or scalar value")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(StringVisitor)
}

/// Decode a signed integer field, accepting integer-valued strings and floats.
pub fn int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct IntVisitor;

    impl<'de> Visitor<'de> for IntVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            // i64::MAX as f64 rounds up to 2^63, which is already out of range.
            if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                Ok(v as i64)
            } else {
                Err(E::invalid_value(Unexpected::Float(v), &self))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(0);
            }
            trimmed
                .parse()
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<i64, E> {
            Ok(i64::from(v))
        }

        fn visit_unit<E: de::Error>(self) -> Result<i64, E> {
            Ok(0)
        }

        fn visit_none<E: de::Error>(self) -> Result<i64, E> {
            Ok(0)
        }
    }

    deserializer.deserialize_any(IntVisitor)
}

/// Decode a floating-point field, accepting integers and numeric strings.
pub fn float<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct FloatVisitor;

    impl<'de> Visitor<'de> for FloatVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            trimmed
                .parse()
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }

        fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
            Ok(0.0)
        }

        fn visit_none<E: de::Error>(self) -> Result<f64, E> {
            Ok(0.0)
        }
    }

    deserializer.deserialize_any(FloatVisitor)
}

/// Decode a boolean field, accepting the usual textual spellings and 0/1.
pub fn boolean<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct BoolVisitor;

    impl<'de> Visitor<'de> for BoolVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            match v.trim() {
                "" => Ok(false),
                "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
                "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
                _ => Err(E::invalid_value(Unexpected::Str(v), &self)),
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }

        fn visit_none<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }
    }

    deserializer.deserialize_any(BoolVisitor)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Fields {
        #[serde(deserialize_with = "super::string")]
        text: String,
        #[serde(deserialize_with = "super::int")]
        count: i64,
        #[serde(deserialize_with = "super::float")]
        amount: f64,
        #[serde(deserialize_with = "super::boolean")]
        flag: bool,
    }

    #[test]
    fn test_numbers_become_strings() {
        let fields: Fields = toml::from_str("text = 8086").unwrap();
        assert_eq!(fields.text, "8086");

        let fields: Fields = toml::from_str("text = true").unwrap();
        assert_eq!(fields.text, "true");
    }

    #[test]
    fn test_numeric_strings_become_numbers() {
        let fields: Fields = toml::from_str(
            r#"
            count = "12"
            amount = "0.25"
            "#,
        )
        .unwrap();

        assert_eq!(fields.count, 12);
        assert_eq!(fields.amount, 0.25);
    }

    #[test]
    fn test_integer_accepted_for_float() {
        let fields: Fields = toml::from_str("amount = 2").unwrap();
        assert_eq!(fields.amount, 2.0);
    }

    #[test]
    fn test_non_numeric_string_rejected() {
        let result: Result<Fields, _> = toml::from_str(r#"count = "many""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_fractional_float_rejected_for_int() {
        let result: Result<Fields, _> = serde_json::from_str(r#"{"count": 1.5}"#);
        assert!(result.is_err());

        let fields: Fields = serde_json::from_str(r#"{"count": 3.0}"#).unwrap();
        assert_eq!(fields.count, 3);
    }

    #[test]
    fn test_float_beyond_i64_rejected_for_int() {
        let result: Result<Fields, _> =
            serde_json::from_str(r#"{"count": 9223372036854775808.0}"#);
        assert!(result.is_err());

        let result: Result<Fields, _> =
            serde_json::from_str(r#"{"count": -9223372036854775808.0}"#);
        assert_eq!(result.unwrap().count, i64::MIN);
    }

    #[test]
    fn test_bool_spellings() {
        let fields: Fields = toml::from_str(r#"flag = "True""#).unwrap();
        assert!(fields.flag);

        let fields: Fields = serde_json::from_str(r#"{"flag": 0}"#).unwrap();
        assert!(!fields.flag);

        let result: Result<Fields, _> = toml::from_str(r#"flag = "maybe""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_yaml_null_is_zero_value() {
        let fields: Fields = serde_yaml::from_str("text: ~\ncount: ~\n").unwrap();
        assert_eq!(fields.text, "");
        assert_eq!(fields.count, 0);
    }
}
