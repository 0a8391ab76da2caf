//! Lenient deserializers for values that CloudFormation may stringify.
//!
//! Template authors often pass numeric ids through parameters or intrinsic
//! functions, which arrive as JSON strings. These helpers accept both forms.

use serde::de::{self, Deserializer, Visitor};
use std::fmt;

struct U64Visitor;

impl<'de> Visitor<'de> for U64Visitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an unsigned integer or a string containing one")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
        u64::try_from(v).map_err(|_| E::custom(format!("negative id: {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
        v.trim()
            .parse()
            .map_err(|_| E::custom(format!("not a numeric id: {v:?}")))
    }
}

/// Deserialize a `u64` from a JSON number or numeric string.
pub fn u64_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    deserializer.deserialize_any(U64Visitor)
}

/// Deserialize an optional `u64` from a JSON number, numeric string or null.
pub fn opt_u64_or_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    #[derive(serde::Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "u64_or_string")] u64);

    let value: Option<Wrapper> = serde::Deserialize::deserialize(deserializer)?;
    Ok(value.map(|Wrapper(v)| v))
}

/// Deserialize an optional list of `u64`, each element a JSON number or
/// numeric string.
pub fn opt_vec_u64_or_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<u64>>, D::Error> {
    #[derive(serde::Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "u64_or_string")] u64);

    let values: Option<Vec<Wrapper>> = serde::Deserialize::deserialize(deserializer)?;
    Ok(values.map(|v| v.into_iter().map(|Wrapper(id)| id).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Ids {
        #[serde(deserialize_with = "u64_or_string")]
        required: u64,
        #[serde(default, deserialize_with = "opt_u64_or_string")]
        optional: Option<u64>,
        #[serde(default, deserialize_with = "opt_vec_u64_or_string")]
        list: Option<Vec<u64>>,
    }

    #[test]
    fn accepts_numbers_and_strings() {
        let ids: Ids = serde_json::from_str(r#"{"required": 42, "optional": "7"}"#).unwrap();
        assert_eq!(ids.required, 42);
        assert_eq!(ids.optional, Some(7));

        let ids: Ids = serde_json::from_str(r#"{"required": "558617288"}"#).unwrap();
        assert_eq!(ids.required, 558617288);
        assert_eq!(ids.optional, None);
        assert_eq!(ids.list, None);
    }

    #[test]
    fn lists_mix_numbers_and_strings() {
        let ids: Ids =
            serde_json::from_str(r#"{"required": 1, "list": ["558617288", 42]}"#).unwrap();
        assert_eq!(ids.list, Some(vec![558617288, 42]));

        let ids: Ids = serde_json::from_str(r#"{"required": 1, "list": null}"#).unwrap();
        assert_eq!(ids.list, None);
        assert!(serde_json::from_str::<Ids>(r#"{"required": 1, "list": ["x"]}"#).is_err());
    }

    #[test]
    fn rejects_non_numeric() {
        assert!(serde_json::from_str::<Ids>(r#"{"required": "abc"}"#).is_err());
        assert!(serde_json::from_str::<Ids>(r#"{"required": -1}"#).is_err());
    }
}
