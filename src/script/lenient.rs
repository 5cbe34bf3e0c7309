//! Tolerant field deserializers shared by roles and script metadata.
//!
//! Community scripts are hand-edited, so `null` where a list is expected,
//! night orders written as strings, or a bare string where an image list
//! belongs are all accepted rather than rejected.

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

/// Treats an explicit `null` the same as a missing field.
pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Image field: a bare string becomes a one-element list, an array is kept
/// as-is, and `null` / `""` become an empty list.
pub fn image_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ImageInput {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<ImageInput>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ImageInput::One(url)) if url.trim().is_empty() => Vec::new(),
        Some(ImageInput::One(url)) => vec![url],
        Some(ImageInput::Many(urls)) => urls,
    })
}

/// Night order values: numbers, numeric strings, or `null` (which means 0).
/// Integral values are written back as JSON integers.
pub mod night_order {
    use super::*;

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
            serializer.serialize_i64(*value as i64)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum NightInput {
            Number(f64),
            String(String),
        }

        match Option::<NightInput>::deserialize(deserializer)? {
            None => Ok(0.0),
            Some(NightInput::Number(value)) => Ok(value),
            Some(NightInput::String(raw)) if raw.trim().is_empty() => Ok(0.0),
            Some(NightInput::String(raw)) => raw.trim().parse::<f64>().map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Wrapper {
        #[serde(default, with = "super::night_order")]
        night: f64,
        #[serde(default, deserialize_with = "super::image_list")]
        image: Vec<String>,
        #[serde(default, deserialize_with = "super::null_default")]
        reminders: Vec<String>,
    }

    #[test]
    fn night_order_accepts_string_and_null() {
        let parsed: Wrapper = serde_json::from_str(r#"{"night":"12"}"#).unwrap();
        assert_eq!(parsed.night, 12.0);
        let parsed: Wrapper = serde_json::from_str(r#"{"night":null}"#).unwrap();
        assert_eq!(parsed.night, 0.0);
        let parsed: Wrapper = serde_json::from_str(r#"{"night":7.5}"#).unwrap();
        assert_eq!(parsed.night, 7.5);
    }

    #[test]
    fn night_order_writes_integers() {
        let json = serde_json::to_value(Wrapper {
            night: 33.0,
            image: vec![],
            reminders: vec![],
        })
        .unwrap();
        assert_eq!(json["night"], serde_json::json!(33));
    }

    #[test]
    fn image_accepts_string_or_array() {
        let parsed: Wrapper = serde_json::from_str(r#"{"image":"http://x/a.png"}"#).unwrap();
        assert_eq!(parsed.image, vec!["http://x/a.png"]);
        let parsed: Wrapper = serde_json::from_str(r#"{"image":["a","b"]}"#).unwrap();
        assert_eq!(parsed.image, vec!["a", "b"]);
        let parsed: Wrapper = serde_json::from_str(r#"{"image":""}"#).unwrap();
        assert!(parsed.image.is_empty());
        let parsed: Wrapper = serde_json::from_str(r#"{}"#).unwrap();
        assert!(parsed.image.is_empty());
    }

    #[test]
    fn null_reminders_become_empty() {
        let parsed: Wrapper = serde_json::from_str(r#"{"reminders":null}"#).unwrap();
        assert!(parsed.reminders.is_empty());
    }
}
