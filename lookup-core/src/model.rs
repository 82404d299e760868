use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{MapAccess, Visitor},
};
use serde_json::Value;

/// A display value copied verbatim from the service payload.
///
/// The service decides units and formatting; nothing here converts or
/// coerces. `null` never reaches this type (it decodes to `None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(serde_json::Number),
    Text(String),
    Bool(bool),
    Other(Value),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => match integral(n) {
                Some(i) => write!(f, "{i}"),
                None => write!(f, "{n}"),
            },
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Other(v) => write!(f, "{v}"),
        }
    }
}

/// Largest magnitude a JSON number can have and still be an exact integer
/// once read as a double.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A float with no fractional part, as an integer (`10.0` -> `10`).
fn integral(n: &serde_json::Number) -> Option<i64> {
    let f = n.as_f64().filter(|_| n.is_f64())?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER).then_some(f as i64)
}

/// Rewrite integral floats as integers throughout `value`, so `{"t":10.0}`
/// serializes as `{"t":10}`.
pub fn collapse_integral_floats(value: &mut Value) {
    match value {
        Value::Number(n) => {
            if let Some(i) = integral(n) {
                *n = i.into();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(collapse_integral_floats),
        Value::Object(map) => map.values_mut().for_each(collapse_integral_floats),
        Value::Null | Value::Bool(_) | Value::String(_) => {}
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Top-level payload returned by `GET /weather/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WeatherRecord {
    pub request: Option<RequestInfo>,
    pub location: Option<Location>,
    pub current: Option<Conditions>,
    pub historical: Option<Historical>,
    pub notes: Option<String>,
    pub date: Option<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RequestInfo {
    pub query: Option<FieldValue>,
    pub language: Option<FieldValue>,
    pub unit: Option<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Location {
    pub name: Option<FieldValue>,
    /// Service-local time, e.g. `"2024-01-01 10:00"`.
    pub localtime: Option<String>,
}

/// Weather readings shared by the current snapshot, historical entries and
/// their hourly items.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Conditions {
    pub temperature: Option<FieldValue>,
    pub feelslike: Option<FieldValue>,
    pub humidity: Option<FieldValue>,
    pub wind_speed: Option<FieldValue>,
    pub wind_dir: Option<FieldValue>,
    pub pressure: Option<FieldValue>,
    pub cloudcover: Option<FieldValue>,
    pub uv_index: Option<FieldValue>,
    pub visibility: Option<FieldValue>,
    pub weather_icons: Option<Vec<String>>,
    pub weather_descriptions: Option<Vec<String>>,
    pub astro: Option<Astro>,
    pub air_quality: Option<AirQuality>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistoricalEntry {
    pub date: Option<FieldValue>,
    #[serde(flatten)]
    pub conditions: Conditions,
    pub hourly: Option<Vec<Conditions>>,
}

impl HistoricalEntry {
    fn first_hourly(&self) -> Option<&Conditions> {
        self.hourly.as_ref().and_then(|h| h.first())
    }

    /// Entry-level icons, else the first hourly item's, else nothing.
    pub fn weather_icons(&self) -> Vec<String> {
        self.conditions
            .weather_icons
            .clone()
            .or_else(|| self.first_hourly().and_then(|h| h.weather_icons.clone()))
            .unwrap_or_default()
    }

    /// Same fallback chain as [`HistoricalEntry::weather_icons`].
    pub fn weather_descriptions(&self) -> Vec<String> {
        self.conditions
            .weather_descriptions
            .clone()
            .or_else(|| self.first_hourly().and_then(|h| h.weather_descriptions.clone()))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Astro {
    pub sunrise: Option<FieldValue>,
    pub sunset: Option<FieldValue>,
    pub moonrise: Option<FieldValue>,
    pub moonset: Option<FieldValue>,
    pub moon_phase: Option<FieldValue>,
    pub moon_illumination: Option<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AirQuality {
    pub co: Option<FieldValue>,
    pub no2: Option<FieldValue>,
    pub o3: Option<FieldValue>,
    pub so2: Option<FieldValue>,
    pub pm2_5: Option<FieldValue>,
    pub pm10: Option<FieldValue>,
    #[serde(rename = "us-epa-index")]
    pub us_epa_index: Option<FieldValue>,
    #[serde(rename = "gb-defra-index")]
    pub gb_defra_index: Option<FieldValue>,
}

/// Date-keyed historical entries in the order the payload lists them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Historical(Vec<(String, HistoricalEntry)>);

impl Historical {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> Option<(&str, &HistoricalEntry)> {
        self.0.first().map(|(date, entry)| (date.as_str(), entry))
    }

    pub fn get(&self, date: &str) -> Option<&HistoricalEntry> {
        self.0.iter().find(|(d, _)| d == date).map(|(_, e)| e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HistoricalEntry)> {
        self.0.iter().map(|(date, entry)| (date.as_str(), entry))
    }
}

impl<'de> Deserialize<'de> for Historical {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HistoricalVisitor;

        impl<'de> Visitor<'de> for HistoricalVisitor {
            type Value = Historical;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of dates to historical entries")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(String, HistoricalEntry)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));

                while let Some((date, entry)) = map.next_entry::<String, HistoricalEntry>()? {
                    // A repeated key keeps its first position and takes the later value.
                    match entries.iter_mut().find(|(d, _)| *d == date) {
                        Some(slot) => slot.1 = entry,
                        None => entries.push((date, entry)),
                    }
                }

                Ok(Historical(entries))
            }
        }

        deserializer.deserialize_map(HistoricalVisitor)
    }
}
