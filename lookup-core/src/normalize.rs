//! Turns a raw weather payload into a flat view and renders it as text.
//!
//! A payload carries either a `current` snapshot or a date-keyed
//! `historical` map. A non-empty historical map wins; its first entry is the
//! one shown. Missing fields render as empty text, never as an error.

use crate::{
    error::LookupError,
    model::{AirQuality, Astro, Conditions, FieldValue, RequestInfo, WeatherRecord},
};

/// Shown in place of the weather when the payload cannot be decoded.
pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid weather data format.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Current,
    Historical,
}

/// Everything the renderer needs, already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherView {
    pub mode: Mode,
    pub location_name: Option<FieldValue>,
    pub date: Option<String>,
    pub request: RequestInfo,
    pub conditions: Conditions,
    pub weather_icons: Vec<String>,
    pub weather_descriptions: Vec<String>,
    pub astro: Astro,
    /// Only populated for current snapshots.
    pub air_quality: Option<AirQuality>,
    /// Only populated when the notes contain more than whitespace.
    pub notes: Option<String>,
}

impl WeatherView {
    pub fn from_record(record: &WeatherRecord) -> Self {
        let request = record.request.clone().unwrap_or_default();
        let location = record.location.clone().unwrap_or_default();
        let notes = record
            .notes
            .as_ref()
            .filter(|n| !n.trim().is_empty())
            .cloned();

        let historical = record
            .historical
            .as_ref()
            .and_then(|h| h.first())
            .map(|(_, entry)| entry);

        match historical {
            Some(entry) => WeatherView {
                mode: Mode::Historical,
                location_name: location.name,
                date: entry.date.as_ref().map(ToString::to_string),
                request,
                conditions: entry.conditions.clone(),
                weather_icons: entry.weather_icons(),
                weather_descriptions: entry.weather_descriptions(),
                astro: entry.conditions.astro.clone().unwrap_or_default(),
                air_quality: None,
                notes,
            },
            None => {
                let current = record.current.clone().unwrap_or_default();
                let date = record.date.as_ref().map(ToString::to_string).or_else(|| {
                    location
                        .localtime
                        .as_deref()
                        .and_then(|t| t.split(' ').next())
                        .map(str::to_string)
                });

                WeatherView {
                    mode: Mode::Current,
                    location_name: location.name,
                    date,
                    request,
                    weather_icons: current.weather_icons.clone().unwrap_or_default(),
                    weather_descriptions: current.weather_descriptions.clone().unwrap_or_default(),
                    astro: current.astro.clone().unwrap_or_default(),
                    air_quality: current.air_quality.clone(),
                    conditions: current,
                    notes,
                }
            }
        }
    }

    pub fn is_historical(&self) -> bool {
        self.mode == Mode::Historical
    }
}

/// Decode a raw payload into a [`WeatherView`].
pub fn parse_payload(raw: &str) -> Result<WeatherView, LookupError> {
    let record: WeatherRecord = serde_json::from_str(raw)?;
    Ok(WeatherView::from_record(&record))
}

/// Render a raw payload, degrading to [`INVALID_PAYLOAD_MESSAGE`] when it
/// is not a weather record.
pub fn render_payload(raw: &str) -> String {
    match parse_payload(raw) {
        Ok(view) => render(&view),
        Err(err) => {
            tracing::debug!("Rendering fallback for undecodable payload: {err}");
            INVALID_PAYLOAD_MESSAGE.to_string()
        }
    }
}

fn text(value: &Option<FieldValue>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn first(values: &[String]) -> &str {
    values.first().map(String::as_str).unwrap_or_default()
}

pub fn render(view: &WeatherView) -> String {
    let w = &view.conditions;
    let astro = &view.astro;
    let mut lines = Vec::new();

    lines.push(format!(
        "🌤️ Weather for {} on {}",
        text(&view.location_name),
        view.date.as_deref().unwrap_or_default()
    ));

    lines.push(String::new());
    lines.push("📍 Request Info".to_string());
    lines.push(format!("  - Query: {}", text(&view.request.query)));
    lines.push(format!("  - Language: {}", text(&view.request.language)));
    lines.push(format!("  - Units: {}", text(&view.request.unit)));

    lines.push(String::new());
    lines.push("🌡️ Weather Details".to_string());
    if let Some(icon) = view.weather_icons.first().filter(|i| !i.is_empty()) {
        lines.push(format!(
            "  Icon: {icon} ({})",
            first(&view.weather_descriptions)
        ));
    }
    // Unit labels are fixed text; request.unit is shown above but not applied.
    lines.push(format!("  - Description: {}", first(&view.weather_descriptions)));
    lines.push(format!("  - Temperature: {}°C", text(&w.temperature)));
    lines.push(format!("  - Feels Like: {}°C", text(&w.feelslike)));
    lines.push(format!("  - Humidity: {}%", text(&w.humidity)));
    lines.push(format!(
        "  - Wind: {} km/h {}",
        text(&w.wind_speed),
        text(&w.wind_dir)
    ));
    lines.push(format!("  - Pressure: {} hPa", text(&w.pressure)));
    lines.push(format!("  - Cloud Cover: {}%", text(&w.cloudcover)));
    lines.push(format!("  - UV Index: {}", text(&w.uv_index)));
    lines.push(format!("  - Visibility: {} km", text(&w.visibility)));

    lines.push(String::new());
    lines.push("🌌 Astronomy".to_string());
    lines.push(format!("  - Sunrise: {}", text(&astro.sunrise)));
    lines.push(format!("  - Sunset: {}", text(&astro.sunset)));
    lines.push(format!("  - Moonrise: {}", text(&astro.moonrise)));
    lines.push(format!("  - Moonset: {}", text(&astro.moonset)));
    lines.push(format!("  - Moon Phase: {}", text(&astro.moon_phase)));
    lines.push(format!(
        "  - Moon Illumination: {}%",
        text(&astro.moon_illumination)
    ));

    if let (Mode::Current, Some(aq)) = (view.mode, view.air_quality.as_ref()) {
        lines.push(String::new());
        lines.push("🌫️ Air Quality".to_string());
        lines.push(format!("  - CO: {}", text(&aq.co)));
        lines.push(format!("  - NO₂: {}", text(&aq.no2)));
        lines.push(format!("  - O₃: {}", text(&aq.o3)));
        lines.push(format!("  - SO₂: {}", text(&aq.so2)));
        lines.push(format!("  - PM2.5: {}", text(&aq.pm2_5)));
        lines.push(format!("  - PM10: {}", text(&aq.pm10)));
        lines.push(format!("  - US EPA Index: {}", text(&aq.us_epa_index)));
        lines.push(format!("  - UK DEFRA Index: {}", text(&aq.gb_defra_index)));
    }

    if let Some(notes) = &view.notes {
        lines.push(String::new());
        lines.push("📝 Notes".to_string());
        lines.push(format!("  {notes}"));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT_WITH_EMPTY_HISTORICAL: &str = r#"{"request":{"query":"London","language":"en","unit":"m"},"location":{"name":"London","localtime":"2024-01-01 10:00"},"current":{"temperature":10,"astro":{"sunrise":"07:00"}}, "historical":{}}"#;

    fn full_current() -> &'static str {
        r#"{
            "request": {"query": "Oslo, Norway", "language": "en", "unit": "m"},
            "location": {"name": "Oslo", "localtime": "2024-05-04 12:30"},
            "current": {
                "temperature": 14,
                "feelslike": 12,
                "humidity": 55,
                "wind_speed": 11,
                "wind_dir": "SW",
                "pressure": 1015,
                "cloudcover": 25,
                "uv_index": 4,
                "visibility": 10,
                "weather_icons": ["https://cdn.example/partly.png"],
                "weather_descriptions": ["Partly cloudy"],
                "astro": {
                    "sunrise": "04:58 AM",
                    "sunset": "09:35 PM",
                    "moonrise": "03:40 AM",
                    "moonset": "04:10 PM",
                    "moon_phase": "Waning Crescent",
                    "moon_illumination": 17
                },
                "air_quality": {
                    "co": "201.9",
                    "no2": "9.2",
                    "o3": "74",
                    "so2": "1.1",
                    "pm2_5": "3.4",
                    "pm10": "5.0",
                    "us-epa-index": "1",
                    "gb-defra-index": "1"
                }
            },
            "notes": "Sea breeze in the afternoon"
        }"#
    }

    #[test]
    fn empty_historical_selects_current_and_localtime_date() {
        let view = parse_payload(CURRENT_WITH_EMPTY_HISTORICAL).unwrap();

        assert_eq!(view.mode, Mode::Current);
        assert_eq!(view.date.as_deref(), Some("2024-01-01"));
        assert_eq!(view.conditions.temperature, Some(FieldValue::Number(10.into())));
        assert_eq!(view.astro.sunrise, Some(FieldValue::from("07:00")));

        let out = render(&view);
        assert!(out.starts_with("🌤️ Weather for London on 2024-01-01"));
        assert!(out.contains("  - Temperature: 10°C"));
        assert!(out.contains("  - Sunrise: 07:00"));
    }

    #[test]
    fn top_level_date_beats_localtime() {
        let view = parse_payload(
            r#"{"date":"2023-12-31","location":{"localtime":"2024-01-01 10:00"},"current":{}}"#,
        )
        .unwrap();

        assert_eq!(view.date.as_deref(), Some("2023-12-31"));
    }

    #[test]
    fn historical_entry_uses_hourly_icon_fallback() {
        let view = parse_payload(
            r#"{"location":{"name":"Paris"},"current":{"temperature":99},"historical":{"2024-01-01":{"date":"2024-01-01","astro":{},"hourly":[{"weather_icons":["x.png"]}]}}}"#,
        )
        .unwrap();

        assert!(view.is_historical());
        assert_eq!(view.weather_icons, vec!["x.png".to_string()]);
        assert_eq!(view.date.as_deref(), Some("2024-01-01"));
        // Readings come from the entry, not the current snapshot.
        assert_eq!(view.conditions.temperature, None);
    }

    #[test]
    fn historical_description_falls_back_to_hourly() {
        let out = render_payload(
            r#"{"historical":{"2024-01-01":{"date":"2024-01-01","hourly":[{"weather_descriptions":["Sunny"]}]}}}"#,
        );

        assert!(out.contains("  - Description: Sunny"));
    }

    #[test]
    fn integral_float_readings_render_without_fraction() {
        let out = render_payload(r#"{"current":{"temperature":10.0,"visibility":1e1}}"#);

        assert!(out.contains("  - Temperature: 10°C"));
        assert!(out.contains("  - Visibility: 10 km"));
    }

    #[test]
    fn first_historical_key_is_representative() {
        let view = parse_payload(
            r#"{"historical":{"2024-02-02":{"date":"2024-02-02","temperature":1},"2024-01-01":{"date":"2024-01-01","temperature":2}}}"#,
        )
        .unwrap();

        assert_eq!(view.date.as_deref(), Some("2024-02-02"));
        assert_eq!(view.conditions.temperature, Some(FieldValue::Number(1.into())));
    }

    #[test]
    fn invalid_json_renders_only_the_fallback_message() {
        assert_eq!(render_payload("not json"), "Invalid weather data format.");
    }

    #[test]
    fn invalid_json_is_reported_as_invalid_payload() {
        let err = parse_payload("not json").unwrap_err();
        assert!(matches!(err, LookupError::InvalidPayload { .. }));
    }

    #[test]
    fn full_current_payload_renders_every_section() {
        let out = render_payload(full_current());

        assert!(out.contains("🌤️ Weather for Oslo on 2024-05-04"));
        assert!(out.contains("  - Query: Oslo, Norway"));
        assert!(out.contains("  Icon: https://cdn.example/partly.png (Partly cloudy)"));
        assert!(out.contains("  - Description: Partly cloudy"));
        assert!(out.contains("  - Wind: 11 km/h SW"));
        assert!(out.contains("  - Pressure: 1015 hPa"));
        assert!(out.contains("  - Moon Illumination: 17%"));
        assert!(out.contains("🌫️ Air Quality"));
        assert!(out.contains("  - PM2.5: 3.4"));
        assert!(out.contains("  - UK DEFRA Index: 1"));
        assert!(out.contains("📝 Notes\n  Sea breeze in the afternoon"));
    }

    #[test]
    fn air_quality_hidden_in_historical_mode() {
        let out = render_payload(
            r#"{"historical":{"2024-01-01":{"date":"2024-01-01","air_quality":{"co":"1"}}}}"#,
        );

        assert!(!out.contains("Air Quality"));
    }

    #[test]
    fn blank_notes_are_not_rendered() {
        let view = parse_payload(r#"{"current":{},"notes":"   \n\t"}"#).unwrap();
        assert_eq!(view.notes, None);
        assert!(!render(&view).contains("Notes"));
    }

    #[test]
    fn missing_fields_render_as_empty_text() {
        let out = render_payload("{}");

        assert!(out.starts_with("🌤️ Weather for  on "));
        assert!(out.contains("  - Temperature: °C"));
        assert!(out.contains("  - Wind:  km/h "));
        assert!(!out.contains("Icon:"));
        assert!(!out.contains("Air Quality"));
    }

    #[test]
    fn unit_labels_ignore_requested_units() {
        let out = render_payload(r#"{"request":{"unit":"f"},"current":{"temperature":50}}"#);

        assert!(out.contains("  - Units: f"));
        assert!(out.contains("  - Temperature: 50°C"));
    }
}
