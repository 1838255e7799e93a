use crate::domain::model::{EarthquakeFeature, FeedOutcome, RejectedFeature};
use crate::utils::error::{MapError, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const EARTHQUAKE_FEED: &str = "earthquake";
pub const PLATES_FEED: &str = "tectonic plates";

/// Fetches GeoJSON documents. One attempt per call; failures are returned, not retried.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    timeout: Duration,
}

impl FeedClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    pub async fn fetch(&self, url: &str) -> FeedOutcome<Value> {
        match self.try_fetch(url).await {
            Ok(document) => FeedOutcome::Success(document),
            Err(e) => {
                tracing::warn!("Feed request to {} failed: {}", url, e);
                FeedOutcome::Failure(e.to_string())
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<Value> {
        tracing::debug!("Requesting feed: {}", url);
        let response = self.client.get(url).timeout(self.timeout).send().await?;

        let status = response.status();
        tracing::debug!("Feed response status: {}", status);
        if !status.is_success() {
            return Err(MapError::FeedUnavailable {
                feed: url.to_string(),
                reason: format!("HTTP status {}", status),
            });
        }

        let document: Value = response.json().await?;
        Ok(document)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedEarthquakes {
    pub features: Vec<EarthquakeFeature>,
    pub rejected: Vec<RejectedFeature>,
}

fn feature_array<'a>(feed: &str, document: &'a Value) -> Result<&'a Vec<Value>> {
    let malformed = |reason: &str| MapError::MalformedFeed {
        feed: feed.to_string(),
        reason: reason.to_string(),
    };

    match document.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {}
        Some(other) => return Err(malformed(&format!("expected FeatureCollection, got {}", other))),
        None => return Err(malformed("document has no GeoJSON type")),
    }

    document
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("FeatureCollection has no features array"))
}

/// Splits a USGS-style FeatureCollection into usable records and rejections.
pub fn parse_earthquakes(document: &Value) -> Result<ParsedEarthquakes> {
    let mut parsed = ParsedEarthquakes::default();

    for (index, feature) in feature_array(EARTHQUAKE_FEED, document)?.iter().enumerate() {
        match parse_feature(index, feature) {
            Ok(quake) => parsed.features.push(quake),
            Err(MapError::MalformedFeature { index, reason }) => {
                tracing::debug!("Rejecting feature {}: {}", index, reason);
                parsed.rejected.push(RejectedFeature { index, reason });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(parsed)
}

pub fn parse_feature(index: usize, feature: &Value) -> Result<EarthquakeFeature> {
    let malformed = |reason: String| MapError::MalformedFeature { index, reason };

    let properties = feature
        .get("properties")
        .filter(|p| p.is_object())
        .ok_or_else(|| malformed("missing properties object".to_string()))?;

    let magnitude = match properties.get("mag") {
        None | Some(Value::Null) => return Err(malformed("missing magnitude".to_string())),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| malformed(format!("non-numeric magnitude: {}", value)))?,
    };

    let coordinates = feature
        .get("geometry")
        .and_then(|g| g.get("coordinates"))
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("missing geometry coordinates".to_string()))?;

    let coordinate = |position: usize, name: &str| -> Result<f64> {
        match coordinates.get(position) {
            None | Some(Value::Null) => Err(malformed(format!("missing {}", name))),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| malformed(format!("non-numeric {}: {}", name, value))),
        }
    };
    let longitude = coordinate(0, "longitude")?;
    let latitude = coordinate(1, "latitude")?;
    let depth_km = coordinate(2, "depth")?;

    let place = properties
        .get("place")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();

    let time = properties
        .get("time")
        .and_then(Value::as_i64)
        .and_then(DateTime::<Utc>::from_timestamp_millis);

    Ok(EarthquakeFeature {
        id: feature.get("id").and_then(Value::as_str).map(str::to_string),
        magnitude,
        depth_km,
        place,
        longitude,
        latitude,
        time,
        url: properties
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Checks the plate boundary document is drawable; its contents are passed through.
pub fn validate_plates(document: &Value) -> Result<usize> {
    feature_array(PLATES_FEED, document).map(Vec::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn quake(id: &str, mag: Value, coordinates: Value, place: Value) -> Value {
        json!({
            "type": "Feature",
            "id": id,
            "properties": { "mag": mag, "place": place, "time": 1_700_000_000_000i64,
                            "url": format!("https://earthquake.usgs.gov/earthquakes/eventpage/{}", id) },
            "geometry": { "type": "Point", "coordinates": coordinates }
        })
    }

    #[test]
    fn test_parse_valid_feature() {
        let feature = quake("us7000abcd", json!(5.2), json!([139.69, 35.68, 10.0]), json!("Tokyo, Japan"));

        let parsed = parse_feature(0, &feature).unwrap();

        assert_eq!(parsed.id.as_deref(), Some("us7000abcd"));
        assert_eq!(parsed.magnitude, 5.2);
        assert_eq!(parsed.depth_km, 10.0);
        assert_eq!(parsed.longitude, 139.69);
        assert_eq!(parsed.latitude, 35.68);
        assert_eq!(parsed.place, "Tokyo, Japan");
        assert_eq!(
            parsed.time.unwrap().to_rfc3339(),
            "2023-11-14T22:13:20+00:00"
        );
        assert!(parsed.url.unwrap().ends_with("us7000abcd"));
    }

    #[test]
    fn test_zero_and_negative_values_are_accepted() {
        let feature = quake("nc1", json!(0), json!([-122.8, 38.8, -1.2]), json!("The Geysers, CA"));
        let parsed = parse_feature(0, &feature).unwrap();
        assert_eq!(parsed.magnitude, 0.0);
        assert_eq!(parsed.depth_km, -1.2);
    }

    #[test]
    fn test_missing_place_defaults_to_unknown() {
        let feature = quake("ak1", json!(1.4), json!([-150.0, 61.0, 30.0]), Value::Null);
        assert_eq!(parse_feature(0, &feature).unwrap().place, "Unknown");
    }

    #[test]
    fn test_malformed_features_are_rejected() {
        let cases = [
            (quake("a", Value::Null, json!([1.0, 2.0, 3.0]), json!("x")), "missing magnitude"),
            (quake("b", json!("4.5"), json!([1.0, 2.0, 3.0]), json!("x")), "non-numeric magnitude"),
            (quake("c", json!(4.5), json!([1.0, 2.0]), json!("x")), "missing depth"),
            (quake("d", json!(4.5), json!([1.0, 2.0, "deep"]), json!("x")), "non-numeric depth"),
            (quake("e", json!(4.5), json!([null, 2.0, 3.0]), json!("x")), "missing longitude"),
            (json!({"type": "Feature", "geometry": null}), "missing properties"),
        ];

        for (i, (feature, expected)) in cases.iter().enumerate() {
            match parse_feature(i, feature) {
                Err(MapError::MalformedFeature { index, reason }) => {
                    assert_eq!(index, i);
                    assert!(reason.contains(expected), "{} does not mention {}", reason, expected);
                }
                other => panic!("case {} should be rejected, got {:?}", i, other),
            }
        }
    }

    #[test]
    fn test_parse_earthquakes_collects_rejections() {
        let document = json!({
            "type": "FeatureCollection",
            "features": [
                quake("ok1", json!(2.1), json!([1.0, 2.0, 15.0]), json!("A")),
                quake("bad", Value::Null, json!([1.0, 2.0, 15.0]), json!("B")),
                quake("ok2", json!(6.3), json!([1.0, 2.0, 95.0]), json!("C"))
            ]
        });

        let parsed = parse_earthquakes(&document).unwrap();

        assert_eq!(parsed.features.len(), 2);
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].index, 1);
        assert_eq!(parsed.features[1].id.as_deref(), Some("ok2"));
    }

    #[test]
    fn test_non_collection_documents_are_malformed_feeds() {
        assert!(matches!(
            parse_earthquakes(&json!({"type": "Feature"})),
            Err(MapError::MalformedFeed { .. })
        ));
        assert!(matches!(
            parse_earthquakes(&json!([1, 2, 3])),
            Err(MapError::MalformedFeed { .. })
        ));
        assert!(matches!(
            validate_plates(&json!({"type": "FeatureCollection"})),
            Err(MapError::MalformedFeed { .. })
        ));
        assert_eq!(
            validate_plates(&json!({"type": "FeatureCollection", "features": []})).unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start();
        let body = json!({"type": "FeatureCollection", "features": []});

        let feed_mock = server.mock(|when, then| {
            when.method(GET).path("/summary/all_week.geojson");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(body.clone());
        });

        let client = FeedClient::new(Duration::from_secs(5));
        let outcome = client.fetch(&server.url("/summary/all_week.geojson")).await;

        feed_mock.assert();
        assert_eq!(outcome, FeedOutcome::Success(body));
    }

    #[tokio::test]
    async fn test_fetch_http_error_is_failure() {
        let server = MockServer::start();
        let feed_mock = server.mock(|when, then| {
            when.method(GET).path("/plates.json");
            then.status(503);
        });

        let client = FeedClient::new(Duration::from_secs(5));
        let outcome = client.fetch(&server.url("/plates.json")).await;

        // one attempt only
        feed_mock.assert_hits(1);
        assert!(!outcome.is_success());
        assert!(outcome.failure_reason().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_fetch_non_json_body_is_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/broken");
            then.status(200).body("<html>maintenance</html>");
        });

        let client = FeedClient::new(Duration::from_secs(5));
        let outcome = client.fetch(&server.url("/broken")).await;

        assert!(!outcome.is_success());
    }
}
