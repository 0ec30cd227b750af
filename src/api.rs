use chrono::NaiveTime;
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;
use crate::data::{format_meeting_time, Meeting, Organization, Position, WeekDay};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Origin and radius for a proximity search. The backend needs all three
/// query parameters together to rank results by distance.
#[derive(Debug, Clone, Copy)]
pub struct DistanceOptions {
    pub position: Position,
    pub distance: f64,
}

pub async fn fetch_meetings(
    config: &Config,
    options: Option<&DistanceOptions>,
) -> Result<Vec<Meeting>, ApiError> {
    let mut url = format!("{}/meetings", config.api_url);

    if let Some(options) = options {
        url.push_str(&format!(
            "?longitude={}&latitude={}&distance={}",
            urlencoding::encode(&options.position.longitude.to_string()),
            urlencoding::encode(&options.position.latitude.to_string()),
            urlencoding::encode(&options.distance.to_string()),
        ));
    }

    log::debug!("fetching meetings from {}", url);

    let body = reqwest::get(&url).await?.text().await?;
    Ok(parse_meetings(&body)?)
}

/// Looks up a free-text location with the configured geocoder and takes the
/// first match. `Ok(None)` means the query matched nothing, which is a
/// user-facing condition rather than an error.
pub async fn fetch_position_by_query(
    config: &Config,
    query: &str,
) -> Result<Option<Position>, ApiError> {
    let url = format!(
        "{}?q={}&format=json",
        config.geocoder_url,
        urlencoding::encode(query)
    );

    log::debug!("geocoding {:?}", query);

    let body = reqwest::get(&url).await?.text().await?;
    Ok(parse_position(&body)?)
}

fn parse_meetings(body: &str) -> Result<Vec<Meeting>, serde_json::Error> {
    let results: Vec<ApiSearchMeeting> = serde_json::from_str(body)?;

    let meetings = results
        .into_iter()
        .zip(1..)
        .map(|(result, id)| result.into_meeting(id))
        .collect();

    Ok(meetings)
}

fn parse_position(body: &str) -> Result<Option<Position>, serde_json::Error> {
    let places: Vec<Place> = serde_json::from_str(body)?;

    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    match (place.lat.parse(), place.lon.parse()) {
        (Ok(latitude), Ok(longitude)) => Ok(Some(Position::new(latitude, longitude))),
        _ => {
            log::warn!(
                "geocoder returned non-numeric coordinates for {:?}",
                place.display_name
            );
            Ok(None)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiSearchMeeting {
    meeting: ApiMeeting,
    distance: Option<f64>,
}

impl ApiSearchMeeting {
    fn into_meeting(self, id: i32) -> Meeting {
        let api = self.meeting;

        let ApiTime::Recurring { day, hour, minute } = api.time;
        let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
        let duration_in_secs = api.duration.map(|duration| duration.secs);

        Meeting {
            id,
            name: api.name,
            org: api.org,
            notes: api.notes,
            source: api.source,
            position: api.location.position,
            country: api.location.country,
            region: api.location.region,
            address: api.location.address,
            location_name: api.location.location_name,
            location_notes: api.location.location_notes,
            distance: self.distance,
            email: api.contact.email,
            phone: api.contact.phone,
            online: api.online_options.is_online,
            online_url: api.online_options.online_url,
            online_notes: api.online_options.notes,
            recurring: true,
            day,
            time,
            duration_in_secs,
            formatted_time: format_meeting_time(day, time, duration_in_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiMeeting {
    name: String,
    org: Organization,
    notes: Option<String>,
    source: String,
    contact: ApiContact,
    location: ApiLocation,
    online_options: ApiOnlineOptions,
    time: ApiTime,
    duration: Option<ApiDuration>,
}

#[derive(Debug, Deserialize)]
struct ApiContact {
    email: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    position: Option<Position>,
    location_name: Option<String>,
    location_notes: Option<String>,
    country: Option<String>,
    region: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiOnlineOptions {
    online_url: Option<String>,
    notes: Option<String>,
    is_online: bool,
}

#[derive(Debug, Deserialize)]
enum ApiTime {
    #[serde(rename = "recurring")]
    Recurring { day: WeekDay, hour: u32, minute: u32 },
}

#[derive(Debug, Deserialize)]
struct ApiDuration {
    secs: u64,
    #[allow(dead_code)]
    nanos: u32,
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_MEETINGS: &str = r#"
    [
        {
            "meeting": {
                "name": "Harbour Group",
                "org": "AnonymousAlcoholics",
                "notes": "Ring the bell twice",
                "source": "https://alcoholics-anonymous.eu/meetings/1",
                "contact": { "email": "host@example.org", "phone": null },
                "location": {
                    "position": { "latitude": 52.37, "longitude": 4.89 },
                    "location_name": "Community hall",
                    "location_notes": null,
                    "country": "Nederland",
                    "region": "Noord-Holland",
                    "address": "Kerkstraat 1"
                },
                "online_options": { "online_url": null, "notes": null, "is_online": false },
                "time": { "recurring": { "day": "Friday", "hour": 19, "minute": 0 } },
                "duration": { "secs": 3600, "nanos": 0 }
            },
            "distance": 2.4
        },
        {
            "meeting": {
                "name": "Evening Call",
                "org": "NarcoticsAnonymous",
                "notes": null,
                "source": "https://na-holland.nl/meetings/2",
                "contact": { "email": null, "phone": null },
                "location": {
                    "position": null,
                    "location_name": null,
                    "location_notes": null,
                    "country": null,
                    "region": null,
                    "address": null
                },
                "online_options": {
                    "online_url": "https://zoom.example.org/123",
                    "notes": "Waiting room enabled",
                    "is_online": true
                },
                "time": { "recurring": { "day": "Sunday", "hour": 21, "minute": 30 } },
                "duration": null
            },
            "distance": null
        }
    ]
    "#;

    #[test]
    fn meetings_get_sequential_ids_starting_at_one() {
        let meetings = parse_meetings(TWO_MEETINGS).unwrap();

        assert_eq!(meetings.len(), 2);
        assert_eq!(meetings[0].id, 1);
        assert_eq!(meetings[1].id, 2);
    }

    #[test]
    fn fields_map_through_from_the_wire_format() {
        let meetings = parse_meetings(TWO_MEETINGS).unwrap();
        let first = &meetings[0];

        assert_eq!(first.name, "Harbour Group");
        assert_eq!(first.org, Organization::AnonymousAlcoholics);
        assert_eq!(first.country.as_deref(), Some("Nederland"));
        assert_eq!(first.region.as_deref(), Some("Noord-Holland"));
        assert_eq!(first.address.as_deref(), Some("Kerkstraat 1"));
        assert_eq!(first.email.as_deref(), Some("host@example.org"));
        assert_eq!(first.phone, None);
        assert_eq!(first.distance, Some(2.4));
        assert_eq!(first.position, Some(Position::new(52.37, 4.89)));
        assert_eq!(first.day, WeekDay::Friday);
        assert_eq!(first.duration_in_secs, Some(3600));
        assert_eq!(first.formatted_time, "Every Friday at 19:00 - 20:00");
        assert!(first.recurring);
        assert!(!first.online);
    }

    #[test]
    fn null_position_distance_and_duration_become_none() {
        let meetings = parse_meetings(TWO_MEETINGS).unwrap();
        let second = &meetings[1];

        assert_eq!(second.position, None);
        assert_eq!(second.distance, None);
        assert_eq!(second.duration_in_secs, None);
        assert_eq!(second.formatted_time, "Every Sunday at 21:30");
        assert!(second.online);
        assert_eq!(second.online_url.as_deref(), Some("https://zoom.example.org/123"));
    }

    #[test]
    fn first_geocoder_match_wins() {
        let body = r#"
        [
            { "lat": "52.09", "lon": "5.12", "display_name": "Utrecht" },
            { "lat": "0.0", "lon": "0.0", "display_name": "Elsewhere" }
        ]
        "#;

        let position = parse_position(body).unwrap().unwrap();
        assert_eq!(position, Position::new(52.09, 5.12));
    }

    #[test]
    fn empty_geocoder_response_is_not_found() {
        assert_eq!(parse_position("[]").unwrap(), None);
    }

    #[test]
    fn malformed_geocoder_coordinates_are_not_found() {
        let body = r#"[{ "lat": "not-a-number", "lon": "5.12", "display_name": "X" }]"#;
        assert_eq!(parse_position(body).unwrap(), None);
    }
}
