use chrono::{Duration, NaiveTime};
use serde::Deserialize;
use std::fmt;
use std::rc::Rc;

pub const APP_ID: &str = "org.meetingfinder.MeetingFinder";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Meetings shown per page in the results list.
pub const PAGE_SIZE: usize = 20;

pub const MIN_ZOOM: u32 = 2;
pub const MAX_ZOOM: u32 = 19;
pub const INITIAL_ZOOM: f64 = 2.0;

/// Zoom level used when flying to a single meeting.
pub const FOCUS_ZOOM: f64 = 13.0;
/// Zoom level used when recentering on a geocoded search origin.
pub const SEARCH_ZOOM: f64 = 9.0;

/// Markers closer than this (in screen pixels at the current zoom) are
/// grouped into one cluster.
pub const CLUSTER_RADIUS_PX: f64 = 64.0;
/// A cluster icon shows at most this many stacked member logos.
pub const CLUSTER_ICON_CAP: usize = 5;

pub type MeetingCallback = Rc<dyn Fn(Rc<Meeting>)>;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Default)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Organization {
    AnonymousAlcoholics,
    DebtorsAnonymous,
    CrystalMethAnonymous,
    CodependentsAnonymous,
    NarcoticsAnonymous,
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Organization::AnonymousAlcoholics => "Alcoholics Anonymous",
            Organization::DebtorsAnonymous => "Debtors Anonymous",
            Organization::CrystalMethAnonymous => "Crystal Meth Anonymous",
            Organization::CodependentsAnonymous => "Co-Dependents Anonymous",
            Organization::NarcoticsAnonymous => "Narcotics Anonymous",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum WeekDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl fmt::Display for WeekDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WeekDay::Monday => "Monday",
            WeekDay::Tuesday => "Tuesday",
            WeekDay::Wednesday => "Wednesday",
            WeekDay::Thursday => "Thursday",
            WeekDay::Friday => "Friday",
            WeekDay::Saturday => "Saturday",
            WeekDay::Sunday => "Sunday",
        };
        write!(f, "{}", name)
    }
}

/// One recurring support-group meeting, as shown in the list and on the map.
/// Built fresh on every fetch; `id` is assigned client-side in fetch order
/// and is only unique within that one result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Meeting {
    pub id: i32,

    pub name: String,
    pub org: Organization,
    pub notes: Option<String>,
    pub source: String,

    pub position: Option<Position>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub address: Option<String>,
    pub location_name: Option<String>,
    pub location_notes: Option<String>,

    /// Kilometers from the search origin; `None` when the search had no
    /// location filter.
    pub distance: Option<f64>,

    pub email: Option<String>,
    pub phone: Option<String>,

    pub online: bool,
    pub online_url: Option<String>,
    pub online_notes: Option<String>,

    pub recurring: bool,
    pub day: WeekDay,
    pub time: NaiveTime,
    pub duration_in_secs: Option<u64>,
    pub formatted_time: String,
}

/// Human-readable schedule line, e.g. "Every Friday at 19:00 - 20:00".
/// The end time is start + duration, at minute precision; times past
/// midnight wrap around.
pub fn format_meeting_time(day: WeekDay, start: NaiveTime, duration_in_secs: Option<u64>) -> String {
    let mut formatted = format!("Every {} at {}", day, start.format("%H:%M"));

    if let Some(secs) = duration_in_secs {
        let (end, _) = start.overflowing_add_signed(Duration::seconds(secs as i64));
        formatted.push_str(&format!(" - {}", end.format("%H:%M")));
    }

    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn one_hour_meeting_ends_an_hour_later() {
        let formatted = format_meeting_time(WeekDay::Friday, at(19, 0), Some(3600));
        assert_eq!(formatted, "Every Friday at 19:00 - 20:00");
    }

    #[test]
    fn ninety_minute_meeting_keeps_minute_precision() {
        let formatted = format_meeting_time(WeekDay::Monday, at(18, 15), Some(90 * 60));
        assert_eq!(formatted, "Every Monday at 18:15 - 19:45");
    }

    #[test]
    fn missing_duration_omits_the_end_time() {
        let formatted = format_meeting_time(WeekDay::Sunday, at(10, 30), None);
        assert_eq!(formatted, "Every Sunday at 10:30");
    }

    #[test]
    fn end_time_wraps_past_midnight() {
        let formatted = format_meeting_time(WeekDay::Saturday, at(23, 30), Some(3600));
        assert_eq!(formatted, "Every Saturday at 23:30 - 00:30");
    }
}
