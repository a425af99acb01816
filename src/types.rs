//! Common types used throughout the pipelines
//!
//! Raw input records as they arrive in the JSON sources, the five output
//! rows of the star schema, and the `Table` catalog that ties each output
//! table to its name and partition layout.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Raw Inputs
// ============================================================================

/// One song-metadata document
///
/// Every field is optional on the wire; rows without a key are dropped by
/// the catalog transform rather than rejected here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    #[serde(default)]
    pub num_songs: Option<i64>,
    #[serde(default)]
    pub artist_id: Option<String>,
    #[serde(default)]
    pub artist_latitude: Option<f64>,
    #[serde(default)]
    pub artist_longitude: Option<f64>,
    #[serde(default)]
    pub artist_location: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub song_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub year: Option<i32>,
}

/// One user-action event from the activity logs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub auth: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub item_in_session: Option<i64>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub registration: Option<f64>,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub song: Option<String>,
    #[serde(default)]
    pub status: Option<i64>,
    /// Event time in epoch milliseconds
    pub ts: i64,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default, deserialize_with = "deserialize_user_id")]
    pub user_id: Option<i64>,
}

/// The page value that marks a song play
pub const NEXT_SONG_PAGE: &str = "NextSong";

impl LogEvent {
    /// Whether this event is a song play
    pub fn is_song_play(&self) -> bool {
        self.page.as_deref() == Some(NEXT_SONG_PAGE)
    }
}

/// Logged-out sessions carry `"userId": ""`; numeric ids may arrive as
/// strings or numbers.
fn deserialize_user_id<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Int(id)) => Ok(Some(id)),
        Some(RawId::Float(id)) if id.fract() == 0.0 => Ok(Some(id as i64)),
        Some(RawId::Float(id)) => Err(D::Error::custom(format!("invalid userId {id}"))),
        Some(RawId::Text(text)) => {
            let text = crate::transform::trim_key(&text);
            if text.is_empty() {
                Ok(None)
            } else {
                text.parse()
                    .map(Some)
                    .map_err(|e| D::Error::custom(format!("invalid userId '{text}': {e}")))
            }
        }
    }
}

// ============================================================================
// Star Schema Rows
// ============================================================================

/// Song dimension row
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub title: Option<String>,
    pub artist_id: Option<String>,
    pub year: Option<i32>,
    pub duration: Option<f64>,
}

/// Artist dimension row
#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// User dimension row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

/// Time dimension row, one per distinct event second
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    pub start_time: DateTime<Utc>,
    pub hour: u32,
    pub day: u32,
    /// ISO 8601 week of year (1-53)
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// ISO weekday, Monday = 1 through Sunday = 7
    pub weekday: u32,
}

/// Song-play fact row
#[derive(Debug, Clone, PartialEq)]
pub struct SongPlay {
    pub songplay_id: i64,
    pub start_time: DateTime<Utc>,
    pub user_id: Option<i64>,
    pub level: Option<String>,
    pub song_id: String,
    pub artist_id: String,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    /// Partition column copied from the matching time row
    pub year: i32,
    /// Partition column copied from the matching time row
    pub month: u32,
}

// ============================================================================
// Table Catalog
// ============================================================================

/// The five output tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Songs,
    Artists,
    Users,
    Time,
    SongPlays,
}

impl Table {
    /// All tables, dimensions before facts
    pub const ALL: [Table; 5] = [
        Table::Songs,
        Table::Artists,
        Table::Users,
        Table::Time,
        Table::SongPlays,
    ];

    /// Directory / table name
    pub fn name(self) -> &'static str {
        match self {
            Table::Songs => "songs",
            Table::Artists => "artists",
            Table::Users => "users",
            Table::Time => "time",
            Table::SongPlays => "songplays",
        }
    }

    /// Columns the lake layout partitions on, outermost first
    pub fn partition_columns(self) -> &'static [&'static str] {
        match self {
            Table::Songs => &["year", "artist_id"],
            Table::Time | Table::SongPlays => &["year", "month"],
            Table::Artists | Table::Users => &[],
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Row counts produced by a pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub songs: usize,
    pub artists: usize,
    pub users: usize,
    pub time: usize,
    pub songplays: usize,
}

impl TableCounts {
    /// Count for a single table
    pub fn get(&self, table: Table) -> usize {
        match table {
            Table::Songs => self.songs,
            Table::Artists => self.artists,
            Table::Users => self.users,
            Table::Time => self.time,
            Table::SongPlays => self.songplays,
        }
    }

    /// Set the count for a single table
    pub fn set(&mut self, table: Table, count: usize) {
        match table {
            Table::Songs => self.songs = count,
            Table::Artists => self.artists = count,
            Table::Users => self.users = count,
            Table::Time => self.time = count,
            Table::SongPlays => self.songplays = count,
        }
    }
}
