//! Song-catalog transform
//!
//! Projects song metadata into the song and artist dimensions.

use super::dedup::{dedup_by_key, Retain};
use crate::types::{Artist, Song, SongRecord};

/// Song and artist dimensions derived from one batch of song metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongCatalog {
    pub songs: Vec<Song>,
    pub artists: Vec<Artist>,
}

impl SongCatalog {
    /// Build both dimensions from raw records
    pub fn from_records(records: &[SongRecord]) -> Self {
        Self {
            songs: transform_songs(records),
            artists: transform_artists(records),
        }
    }
}

/// Song dimension: one row per `song_id`, first-seen wins
///
/// Records without a `song_id` are dropped.
pub fn transform_songs(records: &[SongRecord]) -> Vec<Song> {
    let projected = records.iter().filter_map(|r| {
        Some(Song {
            song_id: r.song_id.clone()?,
            title: r.title.clone(),
            artist_id: r.artist_id.clone(),
            year: r.year,
            duration: r.duration,
        })
    });
    dedup_by_key(projected, Retain::FirstSeen, |s| s.song_id.clone())
}

/// Artist dimension: one row per `artist_id`, first-seen wins
///
/// Records without an `artist_id` are dropped.
pub fn transform_artists(records: &[SongRecord]) -> Vec<Artist> {
    let projected = records.iter().filter_map(|r| {
        Some(Artist {
            artist_id: r.artist_id.clone()?,
            name: r.artist_name.clone(),
            location: r.artist_location.clone(),
            latitude: r.artist_latitude,
            longitude: r.artist_longitude,
        })
    });
    dedup_by_key(projected, Retain::FirstSeen, |a| a.artist_id.clone())
}
