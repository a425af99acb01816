//! Event-log transform
//!
//! Derives the user and time dimensions and the song-play fact table from
//! activity events. Only `NextSong` events take part; the `SongPlayEvents`
//! wrapper is the only way into the functions below, so other pages cannot
//! leak into any output.

use super::dedup::{dedup_by_key, Retain};
use super::normalize::{normalize, MatchPolicy};
use super::time::{decompose, start_time_from_millis};
use crate::error::Result;
use crate::types::{Artist, LogEvent, Song, SongPlay, TimeEntry, User};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Events whose page is `NextSong`, in input order
#[derive(Debug, Clone, Default)]
pub struct SongPlayEvents<'a> {
    events: Vec<&'a LogEvent>,
}

impl<'a> SongPlayEvents<'a> {
    /// Number of retained events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no event was retained
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate retained events in input order
    pub fn iter(&self) -> impl Iterator<Item = &'a LogEvent> + '_ {
        self.events.iter().copied()
    }
}

/// Keep only song-play events
pub fn filter_song_plays(events: &[LogEvent]) -> SongPlayEvents<'_> {
    SongPlayEvents {
        events: events.iter().filter(|e| e.is_song_play()).collect(),
    }
}

/// User dimension: one row per `user_id`
///
/// The row sits where the user first appeared but carries the values of the
/// user's last event, so `level` reflects the latest subscription state in
/// the batch. Events without a user id are dropped.
pub fn transform_users(plays: &SongPlayEvents<'_>) -> Vec<User> {
    let projected = plays.iter().filter_map(|e| {
        Some(User {
            user_id: e.user_id?,
            first_name: e.first_name.clone(),
            last_name: e.last_name.clone(),
            gender: e.gender.clone(),
            level: e.level.clone(),
        })
    });
    dedup_by_key(projected, Retain::LastSeen, |u| u.user_id)
}

/// Time dimension: one row per distinct start second
pub fn transform_time(plays: &SongPlayEvents<'_>) -> Result<Vec<TimeEntry>> {
    let entries = plays
        .iter()
        .map(|e| start_time_from_millis(e.ts).map(decompose))
        .collect::<Result<Vec<_>>>()?;
    Ok(dedup_by_key(entries, Retain::FirstSeen, |t| t.start_time))
}

/// Song-play fact rows plus the number of events that found no match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongPlayOutput {
    pub rows: Vec<SongPlay>,
    pub unmatched_events: usize,
}

/// Join key of the song catalog: normalized artist name, normalized title,
/// and the bit pattern of the duration.
type CatalogKey = (String, String, u64);

/// Exact f64 equality as a hashable key. `-0.0` folds onto `0.0` and NaN
/// never matches, as with `==`.
fn duration_key(duration: f64) -> Option<u64> {
    if duration.is_nan() {
        None
    } else if duration == 0.0 {
        Some(0.0_f64.to_bits())
    } else {
        Some(duration.to_bits())
    }
}

/// Index of `songs ⋈ artists` by join key, values in song order
fn build_catalog_index<'c>(
    songs: &'c [Song],
    artists: &'c [Artist],
    policy: MatchPolicy,
) -> HashMap<CatalogKey, Vec<(&'c str, &'c str)>> {
    let artists_by_id: HashMap<&str, &Artist> = artists
        .iter()
        .map(|a| (a.artist_id.as_str(), a))
        .collect();

    let mut index: HashMap<CatalogKey, Vec<(&str, &str)>> = HashMap::new();
    for song in songs {
        let (Some(artist_id), Some(title), Some(duration)) =
            (song.artist_id.as_deref(), song.title.as_deref(), song.duration)
        else {
            continue;
        };
        let Some(artist) = artists_by_id.get(artist_id) else {
            continue;
        };
        let (Some(name), Some(duration)) = (artist.name.as_deref(), duration_key(duration))
        else {
            continue;
        };

        let key = (
            normalize(name, policy).into_owned(),
            normalize(title, policy).into_owned(),
            duration,
        );
        index
            .entry(key)
            .or_default()
            .push((song.song_id.as_str(), artist.artist_id.as_str()));
    }
    index
}

/// Song-play fact table
///
/// Inner-joins song-play events with the song/artist catalog on normalized
/// artist name and title plus exact duration, then with the time dimension
/// on start time. Rows are stably sorted by start time and numbered from 1.
pub fn transform_song_plays(
    plays: &SongPlayEvents<'_>,
    songs: &[Song],
    artists: &[Artist],
    time: &[TimeEntry],
    policy: MatchPolicy,
) -> Result<SongPlayOutput> {
    let index = build_catalog_index(songs, artists, policy);
    let time_by_start: HashMap<DateTime<Utc>, &TimeEntry> =
        time.iter().map(|t| (t.start_time, t)).collect();

    let mut rows = Vec::new();
    let mut unmatched_events = 0;

    for event in plays.iter() {
        let matches = match (
            event.artist.as_deref(),
            event.song.as_deref(),
            event.length.and_then(duration_key),
        ) {
            (Some(artist), Some(song), Some(length)) => index.get(&(
                normalize(artist, policy).into_owned(),
                normalize(song, policy).into_owned(),
                length,
            )),
            _ => None,
        };
        let start_time = start_time_from_millis(event.ts)?;

        let (Some(matches), Some(slot)) = (matches, time_by_start.get(&start_time)) else {
            unmatched_events += 1;
            continue;
        };

        for (song_id, artist_id) in matches {
            rows.push(SongPlay {
                songplay_id: 0,
                start_time,
                user_id: event.user_id,
                level: event.level.clone(),
                song_id: (*song_id).to_string(),
                artist_id: (*artist_id).to_string(),
                session_id: event.session_id,
                location: event.location.clone(),
                user_agent: event.user_agent.clone(),
                year: slot.year,
                month: slot.month,
            });
        }
    }

    rows.sort_by_key(|r| r.start_time);
    for (id, row) in (1..).zip(rows.iter_mut()) {
        row.songplay_id = id;
    }

    Ok(SongPlayOutput {
        rows,
        unmatched_events,
    })
}
