//! Dimensional transform
//!
//! Turns raw song metadata and event logs into the star schema.
//!
//! # Overview
//!
//! - `catalog` - song and artist dimensions
//! - `events` - user and time dimensions, song-play facts
//! - `normalize` - join-key normalization shared with the warehouse SQL
//! - `time` - epoch decomposition (UTC)
//! - `dedup` - first-seen / last-seen key deduplication

mod catalog;
mod dedup;
mod events;
mod normalize;
mod time;

pub use catalog::{transform_artists, transform_songs, SongCatalog};
pub use dedup::{dedup_by_key, Retain};
pub use events::{
    filter_song_plays, transform_song_plays, transform_time, transform_users, SongPlayEvents,
    SongPlayOutput,
};
pub use normalize::{
    normalize, sql_normalize, sql_trim, trim_key, CaseSensitivity, MatchPolicy, TRIMMED,
};
pub use time::{decompose, start_time_from_millis};

use crate::error::Result;
use crate::types::{LogEvent, SongPlay, TimeEntry, User};

/// Tables derived from one batch of event logs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTables {
    pub users: Vec<User>,
    pub time: Vec<TimeEntry>,
    pub songplays: Vec<SongPlay>,
    /// Song plays that found no catalog or time match
    pub unmatched_events: usize,
    /// Events discarded because their page was not `NextSong`
    pub skipped_events: usize,
}

impl EventTables {
    /// Run the whole event-log transform against a song catalog
    pub fn from_events(
        events: &[LogEvent],
        catalog: &SongCatalog,
        policy: MatchPolicy,
    ) -> Result<Self> {
        let plays = filter_song_plays(events);
        let users = transform_users(&plays);
        let time = transform_time(&plays)?;
        let facts = transform_song_plays(&plays, &catalog.songs, &catalog.artists, &time, policy)?;

        Ok(Self {
            users,
            time,
            songplays: facts.rows,
            unmatched_events: facts.unmatched_events,
            skipped_events: events.len() - plays.len(),
        })
    }
}

#[cfg(test)]
mod tests;
