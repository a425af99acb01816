//! Tests for the dimensional transform

use super::*;
use crate::types::{LogEvent, SongRecord};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

// ============================================================================
// Fixtures
// ============================================================================

fn song_record(song_id: &str, title: &str, artist_id: &str, artist: &str, duration: f64) -> SongRecord {
    SongRecord {
        num_songs: Some(1),
        artist_id: Some(artist_id.to_string()),
        artist_name: Some(artist.to_string()),
        song_id: Some(song_id.to_string()),
        title: Some(title.to_string()),
        duration: Some(duration),
        year: Some(2004),
        ..Default::default()
    }
}

fn play(user_id: i64, artist: &str, song: &str, length: f64, ts: i64) -> LogEvent {
    LogEvent {
        artist: Some(artist.to_string()),
        first_name: Some("Kaylee".to_string()),
        last_name: Some("Summers".to_string()),
        gender: Some("F".to_string()),
        length: Some(length),
        level: Some("free".to_string()),
        location: Some("Phoenix-Mesa-Scottsdale, AZ".to_string()),
        page: Some("NextSong".to_string()),
        session_id: Some(139),
        song: Some(song.to_string()),
        ts,
        user_agent: Some("Mozilla/5.0".to_string()),
        user_id: Some(user_id),
        ..Default::default()
    }
}

fn page_event(page: &str, user_id: i64, ts: i64) -> LogEvent {
    LogEvent {
        page: Some(page.to_string()),
        user_id: Some(user_id),
        first_name: Some("Walter".to_string()),
        level: Some("paid".to_string()),
        ts,
        ..Default::default()
    }
}

fn catalog() -> SongCatalog {
    SongCatalog::from_records(&[
        song_record("SOA", "You Gotta Be", "AR1", "Des'ree", 246.30812),
        song_record("SOB", " Setanta matins ", "AR2", "Elena", 269.58),
        song_record("SOC", "Intro", "AR3", "  Tycho", 100.0),
    ])
}

// ============================================================================
// Catalog
// ============================================================================

#[test]
fn test_songs_dedup_first_seen() {
    let records = vec![
        song_record("SOA", "First", "AR1", "A", 1.0),
        song_record("SOA", "Second", "AR1", "A", 2.0),
        song_record("SOB", "Other", "AR2", "B", 3.0),
    ];

    let songs = transform_songs(&records);
    assert_eq!(songs.len(), 2);
    assert_eq!(songs[0].title.as_deref(), Some("First"));
    assert_eq!(songs[0].duration, Some(1.0));
}

#[test]
fn test_artists_dedup_and_projection() {
    let mut located = song_record("SOA", "T", "AR1", "Line Renaud", 1.0);
    located.artist_location = Some("Paris".to_string());
    located.artist_latitude = Some(48.85);
    located.artist_longitude = Some(2.35);
    let records = vec![
        located,
        song_record("SOB", "T2", "AR1", "Renamed", 2.0),
        song_record("SOC", "T3", "AR2", "Other", 3.0),
    ];

    let artists = transform_artists(&records);
    assert_eq!(artists.len(), 2);
    assert_eq!(artists[0].name.as_deref(), Some("Line Renaud"));
    assert_eq!(artists[0].location.as_deref(), Some("Paris"));
    assert_eq!(artists[0].latitude, Some(48.85));
}

#[test]
fn test_catalog_has_unique_keys() {
    let records: Vec<SongRecord> = (0..50)
        .map(|i| {
            song_record(
                &format!("SO{}", i % 7),
                "t",
                &format!("AR{}", i % 3),
                "a",
                f64::from(i),
            )
        })
        .collect();

    let catalog = SongCatalog::from_records(&records);
    let song_ids: HashSet<_> = catalog.songs.iter().map(|s| &s.song_id).collect();
    let artist_ids: HashSet<_> = catalog.artists.iter().map(|a| &a.artist_id).collect();
    assert_eq!(song_ids.len(), catalog.songs.len());
    assert_eq!(artist_ids.len(), catalog.artists.len());
    assert_eq!(catalog.songs.len(), 7);
    assert_eq!(catalog.artists.len(), 3);
}

#[test]
fn test_keyless_records_dropped() {
    let records = vec![SongRecord {
        title: Some("Orphan".to_string()),
        ..Default::default()
    }];
    let catalog = SongCatalog::from_records(&records);
    assert!(catalog.songs.is_empty());
    assert!(catalog.artists.is_empty());
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn test_filter_song_plays() {
    let events = vec![
        page_event("Home", 1, 1_000),
        play(2, "Elena", "Setanta matins", 269.58, 2_000),
        page_event("Logout", 3, 3_000),
    ];

    let plays = filter_song_plays(&events);
    assert_eq!(plays.len(), 1);
    assert!(plays.iter().all(LogEvent::is_song_play));
}

#[test]
fn test_non_song_pages_never_reach_outputs() {
    let events = vec![
        page_event("Home", 91, 1_541_000_000_000),
        page_event("Help", 92, 1_541_000_001_000),
        play(2, "Elena", "Setanta matins", 269.58, 1_541_000_002_000),
    ];

    let tables = EventTables::from_events(&events, &catalog(), MatchPolicy::default()).unwrap();

    assert!(tables.users.iter().all(|u| u.user_id == 2));
    assert_eq!(tables.time.len(), 1);
    assert_eq!(
        tables.time[0].start_time,
        start_time_from_millis(1_541_000_002_000).unwrap()
    );
    assert!(tables.songplays.iter().all(|p| p.user_id == Some(2)));
    assert_eq!(tables.skipped_events, 2);
}

#[test]
fn test_users_single_row_last_level() {
    let mut first = play(8, "x", "y", 1.0, 1_000);
    first.level = Some("free".to_string());
    let mut second = play(8, "x", "y", 1.0, 2_000);
    second.level = Some("paid".to_string());
    let other = play(9, "x", "y", 1.0, 1_500);
    let events = vec![first, other, second];

    let users = transform_users(&filter_song_plays(&events));
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].user_id, 8);
    assert_eq!(users[0].level.as_deref(), Some("paid"));
    assert_eq!(users[1].user_id, 9);
}

#[test]
fn test_users_without_id_dropped() {
    let mut anonymous = play(1, "x", "y", 1.0, 1_000);
    anonymous.user_id = None;
    let events = vec![anonymous];
    assert!(transform_users(&filter_song_plays(&events)).is_empty());
}

#[test]
fn test_time_dedup_same_second() {
    let events = vec![
        play(1, "x", "y", 1.0, 1_541_106_106_001),
        play(1, "x", "y", 1.0, 1_541_106_106_999),
        play(1, "x", "y", 1.0, 1_541_106_107_000),
    ];

    let time = transform_time(&filter_song_plays(&events)).unwrap();
    assert_eq!(time.len(), 2);
    assert_eq!(
        time[0].start_time,
        Utc.with_ymd_and_hms(2018, 11, 1, 21, 1, 46).unwrap()
    );
}

// ============================================================================
// Song Plays
// ============================================================================

#[test]
fn test_unmatched_event_yields_no_fact() {
    let events = vec![play(1, "Elena", "Setanta matins", 269.58, 1_541_106_106_796)];
    let empty = SongCatalog::default();

    let tables = EventTables::from_events(&events, &empty, MatchPolicy::default()).unwrap();
    assert!(tables.songplays.is_empty());
    assert_eq!(tables.unmatched_events, 1);
    // Dimensions are still derived from the event
    assert_eq!(tables.users.len(), 1);
    assert_eq!(tables.time.len(), 1);
}

#[test]
fn test_match_on_trimmed_text() {
    let events = vec![
        play(1, " Elena", "Setanta matins  ", 269.58, 1_541_106_106_796),
        play(2, "Tycho", "Intro", 100.0, 1_541_106_200_000),
    ];

    let tables = EventTables::from_events(&events, &catalog(), MatchPolicy::default()).unwrap();
    let ids: Vec<_> = tables.songplays.iter().map(|p| p.song_id.as_str()).collect();
    assert_eq!(ids, vec!["SOB", "SOC"]);
    assert_eq!(tables.songplays[0].artist_id, "AR2");
}

#[test]
fn test_duration_must_match_exactly() {
    let events = vec![play(1, "Elena", "Setanta matins", 269.581, 1_541_106_106_796)];
    let tables = EventTables::from_events(&events, &catalog(), MatchPolicy::default()).unwrap();
    assert!(tables.songplays.is_empty());
}

#[test]
fn test_case_policy() {
    let events = vec![play(1, "ELENA", "setanta MATINS", 269.58, 1_541_106_106_796)];

    let sensitive =
        EventTables::from_events(&events, &catalog(), MatchPolicy::exact_case()).unwrap();
    assert!(sensitive.songplays.is_empty());

    let insensitive =
        EventTables::from_events(&events, &catalog(), MatchPolicy::ignore_case()).unwrap();
    assert_eq!(insensitive.songplays.len(), 1);
}

#[test]
fn test_song_without_known_artist_never_matches() {
    let mut catalog = catalog();
    catalog.artists.retain(|a| a.artist_id != "AR2");

    let events = vec![play(1, "Elena", "Setanta matins", 269.58, 1_541_106_106_796)];
    let tables = EventTables::from_events(&events, &catalog, MatchPolicy::default()).unwrap();
    assert!(tables.songplays.is_empty());
}

#[test]
fn test_fact_columns() {
    let events = vec![play(26, "Des'ree", "You Gotta Be", 246.30812, 1_541_106_106_796)];
    let tables = EventTables::from_events(&events, &catalog(), MatchPolicy::default()).unwrap();

    assert_eq!(
        tables.songplays,
        vec![SongPlay {
            songplay_id: 1,
            start_time: Utc.with_ymd_and_hms(2018, 11, 1, 21, 1, 46).unwrap(),
            user_id: Some(26),
            level: Some("free".to_string()),
            song_id: "SOA".to_string(),
            artist_id: "AR1".to_string(),
            session_id: Some(139),
            location: Some("Phoenix-Mesa-Scottsdale, AZ".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            year: 2018,
            month: 11,
        }]
    );
}

#[test]
fn test_surrogate_keys_dense_and_ordered() {
    // Out of order, with a tie at the same second
    let events = vec![
        play(3, "Tycho", "Intro", 100.0, 1_541_106_300_000),
        play(1, "Elena", "Setanta matins", 269.58, 1_541_106_100_000),
        play(2, "Des'ree", "You Gotta Be", 246.30812, 1_541_106_300_500),
        play(4, "Nobody", "Nothing", 1.0, 1_541_106_000_000),
    ];

    let tables = EventTables::from_events(&events, &catalog(), MatchPolicy::default()).unwrap();
    let plays = &tables.songplays;

    let ids: Vec<i64> = plays.iter().map(|p| p.songplay_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(plays.windows(2).all(|w| w[0].start_time <= w[1].start_time));

    // Ties keep input order
    assert_eq!(plays[1].user_id, Some(3));
    assert_eq!(plays[2].user_id, Some(2));
    assert_eq!(tables.unmatched_events, 1);
}

#[test]
fn test_every_fact_has_one_time_row_and_catalog_match() {
    let events: Vec<LogEvent> = (0..20)
        .map(|i| {
            let (artist, song, length) = match i % 3 {
                0 => ("Elena", "Setanta matins", 269.58),
                1 => ("Tycho ", " Intro", 100.0),
                _ => ("Unknown", "Missing", 5.0),
            };
            play(i, artist, song, length, 1_541_106_106_000 + i * 400)
        })
        .collect();

    let cat = catalog();
    let policy = MatchPolicy::default();
    let tables = EventTables::from_events(&events, &cat, policy).unwrap();

    let triples: HashSet<(String, String, u64)> = cat
        .songs
        .iter()
        .map(|s| {
            let artist = cat
                .artists
                .iter()
                .find(|a| Some(&a.artist_id) == s.artist_id.as_ref())
                .unwrap();
            (
                normalize(artist.name.as_deref().unwrap(), policy).into_owned(),
                normalize(s.title.as_deref().unwrap(), policy).into_owned(),
                s.duration.unwrap().to_bits(),
            )
        })
        .collect();

    for fact in &tables.songplays {
        let event = events
            .iter()
            .find(|e| e.user_id == fact.user_id)
            .unwrap();
        assert!(triples.contains(&(
            normalize(event.artist.as_deref().unwrap(), policy).into_owned(),
            normalize(event.song.as_deref().unwrap(), policy).into_owned(),
            event.length.unwrap().to_bits(),
        )));
        let matching_time = tables
            .time
            .iter()
            .filter(|t| t.start_time == fact.start_time)
            .count();
        assert_eq!(matching_time, 1);
    }

    assert_eq!(tables.songplays.len(), 14);
    assert_eq!(tables.unmatched_events, 6);
}

#[test]
fn test_event_matching_two_songs_yields_two_rows() {
    let cat = SongCatalog::from_records(&[
        song_record("SO1", "Twin", "AR1", "Band", 10.0),
        song_record("SO2", "Twin", "AR1", "Band", 10.0),
    ]);
    let events = vec![play(1, "Band", "Twin", 10.0, 1_541_106_106_000)];

    let tables = EventTables::from_events(&events, &cat, MatchPolicy::default()).unwrap();
    let ids: Vec<_> = tables.songplays.iter().map(|p| (p.songplay_id, p.song_id.as_str())).collect();
    assert_eq!(ids, vec![(1, "SO1"), (2, "SO2")]);
}
