//! Shared fixtures: a tiny song dataset and one day of event logs on disk

#![allow(dead_code)]

use sparkify_etl::{PipelineConfig, TemplateContext};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Song documents keyed by their path below `song_data/`
///
/// `SOA` appears twice; the first document wins.
pub const SONGS: [(&str, &str); 3] = [
    (
        "A/A/A/TRAAAAW128F429D538.json",
        r#"{"num_songs": 1, "artist_id": "AR1", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Des'ree", "song_id": "SOA", "title": "You Gotta Be", "duration": 246.30812, "year": 1994}"#,
    ),
    (
        "A/A/B/TRAABJL12903CDCF1A.json",
        r#"{"num_songs": 1, "artist_id": "AR2", "artist_latitude": 35.14968, "artist_longitude": -90.04892, "artist_location": "Memphis, TN", "artist_name": "Elena", "song_id": "SOB", "title": "Setanta matins", "duration": 269.58, "year": 0}"#,
    ),
    (
        "A/A/C/TRAACCG128F92E8A55.json",
        r#"{"num_songs": 1, "artist_id": "AR1", "artist_latitude": null, "artist_longitude": null, "artist_location": "London", "artist_name": "Des'ree", "song_id": "SOA", "title": "Duplicate", "duration": 1.0, "year": 1994}"#,
    ),
];

/// Six events: four song plays (one unmatched) and two page views
pub const EVENTS: &str = r#"{"artist":"Des'ree","auth":"Logged In","firstName":"Ryan","gender":"M","itemInSession":0,"lastName":"Smith","length":246.30812,"level":"free","location":"San Jose, CA","method":"PUT","page":"NextSong","registration":1541016707796.0,"sessionId":583,"song":"You Gotta Be","status":200,"ts":1541106106796,"userAgent":"Mozilla/5.0","userId":"26"}
{"artist":null,"auth":"Logged In","firstName":"Ryan","gender":"M","itemInSession":1,"lastName":"Smith","length":null,"level":"free","location":"San Jose, CA","method":"GET","page":"Home","registration":1541016707796.0,"sessionId":583,"song":null,"status":200,"ts":1541106150000,"userAgent":"Mozilla/5.0","userId":"26"}
{"artist":" Elena","auth":"Logged In","firstName":"Ryan","gender":"M","itemInSession":2,"lastName":"Smith","length":269.58,"level":"paid","location":"San Jose, CA","method":"PUT","page":"NextSong","registration":1541016707796.0,"sessionId":583,"song":"Setanta matins","status":200,"ts":1541106200000,"userAgent":"Mozilla/5.0","userId":"26"}
{"artist":"Nobody","auth":"Logged In","firstName":"Lily","gender":"F","itemInSession":0,"lastName":"Koch","length":100.0,"level":"paid","location":"Chicago, IL","method":"PUT","page":"NextSong","registration":1541048010796.0,"sessionId":172,"song":"Nothing","status":200,"ts":1541106300000,"userAgent":"Mozilla/5.0","userId":"8"}
{"artist":"Des'ree","auth":"Logged In","firstName":"Sylvie","gender":"F","itemInSession":3,"lastName":"Cruz","length":246.30812,"level":"free","location":"Washington, DC","method":"PUT","page":"NextSong","registration":1540266185796.0,"sessionId":9,"song":"You Gotta Be","status":200,"ts":1541106106100,"userAgent":"Mozilla/5.0","userId":10}
{"artist":null,"auth":"Logged Out","firstName":null,"gender":null,"itemInSession":0,"lastName":null,"length":null,"level":"free","location":null,"method":"GET","page":"Home","registration":null,"sessionId":12,"song":null,"status":200,"ts":1541106400000,"userAgent":null,"userId":""}
"#;

/// Pipeline configuration for the fixture, with paths taken from `{{ env.DATA }}`
pub const CONFIG: &str = r#"
lake:
  input: "{{ env.DATA }}"
  output: "{{ env.DATA }}/lake"
warehouse:
  database: ":memory:"
  song_data: "{{ env.DATA }}/song_data/*/*/*/*.json"
  log_data: "{{ env.DATA }}/log_data/*.json"
"#;

pub fn write(root: &Path, relative: &str, body: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// Lay the songs and events out below a fresh temp dir
pub fn dataset() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (key, body) in SONGS {
        write(dir.path(), &format!("song_data/{key}"), body);
    }
    write(dir.path(), "log_data/2018-11-01-events.json", EVENTS);
    dir
}

/// Parse `CONFIG` against a dataset directory
pub fn config(dir: &TempDir) -> PipelineConfig {
    let ctx = TemplateContext::with_env([("DATA", dir.path().display().to_string())]);
    PipelineConfig::from_yaml(CONFIG, &ctx).unwrap()
}
