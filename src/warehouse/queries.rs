//! Warehouse SQL
//!
//! Every statement the warehouse pipeline runs, grouped by phase. The
//! plan executes them in list order: drops, creates, staging copies,
//! dimension inserts, then the fact insert.

use crate::config::WarehouseConfig;
use crate::transform::{sql_normalize, sql_trim, MatchPolicy};

/// A labelled SQL statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Short name used in logs and errors
    pub label: String,
    pub sql: String,
}

impl Statement {
    fn new(label: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sql: sql.into(),
        }
    }
}

// ============================================================================
// DROP
// ============================================================================

/// Facts first, so nothing references a dropped dimension
pub const DROP_TABLES: [(&str, &str); 7] = [
    ("drop songplays", "DROP TABLE IF EXISTS songplays"),
    ("drop users", "DROP TABLE IF EXISTS users"),
    ("drop songs", "DROP TABLE IF EXISTS songs"),
    ("drop artists", "DROP TABLE IF EXISTS artists"),
    ("drop time", r#"DROP TABLE IF EXISTS "time""#),
    ("drop staging_events", "DROP TABLE IF EXISTS staging_events"),
    ("drop staging_songs", "DROP TABLE IF EXISTS staging_songs"),
];

// ============================================================================
// CREATE
// ============================================================================

const CREATE_STAGING_EVENTS: &str = "
CREATE TABLE IF NOT EXISTS staging_events (
    artist        VARCHAR,
    auth          VARCHAR,
    firstName     VARCHAR,
    gender        VARCHAR,
    itemInSession INTEGER,
    lastName      VARCHAR,
    length        DOUBLE,
    level         VARCHAR,
    location      VARCHAR,
    method        VARCHAR,
    page          VARCHAR,
    registration  DOUBLE,
    sessionId     BIGINT,
    song          VARCHAR,
    status        INTEGER,
    ts            BIGINT,
    userAgent     VARCHAR,
    userId        BIGINT
)";

const CREATE_STAGING_SONGS: &str = "
CREATE TABLE IF NOT EXISTS staging_songs (
    num_songs        INTEGER,
    artist_id        VARCHAR,
    artist_latitude  DOUBLE,
    artist_longitude DOUBLE,
    artist_location  VARCHAR,
    artist_name      VARCHAR,
    song_id          VARCHAR,
    title            VARCHAR,
    duration         DOUBLE,
    year             INTEGER
)";

const CREATE_SONGPLAYS: &str = "
CREATE TABLE IF NOT EXISTS songplays (
    songplay_id BIGINT PRIMARY KEY,
    start_time  TIMESTAMP NOT NULL,
    user_id     BIGINT,
    level       VARCHAR,
    song_id     VARCHAR NOT NULL,
    artist_id   VARCHAR NOT NULL,
    session_id  BIGINT,
    location    VARCHAR,
    user_agent  VARCHAR
)";

const CREATE_USERS: &str = "
CREATE TABLE IF NOT EXISTS users (
    user_id    BIGINT PRIMARY KEY,
    first_name VARCHAR,
    last_name  VARCHAR,
    gender     VARCHAR,
    level      VARCHAR
)";

const CREATE_SONGS: &str = "
CREATE TABLE IF NOT EXISTS songs (
    song_id   VARCHAR PRIMARY KEY,
    title     VARCHAR,
    artist_id VARCHAR,
    year      INTEGER,
    duration  DOUBLE
)";

const CREATE_ARTISTS: &str = "
CREATE TABLE IF NOT EXISTS artists (
    artist_id VARCHAR PRIMARY KEY,
    name      VARCHAR,
    location  VARCHAR,
    latitude  DOUBLE,
    longitude DOUBLE
)";

const CREATE_TIME: &str = r#"
CREATE TABLE IF NOT EXISTS "time" (
    start_time TIMESTAMP PRIMARY KEY,
    hour       INTEGER NOT NULL,
    day        INTEGER NOT NULL,
    week       INTEGER NOT NULL,
    month      INTEGER NOT NULL,
    year       INTEGER NOT NULL,
    weekday    INTEGER NOT NULL
)"#;

pub const CREATE_TABLES: [(&str, &str); 7] = [
    ("create staging_events", CREATE_STAGING_EVENTS),
    ("create staging_songs", CREATE_STAGING_SONGS),
    ("create songplays", CREATE_SONGPLAYS),
    ("create users", CREATE_USERS),
    ("create songs", CREATE_SONGS),
    ("create artists", CREATE_ARTISTS),
    ("create time", CREATE_TIME),
];

// ============================================================================
// COPY
// ============================================================================

/// Bulk-load event logs; `userId` is read as text so empty strings from
/// logged-out sessions become NULL instead of failing the load.
pub fn copy_staging_events(path: &str) -> String {
    let user_id = sql_trim("userId");
    format!(
        "
INSERT INTO staging_events
SELECT artist, auth, firstName, gender, itemInSession, lastName, length, level,
       location, method, page, registration, sessionId, song, status, ts,
       userAgent, TRY_CAST(NULLIF({user_id}, '') AS BIGINT)
FROM read_json('{path}', format = 'auto', columns = {{
    artist: 'VARCHAR', auth: 'VARCHAR', firstName: 'VARCHAR', gender: 'VARCHAR',
    itemInSession: 'INTEGER', lastName: 'VARCHAR', length: 'DOUBLE',
    level: 'VARCHAR', location: 'VARCHAR', method: 'VARCHAR', page: 'VARCHAR',
    registration: 'DOUBLE', sessionId: 'BIGINT', song: 'VARCHAR',
    status: 'INTEGER', ts: 'BIGINT', userAgent: 'VARCHAR', userId: 'VARCHAR'
}})"
    )
}

pub fn copy_staging_songs(path: &str) -> String {
    format!(
        "
INSERT INTO staging_songs
SELECT num_songs, artist_id, artist_latitude, artist_longitude, artist_location,
       artist_name, song_id, title, duration, year
FROM read_json('{path}', format = 'auto', columns = {{
    num_songs: 'INTEGER', artist_id: 'VARCHAR', artist_latitude: 'DOUBLE',
    artist_longitude: 'DOUBLE', artist_location: 'VARCHAR',
    artist_name: 'VARCHAR', song_id: 'VARCHAR', title: 'VARCHAR',
    duration: 'DOUBLE', year: 'INTEGER'
}})"
    )
}

// ============================================================================
// INSERT
// ============================================================================

/// Epoch milliseconds truncated to the second, as a UTC timestamp
const START_TIME: &str = "date_trunc('second', epoch_ms(ts))";

/// One row per user: values of the last song play, in order of first play
pub const INSERT_USERS: &str = "
INSERT INTO users (user_id, first_name, last_name, gender, level)
SELECT userId, firstName, lastName, gender, level
FROM (
    SELECT userId, firstName, lastName, gender, level,
           ROW_NUMBER() OVER (PARTITION BY userId ORDER BY rowid DESC) AS latest,
           MIN(rowid) OVER (PARTITION BY userId) AS first_seen
    FROM staging_events
    WHERE page = 'NextSong' AND userId IS NOT NULL
)
WHERE latest = 1
ORDER BY first_seen";

pub const INSERT_SONGS: &str = "
INSERT INTO songs (song_id, title, artist_id, year, duration)
SELECT song_id, title, artist_id, year, duration
FROM (
    SELECT rowid AS seq, song_id, title, artist_id, year, duration,
           ROW_NUMBER() OVER (PARTITION BY song_id ORDER BY rowid) AS n
    FROM staging_songs
    WHERE song_id IS NOT NULL
)
WHERE n = 1
ORDER BY seq";

pub const INSERT_ARTISTS: &str = "
INSERT INTO artists (artist_id, name, location, latitude, longitude)
SELECT artist_id, artist_name, artist_location, artist_latitude, artist_longitude
FROM (
    SELECT rowid AS seq, artist_id, artist_name, artist_location,
           artist_latitude, artist_longitude,
           ROW_NUMBER() OVER (PARTITION BY artist_id ORDER BY rowid) AS n
    FROM staging_songs
    WHERE artist_id IS NOT NULL
)
WHERE n = 1
ORDER BY seq";

pub fn insert_time() -> String {
    format!(
        r#"
INSERT INTO "time" (start_time, hour, day, week, month, year, weekday)
SELECT start_time, hour(start_time), day(start_time), week(start_time),
       month(start_time), year(start_time), isodow(start_time)
FROM (
    SELECT DISTINCT {START_TIME} AS start_time
    FROM staging_events
    WHERE page = 'NextSong' AND ts IS NOT NULL
)
ORDER BY start_time"#
    )
}

/// Fact insert; the join keys go through the shared normalization policy
pub fn insert_songplays(policy: MatchPolicy) -> String {
    let norm = |column: &str| sql_normalize(column, policy);
    format!(
        r#"
INSERT INTO songplays (songplay_id, start_time, user_id, level, song_id,
                       artist_id, session_id, location, user_agent)
SELECT ROW_NUMBER() OVER (ORDER BY p.start_time, p.seq, c.seq),
       p.start_time, p.userId, p.level, c.song_id, c.artist_id,
       p.sessionId, p.location, p.userAgent
FROM (
    SELECT rowid AS seq, {START_TIME} AS start_time, userId, level, artist,
           song, length, sessionId, location, userAgent
    FROM staging_events
    WHERE page = 'NextSong'
) p
JOIN (
    SELECT s.rowid AS seq, s.song_id, s.title, s.duration, a.artist_id, a.name
    FROM songs s
    JOIN artists a ON s.artist_id = a.artist_id
) c
  ON {event_artist} = {catalog_artist}
 AND {event_song} = {catalog_title}
 AND p.length = c.duration
JOIN "time" t ON t.start_time = p.start_time"#,
        event_artist = norm("p.artist"),
        catalog_artist = norm("c.name"),
        event_song = norm("p.song"),
        catalog_title = norm("c.title"),
    )
}

// ============================================================================
// Plan
// ============================================================================

/// The ordered statement list of one warehouse run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehousePlan {
    pub drops: Vec<Statement>,
    pub creates: Vec<Statement>,
    pub copies: Vec<Statement>,
    pub inserts: Vec<Statement>,
}

impl WarehousePlan {
    /// Full plan for a configuration
    pub fn new(config: &WarehouseConfig, policy: MatchPolicy) -> Self {
        let fixed = |list: &[(&str, &str)]| {
            list.iter()
                .map(|(label, sql)| Statement::new(*label, *sql))
                .collect::<Vec<_>>()
        };

        Self {
            drops: fixed(&DROP_TABLES),
            creates: fixed(&CREATE_TABLES),
            copies: vec![
                Statement::new("copy staging_events", copy_staging_events(&config.log_data)),
                Statement::new("copy staging_songs", copy_staging_songs(&config.song_data)),
            ],
            inserts: vec![
                Statement::new("insert users", INSERT_USERS),
                Statement::new("insert songs", INSERT_SONGS),
                Statement::new("insert artists", INSERT_ARTISTS),
                Statement::new("insert time", insert_time()),
                Statement::new("insert songplays", insert_songplays(policy)),
            ],
        }
    }

    /// Only drop and recreate the schema
    #[must_use]
    pub fn reset_only(mut self) -> Self {
        self.copies.clear();
        self.inserts.clear();
        self
    }

    /// All statements in execution order
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.drops
            .iter()
            .chain(&self.creates)
            .chain(&self.copies)
            .chain(&self.inserts)
    }

    pub fn len(&self) -> usize {
        self.drops.len() + self.creates.len() + self.copies.len() + self.inserts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
