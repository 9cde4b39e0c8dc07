use super::config::SourceConfig;
use std::borrow::Cow;

/// A single warehouse statement, tagged with the table it touches.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub name: String,
    pub table: &'static str,
    pub sql: Cow<'static, str>,
}

impl Statement {
    fn fixed(verb: &str, table: &'static str, sql: &'static str) -> Self {
        Statement {
            name: format!("{} {}", verb, table),
            table,
            sql: Cow::Borrowed(sql),
        }
    }

    fn rendered(verb: &str, table: &'static str, sql: String) -> Self {
        Statement {
            name: format!("{} {}", verb, table),
            table,
            sql: Cow::Owned(sql),
        }
    }
}

pub const STAGING_EVENTS: &str = "staging_events";
pub const STAGING_SONGS: &str = "staging_songs";
pub const SONGPLAYS: &str = "songplays";
pub const USERS: &str = "users";
pub const SONGS: &str = "songs";
pub const ARTISTS: &str = "artists";
pub const TIME: &str = "time";

/// Fact and dimension tables, in load order.
pub const STAR_TABLES: [&str; 5] = [SONGPLAYS, USERS, SONGS, ARTISTS, TIME];

// DROP TABLES

const STAGING_EVENTS_TABLE_DROP: &str = "DROP TABLE IF EXISTS staging_events";
const STAGING_SONGS_TABLE_DROP: &str = "DROP TABLE IF EXISTS staging_songs";
const SONGPLAY_TABLE_DROP: &str = "DROP TABLE IF EXISTS songplays";
const USER_TABLE_DROP: &str = "DROP TABLE IF EXISTS users";
const SONG_TABLE_DROP: &str = "DROP TABLE IF EXISTS songs";
const ARTIST_TABLE_DROP: &str = "DROP TABLE IF EXISTS artists";
const TIME_TABLE_DROP: &str = "DROP TABLE IF EXISTS time";

// CREATE TABLES

const STAGING_EVENTS_TABLE_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS staging_events
(
    artist        VARCHAR,
    auth          VARCHAR,
    firstName     VARCHAR,
    gender        VARCHAR,
    itemInSession INTEGER,
    lastName      VARCHAR,
    length        NUMERIC,
    level         VARCHAR,
    location      VARCHAR,
    method        VARCHAR,
    page          VARCHAR,
    registration  FLOAT,
    sessionId     INTEGER SORTKEY DISTKEY,
    song          VARCHAR,
    status        INTEGER,
    ts            BIGINT,
    userAgent     VARCHAR,
    userId        INTEGER
)
"#;

const STAGING_SONGS_TABLE_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS staging_songs
(
    num_songs        INTEGER,
    artist_id        VARCHAR SORTKEY DISTKEY,
    artist_latitude  VARCHAR,
    artist_longitude VARCHAR,
    artist_location  VARCHAR,
    artist_name      VARCHAR,
    song_id          VARCHAR,
    title            VARCHAR,
    duration         NUMERIC,
    year             INTEGER
)
"#;

const SONGPLAY_TABLE_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS songplays
(
    songplay_id INTEGER IDENTITY(0,1) PRIMARY KEY,
    start_time  TIMESTAMP NOT NULL,
    user_id     VARCHAR NOT NULL,
    level       VARCHAR NOT NULL,
    song_id     VARCHAR,
    artist_id   VARCHAR,
    session_id  INTEGER NOT NULL,
    location    VARCHAR,
    user_agent  VARCHAR
)
DISTSTYLE KEY
DISTKEY (start_time)
SORTKEY (start_time)
"#;

const USER_TABLE_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS users
(
    user_id    INTEGER PRIMARY KEY,
    first_name VARCHAR NOT NULL,
    last_name  VARCHAR NOT NULL,
    gender     VARCHAR,
    level      VARCHAR NOT NULL
)
SORTKEY (user_id)
"#;

const SONG_TABLE_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS songs
(
    song_id   VARCHAR PRIMARY KEY,
    title     VARCHAR NOT NULL,
    artist_id VARCHAR NOT NULL,
    year      INTEGER,
    duration  FLOAT NOT NULL
)
SORTKEY (song_id)
"#;

const ARTIST_TABLE_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS artists
(
    artist_id VARCHAR PRIMARY KEY,
    name      VARCHAR NOT NULL,
    location  VARCHAR,
    latitude  VARCHAR,
    longitude VARCHAR
)
SORTKEY (artist_id)
"#;

const TIME_TABLE_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS time
(
    start_time TIMESTAMP PRIMARY KEY,
    hour       INTEGER NOT NULL,
    day        INTEGER NOT NULL,
    week       INTEGER NOT NULL,
    month      INTEGER NOT NULL,
    year       INTEGER ENCODE BYTEDICT,
    weekday    VARCHAR ENCODE BYTEDICT
)
DISTSTYLE KEY
DISTKEY (start_time)
SORTKEY (start_time)
"#;

// FINAL TABLES

const SONGPLAY_TABLE_INSERT: &str = r#"
INSERT INTO songplays (start_time,
                       user_id,
                       level,
                       song_id,
                       artist_id,
                       session_id,
                       location,
                       user_agent)
SELECT TIMESTAMP 'epoch' + (se.ts / 1000) * INTERVAL '1 second' AS start_time,
       se.userid,
       se.level,
       ss.song_id,
       ss.artist_id,
       se.sessionid,
       se.location,
       se.useragent
FROM staging_songs ss
JOIN staging_events se
ON (ss.title = se.song AND se.artist = ss.artist_name)
AND se.page = 'NextSong'
"#;

const USER_TABLE_INSERT: &str = r#"
INSERT INTO users (user_id,
                   first_name,
                   last_name,
                   gender,
                   level)
SELECT DISTINCT userid,
                firstname,
                lastname,
                gender,
                level
FROM staging_events
WHERE page = 'NextSong'
"#;

const SONG_TABLE_INSERT: &str = r#"
INSERT INTO songs (song_id,
                   title,
                   artist_id,
                   year,
                   duration)
SELECT DISTINCT song_id,
                title,
                artist_id,
                year,
                duration
FROM staging_songs
WHERE song_id IS NOT NULL
"#;

const ARTIST_TABLE_INSERT: &str = r#"
INSERT INTO artists (artist_id,
                     name,
                     location,
                     latitude,
                     longitude)
SELECT DISTINCT artist_id,
                artist_name,
                artist_location,
                artist_latitude,
                artist_longitude
FROM staging_songs
"#;

const TIME_TABLE_INSERT: &str = r#"
INSERT INTO time (start_time,
                  hour,
                  day,
                  week,
                  month,
                  year,
                  weekday)
SELECT DISTINCT TIMESTAMP 'epoch' + (ts / 1000) * INTERVAL '1 second' AS start_time,
       EXTRACT(HOUR FROM start_time) AS hour,
       EXTRACT(DAY FROM start_time) AS day,
       EXTRACT(WEEKS FROM start_time) AS week,
       EXTRACT(MONTH FROM start_time) AS month,
       EXTRACT(YEAR FROM start_time) AS year,
       to_char(start_time, 'Day') AS weekday
FROM staging_events
"#;

pub fn drop_table_queries() -> Vec<Statement> {
    [
        (STAGING_EVENTS, STAGING_EVENTS_TABLE_DROP),
        (STAGING_SONGS, STAGING_SONGS_TABLE_DROP),
        (SONGPLAYS, SONGPLAY_TABLE_DROP),
        (USERS, USER_TABLE_DROP),
        (SONGS, SONG_TABLE_DROP),
        (ARTISTS, ARTIST_TABLE_DROP),
        (TIME, TIME_TABLE_DROP),
    ]
    .into_iter()
    .map(|(table, sql)| Statement::fixed("drop", table, sql))
    .collect()
}

pub fn create_table_queries() -> Vec<Statement> {
    [
        (STAGING_EVENTS, STAGING_EVENTS_TABLE_CREATE),
        (STAGING_SONGS, STAGING_SONGS_TABLE_CREATE),
        (SONGPLAYS, SONGPLAY_TABLE_CREATE),
        (USERS, USER_TABLE_CREATE),
        (SONGS, SONG_TABLE_CREATE),
        (ARTISTS, ARTIST_TABLE_CREATE),
        (TIME, TIME_TABLE_CREATE),
    ]
    .into_iter()
    .map(|(table, sql)| Statement::fixed("create", table, sql))
    .collect()
}

/// COPY statements for the staging tables, rendered against the S3 sources.
pub fn copy_table_queries(sources: &SourceConfig) -> Vec<Statement> {
    let region = match &sources.region {
        Some(region) => format!("\nREGION {}", quote_literal(region)),
        None => String::new(),
    };
    let iam_role = quote_literal(&sources.iam_role_arn);

    let staging_events_copy = format!(
        "\nCOPY staging_events\nFROM {}\nIAM_ROLE {}\nFORMAT AS JSON {}{}\n",
        quote_literal(&sources.log_data),
        iam_role,
        quote_literal(&sources.log_jsonpath),
        region,
    );
    let staging_songs_copy = format!(
        "\nCOPY staging_songs\nFROM {}\nIAM_ROLE {}\nFORMAT AS JSON 'auto'{}\n",
        quote_literal(&sources.song_data),
        iam_role,
        region,
    );

    vec![
        Statement::rendered("copy", STAGING_EVENTS, staging_events_copy),
        Statement::rendered("copy", STAGING_SONGS, staging_songs_copy),
    ]
}

pub fn insert_table_queries() -> Vec<Statement> {
    [
        (SONGPLAYS, SONGPLAY_TABLE_INSERT),
        (USERS, USER_TABLE_INSERT),
        (SONGS, SONG_TABLE_INSERT),
        (ARTISTS, ARTIST_TABLE_INSERT),
        (TIME, TIME_TABLE_INSERT),
    ]
    .into_iter()
    .map(|(table, sql)| Statement::fixed("insert", table, sql))
    .collect()
}

/// Renders `value` as a single-quoted SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
