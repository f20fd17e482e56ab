//! Player records and their categorical fields.
//!
//! A [`PlayerRecord`] is one row of the gaming-behavior dataset. Field names
//! map onto the CSV header through serde renames, so the struct is the single
//! source of truth for the column order (see [`COLUMNS`]).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of achievements a single player can unlock.
pub const MAX_ACHIEVEMENTS: u32 = 50;

/// CSV header of the dataset, in column order.
pub const COLUMNS: [&str; 24] = [
    "PlayerID",
    "Age",
    "Gender",
    "Location",
    "Device",
    "SignupDate",
    "GameGenre",
    "GameDifficulty",
    "AB_Group",
    "HasPurchased",
    "TotalSpentUSD",
    "PlayTimeHours",
    "SessionsPerWeek",
    "AvgSessionDurationMinutes",
    "PlayerLevel",
    "AchievementsUnlocked",
    "DaysSinceSignup",
    "IsActive",
    "LastActiveDate",
    "FriendsCount",
    "GuildMember",
    "AvgFPS",
    "CrashCount",
    "EngagementLevel",
];

/// Difficulty setting the player plays on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
pub enum GameDifficulty {
    Easy,
    Medium,
    Hard,
}

impl GameDifficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];
}

/// Tertile bucket of the composite engagement score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
pub enum EngagementLevel {
    Low,
    Medium,
    High,
}

impl EngagementLevel {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];
}

/// Experiment arm the player was assigned to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
pub enum AbGroup {
    A,
    B,
}

/// One player of the dataset.
///
/// Invariants established by the generator (and expected from external data):
///
/// - `total_spent_usd == 0.0` whenever `has_purchased` is false
/// - `days_since_signup` was fixed at generation time and is never recomputed
/// - `last_active_date >= signup_date` is expected but not enforced
/// - `engagement_level` was bucketed once over the full dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerRecord {
    #[serde(rename = "PlayerID")]
    pub player_id: u64,
    pub age: u32,
    pub gender: String,
    pub location: String,
    pub device: String,
    #[serde(with = "date_format")]
    pub signup_date: NaiveDate,
    pub game_genre: String,
    pub game_difficulty: GameDifficulty,
    #[serde(rename = "AB_Group")]
    pub ab_group: AbGroup,
    #[serde(with = "flag_format")]
    pub has_purchased: bool,
    #[serde(rename = "TotalSpentUSD")]
    pub total_spent_usd: f64,
    pub play_time_hours: f64,
    pub sessions_per_week: u32,
    pub avg_session_duration_minutes: u32,
    pub player_level: u32,
    pub achievements_unlocked: u32,
    pub days_since_signup: u32,
    #[serde(with = "flag_format")]
    pub is_active: bool,
    #[serde(with = "date_format")]
    pub last_active_date: NaiveDate,
    pub friends_count: u32,
    #[serde(with = "flag_format")]
    pub guild_member: bool,
    #[serde(rename = "AvgFPS")]
    pub avg_fps: f64,
    pub crash_count: u32,
    pub engagement_level: EngagementLevel,
}

/// Dates are written as `YYYY-MM-DD`; timestamps with a time-of-day part are
/// accepted on input and truncated to their date.
mod date_format {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{Deserialize as _, Deserializer, Serializer, de::Error as _};

    const DATE: &str = "%Y-%m-%d";
    const TIMESTAMPS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&date.format(DATE))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, DATE) {
            return Ok(date);
        }
        TIMESTAMPS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|datetime| datetime.date())
            .ok_or_else(|| D::Error::custom(format!("invalid date: {s:?}")))
    }
}

/// Boolean flags are stored as `0`/`1`.
mod flag_format {
    use serde::{Deserialize as _, Deserializer, Serializer, de::Error as _};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.trim() {
            "1" => Ok(true),
            "0" => Ok(false),
            s if s.eq_ignore_ascii_case("true") => Ok(true),
            s if s.eq_ignore_ascii_case("false") => Ok(false),
            s => Err(D::Error::custom(format!("invalid flag: {s:?}"))),
        }
    }
}
