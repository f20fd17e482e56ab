//! Synthetic gaming-behavior dataset generator.
//!
//! Produces a fixture dataset with realistic correlations: playtime shrinks
//! with age and grows with difficulty, sessions and level follow playtime,
//! activity decays with account age, and group B purchasers spend slightly
//! more. Output is fully determined by [`GeneratorConfig`].
//!
//! Derived columns (sessions, achievements, engagement) depend on
//! dataset-wide statistics of playtime and spend, so generation runs in
//! passes over the whole population.

use chrono::{Days, NaiveDate};
use gamelytics_stats::percentiles::percentiles_of;
use rand::{Rng, distr::weighted::WeightedIndex};
use rand_distr::{Distribution as _, Gamma, Normal, Poisson};
use rand_pcg::Pcg32;

use crate::{
    dataset::Dataset,
    player::{AbGroup, EngagementLevel, GameDifficulty, MAX_ACHIEVEMENTS, PlayerRecord},
};

pub const DEFAULT_PLAYERS: usize = 10_000;
pub const DEFAULT_SEED: u64 = 42;
pub const FIRST_PLAYER_ID: u64 = 9000;

const GENRES: [&str; 7] = [
    "Action RPG",
    "Strategy",
    "Casual",
    "Puzzle",
    "Adventure",
    "Sports",
    "Battle Royale",
];
const LOCATIONS: [&str; 9] = [
    "Turkey",
    "USA",
    "Germany",
    "UK",
    "France",
    "Russia",
    "Japan",
    "South Korea",
    "Other",
];
const DEVICES: [&str; 4] = ["Android", "iOS", "PC", "Console"];
const GENDERS: [(&str, f64); 3] = [("Male", 0.65), ("Female", 0.30), ("Other", 0.05)];
const DIFFICULTIES: [(GameDifficulty, f64); 3] = [
    (GameDifficulty::Easy, 0.3),
    (GameDifficulty::Medium, 0.5),
    (GameDifficulty::Hard, 0.2),
];

const RNG_STREAM: u64 = 0xcafe_f00d_d15e_a5e5;

const PURCHASE_RATE: f64 = 0.15;
const GUILD_RATE: f64 = 0.3;
const MIN_AGE: f64 = 18.0;
const MAX_AGE: f64 = 65.0;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub players: usize,
    pub seed: u64,
    /// "Today" of the generated data; signup and activity dates precede it.
    pub reference_date: NaiveDate,
}

impl GeneratorConfig {
    #[must_use]
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            players: DEFAULT_PLAYERS,
            seed: DEFAULT_SEED,
            reference_date,
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum GenerateError {
    #[display("invalid parameters for the {name} distribution")]
    InvalidDistribution { name: &'static str },
}

fn invalid(name: &'static str) -> impl FnOnce(rand_distr::NormalError) -> GenerateError {
    move |_| GenerateError::InvalidDistribution { name }
}

struct Distributions {
    age: Normal<f64>,
    spend: Gamma<f64>,
    play_time: Gamma<f64>,
    sessions: Normal<f64>,
    unit_noise: Normal<f64>,
    level_rate: Normal<f64>,
    achievement_noise: Normal<f64>,
    fps: Normal<f64>,
    friends: Poisson<f64>,
    crashes: Poisson<f64>,
    gender: WeightedIndex<f64>,
    difficulty: WeightedIndex<f64>,
}

impl Distributions {
    fn new() -> Result<Self, GenerateError> {
        let gamma = |shape: f64, scale: f64, name: &'static str| {
            Gamma::new(shape, scale).map_err(|_| GenerateError::InvalidDistribution { name })
        };
        let poisson = |lambda: f64, name: &'static str| {
            Poisson::new(lambda).map_err(|_| GenerateError::InvalidDistribution { name })
        };
        let weighted = |weights: &[f64], name: &'static str| {
            WeightedIndex::new(weights).map_err(|_| GenerateError::InvalidDistribution { name })
        };
        Ok(Self {
            age: Normal::new(28.0, 8.0).map_err(invalid("age"))?,
            spend: gamma(2.0, 15.0, "spend")?,
            play_time: gamma(2.0, 5.0, "playtime")?,
            sessions: Normal::new(8.0, 3.0).map_err(invalid("sessions"))?,
            unit_noise: Normal::new(1.0, 0.1).map_err(invalid("duration"))?,
            level_rate: Normal::new(5.0, 1.0).map_err(invalid("level"))?,
            achievement_noise: Normal::new(1.0, 0.2).map_err(invalid("achievements"))?,
            fps: Normal::new(55.0, 10.0).map_err(invalid("fps"))?,
            friends: poisson(5.0, "friends")?,
            crashes: poisson(0.5, "crashes")?,
            gender: weighted(&GENDERS.map(|(_, w)| w), "gender")?,
            difficulty: weighted(&DIFFICULTIES.map(|(_, w)| w), "difficulty")?,
        })
    }
}

/// Generates a dataset of `config.players` players.
///
/// ```
/// use chrono::NaiveDate;
/// use gamelytics_data::generator::{GeneratorConfig, generate};
///
/// let config = GeneratorConfig {
///     players: 50,
///     ..GeneratorConfig::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
/// };
/// let dataset = generate(&config).unwrap();
/// assert_eq!(dataset.len(), 50);
/// assert_eq!(dataset.records()[0].player_id, 9000);
/// ```
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn generate(config: &GeneratorConfig) -> Result<Dataset, GenerateError> {
    let dist = Distributions::new()?;
    let mut rng = Pcg32::new(config.seed, RNG_STREAM);
    let today = config.reference_date;

    let mut records = (0..config.players as u64)
        .map(|offset| {
            let age = dist.age.sample(&mut rng).clamp(MIN_AGE, MAX_AGE).trunc();
            let days_since_signup = rng.random_range(1..365_u32);
            let game_difficulty = DIFFICULTIES[dist.difficulty.sample(&mut rng)].0;
            let ab_group = if rng.random_bool(0.5) {
                AbGroup::B
            } else {
                AbGroup::A
            };

            let has_purchased = rng.random_bool(PURCHASE_RATE);
            let mut total_spent_usd = 0.0;
            if has_purchased {
                total_spent_usd = round_to(dist.spend.sample(&mut rng), 2);
                if ab_group == AbGroup::B {
                    total_spent_usd += round_to(rng.random_range(0.5..5.0), 2);
                }
            }

            let age_factor = 1.0 - (age - 25.0) * 0.01;
            let difficulty_factor = match game_difficulty {
                GameDifficulty::Easy => 0.8,
                GameDifficulty::Medium => 1.0,
                GameDifficulty::Hard => 1.2,
            };
            let play_time_hours =
                round_to(dist.play_time.sample(&mut rng) * age_factor * difficulty_factor, 2)
                    .max(0.0);

            let is_active = rng.random_bool(retention_probability(days_since_signup));
            let last_active_days_ago = if is_active {
                rng.random_range(0..7)
            } else {
                rng.random_range(30..365)
            };

            PlayerRecord {
                player_id: FIRST_PLAYER_ID + offset,
                age: age as u32,
                gender: GENDERS[dist.gender.sample(&mut rng)].0.to_owned(),
                location: LOCATIONS[rng.random_range(0..LOCATIONS.len())].to_owned(),
                device: DEVICES[rng.random_range(0..DEVICES.len())].to_owned(),
                signup_date: days_before(today, u64::from(days_since_signup)),
                game_genre: GENRES[rng.random_range(0..GENRES.len())].to_owned(),
                game_difficulty,
                ab_group,
                has_purchased,
                total_spent_usd,
                play_time_hours,
                sessions_per_week: 1,
                avg_session_duration_minutes: 0,
                player_level: 1,
                achievements_unlocked: 0,
                days_since_signup,
                is_active,
                last_active_date: days_before(today, last_active_days_ago),
                friends_count: dist.friends.sample(&mut rng) as u32,
                guild_member: rng.random_bool(GUILD_RATE),
                avg_fps: round_to(dist.fps.sample(&mut rng).clamp(30.0, 60.0), 1),
                crash_count: dist.crashes.sample(&mut rng) as u32,
                engagement_level: EngagementLevel::Low,
            }
        })
        .collect::<Vec<_>>();

    let play_times = records.iter().map(|r| r.play_time_hours).collect::<Vec<_>>();
    let mean_play_time = play_times.iter().sum::<f64>() / play_times.len().max(1) as f64;
    let max_play_time = play_times.iter().copied().fold(0.0, f64::max);

    for record in &mut records {
        let pt = record.play_time_hours;
        let relative = if mean_play_time > 0.0 {
            pt / mean_play_time
        } else {
            0.0
        };
        let sessions = (dist.sessions.sample(&mut rng) * relative * 0.8).clamp(1.0, 30.0);
        record.sessions_per_week = sessions as u32;

        let duration = pt * 60.0 / f64::from(record.sessions_per_week)
            * dist.unit_noise.sample(&mut rng);
        record.avg_session_duration_minutes = duration.clamp(15.0, 240.0).round() as u32;

        let level_factor = match record.game_difficulty {
            GameDifficulty::Easy => 1.2,
            GameDifficulty::Medium => 1.0,
            GameDifficulty::Hard => 0.8,
        };
        let level = pt * dist.level_rate.sample(&mut rng) * level_factor;
        record.player_level = level.clamp(1.0, 100.0) as u32;

        let share_of_max = if max_play_time > 0.0 {
            pt / max_play_time
        } else {
            0.0
        };
        let max_achievements = f64::from(MAX_ACHIEVEMENTS);
        let achievements = f64::from(record.player_level) / 100.0
            * share_of_max
            * max_achievements
            * dist.achievement_noise.sample(&mut rng);
        record.achievements_unlocked = achievements.clamp(0.0, max_achievements) as u32;
    }

    assign_engagement_levels(&mut records);
    log::info!("Generated {} players", records.len());
    Ok(Dataset::new(records))
}

/// Probability that a player is still active `days` after signing up.
fn retention_probability(days: u32) -> f64 {
    (0.9 - f64::from(days) * 0.001).clamp(0.1, 0.9)
}

fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Buckets players into tertiles of the composite engagement score: the
/// mean of min-max normalized playtime, achievement completion and min-max
/// normalized spend.
fn assign_engagement_levels(records: &mut [PlayerRecord]) {
    let play_time = min_max(records.iter().map(|r| r.play_time_hours));
    let spend = min_max(records.iter().map(|r| r.total_spent_usd));
    let scores = records
        .iter()
        .map(|r| {
            let achievements = f64::from(r.achievements_unlocked) / f64::from(MAX_ACHIEVEMENTS);
            (play_time.normalize(r.play_time_hours)
                + achievements
                + spend.normalize(r.total_spent_usd))
                / 3.0
        })
        .collect::<Vec<_>>();

    let cuts = percentiles_of(scores.iter().copied(), &[100.0 / 3.0, 200.0 / 3.0]);
    let (low_cut, high_cut) = (cuts[0], cuts[1]);
    for (record, score) in records.iter_mut().zip(scores) {
        record.engagement_level = if score <= low_cut {
            EngagementLevel::Low
        } else if score <= high_cut {
            EngagementLevel::Medium
        } else {
            EngagementLevel::High
        };
    }
}

#[derive(Debug, Clone, Copy)]
struct MinMax {
    min: f64,
    max: f64,
}

impl MinMax {
    fn normalize(self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range > 0.0 {
            (value - self.min) / range
        } else {
            0.0
        }
    }
}

fn min_max<I>(values: I) -> MinMax
where
    I: IntoIterator<Item = f64>,
{
    values.into_iter().fold(
        MinMax {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        },
        |acc, v| MinMax {
            min: acc.min.min(v),
            max: acc.max.max(v),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(players: usize, seed: u64) -> GeneratorConfig {
        GeneratorConfig {
            players,
            seed,
            reference_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        }
    }

    #[test]
    fn test_same_seed_same_dataset() {
        let a = generate(&config(200, 7)).unwrap();
        let b = generate(&config(200, 7)).unwrap();
        assert_eq!(a.records(), b.records());
        let c = generate(&config(200, 8)).unwrap();
        assert_ne!(a.records(), c.records());
    }

    #[test]
    fn test_field_ranges() {
        let cfg = config(2000, 42);
        let dataset = generate(&cfg).unwrap();
        for r in dataset.records() {
            assert!((18..=65).contains(&r.age));
            assert!((1..=30).contains(&r.sessions_per_week));
            assert!((15..=240).contains(&r.avg_session_duration_minutes));
            assert!((1..=100).contains(&r.player_level));
            assert!(r.achievements_unlocked <= MAX_ACHIEVEMENTS);
            assert!((30.0..=60.0).contains(&r.avg_fps));
            assert!(r.play_time_hours >= 0.0);
            assert!(r.total_spent_usd >= 0.0);
            if !r.has_purchased {
                assert_eq!(r.total_spent_usd, 0.0);
            }
            assert_eq!(
                cfg.reference_date - r.signup_date,
                chrono::TimeDelta::days(i64::from(r.days_since_signup))
            );
            let last_active_ago = (cfg.reference_date - r.last_active_date).num_days();
            if r.is_active {
                assert!((0..7).contains(&last_active_ago));
            } else {
                assert!((30..365).contains(&last_active_ago));
            }
        }
    }

    #[test]
    fn test_engagement_tertiles_are_balanced() {
        let dataset = generate(&config(3000, 1)).unwrap();
        for level in EngagementLevel::ALL {
            let count = dataset
                .records()
                .iter()
                .filter(|r| r.engagement_level == level)
                .count();
            assert!((900..=1100).contains(&count), "{level}: {count}");
        }
    }

    #[test]
    fn test_zero_players() {
        let dataset = generate(&config(0, 1)).unwrap();
        assert!(dataset.is_empty());
    }
}
