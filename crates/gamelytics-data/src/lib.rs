//! Data model, CSV I/O, filtering and synthetic generation for Gamelytics.
//!
//! - [`player`]: the [`PlayerRecord`] row type and its categorical fields
//! - [`dataset`]: the loaded, read-only [`Dataset`]
//! - [`csv_io`]: schema-validated CSV loading and byte-exact export
//! - [`filter`]: the filter engine producing a [`FilteredView`]
//! - [`generator`]: deterministic synthetic dataset generation
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use gamelytics_data::{FilterSpec, GameDifficulty, Selection, generator};
//!
//! let config = generator::GeneratorConfig {
//!     players: 100,
//!     ..generator::GeneratorConfig::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
//! };
//! let dataset = generator::generate(&config).unwrap();
//!
//! let spec = FilterSpec {
//!     difficulty: Selection::Only(GameDifficulty::Hard),
//!     ..FilterSpec::default()
//! };
//! let view = spec.apply(&dataset);
//! assert!(view.iter().all(|r| r.game_difficulty == GameDifficulty::Hard));
//! ```

pub use self::{
    csv_io::LoadError,
    dataset::Dataset,
    filter::{FilterSpec, FilteredView, LocationFilter, Selection},
    player::{AbGroup, COLUMNS, EngagementLevel, GameDifficulty, PlayerRecord},
};

pub mod csv_io;
pub mod dataset;
pub mod filter;
pub mod generator;
pub mod player;
