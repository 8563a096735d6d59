//! Terminal output for the CLI: styled messages, tables and spinners.

pub mod progress;
pub mod tables;
pub mod theme;

pub use progress::{create_spinner, with_spinner};
pub use tables::{TableBuilder, create_hits_table, create_stats_table};
pub use theme::{MatchStrength, THEME, Theme};
