//! Game tuning
//!
//! Every balance knob lives here so a JSON file can override it. Missing keys
//! fall back to the defaults in `crate::consts`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;

/// Largest grid edge, in tiles
pub const MAX_GRID_DIM: u32 = 256;
/// Upper bound for explosion range, threat margin and sight range, in tiles
pub const MAX_REACH: u32 = 64;
pub const MAX_ITEM_COUNT: u32 = 1024;

/// Tuning for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Grid ===
    pub cols: u32,
    pub rows: u32,
    /// Fraction of the grid area rolled as interior walls
    pub wall_ratio: f32,
    /// Fraction of the grid area rolled as breakable obstacles
    pub breakable_ratio: f32,
    /// Items the generator tries to place
    pub item_count: u32,

    // === Actors ===
    /// Pixels per second
    pub player_speed: f32,
    /// Pixels per second
    pub guard_speed: f32,
    pub player_max_hp: u32,
    pub guard_max_hp: u32,
    /// Allow diagonal player movement. When off, vertical input wins.
    pub diagonal_movement: bool,

    // === Ordnance ===
    pub fuse_secs: f64,
    pub blast_secs: f64,
    pub explosion_range: u32,

    // === Guard behaviour ===
    pub guard_bomb_cooldown_secs: f64,
    pub guard_bomb_chance: f64,
    pub guard_threat_margin: u32,
    pub sight_range: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cols: COLS,
            rows: ROWS,
            wall_ratio: WALL_RATIO,
            breakable_ratio: BREAKABLE_RATIO,
            item_count: ITEM_COUNT,

            player_speed: PLAYER_SPEED,
            guard_speed: GUARD_SPEED,
            player_max_hp: PLAYER_MAX_HP,
            guard_max_hp: GUARD_MAX_HP,
            diagonal_movement: false,

            fuse_secs: FUSE_SECS,
            blast_secs: BLAST_SECS,
            explosion_range: EXPLOSION_RANGE,

            guard_bomb_cooldown_secs: GUARD_BOMB_COOLDOWN_SECS,
            guard_bomb_chance: GUARD_BOMB_CHANCE,
            guard_threat_margin: GUARD_THREAT_MARGIN,
            sight_range: SIGHT_RANGE,
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Unknown keys are ignored, missing keys use defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.validated())
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Clamp values the simulation cannot run with
    pub fn validated(mut self) -> Self {
        if self.cols < 3 || self.rows < 3 {
            log::warn!("Grid {}x{} too small, using 3x3 minimum", self.cols, self.rows);
            self.cols = self.cols.max(3);
            self.rows = self.rows.max(3);
        }
        if self.cols > MAX_GRID_DIM || self.rows > MAX_GRID_DIM {
            log::warn!(
                "Grid {}x{} too large, capping each side at {}",
                self.cols,
                self.rows,
                MAX_GRID_DIM
            );
            self.cols = self.cols.min(MAX_GRID_DIM);
            self.rows = self.rows.min(MAX_GRID_DIM);
        }
        self.item_count = at_most("item_count", self.item_count, MAX_ITEM_COUNT);
        self.explosion_range = at_most("explosion_range", self.explosion_range, MAX_REACH);
        self.guard_threat_margin =
            at_most("guard_threat_margin", self.guard_threat_margin, MAX_REACH);
        self.sight_range = at_most("sight_range", self.sight_range, MAX_REACH);
        self.wall_ratio = clamp_unit("wall_ratio", self.wall_ratio as f64) as f32;
        self.breakable_ratio = clamp_unit("breakable_ratio", self.breakable_ratio as f64) as f32;
        self.guard_bomb_chance = clamp_unit("guard_bomb_chance", self.guard_bomb_chance);

        self.player_speed = non_negative("player_speed", self.player_speed as f64) as f32;
        self.guard_speed = non_negative("guard_speed", self.guard_speed as f64) as f32;
        self.fuse_secs = non_negative("fuse_secs", self.fuse_secs);
        self.blast_secs = non_negative("blast_secs", self.blast_secs);
        self.guard_bomb_cooldown_secs =
            non_negative("guard_bomb_cooldown_secs", self.guard_bomb_cooldown_secs);
        self
    }
}

fn clamp_unit(name: &str, value: f64) -> f64 {
    if (0.0..=1.0).contains(&value) {
        value
    } else {
        let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        log::warn!("{} = {} out of range, clamped to {}", name, value, clamped);
        clamped
    }
}

fn at_most(name: &str, value: u32, max: u32) -> u32 {
    if value > max {
        log::warn!("{} = {} too large, clamped to {}", name, value, max);
        max
    } else {
        value
    }
}

fn non_negative(name: &str, value: f64) -> f64 {
    if value >= 0.0 {
        value
    } else {
        log::warn!("{} = {} is negative, using 0", name, value);
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "item_count": 5, "guard_speed": 90.0 }"#)
            .expect("valid json");
        assert_eq!(settings.item_count, 5);
        assert_eq!(settings.guard_speed, 90.0);
        assert_eq!(settings.cols, COLS);
        assert_eq!(settings.fuse_secs, FUSE_SECS);
        assert!(!settings.diagonal_movement);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let settings = Settings::from_json(
            r#"{ "cols": 1, "wall_ratio": 4.0, "guard_bomb_chance": -1.0, "fuse_secs": -2.0 }"#,
        )
        .expect("valid json");
        assert_eq!(settings.cols, 3);
        assert_eq!(settings.wall_ratio, 1.0);
        assert_eq!(settings.guard_bomb_chance, 0.0);
        assert_eq!(settings.fuse_secs, 0.0);
    }

    #[test]
    fn test_oversized_grid_is_capped() {
        let settings =
            Settings::from_json(r#"{ "cols": 70000, "rows": 70000 }"#).expect("valid json");
        assert_eq!(settings.cols, MAX_GRID_DIM);
        assert_eq!(settings.rows, MAX_GRID_DIM);

        let settings = Settings::from_json(r#"{ "cols": 30, "rows": 900 }"#).expect("valid json");
        assert_eq!(settings.cols, 30);
        assert_eq!(settings.rows, MAX_GRID_DIM);
    }

    #[test]
    fn test_reach_and_item_count_are_capped() {
        let settings = Settings::from_json(
            r#"{ "explosion_range": 4294967295, "guard_threat_margin": 4294967295,
                 "sight_range": 4294967295, "item_count": 4294967295 }"#,
        )
        .expect("valid json");
        assert_eq!(settings.explosion_range, MAX_REACH);
        assert_eq!(settings.guard_threat_margin, MAX_REACH);
        assert_eq!(settings.sight_range, MAX_REACH);
        assert_eq!(settings.item_count, MAX_ITEM_COUNT);

        // Values in range pass through untouched
        let settings = Settings::from_json(r#"{ "explosion_range": 5, "sight_range": 0 }"#)
            .expect("valid json");
        assert_eq!(settings.explosion_range, 5);
        assert_eq!(settings.sight_range, 0);
    }

    #[test]
    fn test_extreme_settings_still_run_a_round() {
        use crate::consts::SIM_DT;
        use crate::sim::{Session, TickInput, tick};

        let settings = Settings::from_json(
            r#"{ "cols": 70000, "rows": 4, "explosion_range": 4294967295,
                 "guard_threat_margin": 4294967295, "item_count": 4294967295 }"#,
        )
        .expect("valid json");
        let mut session = Session::new(settings, 1);
        assert_eq!(session.grid.cols(), MAX_GRID_DIM);
        for _ in 0..10 {
            tick(&mut session, &TickInput::default(), SIM_DT);
        }
    }

    #[test]
    fn test_bad_json_is_a_parse_error() {
        let err = Settings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = Settings::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}
