use bevy::prelude::*;
use rand::Rng;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Vec2Def {
    pub x: f32,
    pub y: f32,
}
impl From<Vec2Def> for Vec2 {
    fn from(v: Vec2Def) -> Self {
        Vec2::new(v.x, v.y)
    }
}

/// Playable interior plus cushion thickness.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TableRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub cushion: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BallPlacement {
    pub id: String,
    pub pos: Vec2Def,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BuildingPlacement {
    pub id: String,
    pub pos: Vec2Def,
    /// Rotation applied at creation only; buildings never move afterwards.
    #[serde(default)]
    pub angle: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    pub version: u32,
    pub id: String,
    pub name: String,
    pub table: TableRect,
    pub pocket_radius: f32,
    pub pockets: Vec<Vec2Def>,
    pub cue_position: Vec2Def,
    #[serde(default = "default_cue_ball")]
    pub cue_ball: String,
    pub target_score: u64,
    pub max_shots: u32,
    #[serde(default)]
    pub start_coins: u64,
    #[serde(default)]
    pub initial_balls: Vec<BallPlacement>,
    #[serde(default)]
    pub buildings: Vec<BuildingPlacement>,
}

fn default_cue_ball() -> String {
    "ball_basic".into()
}

impl LevelFile {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let txt = fs::read_to_string(&path)
            .map_err(|e| format!("read level {:?}: {e}", path.as_ref()))?;
        Self::parse(&txt)
    }

    pub fn parse(txt: &str) -> Result<Self, String> {
        let lf: LevelFile = ron::from_str(txt).map_err(|e| format!("parse level: {e}"))?;
        if lf.version != 1 {
            return Err(format!("LevelFile version {} unsupported (expected 1)", lf.version));
        }
        Ok(lf)
    }
}

/// Resolved level facts the step loop needs after load.
#[derive(Resource, Debug, Clone)]
pub struct ActiveLevel {
    pub id: String,
    pub name: String,
    pub cue_position: Vec2,
    pub cue_ball: String,
}
impl Default for ActiveLevel {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            cue_position: Vec2::new(280.0, 270.0),
            cue_ball: "ball_basic".into(),
        }
    }
}

/// Interior of the table (inside the cushions).
#[derive(Resource, Debug, Clone, Copy)]
pub struct TableBounds {
    pub min: Vec2,
    pub max: Vec2,
}
impl Default for TableBounds {
    fn default() -> Self {
        Self {
            min: Vec2::new(80.0, 60.0),
            max: Vec2::new(880.0, 480.0),
        }
    }
}

impl TableBounds {
    pub fn from_table(t: &TableRect) -> Self {
        Self {
            min: Vec2::new(t.x, t.y),
            max: Vec2::new(t.x + t.w, t.y + t.h),
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x > self.min.x && p.x < self.max.x && p.y > self.min.y && p.y < self.max.y
    }

    /// Uniform point at least `margin` inside the cushions; degenerate tables
    /// collapse to the center instead of panicking.
    pub fn random_point(&self, margin: f32, rng: &mut impl Rng) -> Vec2 {
        let size = self.max - self.min;
        if size.x <= margin * 2.0 || size.y <= margin * 2.0 {
            return (self.min + self.max) * 0.5;
        }
        Vec2::new(
            rng.gen_range(self.min.x + margin..self.max.x - margin),
            rng.gen_range(self.min.y + margin..self.max.y - margin),
        )
    }
}
