use bevy::prelude::*;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds until the headless runner exits on its own; 0 disables.
    #[serde(rename = "autoClose")]
    pub auto_close: f32,
    pub log_interval: f32,
}
impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_close: 0.0,
            log_interval: 1.0,
        }
    }
}

/// Speed governance: cap, damping and rest thresholds. Speeds are px/s; the
/// damping factors are per-frame multipliers (frame-rate dependent on purpose,
/// the arcade feel is tuned against the 60 Hz step).
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpeedConfig {
    pub max_speed: f32,
    pub damping: f32,
    pub min_rest_speed: f32,
    pub jitter_band: f32,
    pub jitter_damping: f32,
    pub rest_frames_required: u32,
}
impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            max_speed: 1440.0,
            damping: 0.996,
            min_rest_speed: 2.4,
            jitter_band: 4.8,
            jitter_damping: 0.95,
            rest_frames_required: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ImpactConfig {
    /// Multiplied on the raw relative-velocity norm at ball-ball contacts.
    pub amplifier: f32,
    pub ball_hit_grace_frames: u8,
    pub wall_hit_grace_frames: u8,
}
impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            amplifier: 1.6,
            ball_hit_grace_frames: 3,
            wall_hit_grace_frames: 2,
        }
    }
}

/// Universal radial push on strong ball-ball impacts, distinct from any
/// chain-type ability.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ChainPushConfig {
    pub trigger_threshold: f32,
    pub radius: f32,
    /// Velocity delta (px/s) applied at zero distance before impact scaling.
    pub strength: f32,
    /// Impact is divided by this before scaling the push.
    pub impact_reference: f32,
    pub max_impact_scale: f32,
}
impl Default for ChainPushConfig {
    fn default() -> Self {
        Self {
            trigger_threshold: 120.0,
            radius: 140.0,
            strength: 180.0,
            impact_reference: 180.0,
            max_impact_scale: 2.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ShotConfig {
    pub max_launch_speed: f32,
    pub grace_frames: u8,
}
impl Default for ShotConfig {
    fn default() -> Self {
        Self {
            max_launch_speed: 1440.0,
            grace_frames: 5,
        }
    }
}

/// Body defaults applied when a type record leaves a field out.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BallDefaultsConfig {
    pub radius: f32,
    pub restitution: f32,
    pub friction: f32,
    pub linear_damping: f32,
    pub mass: f32,
}
impl Default for BallDefaultsConfig {
    fn default() -> Self {
        Self {
            radius: 12.0,
            restitution: 0.98,
            friction: 0.001,
            linear_damping: 0.6,
            mass: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WallConfig {
    pub restitution: f32,
    pub friction: f32,
}
impl Default for WallConfig {
    fn default() -> Self {
        Self {
            restitution: 0.96,
            friction: 0.005,
        }
    }
}

/// Handed to the integrator once at startup.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SolverConfig {
    pub substeps: usize,
    pub max_dt: f32,
}
impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            substeps: 4,
            max_dt: 1.0 / 60.0,
        }
    }
}

#[derive(Debug, Deserialize, Resource, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub session: SessionConfig,
    pub speed: SpeedConfig,
    pub impact: ImpactConfig,
    pub chain_push: ChainPushConfig,
    pub shot: ShotConfig,
    pub ball_defaults: BallDefaultsConfig,
    pub wall: WallConfig,
    pub solver: SolverConfig,
    pub default_level_id: String,
}
impl Default for GameConfig {
    fn default() -> Self {
        Self {
            session: Default::default(),
            speed: Default::default(),
            impact: Default::default(),
            chain_push: Default::default(),
            shot: Default::default(),
            ball_defaults: Default::default(),
            wall: Default::default(),
            solver: Default::default(),
            default_level_id: "break_in".into(),
        }
    }
}

impl GameConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let data = fs::read_to_string(&path).map_err(|e| format!("read config: {e}"))?;
        ron::from_str(&data).map_err(|e| format!("parse RON: {e}"))
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<String>) {
        match Self::load_from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Merge-load a list of RON files (later files override earlier keys).
    /// Returns (config, paths used, errors). Missing files are reported as
    /// errors but never abort the merge; an empty merge yields defaults.
    pub fn load_layered<P, I>(paths: I) -> (Self, Vec<String>, Vec<String>)
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = P>,
    {
        use ron::value::Value;
        fn merge_value(base: &mut Value, overlay: Value) {
            match (base, overlay) {
                (Value::Map(bm), Value::Map(om)) => {
                    for (k, v) in om.into_iter() {
                        let mut incoming = Some(v);
                        let mut replaced = false;
                        for (ek, ev) in bm.iter_mut() {
                            if *ek == k {
                                merge_value(ev, incoming.take().unwrap());
                                replaced = true;
                                break;
                            }
                        }
                        if !replaced {
                            bm.insert(k, incoming.unwrap());
                        }
                    }
                }
                (b, o) => *b = o,
            }
        }
        let mut merged: Option<Value> = None;
        let mut used = Vec::new();
        let mut errors = Vec::new();
        for p in paths {
            let path_ref = p.as_ref();
            match fs::read_to_string(path_ref) {
                Ok(txt) => match ron::from_str::<Value>(&txt) {
                    Ok(val) => {
                        if let Some(cur) = &mut merged {
                            merge_value(cur, val);
                        } else {
                            merged = Some(val);
                        }
                        used.push(path_ref.as_os_str().to_string_lossy().to_string());
                    }
                    Err(e) => errors.push(format!("{}: parse error: {e}", path_ref.display())),
                },
                Err(e) => errors.push(format!("{}: read error: {e}", path_ref.display())),
            }
        }
        if let Some(val) = merged {
            match val.clone().into_rust::<GameConfig>() {
                Ok(cfg) => (cfg, used, errors),
                Err(e) => (GameConfig::default(), used, {
                    let mut evec = errors;
                    evec.push(format!("failed to deserialize merged config; using defaults: {e}"));
                    evec
                }),
            }
        } else {
            (GameConfig::default(), used, errors)
        }
    }

    /// Non-fatal sanity pass; every hit is a warning, never an abort.
    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.session.auto_close < 0.0 {
            w.push(format!(
                "session.autoClose {} negative -> treated as disabled (should be >= 0)",
                self.session.auto_close
            ));
        }
        if self.speed.max_speed <= 0.0 {
            w.push("speed.max_speed must be > 0".into());
        }
        if !(0.0..=1.0).contains(&self.speed.damping) {
            w.push(format!("speed.damping {} outside 0..1", self.speed.damping));
        }
        if !(0.0..=1.0).contains(&self.speed.jitter_damping) {
            w.push(format!(
                "speed.jitter_damping {} outside 0..1",
                self.speed.jitter_damping
            ));
        }
        if self.speed.min_rest_speed <= 0.0 {
            w.push("speed.min_rest_speed must be > 0; balls would never settle".into());
        }
        if self.speed.jitter_band < self.speed.min_rest_speed {
            w.push(format!(
                "speed.jitter_band {} below min_rest_speed {}; jitter suppression never fires",
                self.speed.jitter_band, self.speed.min_rest_speed
            ));
        }
        if self.speed.rest_frames_required == 0 {
            w.push("speed.rest_frames_required is 0; a single slow frame ends the shot".into());
        }
        if self.impact.amplifier <= 0.0 {
            w.push("impact.amplifier must be > 0".into());
        }
        if self.chain_push.radius <= 0.0 {
            w.push("chain_push.radius must be > 0".into());
        }
        if self.chain_push.strength < 0.0 {
            w.push("chain_push.strength negative".into());
        }
        if self.chain_push.impact_reference <= 0.0 {
            w.push("chain_push.impact_reference must be > 0".into());
        }
        if self.shot.max_launch_speed > self.speed.max_speed {
            w.push(format!(
                "shot.max_launch_speed {} above speed.max_speed {}; the cap claws it back next frame",
                self.shot.max_launch_speed, self.speed.max_speed
            ));
        }
        if self.ball_defaults.radius <= 0.0 {
            w.push("ball_defaults.radius must be > 0".into());
        }
        if self.ball_defaults.mass <= 0.0 {
            w.push("ball_defaults.mass must be > 0".into());
        }
        if !(0.0..=1.5).contains(&self.ball_defaults.restitution) {
            w.push(format!(
                "ball_defaults.restitution {} outside recommended 0..1.5",
                self.ball_defaults.restitution
            ));
        }
        if !(0.0..=1.5).contains(&self.wall.restitution) {
            w.push(format!(
                "wall.restitution {} outside recommended 0..1.5",
                self.wall.restitution
            ));
        }
        if self.solver.substeps == 0 {
            w.push("solver.substeps is 0; integrator will not advance".into());
        }
        if self.solver.max_dt <= 0.0 {
            w.push("solver.max_dt must be > 0".into());
        }
        if self.default_level_id.trim().is_empty() {
            w.push("default_level_id empty; loader falls back to built-in default".into());
        }
        w
    }
}
