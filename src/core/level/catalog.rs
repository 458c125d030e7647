//! Entity type records. The core treats these as opaque configuration:
//! JSON in, typed definitions out, no validation beyond required fields.

use anyhow::{Context, Result};
use bevy::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;

use crate::gameplay::abilities::{BallAbility, BuildingBehavior, ParamBag};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SpecialRecord {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BallRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub radius: Option<f32>,
    #[serde(default)]
    pub mass: Option<f32>,
    #[serde(default)]
    pub restitution: Option<f32>,
    #[serde(default)]
    pub friction: Option<f32>,
    #[serde(default, rename = "frictionAir")]
    pub linear_damping: Option<f32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, rename = "scoreValue")]
    pub score_value: Option<u32>,
    #[serde(default)]
    pub cost: Option<u32>,
    #[serde(default)]
    pub special: SpecialRecord,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SizeRecord {
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BuildingRecord {
    pub id: String,
    pub name: String,
    pub size: SizeRecord,
    #[serde(default)]
    pub cost: Option<u32>,
    #[serde(default)]
    pub color: Option<String>,
    pub action: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
    #[serde(default, rename = "isSensor")]
    pub is_sensor: bool,
    #[serde(default, rename = "requiresPair")]
    pub requires_pair: bool,
}

/// Parsed ball type; optional physics fields fall back to config defaults at
/// spawn time.
#[derive(Debug, Clone)]
pub struct BallTypeDef {
    pub id: String,
    pub name: String,
    pub radius: Option<f32>,
    pub mass: Option<f32>,
    pub restitution: Option<f32>,
    pub friction: Option<f32>,
    pub linear_damping: Option<f32>,
    pub score_value: u32,
    pub cost: u32,
    pub ability: BallAbility,
    pub cooldown_ms: u64,
}

#[derive(Debug, Clone)]
pub struct BuildingTypeDef {
    pub id: String,
    pub name: String,
    pub size: Vec2,
    pub cost: u32,
    pub is_sensor: bool,
    pub requires_pair: bool,
    /// Absent when the record names an unknown action: capability gap.
    pub behavior: Option<BuildingBehavior>,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct EntityCatalog {
    balls: HashMap<String, BallTypeDef>,
    buildings: HashMap<String, BuildingTypeDef>,
}

impl EntityCatalog {
    /// Parses both record files. Unknown action names are collected as
    /// warnings and leave the entity without a handler, never failing the load.
    pub fn from_json(balls_json: &str, buildings_json: &str) -> Result<(Self, Vec<String>)> {
        let mut warnings = Vec::new();

        let ball_records: Vec<BallRecord> =
            serde_json::from_str(balls_json).context("parse ball records")?;
        let mut balls = HashMap::new();
        for rec in ball_records {
            let bag = ParamBag(rec.special.params.clone());
            let action = rec.special.action.as_deref().unwrap_or("none");
            let ability = BallAbility::parse(action, &bag).unwrap_or_else(|| {
                warnings.push(format!(
                    "Catalog: ball '{}' has unknown action '{}'; no handlers attached",
                    rec.id, action
                ));
                BallAbility::None
            });
            balls.insert(
                rec.id.clone(),
                BallTypeDef {
                    id: rec.id,
                    name: rec.name,
                    radius: rec.radius,
                    mass: rec.mass,
                    restitution: rec.restitution,
                    friction: rec.friction,
                    linear_damping: rec.linear_damping,
                    score_value: rec.score_value.unwrap_or(10),
                    cost: rec.cost.unwrap_or(0),
                    ability,
                    cooldown_ms: bag.u64("cooldownMs", 300),
                },
            );
        }

        let building_records: Vec<BuildingRecord> =
            serde_json::from_str(buildings_json).context("parse building records")?;
        let mut buildings = HashMap::new();
        for rec in building_records {
            let bag = ParamBag(rec.params.clone());
            let behavior = BuildingBehavior::parse(&rec.action, &bag);
            if behavior.is_none() {
                warnings.push(format!(
                    "Catalog: building '{}' has unknown action '{}'; no handlers attached",
                    rec.id, rec.action
                ));
            }
            buildings.insert(
                rec.id.clone(),
                BuildingTypeDef {
                    id: rec.id,
                    name: rec.name,
                    size: Vec2::new(rec.size.w, rec.size.h),
                    cost: rec.cost.unwrap_or(0),
                    is_sensor: rec.is_sensor,
                    requires_pair: rec.requires_pair,
                    behavior,
                },
            );
        }

        Ok((Self { balls, buildings }, warnings))
    }

    pub fn ball(&self, id: &str) -> Option<&BallTypeDef> {
        self.balls.get(id)
    }

    pub fn building(&self, id: &str) -> Option<&BuildingTypeDef> {
        self.buildings.get(id)
    }

    pub fn ball_count(&self) -> usize {
        self.balls.len()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }
}
