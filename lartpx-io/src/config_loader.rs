//! YAML descriptor loading for the three configuration documents named
//! in spec §4.A/§4.H/§6: geometry, physics, electronics.
//!
//! Missing keys fall back to [`Default`]; unknown top-level keys are
//! ignored with a `log::warn!` (spec §6: "unknown keys are ignored with
//! a warning"). This is a shallow merge over the document's top-level
//! keys, matching the mostly-flat shape of the three config structs; a
//! full recursive merge was not needed for any field these descriptors
//! carry.

use crate::Result;
use lartpx_core::{ElectronicsConfig, GeometryConfig, PhysicsConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::Value;
use std::path::Path;

/// Loads the geometry descriptor (spec §4.A).
pub fn load_geometry_config<P: AsRef<Path>>(path: P) -> Result<GeometryConfig> {
    load_merged(path, "geometry")
}

/// Loads the physics descriptor (spec §4.A/§4.B).
pub fn load_physics_config<P: AsRef<Path>>(path: P) -> Result<PhysicsConfig> {
    load_merged(path, "physics")
}

/// Loads the electronics descriptor (spec §4.H).
pub fn load_electronics_config<P: AsRef<Path>>(path: P) -> Result<ElectronicsConfig> {
    load_merged(path, "electronics")
}

fn load_merged<T, P>(path: P, descriptor_name: &str) -> Result<T>
where
    T: Default + Serialize + DeserializeOwned,
    P: AsRef<Path>,
{
    let text = std::fs::read_to_string(path)?;
    let user: Value = serde_yaml::from_str(&text)?;
    let default_value = serde_yaml::to_value(T::default())?;
    let merged = merge_and_warn(default_value, user, descriptor_name);
    Ok(serde_yaml::from_value(merged)?)
}

fn merge_and_warn(default: Value, user: Value, descriptor_name: &str) -> Value {
    if !matches!(default, Value::Mapping(_)) || !matches!(user, Value::Mapping(_)) {
        return default;
    }
    let Value::Mapping(mut default_map) = default else {
        unreachable!()
    };
    let Value::Mapping(user_map) = user else {
        unreachable!()
    };
    for (key, value) in user_map {
        if default_map.contains_key(&key) {
            default_map.insert(key, value);
        } else if let Some(key_str) = key.as_str() {
            log::warn!("unknown key '{key_str}' in {descriptor_name} descriptor ignored");
        }
    }
    Value::Mapping(default_map)
}
