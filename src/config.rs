//! Rig description
//!
//! A rig is the redirection object, its redirectors and the overlapping rooms
//! that share the play area. Loaded from JSON; every field has a default.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_PLAY_AREA_DEPTH, DEFAULT_PLAY_AREA_WIDTH};
use crate::error::ConfigError;
use crate::redirect::{
    BidirectionalCurvatureRedirector, CurvatureParams, CurvatureRedirector, Redirector,
    RedirectorBase, RedirectorId, RedirectorKind, RotationParams, RotationRedirector,
    TranslationParams, TranslationRedirector,
};
use crate::rooms::RoomSettings;
use crate::transform::Transform;

/// Gain variant and its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum GainSettings {
    Translation(TranslationParams),
    Curvature(CurvatureParams),
    BidirectionalCurvature(CurvatureParams),
    Rotation(RotationParams),
}

impl GainSettings {
    pub fn kind(&self) -> RedirectorKind {
        match self {
            GainSettings::Translation(_) => RedirectorKind::Translation,
            GainSettings::Curvature(_) => RedirectorKind::Curvature,
            GainSettings::BidirectionalCurvature(_) => RedirectorKind::BidirectionalCurvature,
            GainSettings::Rotation(_) => RedirectorKind::Rotation,
        }
    }
}

fn default_play_area() -> Vec2 {
    Vec2::new(DEFAULT_PLAY_AREA_WIDTH, DEFAULT_PLAY_AREA_DEPTH)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectorSettings {
    pub name: String,
    /// Start play area
    #[serde(default)]
    pub anchor: Transform,
    /// Width x depth in meters
    #[serde(default = "default_play_area")]
    pub play_area: Vec2,
    pub gain: GainSettings,
}

impl RedirectorSettings {
    /// Build the redirector this entry describes
    pub fn build(&self, id: RedirectorId) -> Box<dyn Redirector> {
        let base = RedirectorBase::new(id, self.name.clone(), self.anchor).with_play_area(self.play_area);
        match self.gain {
            GainSettings::Translation(params) => Box::new(TranslationRedirector::new(base, params)),
            GainSettings::Curvature(params) => Box::new(CurvatureRedirector::new(base, params)),
            GainSettings::BidirectionalCurvature(params) => {
                Box::new(BidirectionalCurvatureRedirector::new(base, params))
            }
            GainSettings::Rotation(params) => Box::new(RotationRedirector::new(base, params)),
        }
    }
}

/// Minimap copy of a room, moved away from the original
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimapCopySettings {
    pub room: String,
    #[serde(default)]
    pub original: Transform,
    #[serde(default)]
    pub copy: Transform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Append finished sessions to a CSV file
    pub enabled: bool,
    pub directory: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Transform aligning tracking space with the virtual world; `None` runs
    /// the redirectors without anything to move
    pub redirection_object: Option<Transform>,
    pub redirectors: Vec<RedirectorSettings>,
    pub rooms: Vec<RoomSettings>,
    pub minimap: Vec<MinimapCopySettings>,
    pub logging: LoggingSettings,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            redirection_object: Some(Transform::IDENTITY),
            redirectors: Vec::new(),
            rooms: Vec::new(),
            minimap: Vec::new(),
            logging: LoggingSettings::default(),
        }
    }
}

impl RigConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loading rig from {}", path.display());
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Names identify rooms and redirectors in commands and logs, so they
    /// must be unique
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for redirector in &self.redirectors {
            if !seen.insert(redirector.name.as_str()) {
                return Err(ConfigError::DuplicateRedirector {
                    name: redirector.name.clone(),
                });
            }
        }

        let mut rooms = HashSet::new();
        for room in &self.rooms {
            if !rooms.insert(room.name.as_str()) {
                return Err(ConfigError::DuplicateRoom {
                    name: room.name.clone(),
                });
            }
        }

        if let Some(copy) = self.minimap.iter().find(|m| !rooms.contains(m.room.as_str())) {
            return Err(ConfigError::UnknownRoom {
                name: copy.room.clone(),
            });
        }
        Ok(())
    }

    /// Redirectors in declaration order, ids by position
    pub fn build_redirectors(&self) -> Vec<Box<dyn Redirector>> {
        self.redirectors
            .iter()
            .enumerate()
            .map(|(i, settings)| settings.build(RedirectorId(i as u32)))
            .collect()
    }

    /// Small rig used by the demo: a corridor that curves, a turn, a slide
    /// and two rooms on top of each other
    pub fn demo() -> Self {
        Self {
            redirectors: vec![
                RedirectorSettings {
                    name: "corridor".into(),
                    anchor: Transform::IDENTITY,
                    play_area: default_play_area(),
                    gain: GainSettings::Curvature(CurvatureParams {
                        virtual_direction: Vec3::Z,
                        redirection_length: 2.0,
                        degrees_per_meter: 10.0,
                    }),
                },
                RedirectorSettings {
                    name: "turn".into(),
                    anchor: Transform::IDENTITY,
                    play_area: default_play_area(),
                    gain: GainSettings::Rotation(RotationParams {
                        rotation_point: Vec3::ZERO,
                        rotation_degrees: 90.0,
                        velocity_dependent_gain: false,
                        ..Default::default()
                    }),
                },
                RedirectorSettings {
                    name: "slide".into(),
                    anchor: Transform::IDENTITY,
                    play_area: default_play_area(),
                    gain: GainSettings::Translation(TranslationParams {
                        direction: Vec3::Z,
                        amount: 0.5,
                        forward_gain: 0.5,
                        backward_gain: -0.5,
                    }),
                },
            ],
            rooms: vec![
                RoomSettings {
                    name: "kitchen".into(),
                    player_starts_in_room: true,
                    transition: None,
                },
                RoomSettings::named("study"),
            ],
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = RigConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RigConfig::default());
        assert_eq!(config.redirection_object, Some(Transform::IDENTITY));
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_tagged_gain_with_partial_params() {
        let json = r#"{
            "redirectors": [
                { "name": "curve", "gain": { "kind": "BidirectionalCurvature", "redirection_length": 3.0 } },
                { "name": "spin", "play_area": [2.0, 2.0], "gain": { "kind": "Rotation", "rotation_degrees": 45.0 } }
            ]
        }"#;
        let config = RigConfig::from_json_str(json).unwrap();
        match config.redirectors[0].gain {
            GainSettings::BidirectionalCurvature(params) => {
                assert_eq!(params.redirection_length, 3.0);
                assert_eq!(params.degrees_per_meter, 10.0);
            }
            other => panic!("unexpected gain {other:?}"),
        }
        assert_eq!(config.redirectors[1].play_area, Vec2::new(2.0, 2.0));
        assert_eq!(config.redirectors[0].play_area, default_play_area());

        let built = config.build_redirectors();
        assert_eq!(built[0].kind(), RedirectorKind::BidirectionalCurvature);
        assert_eq!(built[1].kind(), RedirectorKind::Rotation);
        assert_eq!(built[1].id(), RedirectorId(1));
        assert_eq!(built[1].name(), "spin");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let json = r#"{ "rooms": [ { "name": "a" }, { "name": "a" } ] }"#;
        assert!(matches!(
            RigConfig::from_json_str(json),
            Err(ConfigError::DuplicateRoom { .. })
        ));

        let json = r#"{ "redirectors": [
            { "name": "r", "gain": { "kind": "Curvature" } },
            { "name": "r", "gain": { "kind": "Translation" } }
        ] }"#;
        assert!(matches!(
            RigConfig::from_json_str(json),
            Err(ConfigError::DuplicateRedirector { .. })
        ));
    }

    #[test]
    fn test_minimap_copy_needs_known_room() {
        let json = r#"{ "rooms": [ { "name": "a" } ], "minimap": [ { "room": "b" } ] }"#;
        assert!(matches!(
            RigConfig::from_json_str(json),
            Err(ConfigError::UnknownRoom { .. })
        ));
    }

    #[test]
    fn test_demo_survives_json() {
        let demo = RigConfig::demo();
        let json = demo.to_json().unwrap();
        assert_eq!(RigConfig::from_json_str(&json).unwrap(), demo);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "logging": {{ "enabled": true }} }}"#).unwrap();
        let config = RigConfig::load(file.path()).unwrap();
        assert!(config.logging.enabled);
        assert_eq!(config.logging.directory, PathBuf::from("logs"));
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = RigConfig::load("/nonexistent/rig.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rig.json"));
    }
}
