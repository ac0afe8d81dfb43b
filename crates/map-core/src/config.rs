//! Configuration loading for the living map.
//!
//! All tuning values live in a TOML file; every section is optional and falls
//! back to the defaults below.

use bevy_ecs::prelude::*;
use map_events::{Point3D, RouteContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "living_map.toml";

/// Complete living-map configuration.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Procedural placement settings
    #[serde(default)]
    pub world: WorldConfig,
    /// Steering agent settings
    #[serde(default)]
    pub navigation: NavigationConfig,
    /// Camera framing settings
    #[serde(default)]
    pub camera: CameraConfig,
    /// Frame loop settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Textures and fonts
    #[serde(default)]
    pub assets: AssetConfig,
}

impl MapConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: MapConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::from_file(DEFAULT_CONFIG_PATH).unwrap_or_else(|e| {
            tracing::warn!("Could not load {}: {}. Using defaults.", DEFAULT_CONFIG_PATH, e);
            Self::default()
        })
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects values the algorithms cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        for (name, value) in [
            ("world.bounds_half_width", world.bounds_half_width),
            ("world.exclusion_half_extent", world.exclusion_half_extent),
            ("world.obstacle_radius_min", world.obstacle_radius_min),
            ("world.obstacle_radius_max", world.obstacle_radius_max),
            ("world.lot_width", world.lot_width),
            ("world.lot_depth", world.lot_depth),
            ("world.sign_height", world.sign_height),
            ("world.cube_half_size", world.cube_half_size),
            ("world.cube_height", world.cube_height),
            ("world.cube_spin_per_tick", world.cube_spin_per_tick),
        ] {
            require_finite(name, value)?;
        }
        if !(world.bounds_half_width > 0.0 && world.bounds_half_width <= MAX_BOUNDS_HALF_WIDTH) {
            return Err(ConfigError::Invalid(format!(
                "world.bounds_half_width must be in (0, {}], got {}",
                MAX_BOUNDS_HALF_WIDTH, world.bounds_half_width
            )));
        }
        if world.max_placement_attempts == 0 {
            return Err(ConfigError::Invalid(
                "world.max_placement_attempts must be at least 1".into(),
            ));
        }
        if world.obstacle_radius_min < 0.0 || world.obstacle_radius_min > world.obstacle_radius_max {
            return Err(ConfigError::Invalid(format!(
                "world obstacle radius range [{}, {}] is invalid",
                world.obstacle_radius_min, world.obstacle_radius_max
            )));
        }

        let nav = &self.navigation;
        for (name, value) in [
            ("navigation.arrival_radius", nav.arrival_radius),
            ("navigation.view_distance", nav.view_distance),
            ("navigation.avoidance_gain", nav.avoidance_gain),
            ("navigation.min_speed", nav.min_speed),
            ("navigation.max_speed", nav.max_speed),
            ("navigation.direction_epsilon", nav.direction_epsilon),
        ] {
            require_finite(name, value)?;
        }
        if nav.min_speed < 0.0 || nav.min_speed > nav.max_speed {
            return Err(ConfigError::Invalid(format!(
                "navigation speed range [{}, {}] is invalid",
                nav.min_speed, nav.max_speed
            )));
        }
        if nav.view_distance <= 0.0 {
            return Err(ConfigError::Invalid(
                "navigation.view_distance must be positive".into(),
            ));
        }

        let camera = &self.camera;
        for (name, value) in [
            ("camera.lerp_factor", camera.lerp_factor),
            ("camera.threshold", camera.threshold),
            ("camera.signup_offset", camera.signup_offset),
            ("camera.login_offset", camera.login_offset),
            ("camera.default_offset", camera.default_offset),
        ] {
            require_finite(name, value)?;
        }
        if !camera.initial_position.is_finite() || !camera.initial_focus.is_finite() {
            return Err(ConfigError::Invalid(
                "camera.initial_position and initial_focus must be finite".into(),
            ));
        }
        if !(camera.lerp_factor > 0.0 && camera.lerp_factor <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.lerp_factor must be in (0, 1], got {}",
                camera.lerp_factor
            )));
        }

        let scheduler = &self.scheduler;
        for (name, value) in [
            ("scheduler.fixed_dt", scheduler.fixed_dt),
            ("scheduler.fov_degrees", scheduler.fov_degrees),
            ("scheduler.near", scheduler.near),
            ("scheduler.far", scheduler.far),
        ] {
            require_finite(name, value)?;
        }
        if !(scheduler.fixed_dt > 0.0) || scheduler.max_steps_per_frame == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.fixed_dt and max_steps_per_frame must be positive".into(),
            ));
        }

        Ok(())
    }
}

/// Largest accepted ground half-width. Keeps `2 * bounds` and the sampled
/// coordinate range finite.
pub const MAX_BOUNDS_HALF_WIDTH: f32 = 1.0e6;

fn require_finite(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{} must be finite, got {}", name, value)))
    }
}

/// Procedural placement configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Half-width of the square ground plane
    pub bounds_half_width: f32,
    /// Half-extent of the central zone reserved for the logo
    pub exclusion_half_extent: f32,
    /// Number of static obstacles
    pub obstacle_count: usize,
    /// Number of parking lots
    pub parking_lot_count: usize,
    /// Number of traffic lights and signs
    pub prop_count: usize,
    /// Draws per item before placement gives up
    pub max_placement_attempts: u32,
    pub obstacle_radius_min: f32,
    pub obstacle_radius_max: f32,
    /// Asphalt rectangle width of each lot
    pub lot_width: f32,
    /// Asphalt rectangle depth of each lot
    pub lot_depth: f32,
    /// Painted stalls per lot
    pub stalls_per_lot: usize,
    pub sign_height: f32,
    /// Half-size of the data cube at the center of the map
    pub cube_half_size: f32,
    /// Height of the data cube center above the ground
    pub cube_height: f32,
    /// Cube rotation per tick, in radians
    pub cube_spin_per_tick: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            bounds_half_width: 800.0,
            exclusion_half_extent: 250.0,
            obstacle_count: 60,
            parking_lot_count: 8,
            prop_count: 24,
            max_placement_attempts: 1000,
            obstacle_radius_min: 8.0,
            obstacle_radius_max: 24.0,
            lot_width: 60.0,
            lot_depth: 40.0,
            stalls_per_lot: 6,
            sign_height: 14.0,
            cube_half_size: 30.0,
            cube_height: 60.0,
            cube_spin_per_tick: 0.005,
        }
    }
}

/// Steering agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Size of the fixed agent pool
    pub agent_count: usize,
    /// Distance at which an agent counts as arrived
    pub arrival_radius: f32,
    /// Obstacles closer than this repel agents
    pub view_distance: f32,
    /// Repulsion gain
    pub avoidance_gain: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Combined steering vectors shorter than this skip movement
    pub direction_epsilon: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            agent_count: 5,
            arrival_radius: 10.0,
            view_distance: 100.0,
            avoidance_gain: 2.0,
            min_speed: 0.2,
            max_speed: 0.5,
            direction_epsilon: 1e-4,
        }
    }
}

/// Camera framing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Fraction of the remaining distance covered per tick
    pub lerp_factor: f32,
    /// Distance below which the camera stops moving
    pub threshold: f32,
    pub signup_offset: f32,
    pub login_offset: f32,
    pub default_offset: f32,
    pub initial_position: Point3D,
    pub initial_focus: Point3D,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            lerp_factor: 0.02,
            threshold: 1.0,
            signup_offset: -250.0,
            login_offset: 250.0,
            default_offset: 250.0,
            initial_position: Point3D::new(250.0, 420.0, 650.0),
            initial_focus: Point3D::new(250.0, 0.0, 0.0),
        }
    }
}

impl CameraConfig {
    /// Horizontal framing offset for a navigation context.
    pub fn offset_for(&self, context: RouteContext) -> f32 {
        match context {
            RouteContext::Signup => self.signup_offset,
            RouteContext::Login => self.login_offset,
            RouteContext::Other => self.default_offset,
        }
    }
}

/// Frame loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Simulation step length in seconds
    pub fixed_dt: f32,
    /// Steps run at most per rendered frame; the rest is dropped
    pub max_steps_per_frame: u32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub initial_width: u32,
    pub initial_height: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_steps_per_frame: 4,
            fov_degrees: 60.0,
            near: 0.1,
            far: 5000.0,
            initial_width: 1280,
            initial_height: 720,
        }
    }
}

/// Asset manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory asset paths are relative to
    pub root: String,
    /// Texture key to path
    pub textures: BTreeMap<String, String>,
    /// Font key to path
    pub fonts: BTreeMap<String, String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        let mut textures = BTreeMap::new();
        textures.insert("asphalt".to_string(), "textures/asphalt.png".to_string());
        textures.insert("logo".to_string(), "textures/logo.png".to_string());
        textures.insert("stop_sign".to_string(), "textures/stop_sign.png".to_string());
        textures.insert("yield_sign".to_string(), "textures/yield_sign.png".to_string());
        textures.insert("parking_sign".to_string(), "textures/parking_sign.png".to_string());

        let mut fonts = BTreeMap::new();
        fonts.insert("sign".to_string(), "fonts/sign.ttf".to_string());

        Self {
            root: "assets".to_string(),
            textures,
            fonts,
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Living Map Configuration

[world]
bounds_half_width = 800.0
exclusion_half_extent = 250.0
obstacle_count = 60
parking_lot_count = 8
prop_count = 24
max_placement_attempts = 1000
obstacle_radius_min = 8.0
obstacle_radius_max = 24.0
lot_width = 60.0
lot_depth = 40.0
stalls_per_lot = 6
sign_height = 14.0
cube_half_size = 30.0
cube_height = 60.0
cube_spin_per_tick = 0.005

[navigation]
agent_count = 5
arrival_radius = 10.0
view_distance = 100.0
avoidance_gain = 2.0
min_speed = 0.2
max_speed = 0.5
direction_epsilon = 0.0001

[camera]
lerp_factor = 0.02
threshold = 1.0
signup_offset = -250.0
login_offset = 250.0
default_offset = 250.0
initial_position = { x = 250.0, y = 420.0, z = 650.0 }
initial_focus = { x = 250.0, y = 0.0, z = 0.0 }

[scheduler]
fixed_dt = 0.016666668
max_steps_per_frame = 4
fov_degrees = 60.0
near = 0.1
far = 5000.0
initial_width = 1280
initial_height = 720

[assets]
root = "assets"

[assets.textures]
asphalt = "textures/asphalt.png"
logo = "textures/logo.png"
parking_sign = "textures/parking_sign.png"
stop_sign = "textures/stop_sign.png"
yield_sign = "textures/yield_sign.png"

[assets.fonts]
sign = "fonts/sign.ttf"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MapConfig::default();

        assert_eq!(config.world.bounds_half_width, 800.0);
        assert_eq!(config.world.exclusion_half_extent, 250.0);
        assert_eq!(config.navigation.agent_count, 5);
        assert_eq!(config.navigation.arrival_radius, 10.0);
        assert_eq!(config.navigation.view_distance, 100.0);
        assert_eq!(config.camera.lerp_factor, 0.02);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
            [navigation]
            agent_count = 12
        "#;

        let config = MapConfig::from_str(toml).unwrap();

        assert_eq!(config.navigation.agent_count, 12);
        assert_eq!(config.navigation.avoidance_gain, 2.0);
        assert_eq!(config.world.max_placement_attempts, 1000);
    }

    #[test]
    fn test_default_config_toml_parses() {
        let config = MapConfig::from_str(&default_config_toml()).unwrap();
        assert_eq!(config.world, WorldConfig::default());
        assert_eq!(config.navigation, NavigationConfig::default());
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.assets, AssetConfig::default());
    }

    #[test]
    fn test_config_to_toml() {
        let toml = MapConfig::default().to_toml().unwrap();
        assert!(toml.contains("[world]"));
        assert!(toml.contains("[navigation]"));
        assert!(toml.contains("[camera]"));

        let parsed = MapConfig::from_str(&toml).unwrap();
        assert_eq!(parsed.navigation, NavigationConfig::default());
    }

    #[test]
    fn test_invalid_speed_range_rejected() {
        let toml = r#"
            [navigation]
            min_speed = 0.9
            max_speed = 0.5
        "#;

        let err = MapConfig::from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_invalid_lerp_rejected() {
        let toml = r#"
            [camera]
            lerp_factor = 1.5
        "#;
        assert!(MapConfig::from_str(toml).is_err());
    }

    #[test]
    fn test_nan_values_rejected() {
        for toml in [
            "[navigation]\nmin_speed = nan\n",
            "[world]\nobstacle_radius_min = nan\n",
            "[world]\nexclusion_half_extent = nan\n",
            "[camera]\nthreshold = nan\n",
            "[camera]\nlerp_factor = nan\n",
            "[navigation]\nview_distance = inf\n",
        ] {
            let err = MapConfig::from_str(toml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{:?} accepted", toml);
        }
    }

    #[test]
    fn test_huge_bounds_rejected() {
        let err = MapConfig::from_str("[world]\nbounds_half_width = 3e38\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config = MapConfig::from_str("[world]\nbounds_half_width = 1e6\n").unwrap();
        assert_eq!(config.world.bounds_half_width, MAX_BOUNDS_HALF_WIDTH);
    }

    #[test]
    fn test_offset_for_context() {
        let camera = CameraConfig::default();
        assert_eq!(camera.offset_for(RouteContext::Signup), -250.0);
        assert_eq!(camera.offset_for(RouteContext::Login), 250.0);
        assert_eq!(camera.offset_for(RouteContext::Other), 250.0);
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[world]\nobstacle_count = 3").unwrap();

        let config = MapConfig::from_file(file.path()).unwrap();
        assert_eq!(config.world.obstacle_count, 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = MapConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
