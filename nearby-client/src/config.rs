use crate::error::ConfigError;
use nearby_core::Position;
use nearby_core::utils::PROXIMITY_RADIUS;
use std::time::Duration;

/// Calls start below `enter_radius` and stop at `exit_radius` or beyond.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityConfig {
    pub enter_radius: f64,
    pub exit_radius: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            enter_radius: PROXIMITY_RADIUS,
            exit_radius: PROXIMITY_RADIUS,
        }
    }
}

impl ProximityConfig {
    pub fn with_hysteresis(enter_radius: f64, exit_radius: f64) -> Result<Self, ConfigError> {
        let config = Self {
            enter_radius,
            exit_radius,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.enter_radius > 0.0 && self.exit_radius >= self.enter_radius) {
            return Err(ConfigError::InvalidRadius {
                enter: self.enter_radius,
                exit: self.exit_radius,
            });
        }
        Ok(())
    }
}

/// The shared canvas. Positions are the avatar's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasBounds {
    pub width: f64,
    pub height: f64,
    pub avatar_size: f64,
}

impl Default for CanvasBounds {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            avatar_size: 20.0,
        }
    }
}

impl CanvasBounds {
    pub fn clamp(&self, position: Position) -> Position {
        Position::new(
            position.x.clamp(0.0, self.width - self.avatar_size),
            position.y.clamp(0.0, self.height - self.avatar_size),
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.avatar_size >= 0.0
            && self.width >= self.avatar_size
            && self.height >= self.avatar_size)
        {
            return Err(ConfigError::InvalidCanvas {
                width: self.width,
                height: self.height,
                avatar_size: self.avatar_size,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub proximity: ProximityConfig,

    pub idle_timeout: Duration,

    pub idle_check_interval: Duration,

    pub canvas: CanvasBounds,

    /// Position updates for unknown participants older than this are dropped.
    pub pending_position_ttl: Duration,

    /// Maximum number of buffered position updates; the oldest goes first.
    pub pending_position_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            proximity: ProximityConfig::default(),
            idle_timeout: Duration::from_secs(10),
            idle_check_interval: Duration::from_secs(1),
            canvas: CanvasBounds::default(),
            pending_position_ttl: Duration::from_secs(30),
            pending_position_capacity: 256,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.proximity.validate()?;
        self.canvas.validate()
    }
}
