use crate::config::ProximityConfig;
use nearby_core::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityTrigger {
    Start,
    Stop,
}

/// Decides when a pair of avatars should start or stop a call.
#[derive(Debug, Clone, Copy)]
pub struct ProximityDetector {
    config: ProximityConfig,
}

impl ProximityDetector {
    pub fn new(config: ProximityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> ProximityConfig {
        self.config
    }

    pub fn evaluate(
        &self,
        local: Position,
        remote: Position,
        in_session: bool,
    ) -> Option<ProximityTrigger> {
        let distance = local.distance_to(&remote);

        if !in_session && distance < self.config.enter_radius {
            Some(ProximityTrigger::Start)
        } else if in_session && distance >= self.config.exit_radius {
            Some(ProximityTrigger::Stop)
        } else {
            None
        }
    }
}

impl Default for ProximityDetector {
    fn default() -> Self {
        Self::new(ProximityConfig::default())
    }
}
