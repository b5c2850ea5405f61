//! NUMA distance model.
//!
//! Assigns every physical frame a home node and reports the local or remote
//! latency for an access issued from the requesting node. The latency is an
//! annotation on the translation result; nothing is timed.

use crate::common::ConfigError;
use crate::config::{FramePlacement, NumaConfig};

/// Validated NUMA topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumaModel {
    config: NumaConfig,
}

impl NumaModel {
    /// Builds a model from `config`.
    ///
    /// # Errors
    ///
    /// Returns the configuration's validation error.
    pub fn new(config: NumaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this model was built from.
    pub const fn config(&self) -> &NumaConfig {
        &self.config
    }

    /// Node that owns `frame`.
    pub const fn home_node(&self, frame: u64) -> usize {
        let nodes = self.config.nodes as u64;
        let node = match self.config.placement {
            FramePlacement::Interleaved => frame % nodes,
            FramePlacement::Blocked { frames_per_node } => (frame / frames_per_node) % nodes,
        };
        node as usize
    }

    /// Returns true if `frame` lives on the requesting node.
    pub const fn is_local(&self, frame: u64) -> bool {
        self.home_node(frame) == self.config.requesting_node
    }

    /// Access latency of `frame` as seen from the requesting node.
    pub const fn latency(&self, frame: u64) -> u64 {
        if self.is_local(frame) {
            self.config.local_latency
        } else {
            self.config.remote_latency
        }
    }
}
