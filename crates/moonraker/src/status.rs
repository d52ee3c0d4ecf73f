//! Canonical machine states.

use serde::Serialize;

/// The three states every controller-reported state collapses into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    Idle,
    Paused,
    Processing,
}

impl MachineStatus {
    /// Map a controller state string. Anything not idle or paused is processing.
    pub fn from_controller(state: &str) -> Self {
        match state {
            "idle" | "ready" => MachineStatus::Idle,
            "paused" => MachineStatus::Paused,
            _ => MachineStatus::Processing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MachineStatus::Idle => "idle",
            MachineStatus::Paused => "paused",
            MachineStatus::Processing => "processing",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, MachineStatus::Idle)
    }
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
