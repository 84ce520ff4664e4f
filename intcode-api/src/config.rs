//! API 层配置
//!
//! 包含执行配置 RunConfig 和全局单例（供 CLI 使用）

use intcode_config::{MachineConfig, NetworkConfig};
use intcode_log::Logger;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Execution configuration
#[derive(Clone)]
pub struct RunConfig {
    /// Whether to narrate every executed instruction
    pub show_steps: bool,
    /// Single-machine configuration
    pub machine: MachineConfig,
    /// Network configuration
    pub network: NetworkConfig,
    /// Logger (optional)
    pub logger: Arc<Logger>,
}

impl RunConfig {
    /// Machine configuration with step narration resolved from `show_steps`
    pub fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            silent_trace: self.machine.silent_trace || !self.show_steps,
            ..self.machine.clone()
        }
    }

    /// Network configuration with step narration resolved from `show_steps`
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            silent_trace: self.network.silent_trace || !self.show_steps,
            ..self.network.clone()
        }
    }
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("show_steps", &self.show_steps)
            .field("machine", &self.machine)
            .field("network", &self.network)
            .finish()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            show_steps: false,
            machine: MachineConfig::default(),
            network: NetworkConfig::default(),
            logger: Logger::noop(),
        }
    }
}

// Global config singleton for CLI convenience
static GLOBAL_CONFIG: OnceCell<RunConfig> = OnceCell::new();

/// Initialize global configuration
///
/// Returns the rejected config if one was already installed.
pub fn init(config: RunConfig) -> Result<(), RunConfig> {
    GLOBAL_CONFIG.set(config)
}

/// Get global config reference, installing the default on first use
pub fn config() -> &'static RunConfig {
    GLOBAL_CONFIG.get_or_init(RunConfig::default)
}

/// Check if config is initialized
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}
