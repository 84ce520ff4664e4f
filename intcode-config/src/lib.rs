//! Intcode Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Intcode crates.
//! Every type deserializes from JSON with missing fields falling back to `Default`.

use serde::Deserialize;

/// Configuration for a single machine
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Suspend after every emitted output until resumed
    pub pause_on_output: bool,
    /// Suppress step-by-step narration
    pub silent_trace: bool,
    /// Value returned instead of blocking when the input queue is empty
    pub default_input: Option<i64>,
    /// Opaque tag used in logs and halt reports
    pub label: Option<String>,
    /// Consecutive default-input reads before the machine counts as idle
    pub idle_threshold: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            pause_on_output: false,
            silent_trace: false,
            default_input: None,
            label: None,
            idle_threshold: 2,
        }
    }
}

impl MachineConfig {
    /// Builder-style label setter
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// How a network decides that it is done
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    /// Stop on the first packet addressed to the host
    #[default]
    FirstPacket,
    /// Re-inject the last host packet into machine 0 whenever the network is
    /// quiescent; stop when the same `y` is injected twice in a row
    Nat,
}

/// Configuration for a network of machines
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Number of machines
    pub size: usize,
    /// Destination address that is delivered to the host
    pub host_address: i64,
    /// Input value returned to a machine with an empty queue
    pub default_input: i64,
    /// Consecutive default-input reads before a machine counts as idle
    ///
    /// Only `Nat` mode consults idleness, and there it is a heuristic: a
    /// machine that polls longer than this before sending looks idle early.
    /// `FirstPacket` mode waits for the host packet regardless.
    pub idle_threshold: u32,
    /// Termination rule
    pub mode: NetworkMode,
    /// Suppress step-by-step narration of every machine
    pub silent_trace: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            size: 50,
            host_address: 255,
            default_input: -1,
            idle_threshold: 2,
            mode: NetworkMode::FirstPacket,
            silent_trace: true,
        }
    }
}

/// Log verbosity shared by the logger crate and the CLI
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a level name; "silent" means errors only
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "silent" | "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log target enum for target-specific configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Machine,
    Network,
    Cli,
}

impl Target {
    /// Get the string name of the target
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Machine => "machine",
            Target::Network => "network",
            Target::Cli => "cli",
        }
    }

    /// Get the log target name
    pub fn target(&self) -> String {
        format!("intcode::{}", self.as_str())
    }
}
