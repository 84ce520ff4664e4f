//! CLI 配置
//!
//! 包含 CLI 特有的配置：JSON 配置文件、日志配置和运行配置的组合

use intcode_config::{LogLevel, MachineConfig, NetworkConfig, Target};
use serde::Deserialize;
use std::path::Path;
use tracing::Level;

/// JSON 配置文件结构（所有字段可省略）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// 是否逐条显示执行的指令
    pub show_steps: bool,
    /// 单机配置
    pub machine: MachineConfig,
    /// 网络配置
    pub network: NetworkConfig,
    /// 日志配置
    pub log: LogSettings,
}

/// 配置文件中的日志部分
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// 全局日志级别
    pub level: LogLevel,
    /// 各 target 的覆盖级别
    pub machine: Option<LogLevel>,
    pub network: Option<LogLevel>,
    pub cli: Option<LogLevel>,
    /// 日志格式: pretty, compact, json
    pub format: Option<String>,
    /// 日志文件路径
    pub file: Option<String>,
    /// 故障时转储的最近日志条数（0 表示关闭）
    pub ring_buffer: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            machine: None,
            network: None,
            cli: None,
            format: None,
            file: None,
            ring_buffer: 256,
        }
    }
}

impl CliConfig {
    /// 读取并解析 JSON 配置文件
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("无法读取 '{}': {}", path.display(), e))?;
        Self::from_json(&content).map_err(|e| format!("解析 '{}' 失败: {}", path.display(), e))
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub machine: Option<Level>,
    pub network: Option<Level>,
    pub cli: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::WARN,
            machine: None,
            network: None,
            cli: None,
        }
    }
}

impl From<&LogSettings> for LogConfig {
    fn from(settings: &LogSettings) -> Self {
        Self {
            global: to_tracing(settings.level),
            machine: settings.machine.map(to_tracing),
            network: settings.network.map(to_tracing),
            cli: settings.cli.map(to_tracing),
        }
    }
}

impl LogConfig {
    /// Get log level for a specific target
    pub fn level_for(&self, target: &str) -> Level {
        match target {
            t if t == Target::Machine.target() => self.machine.unwrap_or(self.global),
            t if t == Target::Network.target() => self.network.unwrap_or(self.global),
            t if t == Target::Cli.target() => self.cli.unwrap_or(self.global),
            _ => self.global,
        }
    }

    /// The most verbose level any target asks for
    pub fn most_verbose(&self) -> Level {
        // tracing 中越详细的级别越大（TRACE > ERROR）
        [self.machine, self.network, self.cli]
            .into_iter()
            .flatten()
            .fold(self.global, |most, level| most.max(level))
    }
}

/// intcode 级别转换为 tracing 级别
pub fn to_tracing(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

/// tracing 级别转换回 intcode-log 级别
pub fn to_log_level(level: Level) -> intcode_log::Level {
    if level == Level::TRACE {
        intcode_log::Level::Trace
    } else if level == Level::DEBUG {
        intcode_log::Level::Debug
    } else if level == Level::INFO {
        intcode_log::Level::Info
    } else if level == Level::WARN {
        intcode_log::Level::Warn
    } else {
        intcode_log::Level::Error
    }
}
