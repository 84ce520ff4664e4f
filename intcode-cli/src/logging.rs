//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分 target 日志控制，
//! 并通过 [`TracingSink`] 把 intcode-log 的记录桥接到 tracing。

use crate::config::LogConfig;
use intcode_config::Target;
use intcode_log::{Level, LogSink, Record};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{
    filter::Targets, fmt, fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt, Layer,
    Registry,
};

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

impl LogFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// 使用指定格式和日志配置初始化日志系统
///
/// 控制台日志写到 stderr，程序输出独占 stdout。
pub fn init_with_file<P: AsRef<Path>>(
    log_config: &LogConfig,
    format: LogFormat,
    file: Option<P>,
) -> Result<(), String> {
    let targets = build_targets(log_config);

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(
        create_format_layer(format, io::stderr, true)
            .with_filter(targets.clone())
            .boxed(),
    );

    // 指定文件时同时输出到控制台和文件
    if let Some(path) = file {
        let path = path.as_ref();
        let file_handle = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| format!("无法打开日志文件 '{}': {}", path.display(), e))?;
        layers.push(
            create_format_layer(format, Mutex::new(file_handle), false)
                .with_filter(targets)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| format!("日志系统初始化失败: {}", e))
}

/// Build filter targets
fn build_targets(log_config: &LogConfig) -> Targets {
    [Target::Machine, Target::Network, Target::Cli]
        .into_iter()
        .fold(
            Targets::new().with_default(log_config.global),
            |targets, target| {
                let name = target.target();
                let level = log_config.level_for(&name);
                targets.with_target(name, level)
            },
        )
}

/// Create formatter layer based on format
fn create_format_layer<M>(
    format: LogFormat,
    make_writer: M,
    ansi: bool,
) -> Box<dyn Layer<Registry> + Send + Sync>
where
    M: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_ansi(ansi)
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_ansi(ansi)
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}

/// 按模块路径把 intcode-log 记录归到 tracing target
pub fn route(module_path: &str) -> Target {
    if module_path.starts_with("intcode_core::network") {
        Target::Network
    } else if module_path.starts_with("intcode_core") {
        Target::Machine
    } else {
        Target::Cli
    }
}

/// tracing 的 target 必须是编译期常量，每个 (target, level) 组合展开一次
macro_rules! forward {
    ($target:literal, $record:expr) => {{
        let record: &Record = $record;
        match record.level {
            Level::Trace => tracing::trace!(target: $target, module = record.target, "{}", record.message),
            Level::Debug => tracing::debug!(target: $target, module = record.target, "{}", record.message),
            Level::Info => tracing::info!(target: $target, module = record.target, "{}", record.message),
            Level::Warn => tracing::warn!(target: $target, module = record.target, "{}", record.message),
            Level::Error => tracing::error!(target: $target, module = record.target, "{}", record.message),
        }
    }};
}

/// 把 intcode-log 的记录转发给 tracing
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, record: &Record) {
        match route(record.target) {
            Target::Machine => forward!("intcode::machine", record),
            Target::Network => forward!("intcode::network", record),
            Target::Cli => forward!("intcode::cli", record),
        }
    }
}
