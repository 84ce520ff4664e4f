//! 日志配置
//!
//! 提供便捷的日志初始化配置。

use crate::logger::{FileSink, StderrSink, StdoutSink};
use crate::{Error, Level, LogRingBuffer, Logger, Result};
use std::sync::Arc;

/// 日志输出目标配置
#[derive(Clone, Debug, PartialEq)]
pub enum OutputConfig {
    /// 输出到标准输出
    Stdout,
    /// 输出到标准错误
    Stderr,
    /// 输出到文件（路径）
    File(String),
    /// 输出到环形缓冲区（容量）
    RingBuffer(usize),
}

/// 日志配置
///
/// 用于一键初始化日志系统
///
/// # 示例
///
/// ```
/// use intcode_log::{LogConfig, Level};
///
/// let config = LogConfig::new(Level::Debug)
///     .with_ring_buffer(10000);
///
/// let (logger, ring) = config.init().unwrap();
/// assert!(ring.is_some());
/// ```
#[derive(Clone, Debug)]
pub struct LogConfig {
    /// 日志级别
    pub level: Level,
    /// 输出目标列表
    pub outputs: Vec<OutputConfig>,
}

impl LogConfig {
    /// 创建配置（无输出）
    pub fn new(level: Level) -> Self {
        LogConfig {
            level,
            outputs: Vec::new(),
        }
    }

    /// 开发环境推荐配置
    ///
    /// - Trace 级别，逐条指令追踪
    /// - 输出到 stderr（stdout 留给程序输出）
    /// - 环形缓冲区 10000 条（用于崩溃转储）
    pub fn dev() -> Self {
        LogConfig {
            level: Level::Trace,
            outputs: vec![OutputConfig::Stderr, OutputConfig::RingBuffer(10000)],
        }
    }

    /// 测试环境配置（静默）
    pub fn test() -> Self {
        LogConfig {
            level: Level::Error,
            outputs: Vec::new(),
        }
    }

    /// 添加 stdout 输出
    pub fn with_stdout(mut self) -> Self {
        if !self.outputs.contains(&OutputConfig::Stdout) {
            self.outputs.push(OutputConfig::Stdout);
        }
        self
    }

    /// 添加 stderr 输出
    pub fn with_stderr(mut self) -> Self {
        if !self.outputs.contains(&OutputConfig::Stderr) {
            self.outputs.push(OutputConfig::Stderr);
        }
        self
    }

    /// 添加文件输出
    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.outputs.push(OutputConfig::File(path.into()));
        self
    }

    /// 添加环形缓冲区输出
    pub fn with_ring_buffer(mut self, capacity: usize) -> Self {
        self.outputs.push(OutputConfig::RingBuffer(capacity));
        self
    }

    /// 初始化日志系统
    ///
    /// 返回 (logger, Option<ring_buffer>)
    /// 如果配置了环形缓冲区，会返回它（用于崩溃转储）
    pub fn init(self) -> Result<(Arc<Logger>, Option<Arc<LogRingBuffer>>)> {
        let logger = Logger::new(self.level);
        let mut ring_buffer: Option<Arc<LogRingBuffer>> = None;

        for output in self.outputs {
            match output {
                OutputConfig::Stdout => logger.add_sink(StdoutSink),
                OutputConfig::Stderr => logger.add_sink(StderrSink),
                OutputConfig::File(path) => logger.add_sink(FileSink::new(&path)?),
                OutputConfig::RingBuffer(0) => return Err(Error::InvalidCapacity(0)),
                OutputConfig::RingBuffer(capacity) => {
                    let ring = LogRingBuffer::new(capacity);
                    ring_buffer = Some(Arc::clone(&ring));
                    logger.add_sink(ring);
                }
            }
        }

        Ok((logger, ring_buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = LogConfig::new(Level::Debug);
        assert_eq!(config.level, Level::Debug);
        assert!(config.outputs.is_empty());
    }

    #[test]
    fn test_config_dev() {
        let config = LogConfig::dev();
        assert_eq!(config.level, Level::Trace);
        assert!(config.outputs.contains(&OutputConfig::Stderr));
        assert!(config
            .outputs
            .iter()
            .any(|o| matches!(o, OutputConfig::RingBuffer(10000))));
    }

    #[test]
    fn test_with_stdout_is_deduplicated() {
        let config = LogConfig::new(Level::Info).with_stdout().with_stdout();
        assert_eq!(config.outputs.len(), 1);
    }

    #[test]
    fn test_init_with_ring_buffer() {
        let (logger, ring) = LogConfig::new(Level::Info)
            .with_ring_buffer(8)
            .init()
            .unwrap();
        let ring = ring.unwrap();

        logger.log(Level::Info, "test", "captured");
        logger.log(Level::Debug, "test", "filtered");

        assert_eq!(ring.len(), 1);
        assert_eq!(ring.capacity(), 8);
    }

    #[test]
    fn test_init_without_ring_buffer() {
        let (logger, ring) = LogConfig::test().init().unwrap();
        assert!(ring.is_none());
        assert_eq!(logger.sink_count(), 0);
    }

    #[test]
    fn test_init_rejects_zero_capacity() {
        let result = LogConfig::new(Level::Info).with_ring_buffer(0).init();
        assert!(matches!(result, Err(Error::InvalidCapacity(0))));
    }

    #[test]
    fn test_init_bad_file_path() {
        let dir = std::env::temp_dir().join("intcode_log_missing_dir").join("nested");
        let path = dir.join("log.txt");
        let result = LogConfig::new(Level::Info)
            .with_file(path.to_string_lossy().into_owned())
            .init();
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
