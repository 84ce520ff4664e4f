//! intcode-log - 结构化日志系统
//!
//! 为 Intcode 解释器和网络协调器设计的日志系统，特点：
//! - **显式传递**：无全局logger，`Arc<Logger>` 通过构造参数传入
//! - **惰性格式化**：宏先检查级别，未启用时不产生任何分配
//! - **多线程安全**：同一个 logger 可以被多台机器的线程共享
//! - **崩溃转储**：环形缓冲区保留最后N条日志
//!
//! # 快速开始
//!
//! ```
//! use intcode_log::{LogConfig, Level, debug};
//!
//! let (logger, ring) = LogConfig::new(Level::Debug).with_ring_buffer(100).init().unwrap();
//! debug!(logger, "machine {} ready", 0);
//! assert_eq!(ring.unwrap().len(), 1);
//! ```

mod config;
mod logger;
mod macros;
mod record;
mod ring_buffer;

pub use config::{LogConfig, OutputConfig};
pub use logger::{FileSink, LogSink, Logger, StderrSink, StdoutSink};
pub use record::{Level, Record};
pub use ring_buffer::{LogRingBuffer, RingBufferStats};

// 宏通过 #[macro_export] 自动导出到 crate 根：
// trace!, debug!, info!, warn!, error!, log!

/// 日志结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// 日志系统错误类型
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO错误（打开日志文件失败等）
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 环形缓冲区容量非法
    #[error("Invalid ring buffer capacity: {0}")]
    InvalidCapacity(usize),
}
