//! 线程同步工具
//!
//! 机器与宿主之间唯一共享的可变状态都建立在这里的原语之上。

mod gate;
mod queue;

pub use gate::ResumeGate;
pub use queue::InputQueue;

use thiserror::Error;

/// 等待被打断时返回的错误
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum WaitError {
    /// 等待期间收到停机请求
    #[error("wait interrupted by halt request")]
    Interrupted,
}
