//! 机器错误类型

use thiserror::Error;

/// 机器运行期错误
///
/// 致命错误只会让出错的那台机器停机，全局策略由宿主决定。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MachineError {
    /// 未知操作码
    #[error("unknown opcode {opcode} at {pointer}")]
    UnknownOpcode { opcode: i64, pointer: usize },

    /// 参数模式数字不是 0/1/2
    #[error("invalid parameter mode {mode} in instruction {instruction} at {pointer}")]
    InvalidParameterMode {
        mode: i64,
        instruction: i64,
        pointer: usize,
    },

    /// 写目标使用了立即模式
    #[error("opcode {opcode} at {pointer} writes to an immediate parameter")]
    WriteToImmediate { opcode: i64, pointer: usize },

    /// 解析出的地址为负
    #[error("negative address {address} at {pointer}")]
    NegativeAddress { address: i64, pointer: usize },

    /// 算术溢出
    #[error("arithmetic overflow in opcode {opcode} at {pointer}")]
    Overflow { opcode: i64, pointer: usize },

    /// 对已停机的机器调用 run
    #[error("machine has already halted")]
    AlreadyHalted,

    /// 无法创建机器线程
    #[error("failed to spawn machine thread: {0}")]
    Spawn(String),

    /// 机器线程 panic
    #[error("machine thread panicked: {0}")]
    Panicked(String),
}

impl MachineError {
    /// 出错指令的地址（如果有）
    pub fn pointer(&self) -> Option<usize> {
        match self {
            MachineError::UnknownOpcode { pointer, .. }
            | MachineError::InvalidParameterMode { pointer, .. }
            | MachineError::WriteToImmediate { pointer, .. }
            | MachineError::NegativeAddress { pointer, .. }
            | MachineError::Overflow { pointer, .. } => Some(*pointer),
            MachineError::AlreadyHalted | MachineError::Spawn(_) | MachineError::Panicked(_) => {
                None
            }
        }
    }

    /// 是否是执行程序时产生的故障（而非宿主误用或线程问题）
    pub fn is_fault(&self) -> bool {
        self.pointer().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = MachineError::UnknownOpcode {
            opcode: 42,
            pointer: 7,
        };
        assert_eq!(err.to_string(), "unknown opcode 42 at 7");

        let err = MachineError::InvalidParameterMode {
            mode: 3,
            instruction: 301,
            pointer: 0,
        };
        assert!(err.to_string().contains("invalid parameter mode 3"));
    }

    #[test]
    fn test_pointer() {
        assert_eq!(
            MachineError::NegativeAddress {
                address: -1,
                pointer: 4
            }
            .pointer(),
            Some(4)
        );
        assert_eq!(MachineError::AlreadyHalted.pointer(), None);
        assert!(!MachineError::Spawn("no threads".into()).is_fault());
    }
}
