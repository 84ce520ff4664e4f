//! API 错误类型
//!
//! 提供统一的错误类型和结构化错误报告。

use intcode_core::{MachineError, NetworkError, TapeError};
use serde::Serialize;
use thiserror::Error;

/// Intcode 错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntcodeError {
    /// 纸带解析错误
    #[error("{0}")]
    Tape(#[from] TapeError),

    /// 机器运行错误
    #[error("{0}")]
    Machine(#[from] MachineError),

    /// 网络错误
    #[error("{0}")]
    Network(#[from] NetworkError),

    /// 程序还在等待输入，但已没有输入可给
    #[error("input exhausted at {pointer}")]
    InputExhausted { pointer: usize },
}

impl IntcodeError {
    /// 获取错误阶段名称
    pub fn phase(&self) -> &'static str {
        match self {
            IntcodeError::Tape(_) => "tape",
            IntcodeError::Machine(_) | IntcodeError::InputExhausted { .. } => "machine",
            IntcodeError::Network(_) => "network",
        }
    }

    /// 出错指令的地址（如果有）
    pub fn pointer(&self) -> Option<usize> {
        match self {
            IntcodeError::Machine(e) => e.pointer(),
            IntcodeError::Network(NetworkError::MachineFault { source, .. })
            | IntcodeError::Network(NetworkError::Machine(source)) => source.pointer(),
            IntcodeError::InputExhausted { pointer } => Some(*pointer),
            _ => None,
        }
    }

    /// 纸带错误的列号（1-based，如果有）
    pub fn column(&self) -> Option<usize> {
        match self {
            IntcodeError::Tape(TapeError::InvalidCell { column, .. }) => Some(*column),
            _ => None,
        }
    }

    /// 网络中出错的机器编号（如果有）
    pub fn machine_index(&self) -> Option<usize> {
        match self {
            IntcodeError::Network(NetworkError::MachineFault { index, .. }) => Some(*index),
            IntcodeError::Network(NetworkError::UnknownDestination { from, .. }) => Some(*from),
            _ => None,
        }
    }

    /// 错误类型名（可用于程序化处理）
    pub fn kind(&self) -> &'static str {
        match self {
            IntcodeError::Tape(TapeError::Empty) => "EmptyTape",
            IntcodeError::Tape(TapeError::InvalidCell { .. }) => "InvalidCell",
            IntcodeError::Machine(e) => machine_error_kind(e),
            IntcodeError::Network(NetworkError::MachineFault { source, .. }) => {
                machine_error_kind(source)
            }
            IntcodeError::Network(NetworkError::UnknownDestination { .. }) => "UnknownDestination",
            IntcodeError::Network(NetworkError::Stalled) => "Stalled",
            IntcodeError::Network(NetworkError::Machine(e)) => machine_error_kind(e),
            IntcodeError::InputExhausted { .. } => "InputExhausted",
        }
    }

    /// 转换为结构化错误报告
    ///
    /// CLI 可以直接打印，上层应用可以序列化为 JSON。
    ///
    /// # Example
    /// ```
    /// use intcode_api::{run, RunConfig};
    ///
    /// let err = run("1,2,x", &[], &RunConfig::default()).unwrap_err();
    /// let report = err.to_report();
    /// assert_eq!(report.phase, "tape");
    /// assert!(report.to_json().contains("\"column\":5"));
    /// ```
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            phase: self.phase(),
            pointer: self.pointer(),
            column: self.column(),
            machine: self.machine_index(),
            error_kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

fn machine_error_kind(error: &MachineError) -> &'static str {
    match error {
        MachineError::UnknownOpcode { .. } => "UnknownOpcode",
        MachineError::InvalidParameterMode { .. } => "InvalidParameterMode",
        MachineError::WriteToImmediate { .. } => "WriteToImmediate",
        MachineError::NegativeAddress { .. } => "NegativeAddress",
        MachineError::Overflow { .. } => "Overflow",
        MachineError::AlreadyHalted => "AlreadyHalted",
        MachineError::Spawn(_) => "Spawn",
        MachineError::Panicked(_) => "Panicked",
    }
}

/// 结构化错误报告
///
/// 上层应用（CLI、脚本）可以根据自己的需求格式化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// 错误阶段: tape, machine, network
    pub phase: &'static str,
    /// 出错指令地址（如果有）
    pub pointer: Option<usize>,
    /// 纸带列号（1-based，如果有）
    pub column: Option<usize>,
    /// 网络中的机器编号（如果有）
    pub machine: Option<usize>,
    /// 错误类型（可用于程序化处理）
    pub error_kind: String,
    /// 人类可读的错误消息
    pub message: String,
}

impl std::fmt::Display for ErrorReport {
    /// 默认的 CLI 友好格式
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.column, self.pointer, self.machine) {
            (Some(column), _, _) => write!(
                f,
                "[col {}] {} error: {}",
                column, self.phase, self.message
            ),
            (None, Some(pointer), Some(machine)) => write!(
                f,
                "[node {} @{}] {} error: {}",
                machine, pointer, self.phase, self.message
            ),
            (None, Some(pointer), None) => write!(
                f,
                "[@{}] {} error: {}",
                pointer, self.phase, self.message
            ),
            _ => write!(f, "[{}] {} error: {}", self.phase, self.phase, self.message),
        }
    }
}

impl ErrorReport {
    /// 转换为 JSON 格式
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "phase": self.phase, "message": e.to_string() }).to_string()
        })
    }

    /// 简洁格式（适合终端）
    pub fn to_short(&self) -> String {
        format!("{}: {}", self.phase, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tape_error_column() {
        let err = IntcodeError::Tape(TapeError::InvalidCell {
            index: 3,
            column: 9,
            text: "x".to_string(),
        });
        assert_eq!(err.column(), Some(9));
        assert_eq!(err.pointer(), None);
        assert_eq!(err.phase(), "tape");
        assert_eq!(err.kind(), "InvalidCell");
    }

    #[test]
    fn test_machine_error_pointer() {
        let err = IntcodeError::from(MachineError::UnknownOpcode {
            opcode: 42,
            pointer: 7,
        });
        assert_eq!(err.pointer(), Some(7));
        assert_eq!(err.column(), None);
        assert_eq!(err.phase(), "machine");
        assert_eq!(err.kind(), "UnknownOpcode");
    }

    #[test]
    fn test_network_fault_points_into_machine() {
        let err = IntcodeError::from(NetworkError::MachineFault {
            index: 3,
            source: MachineError::NegativeAddress {
                address: -1,
                pointer: 12,
            },
        });
        assert_eq!(err.phase(), "network");
        assert_eq!(err.pointer(), Some(12));
        assert_eq!(err.machine_index(), Some(3));
        assert_eq!(err.kind(), "NegativeAddress");
    }

    #[test]
    fn test_input_exhausted() {
        let err = IntcodeError::InputExhausted { pointer: 0 };
        assert_eq!(err.to_string(), "input exhausted at 0");
        assert_eq!(err.pointer(), Some(0));
    }

    #[test]
    fn test_error_report_display_with_column() {
        let report = IntcodeError::Tape(TapeError::InvalidCell {
            index: 0,
            column: 1,
            text: "a".to_string(),
        })
        .to_report();

        let display = format!("{}", report);
        assert!(display.contains("[col 1]"));
        assert!(display.contains("tape error"));
    }

    #[test]
    fn test_error_report_display_with_pointer() {
        let report = IntcodeError::from(MachineError::WriteToImmediate {
            opcode: 1,
            pointer: 4,
        })
        .to_report();

        assert!(report.to_string().starts_with("[@4] machine error"));
    }

    #[test]
    fn test_error_report_display_without_location() {
        let report = IntcodeError::from(NetworkError::Stalled).to_report();
        let display = format!("{}", report);
        assert!(display.contains("[network]"));
        assert!(display.contains("network error"));
    }

    #[test]
    fn test_error_report_to_json() {
        let report = IntcodeError::from(MachineError::UnknownOpcode {
            opcode: 42,
            pointer: 7,
        })
        .to_report();

        let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(json["phase"], "machine");
        assert_eq!(json["pointer"], 7);
        assert_eq!(json["column"], serde_json::Value::Null);
        assert_eq!(json["error_kind"], "UnknownOpcode");
    }

    #[test]
    fn test_error_report_to_short() {
        let report = IntcodeError::from(TapeError::Empty).to_report();
        assert_eq!(report.to_short(), "tape: tape is empty");
    }
}
