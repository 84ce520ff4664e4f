//! 指令集定义
//!
//! 指令单元的低两位十进制数字是操作码，其余数字从右到左依次是
//! 参数 1、2、3 的模式，缺省为 0。

use crate::error::MachineError;
use std::fmt;

/// 操作码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    Add = 1,
    Multiply = 2,
    Input = 3,
    Output = 4,
    JumpIfTrue = 5,
    JumpIfFalse = 6,
    LessThan = 7,
    Equals = 8,
    AdjustBase = 9,
    Halt = 99,
}

impl OpCode {
    /// 从数字解析操作码
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(OpCode::Add),
            2 => Some(OpCode::Multiply),
            3 => Some(OpCode::Input),
            4 => Some(OpCode::Output),
            5 => Some(OpCode::JumpIfTrue),
            6 => Some(OpCode::JumpIfFalse),
            7 => Some(OpCode::LessThan),
            8 => Some(OpCode::Equals),
            9 => Some(OpCode::AdjustBase),
            99 => Some(OpCode::Halt),
            _ => None,
        }
    }

    pub const fn code(&self) -> i64 {
        *self as i64
    }

    /// 助记符（用于追踪日志）
    pub const fn name(&self) -> &'static str {
        match self {
            OpCode::Add => "ADD",
            OpCode::Multiply => "MUL",
            OpCode::Input => "IN",
            OpCode::Output => "OUT",
            OpCode::JumpIfTrue => "JNZ",
            OpCode::JumpIfFalse => "JZ",
            OpCode::LessThan => "LT",
            OpCode::Equals => "EQ",
            OpCode::AdjustBase => "ARB",
            OpCode::Halt => "HALT",
        }
    }

    /// 参数个数
    pub const fn param_count(&self) -> usize {
        match self {
            OpCode::Add | OpCode::Multiply | OpCode::LessThan | OpCode::Equals => 3,
            OpCode::JumpIfTrue | OpCode::JumpIfFalse => 2,
            OpCode::Input | OpCode::Output | OpCode::AdjustBase => 1,
            OpCode::Halt => 0,
        }
    }

    /// 作为写目标的参数下标（从 0 开始）
    pub const fn write_param(&self) -> Option<usize> {
        match self {
            OpCode::Add | OpCode::Multiply | OpCode::LessThan | OpCode::Equals => Some(2),
            OpCode::Input => Some(0),
            _ => None,
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 参数模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ParamMode {
    /// 操作数是 `memory[param]`
    #[default]
    Position = 0,
    /// 操作数就是 `param`（不能作为写目标）
    Immediate = 1,
    /// 操作数是 `memory[relative_base + param]`
    Relative = 2,
}

impl ParamMode {
    pub const fn from_digit(digit: i64) -> Option<Self> {
        match digit {
            0 => Some(ParamMode::Position),
            1 => Some(ParamMode::Immediate),
            2 => Some(ParamMode::Relative),
            _ => None,
        }
    }
}

/// 解码后的指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub modes: [ParamMode; 3],
}

impl Instruction {
    /// 解码一个指令单元
    ///
    /// 负数单元视为未知操作码；声明参数的模式数字不是 0/1/2 时报错，
    /// 未声明参数位置上的数字被忽略。
    pub fn decode(cell: i64, pointer: usize) -> Result<Self, MachineError> {
        if cell < 0 {
            return Err(MachineError::UnknownOpcode {
                opcode: cell,
                pointer,
            });
        }

        let opcode = OpCode::from_code(cell % 100).ok_or(MachineError::UnknownOpcode {
            opcode: cell % 100,
            pointer,
        })?;

        let mut modes = [ParamMode::Position; 3];
        let mut rest = cell / 100;
        for (i, mode) in modes.iter_mut().enumerate() {
            let digit = rest % 10;
            rest /= 10;
            if i >= opcode.param_count() {
                continue;
            }
            *mode = ParamMode::from_digit(digit).ok_or(MachineError::InvalidParameterMode {
                mode: digit,
                instruction: cell,
                pointer,
            })?;
        }

        Ok(Self { opcode, modes })
    }

    /// 指令总宽度（操作码 + 参数）
    pub const fn width(&self) -> usize {
        1 + self.opcode.param_count()
    }

    pub fn mode(&self, index: usize) -> ParamMode {
        self.modes.get(index).copied().unwrap_or_default()
    }
}
