//! Intcode Core - 解释器核心（纯逻辑，无终端 IO）
//!
//! 包含纸带格式、指令集、可挂起的机器以及多实例网络协调器。
//! 只操作内存中的数据结构，不直接读写终端。
//!
//! 配置通过参数显式传入，不使用全局状态。
//!
//! # 示例
//!
//! ```
//! use intcode_core::{Machine, Program};
//!
//! let program: Program = "3,0,4,0,99".parse().unwrap();
//! let mut machine = Machine::new(program, [42]);
//! assert_eq!(machine.run().unwrap(), vec![42]);
//! ```

pub mod ascii;
pub mod error;
pub mod io;
pub mod isa;
pub mod kit;
pub mod machine;
pub mod memory;
pub mod network;
pub mod tape;

pub use error::MachineError;
pub use io::{InputProvider, InputRequest, LineInput, ScriptedInput};
pub use isa::{Instruction, OpCode, ParamMode};
pub use machine::{
    EventSink, HaltReason, HaltReport, Machine, MachineController, MachineEvent, MachineHandle,
    RoutedSink, Status, Suspension,
};
pub use memory::Memory;
pub use network::{Network, NetworkError, NetworkOutcome, Packet};
pub use tape::{Program, TapeError};

// Re-export config types from intcode-config
pub use intcode_config::{MachineConfig, NetworkConfig, NetworkMode};
