//! Intcode 机器
//!
//! 执行模型：
//! - [`Machine::advance`]：协作式、非阻塞，运行到下一个挂起点
//! - [`Machine::run`]：阻塞式，在输入/恢复等待上阻塞直到停机
//! - [`Machine::spawn`]：在独立线程上运行，通过 [`MachineController`] 驱动
//!
//! 输入解析顺序：队列 → 注入的 [`InputProvider`] → 默认输入 → 挂起。

mod control;
mod event;
mod handle;

pub use control::{MachineController, Status};
pub use event::{EventSink, HaltReason, HaltReport, MachineEvent, RoutedSink};
pub use handle::MachineHandle;

use crate::error::MachineError;
use crate::io::{InputProvider, InputRequest};
use crate::isa::{Instruction, OpCode, ParamMode};
use crate::memory::Memory;
use crate::tape::Program;
use control::Control;
use intcode_config::MachineConfig;
use intcode_log::{debug, info, trace, warn, Logger};
use std::fmt;
use std::sync::{mpsc, Arc};
use std::thread;

/// `advance` 返回的挂起点
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suspension {
    /// 输出了一个值（开启 `pause_on_output` 时机器处于暂停状态）
    Output(i64),
    /// 没有可用输入，指针停在输入指令上
    AwaitingInput,
    /// 已停机
    Halted(HaltReason),
}

/// 单条指令执行后的控制流
enum Flow {
    Continue,
    Output(i64),
    NeedInput,
    Halt,
}

/// 一台 Intcode 机器
pub struct Machine {
    memory: Memory,
    pointer: usize,
    relative_base: i64,
    outputs: Vec<i64>,
    /// 消耗的非默认输入个数
    consumed: u64,
    /// 连续读到默认输入的次数
    default_streak: u32,
    last_value: Option<i64>,
    paused: bool,
    halt: Option<HaltReason>,
    config: MachineConfig,
    control: Arc<Control>,
    provider: Option<Box<dyn InputProvider>>,
    logger: Arc<Logger>,
}

impl Machine {
    /// 从程序拷贝和预置输入创建机器（默认配置）
    pub fn new(program: impl Into<Program>, inputs: impl IntoIterator<Item = i64>) -> Self {
        Self::with_config(program, inputs, MachineConfig::default())
    }

    /// 创建机器（带配置）
    pub fn with_config(
        program: impl Into<Program>,
        inputs: impl IntoIterator<Item = i64>,
        config: MachineConfig,
    ) -> Self {
        Self {
            memory: Memory::new(program.into().into_cells()),
            pointer: 0,
            relative_base: 0,
            outputs: Vec::new(),
            consumed: 0,
            default_streak: 0,
            last_value: None,
            paused: false,
            halt: None,
            config,
            control: Control::new(inputs),
            provider: None,
            logger: Logger::noop(),
        }
    }

    /// 设置 logger（用于执行追踪）
    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// 注入输入提供者
    pub fn with_provider<P: InputProvider + 'static>(mut self, provider: P) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    /// 注册事件接收器
    pub fn with_sink<S: EventSink + 'static>(self, sink: S) -> Self {
        self.control.add_sink(Box::new(sink));
        self
    }

    // ===== 宿主操作 =====

    pub fn controller(&self) -> MachineController {
        MachineController::new(Arc::clone(&self.control))
    }

    pub fn input(&self, value: i64) {
        self.control.queue.push(value);
    }

    pub fn input_all(&self, values: impl IntoIterator<Item = i64>) {
        self.control.queue.extend(values);
    }

    pub fn input_line(&self, text: &str) {
        self.controller().input_line(text);
    }

    pub fn resume(&self) {
        self.control.gate.open();
    }

    pub fn halt(&self) {
        self.control.request_halt();
    }

    pub fn subscribe(&self) -> mpsc::Receiver<MachineEvent> {
        self.controller().subscribe()
    }

    // ===== 检查 =====

    pub fn label(&self) -> &str {
        self.config.label.as_deref().unwrap_or("machine")
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn status(&self) -> Status {
        self.control.status()
    }

    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.control.is_idle()
    }

    pub fn outputs(&self) -> &[i64] {
        &self.outputs
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    /// 最后一次被消耗的输入或产生的输出；仅入队的输入不计
    pub fn last_value(&self) -> Option<i64> {
        self.last_value
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn halt_reason(&self) -> Option<&HaltReason> {
        self.halt.as_ref()
    }

    pub fn halt_report(&self) -> Option<HaltReport> {
        self.halt.as_ref().map(|reason| self.report(reason.clone()))
    }

    pub fn pending_inputs(&self) -> usize {
        self.control.queue.len()
    }

    // ===== 执行 =====

    /// 阻塞运行直到停机，返回全部输出
    ///
    /// 致命故障以 `Err` 返回；外部停机返回已产生的输出。
    /// 已停机的机器直接返回 `AlreadyHalted`，不改变任何状态。
    pub fn run(&mut self) -> Result<Vec<i64>, MachineError> {
        if self.halt.is_some() {
            return Err(MachineError::AlreadyHalted);
        }

        loop {
            match self.advance() {
                Suspension::Output(_) => {
                    if self.config.pause_on_output {
                        // 被打断时由下一次 advance 处理停机
                        let _ = self.control.gate.wait();
                    }
                }
                Suspension::AwaitingInput => {
                    let _ = self.control.queue.wait_available();
                }
                Suspension::Halted(HaltReason::Fault(error)) => return Err(error),
                Suspension::Halted(_) => return Ok(self.outputs.clone()),
            }
        }
    }

    /// 协作式驱动：运行到下一个挂起点
    ///
    /// 暂停状态下再次调用即视为恢复。
    pub fn advance(&mut self) -> Suspension {
        if let Some(reason) = &self.halt {
            return Suspension::Halted(reason.clone());
        }

        if self.control.halt_requested() {
            return Suspension::Halted(self.finish(HaltReason::Requested));
        }

        if self.paused {
            self.paused = false;
            debug!(self.logger, "[{}] resumed at {}", self.label(), self.pointer);
            self.control.emit(&MachineEvent::Resumed);
        }
        self.control.set_status(Status::Running);

        loop {
            if self.control.halt_requested() {
                return Suspension::Halted(self.finish(HaltReason::Requested));
            }

            match self.step() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Output(value)) => {
                    if self.config.pause_on_output {
                        self.paused = true;
                        self.control.set_status(Status::Paused);
                        debug!(self.logger, "[{}] paused after output {}", self.label(), value);
                        self.control.emit(&MachineEvent::Paused);
                    }
                    return Suspension::Output(value);
                }
                Ok(Flow::NeedInput) => return Suspension::AwaitingInput,
                Ok(Flow::Halt) => {
                    return Suspension::Halted(self.finish(HaltReason::Completed));
                }
                Err(error) => {
                    return Suspension::Halted(self.finish(HaltReason::Fault(error)));
                }
            }
        }
    }

    /// 在独立线程上运行，返回句柄
    pub fn spawn(self) -> Result<MachineHandle, MachineError> {
        handle::spawn(self)
    }

    /// 执行一条指令
    fn step(&mut self) -> Result<Flow, MachineError> {
        let pointer = self.pointer;
        let instruction = Instruction::decode(self.memory.read(pointer), pointer)?;
        self.trace_instruction(&instruction);

        let opcode = instruction.opcode;
        match opcode {
            OpCode::Add | OpCode::Multiply => {
                let a = self.operand(&instruction, 0)?;
                let b = self.operand(&instruction, 1)?;
                let value = match opcode {
                    OpCode::Add => a.checked_add(b),
                    _ => a.checked_mul(b),
                }
                .ok_or(MachineError::Overflow {
                    opcode: opcode.code(),
                    pointer,
                })?;
                let target = self.address(&instruction, 2)?;
                self.memory.write(target, value);
            }
            OpCode::LessThan | OpCode::Equals => {
                let a = self.operand(&instruction, 0)?;
                let b = self.operand(&instruction, 1)?;
                let hit = match opcode {
                    OpCode::LessThan => a < b,
                    _ => a == b,
                };
                let target = self.address(&instruction, 2)?;
                self.memory.write(target, i64::from(hit));
            }
            OpCode::Input => {
                let target = self.address(&instruction, 0)?;
                match self.read_input() {
                    Some(value) => {
                        self.memory.write(target, value);
                        self.last_value = Some(value);
                    }
                    // 指针不前进，收到输入后重新执行本指令
                    None => return Ok(Flow::NeedInput),
                }
            }
            OpCode::Output => {
                let value = self.operand(&instruction, 0)?;
                self.pointer += instruction.width();
                self.outputs.push(value);
                self.last_value = Some(value);
                self.default_streak = 0;
                self.update_idle(false);
                self.control.emit(&MachineEvent::Output(value));
                return Ok(Flow::Output(value));
            }
            OpCode::JumpIfTrue | OpCode::JumpIfFalse => {
                let condition = self.operand(&instruction, 0)?;
                let taken = match opcode {
                    OpCode::JumpIfTrue => condition != 0,
                    _ => condition == 0,
                };
                if taken {
                    let target = self.operand(&instruction, 1)?;
                    self.pointer = self.to_address(target)?;
                    return Ok(Flow::Continue);
                }
            }
            OpCode::AdjustBase => {
                let delta = self.operand(&instruction, 0)?;
                self.relative_base =
                    self.relative_base
                        .checked_add(delta)
                        .ok_or(MachineError::Overflow {
                            opcode: opcode.code(),
                            pointer,
                        })?;
            }
            OpCode::Halt => return Ok(Flow::Halt),
        }

        self.pointer += instruction.width();
        Ok(Flow::Continue)
    }

    /// 读取第 `index` 个参数的原始值
    fn param(&self, index: usize) -> i64 {
        self.memory.read(self.pointer + 1 + index)
    }

    /// 按模式解析操作数
    fn operand(&self, instruction: &Instruction, index: usize) -> Result<i64, MachineError> {
        let param = self.param(index);
        match instruction.mode(index) {
            ParamMode::Immediate => Ok(param),
            ParamMode::Position => Ok(self.memory.read(self.to_address(param)?)),
            ParamMode::Relative => {
                let address = self.relative(instruction, param)?;
                Ok(self.memory.read(address))
            }
        }
    }

    /// 按模式解析写目标地址
    fn address(&self, instruction: &Instruction, index: usize) -> Result<usize, MachineError> {
        let param = self.param(index);
        match instruction.mode(index) {
            ParamMode::Immediate => Err(MachineError::WriteToImmediate {
                opcode: instruction.opcode.code(),
                pointer: self.pointer,
            }),
            ParamMode::Position => self.to_address(param),
            ParamMode::Relative => self.relative(instruction, param),
        }
    }

    fn relative(&self, instruction: &Instruction, param: i64) -> Result<usize, MachineError> {
        let address = self
            .relative_base
            .checked_add(param)
            .ok_or(MachineError::Overflow {
                opcode: instruction.opcode.code(),
                pointer: self.pointer,
            })?;
        self.to_address(address)
    }

    fn to_address(&self, value: i64) -> Result<usize, MachineError> {
        usize::try_from(value).map_err(|_| MachineError::NegativeAddress {
            address: value,
            pointer: self.pointer,
        })
    }

    /// 队列 → 提供者 → 默认输入；都没有时返回 `None`
    fn read_input(&mut self) -> Option<i64> {
        if let Some(value) = self.control.queue.try_pop() {
            self.take_input(value);
            return Some(value);
        }

        let mut announced = false;
        if self.provider.is_some() {
            self.control.emit(&MachineEvent::WaitingForInput);
            announced = true;

            let request = InputRequest {
                label: self.config.label.as_deref(),
                pointer: self.pointer,
                outputs: &self.outputs,
            };
            let provided = match self.provider.as_mut() {
                Some(provider) => provider.provide(&request),
                None => None,
            };
            if let Some(value) = provided {
                self.take_input(value);
                return Some(value);
            }
        }

        if let Some(value) = self.config.default_input {
            self.default_streak = self.default_streak.saturating_add(1);
            if self.default_streak >= self.config.idle_threshold {
                self.update_idle(true);
            }
            // 让出时间片，避免空转的机器饿死其他线程
            thread::yield_now();
            return Some(value);
        }

        self.control.set_status(Status::AwaitingInput);
        self.update_idle(true);
        if !announced {
            debug!(
                self.logger,
                "[{}] waiting for input at {}",
                self.label(),
                self.pointer
            );
            self.control.emit(&MachineEvent::WaitingForInput);
        }
        None
    }

    fn take_input(&mut self, value: i64) {
        self.consumed += 1;
        self.default_streak = 0;
        self.update_idle(false);
        trace!(self.logger, "[{}] input {}", self.label(), value);
    }

    /// 仅在空闲状态变化时发出事件
    fn update_idle(&self, idle: bool) {
        if self.control.set_idle(idle) {
            debug!(
                self.logger,
                "[{}] idle={} consumed={}",
                self.label(),
                idle,
                self.consumed
            );
            self.control.emit(&MachineEvent::Idle {
                idle,
                consumed: self.consumed,
            });
        }
    }

    fn trace_instruction(&self, instruction: &Instruction) {
        if self.config.silent_trace {
            return;
        }
        trace!(
            self.logger,
            "[{}] {:04} {} {:?} rb={}",
            self.label(),
            self.pointer,
            instruction.opcode.name(),
            (0..instruction.opcode.param_count())
                .map(|i| self.param(i))
                .collect::<Vec<_>>(),
            self.relative_base
        );
    }

    fn report(&self, reason: HaltReason) -> HaltReport {
        HaltReport {
            label: self.config.label.clone(),
            reason,
            last_value: self.last_value,
            pointer: self.pointer,
            outputs: self.outputs.len(),
        }
    }

    /// 进入停机状态（不可逆）
    fn finish(&mut self, reason: HaltReason) -> HaltReason {
        match &reason {
            HaltReason::Fault(error) => {
                warn!(self.logger, "[{}] fault: {}", self.label(), error);
            }
            _ => {
                info!(
                    self.logger,
                    "[{}] halted ({}) at {} after {} outputs",
                    self.label(),
                    reason.as_str(),
                    self.pointer,
                    self.outputs.len()
                );
            }
        }

        self.halt = Some(reason.clone());
        self.paused = false;
        self.control.set_status(Status::Halted);
        self.control.set_idle(false);
        self.control.emit(&MachineEvent::Halted(self.report(reason.clone())));
        reason
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("label", &self.label())
            .field("status", &self.status())
            .field("pointer", &self.pointer)
            .field("relative_base", &self.relative_base)
            .field("memory", &self.memory.len())
            .field("outputs", &self.outputs.len())
            .field("halt", &self.halt)
            .finish()
    }
}
