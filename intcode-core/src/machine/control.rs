//! 控制块：机器与宿主之间唯一的跨线程共享状态

use super::event::{EventSink, MachineEvent};
use crate::ascii;
use crate::kit::{InputQueue, ResumeGate};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};

/// 机器生命周期状态（互斥）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ready = 0,
    Running = 1,
    /// 输出后暂停
    Paused = 2,
    /// 队列为空，挂起在输入指令上
    AwaitingInput = 3,
    Halted = 4,
}

impl Status {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Status::Ready,
            1 => Status::Running,
            2 => Status::Paused,
            3 => Status::AwaitingInput,
            _ => Status::Halted,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Status::Ready => "ready",
            Status::Running => "running",
            Status::Paused => "paused",
            Status::AwaitingInput => "awaiting_input",
            Status::Halted => "halted",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) struct Control {
    pub(crate) queue: InputQueue,
    pub(crate) gate: ResumeGate,
    halt_requested: AtomicBool,
    status: AtomicU8,
    idle: AtomicBool,
    sinks: Mutex<Vec<Box<dyn EventSink>>>,
}

impl Control {
    pub(crate) fn new(inputs: impl IntoIterator<Item = i64>) -> Arc<Self> {
        Arc::new(Self {
            queue: InputQueue::with_values(inputs),
            gate: ResumeGate::new(),
            halt_requested: AtomicBool::new(false),
            status: AtomicU8::new(Status::Ready as u8),
            idle: AtomicBool::new(false),
            sinks: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn status(&self) -> Status {
        Status::from_u8(self.status.load(Ordering::Acquire))
    }

    pub(crate) fn set_status(&self, status: Status) {
        self.status.store(status as u8, Ordering::Release);
    }

    pub(crate) fn halt_requested(&self) -> bool {
        self.halt_requested.load(Ordering::Acquire)
    }

    pub(crate) fn request_halt(&self) {
        self.halt_requested.store(true, Ordering::Release);
        self.queue.interrupt();
        self.gate.interrupt();
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.idle.load(Ordering::Acquire)
    }

    /// 更新空闲标记，返回是否发生了变化
    pub(crate) fn set_idle(&self, idle: bool) -> bool {
        self.idle.swap(idle, Ordering::AcqRel) != idle
    }

    pub(crate) fn add_sink(&self, sink: Box<dyn EventSink>) {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    /// 分发事件，顺带移除已失效的接收器
    pub(crate) fn emit(&self, event: &MachineEvent) {
        let mut sinks = self.sinks.lock().unwrap_or_else(PoisonError::into_inner);
        sinks.retain(|sink| sink.on_event(event));
    }

    #[cfg(test)]
    pub(crate) fn sink_count(&self) -> usize {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// 机器控制器
///
/// 可克隆、可跨线程共享；机器在其他线程运行时，宿主通过它输入数据、
/// 恢复、停机和订阅事件。
#[derive(Clone)]
pub struct MachineController {
    control: Arc<Control>,
}

impl MachineController {
    pub(crate) fn new(control: Arc<Control>) -> Self {
        Self { control }
    }

    /// 追加一个输入值
    pub fn input(&self, value: i64) {
        self.control.queue.push(value);
    }

    /// 按顺序追加多个输入值
    pub fn input_all(&self, values: impl IntoIterator<Item = i64>) {
        self.control.queue.extend(values);
    }

    /// 以 ASCII 追加一行文本（末尾补换行）
    pub fn input_line(&self, text: &str) {
        self.control.queue.extend(ascii::encode_line(text));
    }

    /// 允许输出后暂停的机器继续执行
    pub fn resume(&self) {
        self.control.gate.open();
    }

    /// 请求停机：在下一个指令边界生效，并打断输入/恢复等待
    pub fn halt(&self) {
        self.control.request_halt();
    }

    /// 订阅事件，返回通道接收端
    pub fn subscribe(&self) -> mpsc::Receiver<MachineEvent> {
        let (tx, rx) = mpsc::channel();
        self.control.add_sink(Box::new(tx));
        rx
    }

    /// 注册事件接收器
    pub fn add_sink<S: EventSink + 'static>(&self, sink: S) {
        self.control.add_sink(Box::new(sink));
    }

    pub fn status(&self) -> Status {
        self.control.status()
    }

    pub fn is_idle(&self) -> bool {
        self.control.is_idle()
    }

    pub fn is_halt_requested(&self) -> bool {
        self.control.halt_requested()
    }

    /// 排队中尚未被消耗的输入个数
    pub fn pending_inputs(&self) -> usize {
        self.control.queue.len()
    }
}

impl fmt::Debug for MachineController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineController")
            .field("status", &self.status())
            .field("idle", &self.is_idle())
            .field("pending_inputs", &self.pending_inputs())
            .finish()
    }
}
