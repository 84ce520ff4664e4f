//! 机器事件与事件接收器

use crate::error::MachineError;
use std::sync::mpsc;

/// 停机原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// 执行到 99
    Completed,
    /// 宿主请求停机
    Requested,
    /// 致命故障
    Fault(MachineError),
}

impl HaltReason {
    pub fn is_fault(&self) -> bool {
        matches!(self, HaltReason::Fault(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HaltReason::Completed => "completed",
            HaltReason::Requested => "requested",
            HaltReason::Fault(_) => "fault",
        }
    }
}

/// 停机报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaltReport {
    /// 机器标签
    pub label: Option<String>,
    /// 停机原因
    pub reason: HaltReason,
    /// 最后一次被消耗的输入或产生的输出（入队时不计，执行输入指令时才记录）
    pub last_value: Option<i64>,
    /// 停机时的指令指针
    pub pointer: usize,
    /// 输出个数
    pub outputs: usize,
}

/// 机器事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineEvent {
    /// 输出了一个值
    Output(i64),
    /// 队列为空，正在等待输入
    WaitingForInput,
    /// 空闲状态发生变化；`consumed` 是到目前为止消耗的非默认输入个数
    Idle { idle: bool, consumed: u64 },
    /// 输出后暂停
    Paused,
    /// 从暂停中恢复
    Resumed,
    /// 已停机
    Halted(HaltReport),
}

/// 事件接收器
///
/// 在机器线程上同步调用，实现不应阻塞，也不应回调同一台机器的 `add_sink`。
/// 返回 `false` 表示接收器已失效，机器随即将其移除。
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &MachineEvent) -> bool;
}

impl EventSink for mpsc::Sender<MachineEvent> {
    fn on_event(&self, event: &MachineEvent) -> bool {
        // 接收端已关闭
        self.send(event.clone()).is_ok()
    }
}

/// 给事件打上机器编号后转发到共享通道
#[derive(Debug, Clone)]
pub struct RoutedSink {
    index: usize,
    sender: mpsc::Sender<(usize, MachineEvent)>,
}

impl RoutedSink {
    pub fn new(index: usize, sender: mpsc::Sender<(usize, MachineEvent)>) -> Self {
        Self { index, sender }
    }
}

impl EventSink for RoutedSink {
    fn on_event(&self, event: &MachineEvent) -> bool {
        self.sender.send((self.index, event.clone())).is_ok()
    }
}
