//! 多实例网络协调器
//!
//! N 台机器运行同一段程序，每台在自己的线程上。每台机器先收到自己的地址，
//! 队列为空时读到默认输入（通常是 -1），因此永远不会阻塞。
//! 所有机器的事件汇入同一个通道，由协调器按 3 个输出一组拼成数据包并路由。

use crate::error::MachineError;
use crate::machine::{HaltReason, Machine, MachineEvent, MachineHandle, RoutedSink};
use crate::tape::Program;
use intcode_config::{MachineConfig, NetworkConfig, NetworkMode};
use intcode_log::{debug, info, warn, Logger};
use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;
use thiserror::Error;

/// 网络错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// 某台机器发生致命故障（其余机器已被停机）
    #[error("machine {index} faulted: {source}")]
    MachineFault { index: usize, source: MachineError },

    /// 数据包目标地址不存在
    #[error("machine {from} sent a packet to unknown address {destination}")]
    UnknownDestination { from: usize, destination: i64 },

    /// 网络静止且没有可投递的数据
    #[error("network stalled with nothing to deliver")]
    Stalled,

    /// 启动或回收机器线程失败
    #[error(transparent)]
    Machine(#[from] MachineError),
}

/// 数据包
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    pub destination: i64,
    pub x: i64,
    pub y: i64,
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- ({}, {})", self.destination, self.x, self.y)
    }
}

/// 网络运行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkOutcome {
    /// 决定结束的那个数据包
    pub packet: Packet,
    /// 路由过的数据包总数（包括发给宿主的）
    pub packets_routed: usize,
    /// NAT 向 0 号机器投递的次数
    pub nat_deliveries: usize,
}

/// 网络
pub struct Network {
    program: Program,
    config: NetworkConfig,
    logger: Arc<Logger>,
}

/// 协调器视角下单台机器的状态
#[derive(Debug, Default)]
struct Node {
    /// 尚未凑满 3 个的输出
    partial: Vec<i64>,
    /// 最近一次空闲报告中的 consumed（非空闲时为 None）
    idle_at: Option<u64>,
    /// 已投递给该机器的值个数（含地址）
    delivered: u64,
    halted: bool,
}

impl Node {
    /// 空闲报告覆盖了所有投递过的值，且没有半个包
    fn is_quiescent(&self) -> bool {
        self.halted || (self.partial.is_empty() && self.idle_at == Some(self.delivered))
    }
}

impl Network {
    pub fn new(program: impl Into<Program>, config: NetworkConfig) -> Self {
        Self {
            program: program.into(),
            config,
            logger: Logger::noop(),
        }
    }

    /// 设置 logger（所有机器共享）
    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    fn machine_config(&self, index: usize) -> MachineConfig {
        MachineConfig {
            pause_on_output: false,
            silent_trace: self.config.silent_trace,
            default_input: Some(self.config.default_input),
            label: Some(format!("node-{index}")),
            idle_threshold: self.config.idle_threshold,
        }
    }

    /// 启动所有机器并运行直到得出结果
    ///
    /// 无论结果如何，返回前都会停机并回收所有机器线程。
    pub fn run(&self) -> Result<NetworkOutcome, NetworkError> {
        let (tx, rx) = mpsc::channel();
        let mut handles: Vec<MachineHandle> = Vec::with_capacity(self.config.size);

        for index in 0..self.config.size {
            let address = i64::try_from(index).unwrap_or(i64::MAX);
            let machine = Machine::with_config(
                self.program.clone(),
                [address],
                self.machine_config(index),
            )
            .with_logger(Arc::clone(&self.logger))
            .with_sink(RoutedSink::new(index, tx.clone()));

            match machine.spawn() {
                Ok(handle) => handles.push(handle),
                Err(error) => {
                    warn!(self.logger, "failed to start node {}: {}", index, error);
                    shutdown(handles, &self.logger);
                    return Err(error.into());
                }
            }
        }
        drop(tx);

        debug!(
            self.logger,
            "network of {} machines started ({:?} mode)",
            self.config.size,
            self.config.mode
        );

        let result = self.coordinate(&rx, &handles);
        shutdown(handles, &self.logger);

        match &result {
            Ok(outcome) => info!(
                self.logger,
                "network finished with {} after {} packets and {} NAT deliveries",
                outcome.packet,
                outcome.packets_routed,
                outcome.nat_deliveries
            ),
            Err(error) => warn!(self.logger, "network failed: {}", error),
        }
        result
    }

    fn coordinate(
        &self,
        rx: &mpsc::Receiver<(usize, MachineEvent)>,
        handles: &[MachineHandle],
    ) -> Result<NetworkOutcome, NetworkError> {
        let mut nodes: Vec<Node> = (0..handles.len())
            .map(|_| Node {
                delivered: 1,
                ..Node::default()
            })
            .collect();
        let mut nat: Option<Packet> = None;
        let mut last_nat_y: Option<i64> = None;
        let mut packets_routed = 0;
        let mut nat_deliveries = 0;

        if handles.is_empty() {
            return Err(NetworkError::Stalled);
        }

        loop {
            // 所有机器都持有发送端，通道只会在线程全部退出后关闭
            let Ok((index, event)) = rx.recv() else {
                return Err(NetworkError::Stalled);
            };

            match event {
                MachineEvent::Output(value) => {
                    let node = &mut nodes[index];
                    node.idle_at = None;
                    node.partial.push(value);
                    if node.partial.len() < 3 {
                        continue;
                    }

                    let packet = Packet {
                        destination: node.partial[0],
                        x: node.partial[1],
                        y: node.partial[2],
                    };
                    node.partial.clear();
                    packets_routed += 1;

                    if packet.destination == self.config.host_address {
                        debug!(self.logger, "node {} -> host: {}", index, packet);
                        match self.config.mode {
                            NetworkMode::FirstPacket => {
                                return Ok(NetworkOutcome {
                                    packet,
                                    packets_routed,
                                    nat_deliveries,
                                });
                            }
                            NetworkMode::Nat => nat = Some(packet),
                        }
                    } else {
                        let target = usize::try_from(packet.destination)
                            .ok()
                            .filter(|&target| target < handles.len())
                            .ok_or(NetworkError::UnknownDestination {
                                from: index,
                                destination: packet.destination,
                            })?;
                        debug!(self.logger, "node {} -> {}", index, packet);
                        handles[target].controller().input_all([packet.x, packet.y]);
                        nodes[target].delivered += 2;
                        nodes[target].idle_at = None;
                    }
                }
                MachineEvent::Idle { idle, consumed } => {
                    nodes[index].idle_at = idle.then_some(consumed);
                }
                MachineEvent::Halted(report) => {
                    if let HaltReason::Fault(source) = report.reason {
                        return Err(NetworkError::MachineFault { index, source });
                    }
                    nodes[index].halted = true;
                    if nodes.iter().all(|node| node.halted) {
                        return Err(NetworkError::Stalled);
                    }
                }
                MachineEvent::WaitingForInput | MachineEvent::Paused | MachineEvent::Resumed => {}
            }

            // 默认输入下的空闲只是推测；FirstPacket 模式只等发往宿主的包，
            // 仅在全部机器停机时才判定为停滞
            if self.config.mode != NetworkMode::Nat || !nodes.iter().all(Node::is_quiescent) {
                continue;
            }

            let Some(packet) = nat else {
                return Err(NetworkError::Stalled);
            };
            if nodes[0].halted {
                return Err(NetworkError::Stalled);
            }
            if last_nat_y == Some(packet.y) {
                return Ok(NetworkOutcome {
                    packet,
                    packets_routed,
                    nat_deliveries,
                });
            }

            debug!(self.logger, "network idle, NAT delivers {} to node 0", packet);
            handles[0].controller().input_all([packet.x, packet.y]);
            nodes[0].delivered += 2;
            nodes[0].idle_at = None;
            nat_deliveries += 1;
            last_nat_y = Some(packet.y);
        }
    }
}

/// 停机并回收所有机器线程
fn shutdown(handles: Vec<MachineHandle>, logger: &Arc<Logger>) {
    for handle in &handles {
        handle.controller().halt();
    }
    for handle in handles {
        if let Err(error) = handle.join() {
            warn!(logger, "{}", error);
        }
    }
}
