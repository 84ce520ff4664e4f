//! API 类型定义
//!
//! 执行和网络运行的输出类型，均可序列化为 JSON。

use intcode_core::{HaltReason, HaltReport, NetworkOutcome, Packet};
use serde::Serialize;

/// 停机摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HaltSummary {
    /// 机器标签
    pub label: Option<String>,
    /// 停机原因: completed, requested, fault
    pub reason: &'static str,
    /// 故障消息（仅 fault）
    pub fault: Option<String>,
    /// 最后一次输入或输出的值
    pub last_value: Option<i64>,
    /// 停机时的指令指针
    pub pointer: usize,
}

impl From<&HaltReport> for HaltSummary {
    fn from(report: &HaltReport) -> Self {
        let fault = match &report.reason {
            HaltReason::Fault(error) => Some(error.to_string()),
            _ => None,
        };
        Self {
            label: report.label.clone(),
            reason: report.reason.as_str(),
            fault,
            last_value: report.last_value,
            pointer: report.pointer,
        }
    }
}

/// 执行输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecuteOutput {
    /// 全部输出值
    pub outputs: Vec<i64>,
    /// 停机摘要
    pub halt: HaltSummary,
    /// 消耗的输入个数
    pub inputs_consumed: u64,
}

impl ExecuteOutput {
    /// 最后一个输出值（大多数程序的答案）
    pub fn last_output(&self) -> Option<i64> {
        self.outputs.last().copied()
    }
}

/// ASCII 程序的执行输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AsciiOutput {
    /// 输出中的 ASCII 文本
    pub text: String,
    /// 超出 ASCII 范围的值
    pub non_ascii: Vec<i64>,
    /// 停机摘要
    pub halt: HaltSummary,
}

impl AsciiOutput {
    /// 最后一个非 ASCII 值
    pub fn answer(&self) -> Option<i64> {
        self.non_ascii.last().copied()
    }
}

/// 网络运行摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    /// 决定结束的数据包目的地址
    pub destination: i64,
    pub x: i64,
    pub y: i64,
    /// 路由过的数据包总数
    pub packets_routed: usize,
    /// NAT 投递次数
    pub nat_deliveries: usize,
}

impl NetworkSummary {
    pub fn packet(&self) -> Packet {
        Packet {
            destination: self.destination,
            x: self.x,
            y: self.y,
        }
    }
}

impl From<NetworkOutcome> for NetworkSummary {
    fn from(outcome: NetworkOutcome) -> Self {
        Self {
            destination: outcome.packet.destination,
            x: outcome.packet.x,
            y: outcome.packet.y,
            packets_routed: outcome.packets_routed,
            nat_deliveries: outcome.nat_deliveries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intcode_core::MachineError;

    #[test]
    fn test_halt_summary_from_fault() {
        let report = HaltReport {
            label: Some("amp-a".to_string()),
            reason: HaltReason::Fault(MachineError::UnknownOpcode {
                opcode: 7,
                pointer: 3,
            }),
            last_value: Some(5),
            pointer: 3,
            outputs: 0,
        };
        let summary = HaltSummary::from(&report);
        assert_eq!(summary.reason, "fault");
        assert_eq!(summary.fault.as_deref(), Some("unknown opcode 7 at 3"));
        assert_eq!(summary.label.as_deref(), Some("amp-a"));
    }

    #[test]
    fn test_network_summary_json() {
        let summary = NetworkSummary::from(NetworkOutcome {
            packet: Packet {
                destination: 255,
                x: 1,
                y: 2,
            },
            packets_routed: 4,
            nat_deliveries: 0,
        });
        assert_eq!(summary.packet().to_string(), "255 <- (1, 2)");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["y"], 2);
        assert_eq!(json["packets_routed"], 4);
    }
}
