//! 测试辅助工具
//!
//! 提供端到端测试的辅助函数

#![allow(dead_code)]

use intcode_core::{Machine, MachineEvent, Program};
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// 带反馈回路的放大器程序（phase 5..=9）
pub const FEEDBACK_AMPLIFIER: &str =
    "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5";

/// 解析纸带文本
pub fn parse(source: &str) -> Program {
    source.parse().expect("test tape should parse")
}

/// 用给定输入运行程序，返回全部输出
///
/// # Example
/// ```
/// let outputs = run_program("3,0,4,0,99", &[7]);
/// assert_eq!(outputs, vec![7]);
/// ```
pub fn run_program(source: &str, inputs: &[i64]) -> Vec<i64> {
    let mut machine = Machine::new(parse(source), inputs.iter().copied());
    machine.run().expect("program should run to completion")
}

/// 运行程序，返回停机后的内存
pub fn final_memory(cells: &[i64]) -> Vec<i64> {
    let mut machine = Machine::new(cells, []);
    machine.run().expect("program should run to completion");
    machine.memory().as_slice().to_vec()
}

/// 等待满足条件的事件（最多 5 秒）
pub fn wait_for(
    events: &Receiver<MachineEvent>,
    predicate: impl Fn(&MachineEvent) -> bool,
) -> MachineEvent {
    loop {
        let event = events
            .recv_timeout(Duration::from_secs(5))
            .expect("expected event did not arrive");
        if predicate(&event) {
            return event;
        }
    }
}

/// 网络中继程序：0 号机器启动时给 1 号发 (5, 9)；
/// 之后每台机器把收到的 (x, y) 转发给宿主地址 255
pub const RELAY: &str = "3,200,1005,200,11,104,1,104,5,104,9,3,201,1008,201,-1,202,\
                         1005,202,11,3,203,104,255,4,201,4,203,1105,1,11,99";
