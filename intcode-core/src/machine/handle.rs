//! 线程句柄

use super::{Machine, MachineController};
use crate::error::MachineError;
use std::any::Any;
use std::thread::{self, JoinHandle};

/// 在独立线程上运行的机器
#[derive(Debug)]
pub struct MachineHandle {
    controller: MachineController,
    thread: JoinHandle<Machine>,
}

pub(super) fn spawn(mut machine: Machine) -> Result<MachineHandle, MachineError> {
    let controller = machine.controller();
    let name = format!("intcode-{}", machine.label());
    let thread = thread::Builder::new()
        .name(name)
        .spawn(move || {
            // 结果保存在机器自身的停机原因里
            let _ = machine.run();
            machine
        })
        .map_err(|e| MachineError::Spawn(e.to_string()))?;

    Ok(MachineHandle { controller, thread })
}

impl MachineHandle {
    pub fn controller(&self) -> &MachineController {
        &self.controller
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// 等待线程结束，交回已停机的机器
    pub fn join(self) -> Result<Machine, MachineError> {
        self.thread
            .join()
            .map_err(|payload| MachineError::Panicked(panic_message(payload.as_ref())))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unknown panic")
    }
}
