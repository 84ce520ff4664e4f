use super::WaitError;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// 恢复闸门
///
/// 持有一个二元许可：`open` 放入许可（重复放入不会累加），
/// `wait` 阻塞直到拿到许可或被打断。
#[derive(Debug, Default)]
pub struct ResumeGate {
    state: Mutex<GateState>,
    signal: Condvar,
}

#[derive(Debug, Default)]
struct GateState {
    permit: bool,
    interrupted: bool,
}

impl ResumeGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 放入许可
    pub fn open(&self) {
        self.lock().permit = true;
        self.signal.notify_all();
    }

    /// 等待并消耗许可
    pub fn wait(&self) -> Result<(), WaitError> {
        let mut state = self.lock();
        loop {
            if state.interrupted {
                return Err(WaitError::Interrupted);
            }
            if state.permit {
                state.permit = false;
                return Ok(());
            }
            state = self
                .signal
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// 丢弃尚未消耗的许可
    pub fn clear(&self) {
        self.lock().permit = false;
    }

    pub fn has_permit(&self) -> bool {
        self.lock().permit
    }

    /// 打断所有等待者（不可撤销）
    pub fn interrupt(&self) {
        self.lock().interrupted = true;
        self.signal.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_permit_before_wait() {
        let gate = ResumeGate::new();
        gate.open();
        gate.open();
        assert!(gate.has_permit());
        assert_eq!(gate.wait(), Ok(()));
        // 许可是二元的，两次 open 只换来一次通过
        assert!(!gate.has_permit());
    }

    #[test]
    fn test_wait_then_open() {
        let gate = Arc::new(ResumeGate::new());
        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.wait())
        };

        thread::sleep(Duration::from_millis(20));
        gate.open();
        assert_eq!(waiter.join().unwrap(), Ok(()));
    }

    #[test]
    fn test_interrupt() {
        let gate = Arc::new(ResumeGate::new());
        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.wait())
        };

        thread::sleep(Duration::from_millis(20));
        gate.interrupt();
        assert_eq!(waiter.join().unwrap(), Err(WaitError::Interrupted));
    }

    #[test]
    fn test_clear() {
        let gate = ResumeGate::new();
        gate.open();
        gate.clear();
        assert!(!gate.has_permit());
    }
}
