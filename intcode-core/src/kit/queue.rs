use super::WaitError;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// 线程安全的输入队列，适用于宿主写、机器读的生产者-消费者模型
///
/// 宿主可以在任何时候追加数据，包括机器在其他线程上运行或挂起时。
/// 被打断后 `wait_available` 立即返回错误，队列本身仍可读写。
#[derive(Debug, Default)]
pub struct InputQueue {
    inner: Mutex<Inner>,
    available: Condvar,
}

/// 队列的内部数据结构，受Mutex保护
#[derive(Debug, Default)]
struct Inner {
    values: VecDeque<i64>,
    interrupted: bool,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预先装入一批数据
    pub fn with_values(values: impl IntoIterator<Item = i64>) -> Self {
        let queue = Self::new();
        queue.extend(values);
        queue
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 追加一个值并唤醒等待者
    pub fn push(&self, value: i64) {
        self.lock().values.push_back(value);
        self.available.notify_all();
    }

    /// 按顺序追加多个值
    pub fn extend(&self, values: impl IntoIterator<Item = i64>) {
        self.lock().values.extend(values);
        self.available.notify_all();
    }

    /// 尝试取出队首（非阻塞）
    pub fn try_pop(&self) -> Option<i64> {
        self.lock().values.pop_front()
    }

    /// 阻塞直到队列非空或被打断
    pub fn wait_available(&self) -> Result<(), WaitError> {
        let mut inner = self.lock();
        loop {
            if inner.interrupted {
                return Err(WaitError::Interrupted);
            }
            if !inner.values.is_empty() {
                return Ok(());
            }
            inner = self
                .available
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// 打断所有等待者（不可撤销）
    pub fn interrupt(&self) {
        self.lock().interrupted = true;
        self.available.notify_all();
    }

    pub fn is_interrupted(&self) -> bool {
        self.lock().interrupted
    }

    /// 当前排队的值个数
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = InputQueue::with_values([1, 2]);
        queue.push(3);
        queue.extend([4, 5]);

        let drained: Vec<i64> = std::iter::from_fn(|| queue.try_pop()).collect();
        assert_eq!(drained, vec![1, 2, 3, 4, 5]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_wait_returns_when_value_arrives() {
        let queue = Arc::new(InputQueue::new());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                queue.push(7);
            })
        };

        assert_eq!(queue.wait_available(), Ok(()));
        assert_eq!(queue.try_pop(), Some(7));
        producer.join().unwrap();
    }

    #[test]
    fn test_interrupt_wakes_waiter() {
        let queue = Arc::new(InputQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.wait_available())
        };

        thread::sleep(Duration::from_millis(20));
        queue.interrupt();
        assert_eq!(waiter.join().unwrap(), Err(WaitError::Interrupted));
        assert!(queue.is_interrupted());
    }

    #[test]
    fn test_interrupt_wins_over_pending_values() {
        let queue = InputQueue::with_values([1]);
        queue.interrupt();
        assert_eq!(queue.wait_available(), Err(WaitError::Interrupted));
        // 数据仍然保留
        assert_eq!(queue.len(), 1);
    }
}
