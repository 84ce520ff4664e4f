//! 零扩展内存

/// 机器内存
///
/// 逻辑上无界：越界读返回 0（不增长），越界写把缓冲区零扩展到该地址。
/// 增长从不丢弃已写入的值。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memory {
    cells: Vec<i64>,
}

impl Memory {
    pub fn new(cells: Vec<i64>) -> Self {
        Self { cells }
    }

    /// 读取单元，越界返回 0
    #[inline]
    pub fn read(&self, address: usize) -> i64 {
        self.cells.get(address).copied().unwrap_or(0)
    }

    /// 写入单元，必要时零扩展
    #[inline]
    pub fn write(&mut self, address: usize, value: i64) {
        if address >= self.cells.len() {
            self.cells.resize(address + 1, 0);
        }
        self.cells[address] = value;
    }

    /// 当前已分配的单元数
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.cells
    }

    /// 以 `center` 为中心截取一段（用于错误报告）
    pub fn window(&self, center: usize, radius: usize) -> (usize, Vec<i64>) {
        let start = center.saturating_sub(radius);
        let end = center.saturating_add(radius).saturating_add(1);
        let values = (start..end).map(|address| self.read(address)).collect();
        (start, values)
    }

    pub fn into_vec(self) -> Vec<i64> {
        self.cells
    }
}

impl From<Vec<i64>> for Memory {
    fn from(cells: Vec<i64>) -> Self {
        Self::new(cells)
    }
}
