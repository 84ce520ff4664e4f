//! 纸带（程序）文本格式
//!
//! 逗号分隔的有符号十进制整数，容忍空白以及结尾的换行/逗号。

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 纸带解析错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TapeError {
    /// 纸带不含任何单元
    #[error("tape is empty")]
    Empty,

    /// 某个单元不是合法整数
    #[error("invalid cell #{index} at column {column}: {text:?}")]
    InvalidCell {
        /// 单元序号（从 0 开始）
        index: usize,
        /// 单元起始字节列（从 1 开始）
        column: usize,
        /// 原始文本
        text: String,
    },
}

/// 一段 Intcode 程序
///
/// 每台机器持有自己的拷贝，`Program` 本身不会被执行修改。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    cells: Vec<i64>,
}

impl Program {
    pub fn new(cells: Vec<i64>) -> Self {
        Self { cells }
    }

    /// 所有单元
    pub fn cells(&self) -> &[i64] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn into_cells(self) -> Vec<i64> {
        self.cells
    }

    /// 返回修改了若干单元的副本（常用于在运行前打补丁，例如 `cells[0] = 2`）
    pub fn patched(&self, patches: &[(usize, i64)]) -> Self {
        let mut cells = self.cells.clone();
        for &(address, value) in patches {
            if address >= cells.len() {
                cells.resize(address + 1, 0);
            }
            cells[address] = value;
        }
        Self { cells }
    }
}

impl From<Vec<i64>> for Program {
    fn from(cells: Vec<i64>) -> Self {
        Self::new(cells)
    }
}

impl From<&[i64]> for Program {
    fn from(cells: &[i64]) -> Self {
        Self::new(cells.to_vec())
    }
}

impl FromStr for Program {
    type Err = TapeError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let pieces: Vec<(usize, &str)> = {
            let mut offset = 0;
            source
                .split(',')
                .map(|piece| {
                    let start = offset;
                    offset += piece.len() + 1;
                    (start, piece)
                })
                .collect()
        };

        let mut cells = Vec::with_capacity(pieces.len());
        let last = pieces.len().saturating_sub(1);
        for (index, (start, piece)) in pieces.into_iter().enumerate() {
            let text = piece.trim();
            if text.is_empty() && index == last {
                // 结尾逗号或换行
                break;
            }
            let leading = piece.len() - piece.trim_start().len();
            let value = text.parse::<i64>().map_err(|_| TapeError::InvalidCell {
                index,
                column: start + leading + 1,
                text: text.to_string(),
            })?;
            cells.push(value);
        }

        if cells.is_empty() {
            return Err(TapeError::Empty);
        }
        Ok(Self { cells })
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{cell}")?;
        }
        Ok(())
    }
}
