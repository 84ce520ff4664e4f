//! 输入提供者
//!
//! 当输入队列为空时，机器会先询问注入的 [`InputProvider`]，
//! 再退回到默认输入，最后才挂起等待。

use crate::ascii;
use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// 机器向提供者请求输入时的上下文
#[derive(Debug, Clone, Copy)]
pub struct InputRequest<'a> {
    /// 机器标签
    pub label: Option<&'a str>,
    /// 当前输入指令的地址
    pub pointer: usize,
    /// 到目前为止的全部输出
    pub outputs: &'a [i64],
}

/// 输入提供者
///
/// 返回 `None` 表示暂时没有数据，机器会继续走默认输入或挂起。
pub trait InputProvider: Send {
    fn provide(&mut self, request: &InputRequest<'_>) -> Option<i64>;
}

/// 固定闭包签名，便于类型推断
///
/// ```
/// use intcode_core::io::{from_fn, InputRequest};
///
/// let echo_last = from_fn(|req: &InputRequest<'_>| req.outputs.last().copied());
/// # let _ = echo_last;
/// ```
pub fn from_fn<F>(f: F) -> F
where
    F: FnMut(&InputRequest<'_>) -> Option<i64> + Send,
{
    f
}

impl<F> InputProvider for F
where
    F: FnMut(&InputRequest<'_>) -> Option<i64> + Send,
{
    fn provide(&mut self, request: &InputRequest<'_>) -> Option<i64> {
        self(request)
    }
}

/// 固定序列输入
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    values: VecDeque<i64>,
}

impl ScriptedInput {
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// 以 ASCII 文本构造（每行末尾补换行）
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(lines.into_iter().flat_map(ascii::encode_line))
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl InputProvider for ScriptedInput {
    fn provide(&mut self, _request: &InputRequest<'_>) -> Option<i64> {
        self.values.pop_front()
    }
}

/// 行输入的解释方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    /// 每行一个整数，读取前输出提示符
    Integer,
    /// 每行作为 ASCII 文本逐字符输入（含换行），不输出提示符
    Ascii,
}

/// 基于任意 `BufRead` 的交互式行输入
///
/// 读到 EOF 或 IO 错误时返回 `None`。
pub struct LineInput<R, W> {
    reader: R,
    writer: W,
    mode: LineMode,
    prompt: String,
    pending: VecDeque<i64>,
}

impl<R: BufRead, W: Write> LineInput<R, W> {
    /// 整数模式，提示符为 "Enter value: "
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            mode: LineMode::Integer,
            prompt: String::from("Enter value: "),
            pending: VecDeque::new(),
        }
    }

    /// ASCII 模式
    pub fn ascii(reader: R, writer: W) -> Self {
        Self {
            mode: LineMode::Ascii,
            ..Self::new(reader, writer)
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn mode(&self) -> LineMode {
        self.mode
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }

    fn read_integer(&mut self) -> Option<i64> {
        loop {
            let _ = write!(self.writer, "{}", self.prompt);
            let _ = self.writer.flush();

            let line = self.read_line()?;
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            match text.parse::<i64>() {
                Ok(value) => return Some(value),
                Err(_) => {
                    let _ = writeln!(self.writer, "Invalid integer: {text}");
                }
            }
        }
    }
}

impl<R, W> InputProvider for LineInput<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn provide(&mut self, _request: &InputRequest<'_>) -> Option<i64> {
        match self.mode {
            LineMode::Integer => self.read_integer(),
            LineMode::Ascii => {
                if self.pending.is_empty() {
                    let line = self.read_line()?;
                    let text = line.trim_end_matches(&['\r', '\n'][..]);
                    self.pending.extend(ascii::encode_line(text));
                }
                self.pending.pop_front()
            }
        }
    }
}
