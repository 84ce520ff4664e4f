//! ASCII 辅助函数
//!
//! 文本冒险、弹跳机器人一类的程序以 ASCII 码进行输入输出，
//! 最终答案通常是一个超出 ASCII 范围的大整数。

/// 解码结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    /// 所有 ASCII 值拼成的文本
    pub text: String,
    /// 不在 ASCII 范围内的值（按出现顺序）
    pub non_ascii: Vec<i64>,
}

impl Decoded {
    /// 最后一个非 ASCII 值，通常是程序给出的答案
    pub fn answer(&self) -> Option<i64> {
        self.non_ascii.last().copied()
    }
}

/// 把文本编码为字符码
pub fn encode(text: &str) -> Vec<i64> {
    text.chars().map(|c| c as i64).collect()
}

/// 编码一行文本，末尾补换行（已有换行时不重复添加）
pub fn encode_line(text: &str) -> Vec<i64> {
    let mut values = encode(text);
    if !text.ends_with('\n') {
        values.push(i64::from(b'\n'));
    }
    values
}

/// 把输出拆分为文本和非 ASCII 值
pub fn decode(values: &[i64]) -> Decoded {
    let mut decoded = Decoded::default();
    for &value in values {
        match u8::try_from(value) {
            Ok(byte) if byte.is_ascii() => decoded.text.push(char::from(byte)),
            _ => decoded.non_ascii.push(value),
        }
    }
    decoded
}
