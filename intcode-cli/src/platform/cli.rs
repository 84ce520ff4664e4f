//! CLI 格式化输出
//!
//! 提供命令行友好的错误显示、纸带上下文和故障附近的内存窗口。

use intcode_api::IntcodeError;
use intcode_core::{Instruction, Memory, Program};
use intcode_log::LogRingBuffer;

/// 故障地址前后显示的单元数
const WINDOW_RADIUS: usize = 4;

/// 打印错误并显示纸带上下文
pub fn print_error_with_source(e: &IntcodeError, source: &str) {
    eprintln!("❌ {}", e.to_report());

    if let Some(column) = e.column() {
        print_source_context(source, column);
    } else if let Some(pointer) = e.pointer() {
        if let Ok(program) = source.parse::<Program>() {
            eprint!("{}", render_tape_window(&program, pointer, WINDOW_RADIUS));
        }
    }
}

/// 打印源文本中指定列附近的片段（列号 1-based，按字节计）
pub fn print_source_context(source: &str, column: usize) {
    const CONTEXT_CHARS: usize = 24; // 标记前后显示的字节数

    let offset = column.saturating_sub(1);
    if offset > source.len() {
        return;
    }

    // 定位所在行
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[offset..]
        .find('\n')
        .map_or(source.len(), |i| offset + i);
    let line_number = source[..line_start].matches('\n').count() + 1;

    let mut start = offset.saturating_sub(CONTEXT_CHARS).max(line_start);
    while !source.is_char_boundary(start) {
        start += 1;
    }
    let mut end = (offset + CONTEXT_CHARS).min(line_end);
    while !source.is_char_boundary(end) {
        end -= 1;
    }

    let prefix = if start > line_start { "..." } else { "" };
    let suffix = if end < line_end { "..." } else { "" };
    let line_label = line_number.to_string();
    let marker_offset = prefix.len() + source[start..offset.max(start)].chars().count();

    eprintln!("{}|--", "-".repeat(line_label.len() + 1));
    eprintln!("{} | {}{}{}", line_label, prefix, &source[start..end], suffix);
    eprintln!("{} | {}^", " ".repeat(line_label.len()), " ".repeat(marker_offset));
    eprintln!("{}|--", "-".repeat(line_label.len() + 1));
}

/// 渲染原始纸带在 `pointer` 附近的单元，并解码该处的指令
///
/// 超出纸带末尾的地址不显示。
pub fn render_tape_window(program: &Program, pointer: usize, radius: usize) -> String {
    let memory = Memory::new(program.cells().to_vec());
    let (start, values) = memory.window(pointer, radius);
    let width = (start + values.len()).to_string().len();

    let mut out = String::new();
    out.push_str(&format!("tape around @{}:\n", pointer));
    for (address, value) in (start..).zip(values) {
        if address >= memory.len() {
            break;
        }
        let marker = if address == pointer { ">" } else { " " };
        out.push_str(&format!("{} {:>width$} | {}\n", marker, address, value, width = width));
    }

    match Instruction::decode(memory.read(pointer), pointer) {
        Ok(instruction) => out.push_str(&format!("decodes as {}\n", instruction.opcode)),
        Err(e) => out.push_str(&format!("does not decode: {}\n", e)),
    }
    out
}

/// 故障时打印最近的日志
pub fn print_log_dump(ring: &LogRingBuffer, count: usize) {
    let records = ring.tail(count);
    if records.is_empty() {
        return;
    }
    eprintln!("[recent log]");
    for record in records {
        eprintln!("  {}", record.format());
    }
}
