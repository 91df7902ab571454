// ==========================================
// 组合导入引擎 - 失败信息渲染与提取
// ==========================================
// 子进程把错误写进反显红色区域；父进程在非零退出时提取该区域
// 开: ESC[7;31m    关: ESC[27;39m
// ==========================================

use std::process::ExitCode;

/// 错误区域开始（反显 + 红色前景）
pub const ERROR_OPEN: &str = "\x1b[7;31m";

/// 错误区域结束（取消反显 + 默认前景）
pub const ERROR_CLOSE: &str = "\x1b[27;39m";

/// 渲染错误块（前后各留一个空行）
pub fn render_error_block(message: &str) -> String {
    format!("{}\n\n{}\n\n{}", ERROR_OPEN, message.trim(), ERROR_CLOSE)
}

/// 从合并输出中提取错误消息
///
/// 取开/关分隔符之间的行，逐行 trim，去掉首尾空行后以换行连接；
/// 任一分隔符缺失时返回空串
pub fn extract_message(output: &str) -> String {
    let Some(open) = output.find(ERROR_OPEN) else {
        return String::new();
    };
    let body_start = open + ERROR_OPEN.len();
    let Some(close) = output[body_start..].find(ERROR_CLOSE) else {
        return String::new();
    };

    let lines: Vec<&str> = output[body_start..body_start + close]
        .lines()
        .map(str::trim)
        .collect();

    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].join("\n"),
        _ => String::new(),
    }
}

// ==========================================
// 命令退出码
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandExit {
    Success = 0,
    Failure = 1,
}

impl From<CommandExit> for ExitCode {
    fn from(exit: CommandExit) -> Self {
        ExitCode::from(exit as u8)
    }
}
