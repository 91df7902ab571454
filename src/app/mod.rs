// ==========================================
// 组合导入引擎 - 应用层
// ==========================================
// 职责: 命令行解析、上下文组装、命令实现、控制台输出
// ==========================================

pub mod cli;
pub mod commands;
pub mod console;
pub mod state;

// 重导出
pub use cli::{Cli, Command};
pub use console::ConsoleProgress;
pub use state::{get_default_db_path, get_default_export_dir, AppContext, AppPaths};
