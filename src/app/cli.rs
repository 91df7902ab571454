// ==========================================
// 组合导入引擎 - 命令行定义
// ==========================================
// 子命令: import / import-part / import-images / import-translations
// 全局参数: --database, --export-dir（均可由环境变量提供）
// ==========================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "combination-import")]
#[command(about = "Imports mod combination exports into the relational store")]
#[command(version)]
pub struct Cli {
    /// SQLite 数据库文件
    #[arg(long, global = true, env = "COMBINATION_IMPORT_DB")]
    pub database: Option<PathBuf>,

    /// 导出注册表根目录
    #[arg(long, global = true, env = "COMBINATION_IMPORT_EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 分块导入整个组合
    Import { combination: Uuid },

    /// 导入单个分块（由 import 以子进程方式调用）
    ImportPart {
        /// 分部名称；未知分部在打开数据库前即被拒绝
        part: String,
        offset: usize,
        limit: usize,
        #[arg(long)]
        combination: Uuid,
    },

    /// 导入组合的图标
    ImportImages { combination: Uuid },

    /// 不分块地导入全部翻译
    ImportTranslations { combination: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_part() {
        let id = Uuid::nil().to_string();
        let cli = Cli::try_parse_from([
            "combination-import",
            "--database",
            "x.db",
            "import-part",
            "recipe",
            "256",
            "256",
            "--combination",
            id.as_str(),
        ])
        .unwrap();

        assert_eq!(cli.database, Some(PathBuf::from("x.db")));
        match cli.command {
            Command::ImportPart {
                part,
                offset,
                limit,
                combination,
            } => {
                assert_eq!(part, "recipe");
                assert_eq!((offset, limit), (256, 256));
                assert_eq!(combination, Uuid::nil());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_malformed_combination_id() {
        assert!(Cli::try_parse_from(["combination-import", "import", "not-a-uuid"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
