// ==========================================
// 组合导入引擎 - 命令行主入口
// ==========================================
// 成功: 打印 "Done." 并以 0 退出
// 失败: 打印错误区域（父进程据此提取消息）并以 1 退出
// ==========================================

use anyhow::Context;
use clap::Parser;
use combination_import::app::commands::{self, failure_message};
use combination_import::app::{AppContext, AppPaths, Cli, Command, ConsoleProgress};
use combination_import::engine::{render_error_block, CommandExit, ProcessDispatcher};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 初始化日志系统
    combination_import::logging::init();

    let is_child = matches!(cli.command, Command::ImportPart { .. });
    if !is_child {
        println!("{} v{}", combination_import::APP_NAME, combination_import::VERSION);
    }

    match run(cli).await {
        Ok(()) => {
            if !is_child {
                println!("Done.");
            }
            CommandExit::Success.into()
        }
        Err(err) => {
            tracing::error!(error = %format!("{:#}", err), "命令失败");
            println!("{}", render_error_block(&failure_message(&err)));
            CommandExit::Failure.into()
        }
    }
}

fn open_context(paths: AppPaths) -> anyhow::Result<AppContext> {
    let db_path = paths.db_path.display().to_string();
    AppContext::open(paths).with_context(|| format!("打开数据库失败 {}", db_path))
}

// 分块错误不附加上下文，父进程需要原样提取消息
async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = AppPaths::resolve(cli.database, cli.export_dir);

    match cli.command {
        Command::Import { combination } => {
            let ctx = open_context(paths.clone())?;
            let dispatcher = Arc::new(
                ProcessDispatcher::current_exe(paths.child_args())
                    .context("无法准备 import-part 子进程")?,
            );
            let summary =
                commands::import(&ctx, combination, dispatcher, Arc::new(ConsoleProgress)).await?;
            println!(
                "{} batches imported, {} orphaned rows removed",
                summary.chunks_dispatched, summary.orphans_removed
            );
        }
        Command::ImportPart {
            part,
            offset,
            limit,
            combination,
        } => {
            let report = commands::import_part(paths, &part, offset, limit, combination)?;
            println!("{} created, {} updated", report.created, report.updated);
        }
        Command::ImportImages { combination } => {
            let ctx = open_context(paths)?;
            let report = commands::import_images(&ctx, combination)
                .with_context(|| format!("import-images {}", combination))?;
            println!(
                "{} icons, {} new images, {} unused images removed",
                report.icons, report.images_created, report.images_removed
            );
        }
        Command::ImportTranslations { combination } => {
            let ctx = open_context(paths)?;
            let report = commands::import_translations(&ctx, combination)
                .with_context(|| format!("import-translations {}", combination))?;
            println!("{} created, {} updated", report.created, report.updated);
        }
    }
    Ok(())
}
