// ==========================================
// 组合导入引擎 - 命令实现
// ==========================================
// import              : 刷新组合行 → 读取配置 → 编排器分块导入
// import-part         : 单个分块（子进程入口）
// import-images       : 逐个图标读取并写入 icon_image / icon
// import-translations : 不分块的翻译聚合导入
// ==========================================

use crate::app::state::{AppContext, AppPaths};
use crate::config::ImportSettings;
use crate::domain::{Combination, Icon, IconImage, ImportPart};
use crate::engine::{
    run_chunk, ChunkDispatcher, ImportOrchestrator, ImportSummary, SharedProgressListener,
};
use crate::export::ExportSnapshot;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::identity::digest;
use crate::importer::translation::TranslationKind;
use crate::importer::{ChunkReport, EntityReconciler, Reconciler};
use crate::perf::PerfGuard;
use crate::repository::{CombinationRepository, IconRepository, RepositoryError};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// 图标导入结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImagesReport {
    pub icons: usize,
    pub images_created: usize,
    pub images_removed: usize,
}

/// 写入或刷新组合行（保留已有的最近使用时间）
pub fn upsert_combination(ctx: &AppContext, snapshot: &ExportSnapshot) -> ImportResult<()> {
    let repo = CombinationRepository::new(Arc::clone(&ctx.conn));
    let now = Utc::now();
    let last_usage_at = repo
        .find_by_id(snapshot.combination_id())?
        .map(|existing| existing.last_usage_at)
        .unwrap_or(now);

    repo.upsert(&Combination {
        id: snapshot.combination_id(),
        mod_names: snapshot.combination().mod_names.clone(),
        imported_at: now,
        last_usage_at,
    })?;
    Ok(())
}

// ==========================================
// import
// ==========================================
pub async fn import(
    ctx: &AppContext,
    combination_id: Uuid,
    dispatcher: Arc<dyn ChunkDispatcher>,
    listener: SharedProgressListener,
) -> ImportResult<ImportSummary> {
    let _perf = PerfGuard::new("command", "import");
    let snapshot = ExportSnapshot::load(Arc::clone(&ctx.registry), combination_id)?;
    upsert_combination(ctx, &snapshot)?;

    let settings = ImportSettings::load(&ctx.config).await?;
    let orchestrator =
        ImportOrchestrator::new(Arc::clone(&ctx.conn), dispatcher, listener, settings);
    orchestrator.run(&snapshot).await
}

/// 解析分部名称（未知分部 → UnknownChunkSpec）
pub fn parse_part(name: &str) -> ImportResult<ImportPart> {
    ImportPart::parse(name).ok_or_else(|| ImportError::UnknownChunkSpec(name.to_string()))
}

// ==========================================
// import-part
// ==========================================
// 先校验分部，再打开数据库
pub fn import_part(
    paths: AppPaths,
    part: &str,
    offset: usize,
    limit: usize,
    combination_id: Uuid,
) -> ImportResult<ChunkReport> {
    let part = parse_part(part)?;
    let ctx = AppContext::open(paths)?;
    import_part_with(&ctx, part, offset, limit, combination_id)
}

pub fn import_part_with(
    ctx: &AppContext,
    part: ImportPart,
    offset: usize,
    limit: usize,
    combination_id: Uuid,
) -> ImportResult<ChunkReport> {
    let _perf = PerfGuard::new("command", format!("import-part {} {}", part, offset));
    let mut conn = ctx
        .conn
        .lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))?;
    run_chunk(
        &mut conn,
        Arc::clone(&ctx.registry),
        part,
        combination_id,
        offset,
        limit,
    )
}

// ==========================================
// import-images
// ==========================================
// 图标图像按导出内容哈希标识，已存在的不再读取渲染结果
pub fn import_images(ctx: &AppContext, combination_id: Uuid) -> ImportResult<ImagesReport> {
    let _perf = PerfGuard::new("command", "import-images");
    let snapshot = ExportSnapshot::load(Arc::clone(&ctx.registry), combination_id)?;
    let registry = snapshot.registry();

    let mut conn = ctx
        .conn
        .lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))?;
    let tx = conn.transaction()?;

    if CombinationRepository::find_by_id_tx(&tx, combination_id)?.is_none() {
        return Err(ImportError::missing("combination", combination_id.to_string()));
    }

    let mut report = ImagesReport::default();
    IconRepository::clear_icons_tx(&tx, combination_id)?;

    for hash in &snapshot.combination().icon_hashes {
        let icon = registry.get_icon(hash)?;
        let image_id = digest(&json!([hash]));

        if !IconRepository::image_exists_tx(&tx, image_id)? {
            let contents = registry.get_rendered_icon(hash)?;
            IconRepository::save_image_tx(
                &tx,
                &IconImage {
                    id: image_id,
                    size: icon.size,
                    contents,
                },
            )?;
            report.images_created += 1;
        }

        for entry in &icon.entries {
            IconRepository::save_icon_tx(
                &tx,
                &Icon {
                    combination_id,
                    icon_type: entry.entry_type.clone(),
                    name: entry.name.clone(),
                    image_id,
                },
            )?;
            report.icons += 1;
        }
        debug!(hash = %hash, entries = icon.entries.len(), "图标已写入");
    }

    report.images_removed = IconRepository::remove_orphan_images_tx(&tx)?;
    tx.commit()?;

    info!(%combination_id, ?report, "图标导入完成");
    Ok(report)
}

// ==========================================
// import-translations
// ==========================================
// 单事务处理全部翻译名称，随后清理孤儿翻译
pub fn import_translations(ctx: &AppContext, combination_id: Uuid) -> ImportResult<ChunkReport> {
    let _perf = PerfGuard::new("command", "import-translations");
    let snapshot = ExportSnapshot::load(Arc::clone(&ctx.registry), combination_id)?;
    let reconciler = Reconciler::<TranslationKind>::new();

    let mut conn = ctx
        .conn
        .lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))?;
    reconciler.prepare(&mut conn, combination_id)?;
    let report = reconciler.import_chunk(&mut conn, &snapshot, 0, usize::MAX)?;
    let removed = reconciler.cleanup(&mut conn)?;

    info!(%combination_id, created = report.created, updated = report.updated, removed, "翻译导入完成");
    Ok(report)
}

/// 失败时打印的消息：上下文在前、ImportError 明细在后（子进程未输出错误区域时给出分块位置）
pub fn failure_message(err: &anyhow::Error) -> String {
    let Some(import_err) = err.downcast_ref::<ImportError>() else {
        return format!("{:#}", err);
    };

    let detail = match import_err {
        ImportError::ChunkProcessFailure {
            part,
            offset,
            limit,
            message,
        } if message.is_empty() => format!(
            "import-part {} {} {} exited with a failure and no message",
            part, offset, limit
        ),
        other => other.to_string(),
    };

    // 未附加上下文时顶层即 ImportError 本身
    let outer = err.to_string();
    if outer == import_err.to_string() {
        detail
    } else {
        format!("{}: {}", outer, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_part_rejects_unknown() {
        assert_eq!(parse_part("recipe").unwrap(), ImportPart::Recipe);
        assert!(matches!(
            parse_part("widget"),
            Err(ImportError::UnknownChunkSpec(ref name)) if name == "widget"
        ));
    }

    #[test]
    fn test_failure_message_falls_back_to_chunk_position() {
        let err = anyhow::Error::from(ImportError::ChunkProcessFailure {
            part: "item".to_string(),
            offset: 512,
            limit: 256,
            message: String::new(),
        });
        assert!(failure_message(&err).contains("import-part item 512 256"));

        let err = anyhow::Error::from(ImportError::missing("item", "item/iron-plate"));
        assert_eq!(failure_message(&err), "缺少实体 item: item/iron-plate");
    }

    #[test]
    fn test_failure_message_keeps_context_before_cause() {
        use anyhow::Context;

        let err = Err::<(), _>(ImportError::missing("combination", "42"))
            .context("import-images 42")
            .unwrap_err();
        assert_eq!(failure_message(&err), "import-images 42: 缺少实体 combination: 42");

        let err = Err::<(), _>(ImportError::ChunkProcessFailure {
            part: "recipe".to_string(),
            offset: 0,
            limit: 256,
            message: String::new(),
        })
        .context("import 42")
        .unwrap_err();
        assert_eq!(
            failure_message(&err),
            "import 42: import-part recipe 0 256 exited with a failure and no message"
        );

        let err = anyhow::anyhow!("无法定位当前可执行文件");
        assert_eq!(failure_message(&err), "无法定位当前可执行文件");
    }
}
