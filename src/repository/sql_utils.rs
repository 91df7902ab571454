// ==========================================
// 组合导入引擎 - 仓储层 SQL 工具
// ==========================================
// 职责: IN 子句构建、按批次绑定标识、文本枚举列解析
// 约束: SQLite 变量上限，单条语句的标识数不超过 ID_BATCH_SIZE
// ==========================================

use crate::domain::Identity;
use crate::repository::error::RepositoryError;
use rusqlite::types::Type;

/// 单条 IN 查询绑定的标识数量上限
pub const ID_BATCH_SIZE: usize = 500;

/// 构建 IN 子句的 SQL 片段
///
/// # 示例
/// ```
/// use combination_import::repository::sql_utils::build_in_clause;
///
/// assert_eq!(build_in_clause("id", 3), "id IN (?, ?, ?)");
/// assert_eq!(build_in_clause("id", 0), "1 = 0");
/// ```
pub fn build_in_clause(column_name: &str, count: usize) -> String {
    if count == 0 {
        // 空列表时返回永假条件，确保 SQL 语法正确
        return "1 = 0".to_string();
    }

    let placeholders = vec!["?"; count].join(", ");
    format!("{} IN ({})", column_name, placeholders)
}

/// 标识按批次切分（空输入不产生批次）
pub fn id_batches(ids: &[Identity]) -> impl Iterator<Item = &[Identity]> {
    ids.chunks(ID_BATCH_SIZE)
}

/// 解析文本枚举列
///
/// 无法识别的取值映射为 FromSqlConversionFailure，
/// 内层错误保留字段名便于定位脏数据
pub fn parse_text_column<T>(
    column_index: usize,
    field: &str,
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column_index,
            Type::Text,
            Box::new(RepositoryError::FieldValueError {
                field: field.to_string(),
                message: format!("无法识别的取值: {}", raw),
            }),
        )
    })
}
