// ==========================================
// 组合导入引擎 - SQL 性能统计
// ==========================================
// 用途: 分块导入时统计 SQL 语句数与慢查询
// 开关: COMBINATION_IMPORT_PERF_SQL / COMBINATION_IMPORT_SLOW_SQL_MS
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const PERF_SQL_ENV: &str = "COMBINATION_IMPORT_PERF_SQL";
const SLOW_SQL_MS_ENV: &str = "COMBINATION_IMPORT_SLOW_SQL_MS";
const DEFAULT_SLOW_SQL_MS: u64 = 100;
const SQL_SUMMARY_CHARS: usize = 200;

// 0 表示未开启统计
static SLOW_SQL_MS: AtomicU64 = AtomicU64::new(0);

// ==========================================
// SqlTraceSettings
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlTraceSettings {
    pub slow_threshold_ms: u64,
}

impl SqlTraceSettings {
    /// 从环境变量读取；未开启时返回 None
    pub fn from_env() -> Option<Self> {
        let enabled = std::env::var(PERF_SQL_ENV).ok();
        let slow_ms = std::env::var(SLOW_SQL_MS_ENV).ok();
        Self::parse(enabled.as_deref(), slow_ms.as_deref())
    }

    fn parse(enabled: Option<&str>, slow_ms: Option<&str>) -> Option<Self> {
        let enabled = enabled
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "on"))
            .unwrap_or(false);
        if !enabled {
            return None;
        }

        // 阈值至少 1ms，0 保留给"未开启"
        let slow_threshold_ms = slow_ms
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_SLOW_SQL_MS)
            .max(1);
        Some(Self { slow_threshold_ms })
    }
}

/// 为连接安装 profile 回调；默认关闭（子进程数量多，避免日志噪音）
pub fn install_sqlite_tracing(conn: &mut Connection) {
    match SqlTraceSettings::from_env() {
        Some(settings) => {
            SLOW_SQL_MS.store(settings.slow_threshold_ms, Ordering::Relaxed);
            conn.profile(Some(on_statement_finished));
            tracing::debug!(slow_threshold_ms = settings.slow_threshold_ms, "SQL 统计已开启");
        }
        None => {
            SLOW_SQL_MS.store(0, Ordering::Relaxed);
            conn.profile(None);
        }
    }
}

// ==========================================
// 线程内计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SqlTally {
    statements: u64,
    slow: u64,
}

impl SqlTally {
    fn since(self, earlier: SqlTally) -> SqlTally {
        SqlTally {
            statements: self.statements.saturating_sub(earlier.statements),
            slow: self.slow.saturating_sub(earlier.slow),
        }
    }
}

thread_local! {
    static TALLY: Cell<SqlTally> = const { Cell::new(SqlTally { statements: 0, slow: 0 }) };
    static OPEN_GUARDS: Cell<u32> = const { Cell::new(0) };
}

fn current_tally() -> SqlTally {
    TALLY.with(Cell::get)
}

fn on_statement_finished(sql: &str, duration: Duration) {
    let threshold = SLOW_SQL_MS.load(Ordering::Relaxed);
    if threshold == 0 {
        return;
    }
    record_statement(sql, duration, threshold);
}

fn record_statement(sql: &str, duration: Duration, threshold_ms: u64) {
    let elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    let slow = elapsed_ms >= threshold_ms;
    if slow {
        tracing::warn!(target: "slow_sql", elapsed_ms, sql = %summarize_sql(sql), "慢 SQL");
    }

    // 只在 PerfGuard 作用域内累计
    if OPEN_GUARDS.with(Cell::get) == 0 {
        return;
    }
    TALLY.with(|t| {
        let mut tally = t.get();
        tally.statements += 1;
        if slow {
            tally.slow += 1;
        }
        t.set(tally);
    });
}

/// 单行化并按字符截断
fn summarize_sql(sql: &str) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SQL_SUMMARY_CHARS {
        return flat;
    }
    let mut out: String = flat.chars().take(SQL_SUMMARY_CHARS).collect();
    out.push('…');
    out
}

// ==========================================
// PerfGuard
// ==========================================
/// 作用域计时，drop 时输出耗时与本作用域内的 SQL 计数
///
/// ```ignore
/// let _perf = combination_import::perf::PerfGuard::new("import_chunk", "item");
/// ```
pub struct PerfGuard {
    op: &'static str,
    label: String,
    started_at: Instant,
    baseline: SqlTally,
}

impl PerfGuard {
    pub fn new(op: &'static str, label: impl Into<String>) -> Self {
        OPEN_GUARDS.with(|g| g.set(g.get() + 1));
        Self {
            op,
            label: label.into(),
            started_at: Instant::now(),
            baseline: current_tally(),
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let delta = current_tally().since(self.baseline);
        tracing::debug!(
            target: "perf",
            op = self.op,
            label = %self.label,
            elapsed_ms = self.started_at.elapsed().as_millis() as u64,
            sql_statements = delta.statements,
            slow_sql = delta.slow,
            "完成"
        );
        OPEN_GUARDS.with(|g| g.set(g.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_parse() {
        assert_eq!(SqlTraceSettings::parse(None, Some("5")), None);
        assert_eq!(SqlTraceSettings::parse(Some("off"), None), None);
        assert_eq!(
            SqlTraceSettings::parse(Some(" ON "), None),
            Some(SqlTraceSettings { slow_threshold_ms: DEFAULT_SLOW_SQL_MS })
        );
        assert_eq!(
            SqlTraceSettings::parse(Some("1"), Some("0")),
            Some(SqlTraceSettings { slow_threshold_ms: 1 })
        );
        assert_eq!(
            SqlTraceSettings::parse(Some("true"), Some("abc")),
            Some(SqlTraceSettings { slow_threshold_ms: DEFAULT_SLOW_SQL_MS })
        );
    }

    #[test]
    fn test_statements_counted_only_inside_guard() {
        record_statement("SELECT 1", Duration::from_millis(1), 50);
        let before = current_tally();

        let guard = PerfGuard::new("test", "tally");
        record_statement("SELECT 1", Duration::from_millis(1), 50);
        record_statement("SELECT 2", Duration::from_millis(80), 50);
        assert_eq!(
            current_tally().since(guard.baseline),
            SqlTally { statements: 2, slow: 1 }
        );
        drop(guard);

        record_statement("SELECT 3", Duration::from_millis(1), 50);
        assert_eq!(current_tally().since(before), SqlTally { statements: 2, slow: 1 });
    }

    #[test]
    fn test_summarize_sql_flattens_and_truncates() {
        assert_eq!(
            summarize_sql("SELECT id\n  FROM item\n WHERE name = ?1"),
            "SELECT id FROM item WHERE name = ?1"
        );

        let long = format!("SELECT '{}'", "翻".repeat(300));
        let out = summarize_sql(&long);
        assert!(out.ends_with('…'));
        assert_eq!(out.chars().count(), SQL_SUMMARY_CHARS + 1);
    }
}
