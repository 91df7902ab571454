// ==========================================
// 组合导入引擎 - 分块调度器
// ==========================================
// ProcessDispatcher: 每个分块一个子进程（重新调用本程序的 import-part 子命令）
//   - stdout/stderr 逐行转发给监听者，同时完整保留
//   - 无超时；非零退出时提取错误区域作为失败消息
// InProcessDispatcher: 同一契约，进程内执行（测试与单进程运行）
// ==========================================

use crate::engine::chunk::{run_chunk, ChunkSpec};
use crate::engine::events::{ImportEvent, ImportProgressListener};
use crate::engine::failure::extract_message;
use crate::export::ExportRegistry;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::reconciler::ChunkReport;
use crate::repository::RepositoryError;
use async_trait::async_trait;
use rusqlite::Connection;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

// ==========================================
// ChunkDispatcher Trait
// ==========================================
#[async_trait]
pub trait ChunkDispatcher: Send + Sync {
    /// 执行一个分块，等待其结束
    ///
    /// 失败统一为 ImportError::ChunkProcessFailure（只携带失败消息）
    async fn dispatch(
        &self,
        chunk: &ChunkSpec,
        listener: &dyn ImportProgressListener,
    ) -> ImportResult<()>;
}

fn chunk_failure(chunk: &ChunkSpec, message: String) -> ImportError {
    ImportError::ChunkProcessFailure {
        part: chunk.part.to_string(),
        offset: chunk.offset,
        limit: chunk.limit,
        message,
    }
}

// ==========================================
// ProcessDispatcher - 子进程调度
// ==========================================
pub struct ProcessDispatcher {
    program: PathBuf,
    /// 放在子命令之前的全局参数（数据库、导出目录）
    base_args: Vec<OsString>,
}

impl ProcessDispatcher {
    pub fn new(program: impl Into<PathBuf>, base_args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            base_args,
        }
    }

    /// 以当前可执行文件作为子进程程序
    pub fn current_exe(base_args: Vec<OsString>) -> ImportResult<Self> {
        let program = std::env::current_exe()
            .map_err(|e| ImportError::ProcessSpawnError(format!("无法定位当前程序: {}", e)))?;
        Ok(Self::new(program, base_args))
    }

    /// 子进程参数: <base_args> import-part <part> <offset> <limit> --combination <id>
    pub fn chunk_args(&self, chunk: &ChunkSpec) -> Vec<OsString> {
        let mut args = self.base_args.clone();
        args.extend(
            [
                "import-part".to_string(),
                chunk.part.to_string(),
                chunk.offset.to_string(),
                chunk.limit.to_string(),
                "--combination".to_string(),
                chunk.combination_id.to_string(),
            ]
            .into_iter()
            .map(OsString::from),
        );
        args
    }
}

/// 逐行读取子进程输出（非 UTF-8 字节按有损转换）
async fn pump_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "读取子进程输出失败");
                break;
            }
        }
    }
}

#[async_trait]
impl ChunkDispatcher for ProcessDispatcher {
    async fn dispatch(
        &self,
        chunk: &ChunkSpec,
        listener: &dyn ImportProgressListener,
    ) -> ImportResult<()> {
        let args = self.chunk_args(chunk);
        debug!(program = %self.program.display(), ?args, "启动分块子进程");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ImportError::ProcessSpawnError(format!("{}: {}", self.program.display(), e))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ImportError::ProcessSpawnError("stdout 未建立管道".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ImportError::ProcessSpawnError("stderr 未建立管道".to_string()))?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let pumps = futures::future::join(
            tokio::spawn(pump_lines(stdout, tx.clone())),
            tokio::spawn(pump_lines(stderr, tx)),
        );

        // 两个发送端都结束后 recv 返回 None
        let mut captured = String::new();
        while let Some(line) = rx.recv().await {
            listener.notify(&ImportEvent::OutputLine {
                part: chunk.part,
                line: line.clone(),
            });
            captured.push_str(&line);
            captured.push('\n');
        }

        let (out, err) = pumps.await;
        if let Err(e) = out.and(err) {
            warn!(error = %e, "输出转发任务异常结束");
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ImportError::ProcessSpawnError(format!("等待子进程失败: {}", e)))?;
        if status.success() {
            return Ok(());
        }

        warn!(part = %chunk.part, offset = chunk.offset, ?status, "分块子进程失败");
        Err(chunk_failure(chunk, extract_message(&captured)))
    }
}

// ==========================================
// InProcessDispatcher - 进程内调度
// ==========================================
// 不提供进程隔离：分块内的崩溃会影响调用方
pub struct InProcessDispatcher {
    conn: Arc<Mutex<Connection>>,
    registry: Arc<dyn ExportRegistry>,
}

impl InProcessDispatcher {
    pub fn new(conn: Arc<Mutex<Connection>>, registry: Arc<dyn ExportRegistry>) -> Self {
        Self { conn, registry }
    }
}

#[async_trait]
impl ChunkDispatcher for InProcessDispatcher {
    async fn dispatch(
        &self,
        chunk: &ChunkSpec,
        _listener: &dyn ImportProgressListener,
    ) -> ImportResult<()> {
        let conn = Arc::clone(&self.conn);
        let registry = Arc::clone(&self.registry);
        let spec = *chunk;

        let result = tokio::task::spawn_blocking(move || -> ImportResult<ChunkReport> {
            let mut conn = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            run_chunk(
                &mut conn,
                registry,
                spec.part,
                spec.combination_id,
                spec.offset,
                spec.limit,
            )
        })
        .await
        .map_err(|e| chunk_failure(chunk, e.to_string()))?;

        match result {
            Ok(report) => {
                debug!(?report, "进程内分块完成");
                Ok(())
            }
            Err(e) => Err(chunk_failure(chunk, e.to_string())),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::domain::ImportPart;
    use crate::engine::failure::render_error_block;
    use std::sync::Mutex as StdMutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct CollectingListener {
        lines: StdMutex<Vec<String>>,
    }

    impl ImportProgressListener for CollectingListener {
        fn notify(&self, event: &ImportEvent) {
            if let ImportEvent::OutputLine { line, .. } = event {
                self.lines.lock().unwrap().push(line.clone());
            }
        }
    }

    fn chunk() -> ChunkSpec {
        ChunkSpec {
            part: ImportPart::Item,
            combination_id: Uuid::nil(),
            index: 1,
            offset: 0,
            limit: 256,
        }
    }

    // sh -c '<script>' <$0> <args...>：脚本忽略分块参数
    fn shell(script: &str) -> ProcessDispatcher {
        ProcessDispatcher::new(
            "/bin/sh",
            vec!["-c".into(), script.into(), "combination-import".into()],
        )
    }

    #[tokio::test]
    async fn test_success_streams_output() {
        let dispatcher = shell("echo one; echo two >&2; exit 0");
        let listener = CollectingListener::default();
        dispatcher.dispatch(&chunk(), &listener).await.unwrap();

        let mut lines = listener.lines.lock().unwrap().clone();
        lines.sort();
        assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_extracts_error_block() {
        let block = render_error_block("缺少实体 item: item/iron-plate");
        let script = format!("printf 'processing\\n'; printf '%s\\n' '{}'; exit 1", block);
        let dispatcher = shell(&script);
        let err = dispatcher
            .dispatch(&chunk(), &CollectingListener::default())
            .await
            .unwrap_err();

        match err {
            ImportError::ChunkProcessFailure { part, message, .. } => {
                assert_eq!(part, "item");
                assert_eq!(message, "缺少实体 item: item/iron-plate");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_without_block_has_empty_message() {
        let dispatcher = shell("echo boom; exit 3");
        let err = dispatcher
            .dispatch(&chunk(), &CollectingListener::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::ChunkProcessFailure { ref message, .. } if message.is_empty()));
    }

    #[test]
    fn test_chunk_args_layout() {
        let dispatcher = ProcessDispatcher::new("prog", vec!["--database".into(), "x.db".into()]);
        let combination = Uuid::nil().to_string();
        let args: Vec<String> = dispatcher
            .chunk_args(&chunk())
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();
        assert_eq!(
            args,
            vec![
                "--database",
                "x.db",
                "import-part",
                "item",
                "0",
                "256",
                "--combination",
                combination.as_str(),
            ]
        );
    }
}
