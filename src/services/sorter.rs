//! 排序能力 - 能力层
//!
//! 只处理单个整数序列，不关心批次与并发编排。

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::OrchestratorError;
use crate::models::IntSequence;

/// 单个数组的排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// 在当前任务内直接排序
    Sequential,
    /// 再派生一个独立任务完成排序并等待其结果
    Concurrent,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Sequential => "sequential",
            SortMode::Concurrent => "concurrent",
        }
    }
}

/// 升序排序，返回新序列，不修改输入
pub fn sort_sequence(input: &[i64]) -> IntSequence {
    let mut sorted = input.to_vec();
    sorted.sort_unstable();
    sorted
}

/// 在一个单独的 tokio 任务里排序并等待结果
///
/// 只有一个任务，没有并行收益，保留它是为了与 `/process-concurrent` 的旧行为一致。
/// 任务 panic 时返回 `TaskFailed`，`index` 由调用方传入用于定位。
pub async fn sort_on_task(index: usize, input: IntSequence) -> Result<IntSequence, OrchestratorError> {
    run_on_task(index, async move { sort_sequence(&input) }).await
}

/// 在单独的任务里执行 `work` 并等待
///
/// 等待方被丢弃（整批超时、其他任务失败）时，派生出的任务随之中止。
pub async fn run_on_task<T, Fut>(index: usize, work: Fut) -> Result<T, OrchestratorError>
where
    T: Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let mut task = AbortOnDrop(tokio::spawn(work));
    (&mut task.0)
        .await
        .map_err(|e| OrchestratorError::task_failed(index, &e))
}

struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// 按指定方式排序
pub async fn sort_with_mode(
    mode: SortMode,
    index: usize,
    input: IntSequence,
) -> Result<IntSequence, OrchestratorError> {
    debug!("[数组 {}] 排序 {} 个元素 ({})", index, input.len(), mode.as_str());
    match mode {
        SortMode::Sequential => Ok(sort_sequence(&input)),
        SortMode::Concurrent => sort_on_task(index, input).await,
    }
}
