//! 批量排序编排器 - 编排层
//!
//! ## 职责
//!
//! 把一批整数序列扇出到独立的 tokio 任务上排序，等待全部完成后收集结果并计时。
//!
//! ## 核心流程
//!
//! 1. **扇出**：每个序列一个任务，任务带上它在批次中的下标
//! 2. **回传**：任务把 `(下标, 结果)` 写入同一个 mpsc 通道
//! 3. **收集**：所有发送端随任务结束而释放，通道关闭后收集循环自然退出
//! 4. **重组**：按 `OrderingPolicy` 决定按下标归位还是按到达顺序追加
//! 5. **等待**：`JoinSet` 回收每一个任务，回收数等于派发数
//!
//! ## 故障处理
//!
//! - 任务 panic：转换为 `TaskFailed { index }`，立即中止其余任务
//! - 设置了超时：到期后中止全部未完成任务并返回 `Timeout`
//! - 调用方放弃等待（Future 被丢弃）：`JoinSet` 析构时中止所有任务

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::{Config, OrderingPolicy};
use crate::error::OrchestratorError;
use crate::models::{Batch, IntSequence, SortedBatch};
use crate::services::sorter::{sort_with_mode, SortMode};

type TaskOutcome = (usize, Result<IntSequence, OrchestratorError>);

/// 批量排序编排器
///
/// 不持有任何跨请求的可变状态，可以被多个请求共享。
#[derive(Debug, Clone, Default)]
pub struct BatchOrchestrator {
    ordering: OrderingPolicy,
    limiter: Option<Arc<Semaphore>>,
    timeout: Option<Duration>,
}

impl BatchOrchestrator {
    pub fn new(ordering: OrderingPolicy) -> Self {
        Self {
            ordering,
            limiter: None,
            timeout: None,
        }
    }

    /// 根据配置创建编排器
    pub fn from_config(config: &Config) -> Self {
        let mut orchestrator = Self::new(config.ordering_policy);
        if let Some(limit) = config.concurrency_limit() {
            orchestrator = orchestrator.with_concurrency_limit(limit);
        }
        if let Some(timeout) = config.batch_timeout() {
            orchestrator = orchestrator.with_timeout(timeout);
        }
        orchestrator
    }

    /// 限制同时执行排序的任务数（任务仍然一次性全部派发）
    pub fn with_concurrency_limit(mut self, max_concurrent: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(max_concurrent.max(1))));
        self
    }

    /// 为整批设置超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn ordering(&self) -> OrderingPolicy {
        self.ordering
    }

    /// 对整批排序
    pub async fn sort_batch(
        &self,
        batch: Batch,
        mode: SortMode,
    ) -> Result<SortedBatch, OrchestratorError> {
        let total = batch.len();
        let elements = batch.total_elements();

        let sorted = self
            .fan_out(batch, move |index, input| sort_with_mode(mode, index, input))
            .await?;

        info!(
            "✓ 批量排序完成 ({}): {} 个数组 / {} 个元素, 耗时 {} ns",
            mode.as_str(),
            total,
            elements,
            sorted.elapsed_nanos()
        );
        Ok(sorted)
    }

    /// 通用扇出/扇入：对每个序列执行 `job`，收集结果并计时
    pub async fn fan_out<F, Fut>(&self, batch: Batch, job: F) -> Result<SortedBatch, OrchestratorError>
    where
        F: Fn(usize, IntSequence) -> Fut,
        Fut: Future<Output = Result<IntSequence, OrchestratorError>> + Send + 'static,
    {
        let total = batch.len();
        let start = Instant::now();

        let (tx, mut rx) = mpsc::unbounded_channel::<TaskOutcome>();
        let mut tasks = JoinSet::new();

        // ========== 扇出 ==========
        for (index, input) in batch.arrays.into_iter().enumerate() {
            let tx = tx.clone();
            let limiter = self.limiter.clone();
            let work = job(index, input);

            tasks.spawn(async move {
                let result = run_guarded(index, limiter, work).await;
                // 接收端已退出（超时或其他任务失败）时结果直接丢弃
                let _ = tx.send((index, result));
            });
        }
        // 只保留任务持有的发送端，最后一个任务结束时通道关闭
        drop(tx);

        debug!("📦 已派发 {} 个排序任务 (顺序策略: {})", total, self.ordering);

        // ========== 扇入 ==========
        let mut collector = Collector::new(self.ordering, total);
        let drained = match self.timeout {
            None => collector.drain(&mut rx).await,
            Some(limit) => {
                let outcome = tokio::time::timeout(limit, collector.drain(&mut rx)).await;
                outcome.unwrap_or_else(|_| {
                    Err(OrchestratorError::Timeout {
                        limit_ms: limit.as_millis() as u64,
                        completed: collector.completed,
                        total,
                    })
                })
            }
        };

        if let Err(e) = drained {
            error!("❌ 批量排序中止: {}", e);
            tasks.shutdown().await;
            return Err(e);
        }

        let elapsed = start.elapsed();

        // 通道关闭说明每个任务都已交付，这里只做回收
        let mut joined = 0usize;
        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                warn!("⚠️ 排序任务回收异常: {}", e);
            }
            joined += 1;
        }
        debug_assert_eq!(joined, total);

        Ok(SortedBatch {
            arrays: collector.finish()?,
            elapsed,
        })
    }
}

/// 在限流许可下执行任务，并把 panic 转换为带下标的错误
async fn run_guarded<Fut>(
    index: usize,
    limiter: Option<Arc<Semaphore>>,
    work: Fut,
) -> Result<IntSequence, OrchestratorError>
where
    Fut: Future<Output = Result<IntSequence, OrchestratorError>>,
{
    let _permit = match limiter {
        Some(semaphore) => Some(semaphore.acquire_owned().await.map_err(|_| {
            OrchestratorError::TaskFailed {
                index,
                reason: "并发限流器已关闭".to_string(),
            }
        })?),
        None => None,
    };

    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(OrchestratorError::TaskFailed {
            index,
            reason: "任务 panic".to_string(),
        }),
    }
}

/// 结果收集器
struct Collector {
    ordering: OrderingPolicy,
    /// 按提交顺序归位
    slots: Vec<Option<IntSequence>>,
    /// 按到达顺序追加
    arrivals: Vec<IntSequence>,
    completed: usize,
}

impl Collector {
    fn new(ordering: OrderingPolicy, total: usize) -> Self {
        let (slots, arrivals) = match ordering {
            OrderingPolicy::Submission => (vec![None; total], Vec::new()),
            OrderingPolicy::Completion => (Vec::new(), Vec::with_capacity(total)),
        };
        Self {
            ordering,
            slots,
            arrivals,
            completed: 0,
        }
    }

    async fn drain(
        &mut self,
        rx: &mut mpsc::UnboundedReceiver<TaskOutcome>,
    ) -> Result<(), OrchestratorError> {
        while let Some((index, result)) = rx.recv().await {
            self.accept(index, result?);
        }
        Ok(())
    }

    fn accept(&mut self, index: usize, sorted: IntSequence) {
        match self.ordering {
            OrderingPolicy::Submission => self.slots[index] = Some(sorted),
            OrderingPolicy::Completion => self.arrivals.push(sorted),
        }
        self.completed += 1;
    }

    fn finish(self) -> Result<Vec<IntSequence>, OrchestratorError> {
        match self.ordering {
            OrderingPolicy::Submission => self
                .slots
                .into_iter()
                .enumerate()
                .map(|(index, slot)| slot.ok_or(OrchestratorError::MissingResult { index }))
                .collect(),
            OrderingPolicy::Completion => Ok(self.arrivals),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sorter::sort_sequence;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    fn sample_batch() -> Batch {
        Batch::new(vec![
            vec![3, 1, 2],
            vec![5, 4],
            vec![],
            vec![7],
            (0..5_000).rev().collect(),
            vec![-1, -1, 0, -5],
        ])
    }

    fn expected(batch: &Batch) -> Vec<IntSequence> {
        batch.arrays.iter().map(|a| sort_sequence(a)).collect()
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let orchestrator = BatchOrchestrator::default();
        let sorted = assert_ok!(orchestrator.sort_batch(Batch::default(), SortMode::Sequential).await);
        assert!(sorted.arrays.is_empty());
    }

    #[tokio::test]
    async fn test_scenario_from_request() {
        let orchestrator = BatchOrchestrator::default();
        let batch = Batch::new(vec![vec![3, 1, 2], vec![5, 4]]);
        let sorted = orchestrator.sort_batch(batch, SortMode::Sequential).await.unwrap();
        assert_eq!(sorted.arrays, vec![vec![1, 2, 3], vec![4, 5]]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_submission_order_preserved() {
        let orchestrator = BatchOrchestrator::new(OrderingPolicy::Submission);
        let batch = sample_batch();
        let want = expected(&batch);

        for mode in [SortMode::Sequential, SortMode::Concurrent] {
            let sorted = orchestrator.sort_batch(batch.clone(), mode).await.unwrap();
            assert_eq!(sorted.arrays, want);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_submission_order_survives_reversed_completion() {
        let orchestrator = BatchOrchestrator::new(OrderingPolicy::Submission);
        let batch = Batch::new(vec![vec![2, 1], vec![4, 3], vec![6, 5]]);

        // 下标越小睡得越久，完成顺序与提交顺序相反
        let sorted = orchestrator
            .fan_out(batch, |index, input| async move {
                tokio::time::sleep(Duration::from_millis(60 - 20 * index as u64)).await;
                Ok::<_, OrchestratorError>(sort_sequence(&input))
            })
            .await
            .unwrap();

        assert_eq!(sorted.arrays, vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_completion_order_follows_arrival() {
        let orchestrator = BatchOrchestrator::new(OrderingPolicy::Completion);
        let batch = Batch::new(vec![vec![2, 1], vec![4, 3]]);

        let sorted = orchestrator
            .fan_out(batch, |index, input| async move {
                if index == 0 {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                Ok::<_, OrchestratorError>(sort_sequence(&input))
            })
            .await
            .unwrap();

        assert_eq!(sorted.arrays, vec![vec![3, 4], vec![1, 2]]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_completion_order_keeps_same_contents() {
        let orchestrator = BatchOrchestrator::new(OrderingPolicy::Completion);
        let batch = sample_batch();
        let mut want = expected(&batch);

        let mut got = orchestrator
            .sort_batch(batch, SortMode::Concurrent)
            .await
            .unwrap()
            .arrays;

        want.sort();
        got.sort();
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn test_sorting_output_again_is_identity() {
        let orchestrator = BatchOrchestrator::default();
        let first = orchestrator.sort_batch(sample_batch(), SortMode::Sequential).await.unwrap();
        let second = orchestrator
            .sort_batch(Batch::new(first.arrays.clone()), SortMode::Concurrent)
            .await
            .unwrap();
        assert_eq!(first.arrays, second.arrays);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_task_reports_index() {
        let orchestrator = BatchOrchestrator::default();
        let batch = Batch::new(vec![vec![1], vec![2], vec![3], vec![4]]);

        let err = orchestrator
            .fan_out(batch, |index, input| async move {
                if index == 2 {
                    panic!("boom");
                }
                Ok::<_, OrchestratorError>(input)
            })
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::TaskFailed { index: 2, .. }));
    }

    #[tokio::test]
    async fn test_timeout_aborts_slow_tasks() {
        let orchestrator = BatchOrchestrator::default().with_timeout(Duration::from_millis(50));
        let batch = Batch::new(vec![vec![1], vec![2]]);

        let result = orchestrator
            .fan_out(batch, |index, input| async move {
                if index == 1 {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
                Ok::<_, OrchestratorError>(input)
            })
            .await;

        let err = assert_err!(result);
        assert!(matches!(
            err,
            OrchestratorError::Timeout { completed: 1, total: 2, .. }
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_limit_is_respected() {
        let orchestrator = BatchOrchestrator::default().with_concurrency_limit(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let batch = Batch::new((0..10).map(|i| vec![i, -i]).collect());

        let sorted = orchestrator
            .fan_out(batch, |_, input| {
                let running = running.clone();
                let peak = peak.clone();
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, OrchestratorError>(sort_sequence(&input))
                }
            })
            .await
            .unwrap();

        assert_eq!(sorted.arrays.len(), 10);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_large_batch_completes() {
        let orchestrator = BatchOrchestrator::default();
        let batch = Batch::new((0..10_000i64).map(|i| vec![i % 7, i % 3, i]).collect());
        let want = expected(&batch);

        let sorted = orchestrator.sort_batch(batch, SortMode::Concurrent).await.unwrap();
        assert_eq!(sorted.arrays, want);

        // 紧接着下一批也能正常完成
        let again = orchestrator
            .sort_batch(Batch::new(vec![vec![2, 1]]), SortMode::Sequential)
            .await
            .unwrap();
        assert_eq!(again.arrays, vec![vec![1, 2]]);
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            ordering_policy: OrderingPolicy::Completion,
            max_concurrent_tasks: 3,
            batch_timeout_ms: 500,
            ..Config::default()
        };
        let orchestrator = BatchOrchestrator::from_config(&config);
        assert_eq!(orchestrator.ordering(), OrderingPolicy::Completion);
        assert_eq!(orchestrator.timeout, Some(Duration::from_millis(500)));
        assert!(orchestrator.limiter.is_some());
    }
}
