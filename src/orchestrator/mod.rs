//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量排序的并发调度，是整个系统唯一有设计分量的部分。
//!
//! ## 层次关系
//!
//! ```text
//! api (HTTP 路由, JSON 编解码)
//!     ↓
//! orchestrator::BatchOrchestrator (处理 Vec<IntSequence>)
//!     ↓
//! services::sorter (处理单个 IntSequence)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：编排层只做扇出、收集和计时，不关心排序算法
//! 2. **请求隔离**：每次调用独立的通道与任务集合，跨请求不共享可变状态
//! 3. **无悬挂任务**：返回之前所有任务要么已回收，要么已中止

pub mod batch_processor;

pub use batch_processor::BatchOrchestrator;
