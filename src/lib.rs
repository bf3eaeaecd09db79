//! # Sort Batch Service
//!
//! 接收一批整数数组并返回排序结果的 HTTP 服务
//!
//! ## 架构设计
//!
//! ### ① 能力层（Services）
//! - `services::sorter` - 对单个序列升序排序，不修改输入
//!
//! ### ② 编排层（Orchestration）
//! - `orchestrator::BatchOrchestrator` - 每个数组一个 tokio 任务，
//!   按下标重组结果（或按完成顺序），并统计整批耗时
//!
//! ### ③ 接口层（API）
//! - `api` - `POST /process-single`、`POST /process-concurrent`
//!
//! ## 模块结构

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use api::{build_router, AppState};
pub use app::App;
pub use config::{Config, OrderingPolicy};
pub use error::{ApiError, AppError, AppResult, ConfigError, OrchestratorError};
pub use models::{Batch, IntSequence, SortRequest, SortResponse, SortedBatch};
pub use orchestrator::BatchOrchestrator;
pub use services::{sort_sequence, SortMode};
