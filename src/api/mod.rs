//! API 模块
//!
//! HTTP 边界：解析请求体、调用编排层、序列化响应。
//! 路由通过 `build_router` 显式构造，不依赖任何全局注册表。

pub mod routes;

pub use routes::{build_router, AppState, PROCESS_CONCURRENT_PATH, PROCESS_SINGLE_PATH};
