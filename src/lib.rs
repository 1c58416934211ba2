//! zmark - 文档文本高亮核心库
//!
//! 模块结构：
//! - models: 数据模型（DocTree, Fragment, HTML 加载）
//! - services: 无状态服务（模式引擎、文本遍历、配置）
//! - kernel: 有状态核心（HighlightManager, Request/Response, Store）

pub mod kernel;
pub mod models;
pub mod services;
