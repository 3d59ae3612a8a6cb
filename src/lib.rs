//! # Question Transfer
//!
//! 问答题库的导入导出工具
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 模型层（Models）
//! - `models/` - 抢答题、普通题和题目集合
//! - `loaders/toml_loader` - 账户题库的 TOML 快照读写
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不持有状态
//! - `sanitizer` - 清洗外部文本
//! - `order_code` - 解析顺序代码
//! - `XmlCodec` / `XlsxCodec` - 两种文件格式的编解码
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/transfer` - 导入导出入口：大小检查、类型判断、选择编解码器
//! - `QuestionBank` - 题库：增删改、选择、排序、统计
//!
//! ### ④ 编排层（App）
//! - `app` - 命令行子命令的编排
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;

pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::{App, Command};
pub use config::{Config, ImportLimits};
pub use error::{TransferError, TransferResult};
pub use models::{ChoiceOption, ChoiceQuestion, CorrectOrder, Difficulty, Label, OrderingQuestion, QuestionSet};
pub use workflow::{
    export_bytes, import_bytes, ExportedFile, FileKind, IncomingFile, QuestionBank,
};
