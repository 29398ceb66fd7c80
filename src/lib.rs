//! 日志管理服务的命令行检索客户端。
//! 时间解析、查询构建、分页拉取与输出渲染分模块实现。

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod relative;
pub mod render;
pub mod search;
pub mod timeparse;
