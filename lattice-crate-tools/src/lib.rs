//! Lattice 工具集
//!
//! 在各个 crate 之间共享的日志初始化、配置加载和路径管理。
//!
//! # LatticePath
//! 基于工作区根目录的统一路径管理，避免硬编码相对路径。

pub mod config;
pub mod init_log;
pub mod path;
