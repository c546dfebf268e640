//! Lattice frame graph
//!
//! 每帧重建的渲染 Pass 依赖图：Pass 在 setup 阶段通过 [`FgBuilder`] 声明自己
//! create / read / write 的资源，graph 据此推导执行顺序、资源生命周期，
//! 并在提交任何 GPU 工作之前拦截过期句柄的使用。
//!
//! 详见 [`frame_graph`] 模块文档。

// tracy span 包装，未开启 `profiling` feature 时为空操作
#[cfg(feature = "profiling")]
macro_rules! profile_span {
    ($name:literal) => {
        tracy_client::Client::running().map(|client| client.span(tracy_client::span_location!($name), 0))
    };
}

#[cfg(not(feature = "profiling"))]
macro_rules! profile_span {
    ($name:literal) => {
        ()
    };
}

pub mod frame_graph;

pub use frame_graph::*;
