//! FrameGraph - 声明式的每帧渲染图
//!
//! 提供基于资源版本的依赖分析、Pass 裁剪和资源生命周期管理。
//!
//! # 核心概念
//!
//! - **FgHandle**: 资源句柄，由 `(资源条目 key, 版本号)` 组成，表示"某个资源在某个时间点"
//! - **FgResourceEntry**: 一个逻辑资源的唯一存储，持有版本计数器和（延迟创建的）物理资源
//! - **FgResourceNode**: 每个句柄对应的不可变记录：属于哪个条目、哪个版本、由哪个 Pass 产生
//! - **FgPassNode**: 一个 Pass 声明的 create / read / write 集合
//! - **FgBuilder**: setup 回调中唯一可以访问资源的入口，负责合法性检查和 clone-on-write
//! - **FrameGraph**: 持有一帧内所有 Pass 与资源，提供 `add_pass` / `compile` / `execute`
//!
//! # 版本规则
//!
//! - 写入本 Pass 创建的资源：句柄不变，版本不变
//! - 写入其他 Pass 产生的资源：先记录对旧句柄的读取，再 clone 出新版本，旧句柄立即失效
//! - 句柄有效 当且仅当 句柄版本 == 资源条目当前版本
//!
//! # 使用示例
//!
//! ```
//! use lattice_frame_graph::*;
//!
//! #[derive(Default)]
//! struct Device {
//!     created: u32,
//! }
//!
//! impl FgResourceFactory for Device {
//!     type Resource = String;
//! }
//!
//! #[derive(Debug)]
//! struct TextureDesc {
//!     width: u32,
//!     height: u32,
//! }
//!
//! impl FgResourceDesc<Device> for TextureDesc {
//!     fn create_resource(&self, device: &mut Device, name: &str) -> String {
//!         device.created += 1;
//!         format!("{} {}x{}", name, self.width, self.height)
//!     }
//! }
//!
//! #[derive(Default)]
//! struct GBufferData {
//!     albedo: Option<FgHandle>,
//! }
//!
//! let mut graph = FrameGraph::new(Device::default());
//!
//! let gbuffer = graph.add_pass(
//!     "gbuffer",
//!     |builder, data: &mut GBufferData| {
//!         let albedo = builder.create("albedo", TextureDesc { width: 1920, height: 1080 });
//!         data.albedo = Some(builder.write(albedo));
//!     },
//!     |data, resources| {
//!         let albedo = resources.get(data.albedo.unwrap());
//!         assert_eq!(albedo, "albedo 1920x1080");
//!     },
//! );
//! let albedo = gbuffer.albedo.unwrap();
//! graph.export(albedo);
//!
//! assert!(graph.compile());
//! graph.execute();
//! assert_eq!(graph.resource(albedo).map(String::as_str), Some("albedo 1920x1080"));
//! assert_eq!(graph.factory().created, 1);
//! ```
//!
//! # 模块结构
//!
//! - `handle`: 资源句柄与 Pass 标识
//! - `resource`: 资源工厂 trait、资源条目与资源节点
//! - `resource_registry`: 资源条目表，负责版本推进
//! - `pass`: Pass 节点与执行期资源视图
//! - `builder`: Pass setup 期间使用的构建器
//! - `graph`: 依赖图和拓扑排序
//! - `executor`: FrameGraph 本体（编译、执行、调试输出）

mod builder;
mod error;
mod executor;
mod graph;
mod handle;
mod pass;
mod resource;
mod resource_registry;
mod settings;

#[cfg(test)]
mod test_utils;

// Re-exports
pub use builder::FgBuilder;
pub use error::FgCompileError;
pub use executor::{FgLifetime, FrameGraph};
pub use graph::{FgDependencyGraph, FgEdgeData};
pub use handle::{FgHandle, FgPassId, FgResourceId};
pub use pass::{FgPassNode, FgPassResources};
pub use resource::{FgResourceDesc, FgResourceEntry, FgResourceFactory, FgResourceFn, FgResourceNode};
pub use resource_registry::FgResourceRegistry;
pub use settings::FgSettings;
