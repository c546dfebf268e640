//! Pass 构建器
//!
//! 在 `FrameGraph::add_pass` 的 setup 回调中使用，是 Pass 访问资源的唯一入口。
//! 所有合法性检查（句柄是否过期、是否读取自己的输出）都在这里完成。

use super::handle::FgHandle;
use super::pass::FgPassNode;
use super::resource::{FgResourceDesc, FgResourceFactory};
use super::resource_registry::FgResourceRegistry;

/// Pass 构建器
///
/// 生命周期只覆盖一次 setup 调用，不能被带出回调。
pub struct FgBuilder<'g, F: FgResourceFactory> {
    pass: &'g mut FgPassNode,
    registry: &'g mut FgResourceRegistry<F>,
}

impl<'g, F: FgResourceFactory> FgBuilder<'g, F> {
    pub(crate) fn new(pass: &'g mut FgPassNode, registry: &'g mut FgResourceRegistry<F>) -> Self {
        Self { pass, registry }
    }

    /// 创建一个由 graph 管理的资源
    ///
    /// 创建参数 `desc` 原样保存，execute 阶段首次被使用前才交给工厂。
    ///
    /// # 参数
    /// - `name`: 资源名称，一帧内唯一
    /// - `desc`: 创建参数
    ///
    /// # 返回
    /// 版本 1 的句柄；同一个 Pass 重复创建同名资源时返回第一次创建的句柄
    ///
    /// # Panics
    /// 名称已被其他 Pass 创建或导入的资源占用
    pub fn create<D: FgResourceDesc<F>>(&mut self, name: impl Into<String>, desc: D) -> FgHandle {
        let name = name.into();

        if let Some(id) = self.registry.lookup_name(&name) {
            let Some(handle) = self.pass.creates().find(|h| h.resource == id) else {
                panic!(
                    "FrameGraph: pass '{}' cannot create '{}': the name is already bound to another resource",
                    self.pass.name, name
                );
            };
            return handle;
        }

        let handle = self.registry.register_transient(name, Box::new(desc), self.pass.id);
        self.pass.mark_create(handle)
    }

    /// 声明读取资源
    ///
    /// 同一个句柄重复读取只记录一次。
    ///
    /// # Panics
    /// - 句柄已过期（资源已经被写出新版本）
    /// - 句柄是本 Pass 自己创建或写出的
    pub fn read(&mut self, handle: FgHandle) -> FgHandle {
        assert!(
            self.registry.is_valid(handle),
            "FrameGraph: pass '{}' reads stale handle {:?} of '{}' (current version {})",
            self.pass.name,
            handle,
            self.registry.name(handle.resource),
            self.current_version(handle)
        );
        assert!(
            !self.pass.is_creating(handle) && !self.pass.is_writing(handle),
            "FrameGraph: pass '{}' cannot read its own output '{}' ({:?})",
            self.pass.name,
            self.registry.name(handle.resource),
            handle
        );

        self.pass.mark_read(handle)
    }

    /// 声明写入资源
    ///
    /// - 本 Pass 创建或已经写出的句柄：直接记录写入，句柄不变
    /// - 其他句柄：先记录对旧句柄的读取，再 clone 出新版本，旧句柄随即失效
    ///
    /// # 返回
    /// 写入后的句柄，之后的 Pass 需要使用它
    ///
    /// # Panics
    /// 句柄已过期
    pub fn write(&mut self, handle: FgHandle) -> FgHandle {
        assert!(
            self.registry.is_valid(handle),
            "FrameGraph: pass '{}' writes stale handle {:?} of '{}' (current version {})",
            self.pass.name,
            handle,
            self.registry.name(handle.resource),
            self.current_version(handle)
        );

        if self.pass.is_creating(handle) || self.pass.is_writing(handle) {
            return self.pass.mark_write(handle);
        }

        self.read(handle);
        let written = self.registry.clone_resource(handle, Some(self.pass.id));
        self.pass.mark_write(written)
    }

    /// 标记本 Pass 有外部可见的副作用，编译时不会被裁剪
    pub fn set_side_effect(&mut self) {
        self.pass.side_effect = true;
    }

    /// 句柄是否仍然有效
    #[inline]
    pub fn is_valid(&self, handle: FgHandle) -> bool {
        self.registry.is_valid(handle)
    }

    /// 按名称查找资源的最新版本
    #[inline]
    pub fn find(&self, name: &str) -> Option<FgHandle> {
        self.registry.find(name)
    }

    #[inline]
    pub fn pass_name(&self) -> &str {
        &self.pass.name
    }

    fn current_version(&self, handle: FgHandle) -> u32 {
        self.registry.get(handle.resource).map_or(0, |entry| entry.version())
    }
}
