//! Pass 节点和执行期资源视图
//!
//! `FgPassNode` 记录一个 Pass 在 setup 阶段声明的 create / read / write 集合，
//! `FgPassResources` 是 execute 回调拿到的、只包含该 Pass 声明过的资源的视图。

use std::any::Any;

use indexmap::IndexSet;

use super::handle::{FgHandle, FgPassId};
use super::resource::FgResourceFactory;
use super::resource_registry::FgResourceRegistry;

/// Pass 节点数据
pub struct FgPassNode {
    pub(crate) id: FgPassId,
    /// Pass 名称
    pub(crate) name: String,

    /// 本 Pass 创建的资源
    pub(crate) creates: IndexSet<FgHandle>,
    /// 本 Pass 读取的资源
    pub(crate) reads: IndexSet<FgHandle>,
    /// 本 Pass 写入的资源
    pub(crate) writes: IndexSet<FgHandle>,

    /// 没有消费者时也不能被裁剪（present、readback 等）
    pub(crate) side_effect: bool,
    /// 下游消费者的引用计数，由 compile 填充
    pub(crate) ref_count: u32,
}

// new & init
impl FgPassNode {
    pub(crate) fn new(id: FgPassId, name: String) -> Self {
        Self {
            id,
            name,
            creates: IndexSet::new(),
            reads: IndexSet::new(),
            writes: IndexSet::new(),
            side_effect: false,
            ref_count: 0,
        }
    }
}

// query
impl FgPassNode {
    #[inline]
    pub fn id(&self) -> FgPassId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_creating(&self, handle: FgHandle) -> bool {
        self.creates.contains(&handle)
    }

    #[inline]
    pub fn is_reading(&self, handle: FgHandle) -> bool {
        self.reads.contains(&handle)
    }

    #[inline]
    pub fn is_writing(&self, handle: FgHandle) -> bool {
        self.writes.contains(&handle)
    }

    /// 是否还有下游依赖本 Pass 的输出
    ///
    /// 只有 compile 之后才有意义。
    #[inline]
    pub fn can_execute(&self) -> bool {
        self.ref_count > 0
    }

    #[inline]
    pub fn has_side_effect(&self) -> bool {
        self.side_effect
    }

    /// 本 Pass 声明过的所有句柄（create、read、write）
    pub fn declared(&self) -> impl Iterator<Item = FgHandle> + '_ {
        self.creates.iter().chain(&self.reads).chain(&self.writes).copied()
    }

    #[inline]
    pub fn creates(&self) -> impl Iterator<Item = FgHandle> + '_ {
        self.creates.iter().copied()
    }

    #[inline]
    pub fn reads(&self) -> impl Iterator<Item = FgHandle> + '_ {
        self.reads.iter().copied()
    }

    #[inline]
    pub fn writes(&self) -> impl Iterator<Item = FgHandle> + '_ {
        self.writes.iter().copied()
    }
}

// mark
impl FgPassNode {
    pub(crate) fn mark_create(&mut self, handle: FgHandle) -> FgHandle {
        self.creates.insert(handle);
        handle
    }

    /// 记录读取，重复读取同一句柄只记录一次
    ///
    /// 调用方（`FgBuilder`）保证本 Pass 没有 create / write 该句柄。
    pub(crate) fn mark_read(&mut self, handle: FgHandle) -> FgHandle {
        debug_assert!(!self.is_creating(handle) && !self.is_writing(handle));
        self.reads.insert(handle);
        handle
    }

    /// 记录写入，重复写入同一句柄只记录一次
    pub(crate) fn mark_write(&mut self, handle: FgHandle) -> FgHandle {
        self.writes.insert(handle);
        handle
    }
}

/// 类型擦除的 Pass 执行器
pub(crate) trait FgPassExecutor<F: FgResourceFactory> {
    /// setup 阶段填充的 Pass 数据
    fn data(&self) -> &dyn Any;

    /// 执行 Pass，每个执行器只会真正执行一次
    fn execute(&mut self, resources: &FgPassResources<'_, F>);
}

/// 包装用户 Pass 数据和执行闭包的执行器
pub(crate) struct FgPassExecutorWrapper<D, E> {
    data: D,
    execute: Option<E>,
}

impl<D, E> FgPassExecutorWrapper<D, E> {
    pub(crate) fn new(data: D, execute: E) -> Self {
        Self {
            data,
            execute: Some(execute),
        }
    }
}

impl<F, D, E> FgPassExecutor<F> for FgPassExecutorWrapper<D, E>
where
    F: FgResourceFactory,
    D: 'static,
    E: FnOnce(&D, &FgPassResources<'_, F>),
{
    fn data(&self) -> &dyn Any {
        &self.data
    }

    fn execute(&mut self, resources: &FgPassResources<'_, F>) {
        if let Some(execute) = self.execute.take() {
            execute(&self.data, resources);
        }
    }
}

/// Pass 执行时的资源视图
///
/// 只能访问该 Pass 在 setup 阶段声明过的句柄。
pub struct FgPassResources<'r, F: FgResourceFactory> {
    pass: &'r FgPassNode,
    registry: &'r FgResourceRegistry<F>,
}

impl<'r, F: FgResourceFactory> FgPassResources<'r, F> {
    pub(crate) fn new(pass: &'r FgPassNode, registry: &'r FgResourceRegistry<F>) -> Self {
        Self { pass, registry }
    }

    /// 当前 Pass 名称
    #[inline]
    pub fn pass_name(&self) -> &str {
        &self.pass.name
    }

    /// 句柄是否由当前 Pass 声明过
    #[inline]
    pub fn declares(&self, handle: FgHandle) -> bool {
        self.pass.is_creating(handle) || self.pass.is_reading(handle) || self.pass.is_writing(handle)
    }

    /// 获取物理资源
    ///
    /// # Panics
    /// 句柄不是当前 Pass 声明的，或物理资源尚未创建
    pub fn get(&self, handle: FgHandle) -> &'r F::Resource {
        assert!(
            self.declares(handle),
            "FrameGraph: pass '{}' accesses '{}' ({:?}) without declaring it",
            self.pass.name,
            self.registry.name(handle.resource),
            handle
        );

        match self.registry.get(handle.resource).and_then(|entry| entry.resource()) {
            Some(resource) => resource,
            None => panic!(
                "FrameGraph: resource '{}' is not constructed while executing pass '{}'",
                self.registry.name(handle.resource),
                self.pass.name
            ),
        }
    }

    /// 获取物理资源，未声明或未创建时返回 `None`
    pub fn try_get(&self, handle: FgHandle) -> Option<&'r F::Resource> {
        if !self.declares(handle) {
            return None;
        }
        self.registry.get(handle.resource)?.resource()
    }

    /// 资源调试名称
    #[inline]
    pub fn name(&self, handle: FgHandle) -> &'r str {
        self.registry.name(handle.resource)
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;
    use crate::frame_graph::handle::FgResourceId;

    fn handles(count: usize) -> Vec<FgHandle> {
        let mut sm: SlotMap<FgResourceId, ()> = SlotMap::with_key();
        (0..count).map(|_| FgHandle::new(sm.insert(()), 1)).collect()
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let h = handles(1)[0];
        let mut pass = FgPassNode::new(FgPassId(0), "lighting".into());

        assert_eq!(pass.mark_read(h), h);
        assert_eq!(pass.mark_read(h), h);

        assert!(pass.is_reading(h));
        assert_eq!(pass.reads().count(), 1);
    }

    #[test]
    fn test_mark_write_is_idempotent() {
        let h = handles(1)[0];
        let mut pass = FgPassNode::new(FgPassId(0), "lighting".into());

        pass.mark_write(h);
        pass.mark_write(h);

        assert!(pass.is_writing(h));
        assert!(!pass.is_reading(h));
        assert_eq!(pass.writes().count(), 1);
    }

    #[test]
    fn test_declared_keeps_order() {
        let hs = handles(3);
        let mut pass = FgPassNode::new(FgPassId(0), "gbuffer".into());
        pass.mark_create(hs[0]);
        pass.mark_read(hs[1]);
        pass.mark_write(hs[2]);

        assert_eq!(pass.declared().collect::<Vec<_>>(), hs);
        assert!(pass.is_creating(hs[0]));
    }

    #[test]
    fn test_can_execute_follows_ref_count() {
        let mut pass = FgPassNode::new(FgPassId(0), "gbuffer".into());
        assert!(!pass.can_execute());
        pass.ref_count = 2;
        assert!(pass.can_execute());
    }
}
