//! 资源条目与资源节点
//!
//! - `FgResourceEntry`：一个逻辑资源在整帧内的唯一存储，持有版本计数器、
//!   创建参数以及延迟创建的物理资源
//! - `FgResourceNode`：每发出一个句柄就产生一个节点，创建后不再修改

use std::fmt;

use super::handle::{FgHandle, FgPassId, FgResourceId};

/// 图形层提供的资源工厂
///
/// FrameGraph 自己从不创建物理资源，只在 execute 阶段把保存的创建参数转交给工厂。
/// 创建参数以 `Box<dyn FgResourceDesc<F>>` 保存，因此工厂类型必须是 `'static`。
pub trait FgResourceFactory: 'static {
    /// 工厂产出的物理资源类型
    type Resource;

    /// 销毁物理资源
    ///
    /// 默认实现直接 drop，持有显式生命周期的后端（如 Vulkan）需要覆盖此方法。
    fn destroy_resource(&mut self, name: &str, resource: Self::Resource) {
        let _ = name;
        drop(resource);
    }
}

/// 资源创建参数
///
/// 实现类型决定了"创建哪一种物理资源"，自身携带的字段就是创建参数。
/// 参数在 `FgBuilder::create` 时被捕获，原样保存到 execute 阶段。
pub trait FgResourceDesc<F: FgResourceFactory>: fmt::Debug + 'static {
    fn create_resource(&self, factory: &mut F, name: &str) -> F::Resource;
}

/// 用闭包充当创建参数
///
/// 适用于一次性的资源，不值得单独定义 desc 类型的情况。
pub struct FgResourceFn<C>(pub C);

impl<C> fmt::Debug for FgResourceFn<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FgResourceFn")
    }
}

impl<F, C> FgResourceDesc<F> for FgResourceFn<C>
where
    F: FgResourceFactory,
    C: Fn(&mut F, &str) -> F::Resource + 'static,
{
    fn create_resource(&self, factory: &mut F, name: &str) -> F::Resource {
        (self.0)(factory, name)
    }
}

/// 资源节点：某个资源条目在某个版本上的不可变记录
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FgResourceNode {
    /// 所属资源条目
    pub resource: FgResourceId,
    /// 对应的版本
    pub version: u32,
    /// 声明该版本的 Pass（create 或 write）
    ///
    /// 通过 `FrameGraph::clone_resource` 在 Pass 之外产生的版本为 `None`。
    pub producer: Option<FgPassId>,
    /// 该版本内容的来源：产生该节点时，最后一个为此资源产出内容的 Pass
    ///
    /// 对普通节点与 `producer` 相同；导入资源为 `None`。
    pub last_pass: Option<FgPassId>,
}

impl FgResourceNode {
    #[inline]
    pub fn handle(&self) -> FgHandle {
        FgHandle::new(self.resource, self.version)
    }
}

/// 资源条目
pub struct FgResourceEntry<F: FgResourceFactory> {
    /// 调试名称
    pub(crate) name: String,
    /// 当前版本，0 表示尚未发出任何句柄
    version: u32,
    /// 创建参数；导入的资源没有
    desc: Option<Box<dyn FgResourceDesc<F>>>,
    /// 物理资源
    resource: Option<F::Resource>,
    /// 创建该资源的 Pass
    pub(crate) producer: Option<FgPassId>,
    /// 最后一个为该资源产出新版本的 Pass
    pub(crate) last_pass: Option<FgPassId>,
    /// 每个版本的节点，下标为 `version - 1`
    nodes: Vec<FgResourceNode>,
}

// new & init
impl<F: FgResourceFactory> FgResourceEntry<F> {
    /// 由 graph 负责创建的资源
    pub(crate) fn transient(name: String, desc: Box<dyn FgResourceDesc<F>>) -> Self {
        Self {
            name,
            version: 0,
            desc: Some(desc),
            resource: None,
            producer: None,
            last_pass: None,
            nodes: Vec::new(),
        }
    }

    /// 外部已经存在的资源
    pub(crate) fn imported(name: String, resource: F::Resource) -> Self {
        Self {
            name,
            version: 0,
            desc: None,
            resource: Some(resource),
            producer: None,
            last_pass: None,
            nodes: Vec::new(),
        }
    }
}

// versioning
impl<F: FgResourceFactory> FgResourceEntry<F> {
    /// 当前版本
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// 推进到下一个版本并分配对应的节点
    ///
    /// `producer` 为 `None` 时不改变内容来源（Pass 之外的 clone）。
    pub(crate) fn advance(&mut self, id: FgResourceId, producer: Option<FgPassId>) -> FgHandle {
        self.version += 1;
        if producer.is_some() {
            self.last_pass = producer;
        }

        let node = FgResourceNode {
            resource: id,
            version: self.version,
            producer,
            last_pass: self.last_pass,
        };
        self.nodes.push(node);
        node.handle()
    }

    /// 获取指定版本的节点
    #[inline]
    pub fn node(&self, version: u32) -> Option<&FgResourceNode> {
        version.checked_sub(1).and_then(|i| self.nodes.get(i as usize))
    }

    /// 迭代所有版本的节点
    #[inline]
    pub fn nodes(&self) -> impl Iterator<Item = &FgResourceNode> {
        self.nodes.iter()
    }
}

// construct & destroy
impl<F: FgResourceFactory> FgResourceEntry<F> {
    /// 调用工厂创建物理资源
    ///
    /// # Panics
    /// 物理资源已经存在（中间没有 destroy）或资源是导入的
    pub fn construct_resource(&mut self, factory: &mut F) {
        assert!(self.resource.is_none(), "FrameGraph: resource '{}' is already constructed", self.name);
        let Some(desc) = self.desc.as_ref() else {
            panic!("FrameGraph: imported resource '{}' cannot be constructed by the graph", self.name);
        };

        log::trace!("FrameGraph: construct '{}' from {:?}", self.name, desc);
        self.resource = Some(desc.create_resource(factory, &self.name));
    }

    /// 释放物理资源，没有物理资源时什么都不做
    ///
    /// 导入的资源不归 graph 所有，不会交给工厂销毁。
    pub fn destroy_resource(&mut self, factory: &mut F) {
        if self.is_imported() {
            return;
        }
        if let Some(resource) = self.resource.take() {
            log::trace!("FrameGraph: destroy '{}'", self.name);
            factory.destroy_resource(&self.name, resource);
        }
    }

    #[inline]
    pub fn is_constructed(&self) -> bool {
        self.resource.is_some()
    }

    #[inline]
    pub fn is_imported(&self) -> bool {
        self.desc.is_none()
    }

    #[inline]
    pub fn resource(&self) -> Option<&F::Resource> {
        self.resource.as_ref()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 创建该资源的 Pass，导入的资源为 `None`
    #[inline]
    pub fn producer(&self) -> Option<FgPassId> {
        self.producer
    }

    /// 最后一个为该资源产出新版本的 Pass
    #[inline]
    pub fn last_pass(&self) -> Option<FgPassId> {
        self.last_pass
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;
    use crate::frame_graph::test_utils::{FakeFactory, FakeTexture};

    fn transient_entry() -> (FgResourceId, FgResourceEntry<FakeFactory>) {
        let mut sm: SlotMap<FgResourceId, ()> = SlotMap::with_key();
        let entry = FgResourceEntry::transient("color".to_string(), Box::new(FakeTexture::new(4, 4)));
        (sm.insert(()), entry)
    }

    #[test]
    fn test_advance_bumps_version() {
        let (id, mut entry) = transient_entry();
        assert_eq!(entry.version(), 0);

        let h1 = entry.advance(id, Some(FgPassId(0)));
        let h2 = entry.advance(id, Some(FgPassId(1)));

        assert_eq!(h1.version(), 1);
        assert_eq!(h2.version(), 2);
        assert_eq!(entry.version(), 2);
        assert_eq!(entry.node(1).unwrap().producer, Some(FgPassId(0)));
        assert_eq!(entry.node(2).unwrap().producer, Some(FgPassId(1)));
        assert!(entry.node(0).is_none());
        assert!(entry.node(3).is_none());
    }

    #[test]
    fn test_advance_without_producer_keeps_content_source() {
        let (id, mut entry) = transient_entry();
        entry.advance(id, Some(FgPassId(3)));
        let cloned = entry.advance(id, None);

        let node = entry.node(cloned.version()).unwrap();
        assert_eq!(node.producer, None);
        assert_eq!(node.last_pass, Some(FgPassId(3)));
    }

    #[test]
    fn test_construct_and_destroy() {
        let (_, mut entry) = transient_entry();
        let mut factory = FakeFactory::default();

        entry.construct_resource(&mut factory);
        assert!(entry.is_constructed());
        assert_eq!(entry.resource().unwrap().name, "color");

        entry.destroy_resource(&mut factory);
        assert!(!entry.is_constructed());
        // 没有物理资源时 destroy 是空操作
        entry.destroy_resource(&mut factory);

        assert_eq!(factory.constructed, vec!["color".to_string()]);
        assert_eq!(factory.destroyed, vec!["color".to_string()]);
    }

    #[test]
    #[should_panic(expected = "already constructed")]
    fn test_double_construct_panics() {
        let (_, mut entry) = transient_entry();
        let mut factory = FakeFactory::default();
        entry.construct_resource(&mut factory);
        entry.construct_resource(&mut factory);
    }

    #[test]
    fn test_construct_after_destroy_is_allowed() {
        let (_, mut entry) = transient_entry();
        let mut factory = FakeFactory::default();
        entry.construct_resource(&mut factory);
        entry.destroy_resource(&mut factory);
        entry.construct_resource(&mut factory);
        assert_eq!(factory.constructed.len(), 2);
    }

    #[test]
    fn test_imported_is_never_destroyed_by_factory() {
        let mut factory = FakeFactory::default();
        let backbuffer = factory.make("backbuffer");
        let mut entry: FgResourceEntry<FakeFactory> = FgResourceEntry::imported("backbuffer".to_string(), backbuffer);

        assert!(entry.is_imported());
        entry.destroy_resource(&mut factory);
        assert!(entry.is_constructed());
        assert!(factory.destroyed.is_empty());
    }

    #[test]
    fn test_closure_desc() {
        let mut sm: SlotMap<FgResourceId, ()> = SlotMap::with_key();
        let id = sm.insert(());
        let desc = FgResourceFn(|factory: &mut FakeFactory, name: &str| factory.make(&format!("{name}-custom")));
        let mut entry = FgResourceEntry::transient("lut".to_string(), Box::new(desc));
        entry.advance(id, Some(FgPassId(0)));

        let mut factory = FakeFactory::default();
        entry.construct_resource(&mut factory);
        assert_eq!(entry.resource().unwrap().name, "lut-custom");
    }
}
