use std::collections::HashMap;

use slotmap::SlotMap;

use super::handle::{FgHandle, FgPassId, FgResourceId};
use super::resource::{FgResourceDesc, FgResourceEntry, FgResourceFactory, FgResourceNode};

/// 资源注册表
///
/// 管理 FrameGraph 中所有声明的资源条目，提供句柄到条目/节点的映射。
/// 使用 SlotMap 存储条目：`reset()` 时整表清空，旧句柄的 key 随代际变化自动失效。
pub struct FgResourceRegistry<F: FgResourceFactory> {
    entries: SlotMap<FgResourceId, FgResourceEntry<F>>,
    /// 名称到条目的映射，名称在一帧内唯一
    names: HashMap<String, FgResourceId>,
}

impl<F: FgResourceFactory> Default for FgResourceRegistry<F> {
    fn default() -> Self {
        Self {
            entries: SlotMap::with_key(),
            names: HashMap::new(),
        }
    }
}

// new & init
impl<F: FgResourceFactory> FgResourceRegistry<F> {
    pub fn new() -> Self {
        Self::default()
    }
}

// register
impl<F: FgResourceFactory> FgResourceRegistry<F> {
    /// 注册由 graph 创建的资源，返回版本 1 的句柄
    ///
    /// # Panics
    /// 名称已被占用
    pub(crate) fn register_transient(
        &mut self,
        name: String,
        desc: Box<dyn FgResourceDesc<F>>,
        producer: FgPassId,
    ) -> FgHandle {
        let mut entry = FgResourceEntry::transient(name, desc);
        entry.producer = Some(producer);
        self.insert(entry, Some(producer))
    }

    /// 注册外部导入的资源，返回版本 1 的句柄
    ///
    /// # Panics
    /// 名称已被占用
    pub(crate) fn register_imported(&mut self, name: String, resource: F::Resource) -> FgHandle {
        self.insert(FgResourceEntry::imported(name, resource), None)
    }

    fn insert(&mut self, entry: FgResourceEntry<F>, producer: Option<FgPassId>) -> FgHandle {
        assert!(
            !self.names.contains_key(&entry.name),
            "FrameGraph: resource name '{}' is already bound",
            entry.name
        );

        let name = entry.name.clone();
        let id = self.entries.insert(entry);
        self.names.insert(name, id);
        self.entries[id].advance(id, producer)
    }

    /// 为资源推进一个新版本
    ///
    /// # Panics
    /// 句柄无效
    pub(crate) fn clone_resource(&mut self, handle: FgHandle, producer: Option<FgPassId>) -> FgHandle {
        assert!(self.is_valid(handle), "FrameGraph: cannot clone stale or unknown handle {:?}", handle);
        self.entries[handle.resource].advance(handle.resource, producer)
    }

    /// 清空所有条目，调用方需要先销毁物理资源
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.names.clear();
    }
}

// getter & iter
impl<F: FgResourceFactory> FgResourceRegistry<F> {
    /// 句柄版本是否等于条目当前版本
    #[inline]
    pub fn is_valid(&self, handle: FgHandle) -> bool {
        self.entries.get(handle.resource).is_some_and(|entry| entry.version() == handle.version)
    }

    /// 按名称查找资源，返回最新版本的句柄
    pub fn find(&self, name: &str) -> Option<FgHandle> {
        let id = *self.names.get(name)?;
        let entry = self.entries.get(id)?;
        Some(FgHandle::new(id, entry.version()))
    }

    #[inline]
    pub(crate) fn lookup_name(&self, name: &str) -> Option<FgResourceId> {
        self.names.get(name).copied()
    }

    /// 获取句柄对应的节点（无论句柄是否仍然有效）
    #[inline]
    pub fn node(&self, handle: FgHandle) -> Option<&FgResourceNode> {
        self.entries.get(handle.resource)?.node(handle.version)
    }

    #[inline]
    pub fn get(&self, id: FgResourceId) -> Option<&FgResourceEntry<F>> {
        self.entries.get(id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: FgResourceId) -> Option<&mut FgResourceEntry<F>> {
        self.entries.get_mut(id)
    }

    /// 资源调试名称，未知句柄返回 `<unknown>`
    #[inline]
    pub fn name(&self, id: FgResourceId) -> &str {
        self.entries.get(id).map(|entry| entry.name()).unwrap_or("<unknown>")
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (FgResourceId, &FgResourceEntry<F>)> {
        self.entries.iter()
    }

    #[inline]
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (FgResourceId, &mut FgResourceEntry<F>)> {
        self.entries.iter_mut()
    }
}
