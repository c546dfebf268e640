//! FrameGraph 资源句柄定义
//!
//! 句柄是 graph 内部的虚拟引用，与图形层的物理资源分离。
//! 每个句柄包含版本号，用于跟踪资源在 Pass 之间的状态变化。

use std::fmt;

use slotmap::Key;

slotmap::new_key_type! {
    /// 资源条目在 `FgResourceRegistry` 中的 key
    ///
    /// 代际索引：`FrameGraph::reset()` 之后，上一帧的 key 不会再命中任何条目。
    pub struct FgResourceId;
}

/// Graph 内部的资源句柄
///
/// 指向"某个资源条目的某个版本"。句柄本身不是资源，
/// 只有当 `version` 等于条目的当前版本时才有效。
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FgHandle {
    /// 资源条目 key
    pub(crate) resource: FgResourceId,
    /// 版本号，从 1 开始，每次 clone 后递增
    pub(crate) version: u32,
}

impl FgHandle {
    #[inline]
    pub(crate) fn new(resource: FgResourceId, version: u32) -> Self {
        Self { resource, version }
    }

    /// 获取资源条目 key
    #[inline]
    pub fn resource(&self) -> FgResourceId {
        self.resource
    }

    /// 获取版本号
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }
}

impl fmt::Debug for FgHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fg({:?}.v{})", self.resource.data(), self.version)
    }
}

/// Pass 在 FrameGraph 中的标识
///
/// 等于 Pass 的声明顺序，也是拓扑排序时的 tie-break 依据。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FgPassId(pub(crate) u32);

impl FgPassId {
    /// 由 Pass 在声明列表中的下标生成 id
    ///
    /// # Panics
    /// 下标超出 `u32` 范围
    pub(crate) fn from_index(index: usize) -> Self {
        let Ok(index) = u32::try_from(index) else {
            panic!("FrameGraph: too many passes ({index} does not fit in a pass id)");
        };
        Self(index)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FgPassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
