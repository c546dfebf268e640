//! 只记录日志的假图形设备
//!
//! 充当 frame graph 的资源工厂：分配递增的 id，统计存活的资源数量。

use std::cell::RefCell;

use lattice_frame_graph::{FgResourceDesc, FgResourceFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
    Rgba16Float,
    Rgb10A2,
    D32Float,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuResourceKind {
    Texture { width: u32, height: u32, format: TextureFormat },
    Buffer { size: u64 },
}

/// 设备上的物理资源
#[derive(Debug, Clone)]
pub struct GpuResource {
    pub id: u64,
    pub name: String,
    pub kind: GpuResourceKind,
}

impl GpuResource {
    pub fn describe(&self) -> String {
        match &self.kind {
            GpuResourceKind::Texture { width, height, format } => {
                format!("'{}' ({}x{} {:?})", self.name, width, height, format)
            }
            GpuResourceKind::Buffer { size } => format!("'{}' ({} bytes)", self.name, size),
        }
    }
}

#[derive(Default)]
pub struct FakeDevice {
    next_id: u64,
    live: usize,
    peak_live: usize,
    total_created: usize,
}

impl FakeDevice {
    fn allocate(&mut self, name: &str, kind: GpuResourceKind) -> GpuResource {
        self.next_id += 1;
        self.live += 1;
        self.total_created += 1;
        self.peak_live = self.peak_live.max(self.live);
        log::debug!("device: create #{} '{}' {:?}", self.next_id, name, kind);
        GpuResource {
            id: self.next_id,
            name: name.to_string(),
            kind,
        }
    }

    /// 交换链的当前图像，由 swapchain 持有，不经过 frame graph 销毁
    pub fn acquire_backbuffer(&mut self, frame: u32, width: u32, height: u32) -> GpuResource {
        log::debug!("device: acquire backbuffer for frame {}", frame);
        GpuResource {
            id: u64::from(frame % 3),
            name: format!("swapchain[{}]", frame % 3),
            kind: GpuResourceKind::Texture {
                width,
                height,
                format: TextureFormat::Rgb10A2,
            },
        }
    }

    #[inline]
    pub fn live_resources(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn peak_live_resources(&self) -> usize {
        self.peak_live
    }

    #[inline]
    pub fn total_created(&self) -> usize {
        self.total_created
    }
}

impl FgResourceFactory for FakeDevice {
    type Resource = GpuResource;

    fn destroy_resource(&mut self, name: &str, resource: GpuResource) {
        self.live -= 1;
        log::debug!("device: destroy #{} '{}'", resource.id, name);
    }
}

/// 2D 纹理创建参数
#[derive(Debug, Clone, Copy)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureDesc {
    pub fn new_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        Self { width, height, format }
    }
}

impl FgResourceDesc<FakeDevice> for TextureDesc {
    fn create_resource(&self, device: &mut FakeDevice, name: &str) -> GpuResource {
        device.allocate(
            name,
            GpuResourceKind::Texture {
                width: self.width,
                height: self.height,
                format: self.format,
            },
        )
    }
}

/// 缓冲区创建参数
#[derive(Debug, Clone, Copy)]
pub struct BufferDesc {
    pub size: u64,
}

impl FgResourceDesc<FakeDevice> for BufferDesc {
    fn create_resource(&self, device: &mut FakeDevice, name: &str) -> GpuResource {
        device.allocate(name, GpuResourceKind::Buffer { size: self.size })
    }
}

/// 命令列表：Pass 执行时往里录制命令
///
/// 在整个程序运行期间存活，frame graph 的 execute 闭包借用它。
#[derive(Default)]
pub struct CommandList {
    commands: RefCell<Vec<String>>,
}

impl CommandList {
    pub fn record(&self, pass: &str, command: impl AsRef<str>) {
        self.commands.borrow_mut().push(format!("[{}] {}", pass, command.as_ref()));
    }

    /// 取出本帧录制的所有命令
    pub fn submit(&self) -> Vec<String> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }
}
