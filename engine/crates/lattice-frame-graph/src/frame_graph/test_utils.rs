//! 测试用的假资源工厂
//!
//! 记录每一次 construct / destroy，用于断言资源的生命周期。

use super::resource::{FgResourceDesc, FgResourceFactory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeResource {
    pub id: u32,
    pub name: String,
}

#[derive(Default)]
pub struct FakeFactory {
    next_id: u32,
    /// 按顺序记录 construct 的资源名称
    pub constructed: Vec<String>,
    /// 按顺序记录 destroy 的资源名称
    pub destroyed: Vec<String>,
}

impl FakeFactory {
    /// 直接产出一个资源，不计入 `constructed`
    pub fn make(&mut self, name: &str) -> FakeResource {
        self.next_id += 1;
        FakeResource {
            id: self.next_id,
            name: name.to_string(),
        }
    }
}

impl FgResourceFactory for FakeFactory {
    type Resource = FakeResource;

    fn destroy_resource(&mut self, name: &str, _resource: FakeResource) {
        self.destroyed.push(name.to_string());
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FakeTexture {
    pub width: u32,
    pub height: u32,
}

impl FakeTexture {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl FgResourceDesc<FakeFactory> for FakeTexture {
    fn create_resource(&self, factory: &mut FakeFactory, name: &str) -> FakeResource {
        factory.constructed.push(name.to_string());
        factory.make(name)
    }
}
