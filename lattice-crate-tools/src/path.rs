use std::path::{Path, PathBuf};

/// 统一路径管理
///
/// 所有路径基于工作区根目录（通过 `CARGO_MANIFEST_DIR` 推导）。
///
/// # 使用示例
/// ```ignore
/// let config = LatticePath::crate_path("lattice-frame-app").join("frame_graph.toml");
/// ```
pub struct LatticePath {}

impl LatticePath {
    /// 获取工作区根目录
    pub fn workspace_path() -> PathBuf {
        // 本 crate 位于工作区根目录下一层
        let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
        manifest.parent().unwrap_or(manifest).to_path_buf()
    }

    pub fn target_path() -> PathBuf {
        Self::workspace_path().join("target")
    }

    /// 工作区根目录下某个 crate 的目录
    pub fn crate_path(name: &str) -> PathBuf {
        Self::workspace_path().join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_contains_tools_crate() {
        let tools = LatticePath::crate_path("lattice-crate-tools");
        assert!(tools.join("Cargo.toml").exists());
        assert!(LatticePath::target_path().starts_with(LatticePath::workspace_path()));
    }
}
