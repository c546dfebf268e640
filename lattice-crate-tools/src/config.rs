//! TOML 配置加载

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

/// 从 TOML 文件加载配置
pub fn load_toml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> anyhow::Result<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).with_context(|| format!("读取配置文件失败: {:?}", path))?;
    toml::from_str(&content).with_context(|| format!("解析 TOML 配置失败: {:?}", path))
}

/// 从 TOML 文件加载配置，文件不存在时使用默认值
///
/// 文件存在但内容非法时仍然返回错误。
pub fn load_toml_or_default<T: DeserializeOwned + Default, P: AsRef<Path>>(path: P) -> anyhow::Result<T> {
    let path = path.as_ref();
    if !path.exists() {
        log::info!("配置文件不存在，使用默认配置: {:?}", path);
        return Ok(T::default());
    }
    load_toml(path)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Sample {
        frames: u32,
        name: String,
    }

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("lattice-config-{}-{}.toml", std::process::id(), name));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_uses_default() {
        let path = std::env::temp_dir().join("lattice-config-does-not-exist.toml");
        let sample: Sample = load_toml_or_default(&path).unwrap();
        assert_eq!(sample, Sample::default());
        assert!(load_toml::<Sample, _>(&path).is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let path = temp_file("partial", "frames = 3\n");
        let sample: Sample = load_toml_or_default(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(sample.frames, 3);
        assert!(sample.name.is_empty());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let path = temp_file("invalid", "frames = \"three\"\n");
        let result = load_toml_or_default::<Sample, _>(&path);
        fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("解析 TOML 配置失败"));
    }
}
