use serde::Deserialize;

/// FrameGraph 行为开关
///
/// 通常从应用的 toml 配置中读取，缺省字段取默认值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FgSettings {
    /// 是否裁剪没有消费者的 Pass
    ///
    /// 关闭后所有声明的 Pass 都会执行，便于调试。
    pub cull_passes: bool,
    /// compile 成功后是否打印执行计划
    pub log_execution_plan: bool,
}

impl Default for FgSettings {
    fn default() -> Self {
        Self {
            cull_passes: true,
            log_execution_plan: false,
        }
    }
}
