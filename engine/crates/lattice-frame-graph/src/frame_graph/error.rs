//! FrameGraph 编译错误

use std::fmt;

/// `FrameGraph::try_compile` 失败的原因
///
/// 只覆盖"图本身不合法"的情况；误用 API（过期句柄、读取自己的输出等）直接 panic。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FgCompileError {
    /// 存活的 Pass 读取了由被裁剪的 Pass 产出的内容
    DanglingRead {
        pass: String,
        resource: String,
        producer: String,
    },
    /// 导出的资源版本由被裁剪的 Pass 产出
    DanglingExport { resource: String, producer: String },
    /// 依赖图中存在环
    CyclicDependency { passes: Vec<String> },
}

impl fmt::Display for FgCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingRead {
                pass,
                resource,
                producer,
            } => write!(
                f,
                "pass '{}' reads '{}' whose content comes from culled pass '{}'",
                pass, resource, producer
            ),
            Self::DanglingExport { resource, producer } => {
                write!(f, "exported resource '{}' is produced by culled pass '{}'", resource, producer)
            }
            Self::CyclicDependency { passes } => {
                write!(f, "cyclic dependency between passes [{}]", passes.join(", "))
            }
        }
    }
}

impl std::error::Error for FgCompileError {}
