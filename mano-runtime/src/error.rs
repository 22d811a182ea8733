//! # Error 模块
//!
//! 定义 mano-runtime 中使用的错误类型。
//!
//! 注意：图层解析与播放器操作本身**不返回错误**（畸形指令视为空操作、
//! 未知姿势被忽略），只有角色模型文档的读取和解析会失败。

use thiserror::Error;

/// 角色模型加载错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// 无法读取模型文件
    #[error("无法读取模型文件 '{path}': {message}")]
    Read { path: String, message: String },

    /// 字节数据不是合法的 UTF-8
    #[error("模型数据不是合法的 UTF-8: {message}")]
    InvalidUtf8 { message: String },

    /// JSON 结构不符合角色模型格式
    #[error("无法解析模型 JSON（第 {line} 行第 {column} 列）: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        }
    }
}

/// Result 类型别名
pub type ModelResult<T> = Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_keeps_position() {
        let err: ModelError = serde_json::from_str::<serde_json::Value>("{\n  \"a\": }")
            .unwrap_err()
            .into();

        match err {
            ModelError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = ModelError::Read {
            path: "model.char.json".to_string(),
            message: "not found".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("model.char.json"));
        assert!(display.contains("not found"));
    }
}
