//! # Model 模块
//!
//! 角色模型文档（`*.char.json`）的数据结构与加载。
//!
//! 角色模型由编辑器导出，运行时只读：
//!
//! ```text
//! {
//!   "version": "1.0",
//!   "metadata": { "name": "Sherry" },
//!   "settings": { "basePath": "assets/Sherry" },
//!   "assets": { "layers": [ { "id": "Arm/Up", "group": "Arm", "name": "Up", "order": 3, "path": "arm_up.png" } ] },
//!   "controller": {
//!     "baseLayers": ["Body+Base"],
//!     "defaultPoses": ["ArmDown"],
//!     "poses": { "ArmUp": ["Arm>Up"], "ArmDown": ["Arm>Down"] }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::diagnostic::{DiagnosticLevel, analyze_model};
use crate::error::{ModelError, ModelResult};
use crate::path::resolve_asset_url;

/// 姿势表：姿势名 -> 原始条目列表（指令字符串或其他姿势名）
pub type PoseTable = HashMap<String, Vec<String>>;

/// 图层
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    /// 唯一 ID，约定为 `group/name`（加载时不强制）
    pub id: String,
    /// 所属组
    pub group: String,
    /// 组内名称
    pub name: String,
    /// 绘制顺序（仅供渲染层使用）
    #[serde(default)]
    pub order: i32,
    /// 图片路径（仅供渲染层使用）
    #[serde(default)]
    pub path: String,
}

impl Layer {
    /// 按 `group/name` 约定创建图层
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        let group = group.into();
        let name = name.into();
        Self {
            id: format!("{group}/{name}"),
            group,
            name,
            order: 0,
            path: String::new(),
        }
    }

    /// 设置绘制顺序
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// 设置图片路径
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// 按约定应得的 ID
    pub fn conventional_id(&self) -> String {
        format!("{}/{}", self.group, self.name)
    }

    /// ID 是否符合 `group/name` 约定
    pub fn has_conventional_id(&self) -> bool {
        self.id == self.conventional_id()
    }
}

/// 元数据
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// 资源设置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSettings {
    /// 图片路径的基准目录或 URL
    #[serde(default)]
    pub base_path: String,
}

/// 资源表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAssets {
    #[serde(default)]
    pub layers: Vec<Layer>,
}

/// 控制器配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Controller {
    /// 常驻基础图层指令，最先应用
    #[serde(default)]
    pub base_layers: Vec<String>,
    /// 重置后默认激活的姿势
    #[serde(default)]
    pub default_poses: Vec<String>,
    /// 姿势表
    #[serde(default)]
    pub poses: PoseTable,
}

/// 角色模型
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterModel {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub metadata: ModelMetadata,
    #[serde(default)]
    pub settings: ModelSettings,
    #[serde(default)]
    pub assets: ModelAssets,
    #[serde(default)]
    pub controller: Controller,
}

impl CharacterModel {
    /// 从文件加载模型
    pub fn load(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ModelError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_json_str(&content)
    }

    /// 从字节数据加载模型
    pub fn load_from_bytes(bytes: &[u8]) -> ModelResult<Self> {
        let content = std::str::from_utf8(bytes).map_err(|e| ModelError::InvalidUtf8 {
            message: e.to_string(),
        })?;

        Self::from_json_str(content)
    }

    /// 从 JSON 字符串解析模型
    pub fn from_json_str(json: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 加载模型并检查，通过日志输出警告与错误
    ///
    /// 检查结果不影响加载：运行时对不一致的文档保持宽容。
    pub fn load_and_validate(path: impl AsRef<Path>) -> ModelResult<Self> {
        let model = Self::load(path)?;

        let result = analyze_model(&model);
        for diag in result.filter_by_level(DiagnosticLevel::Warn) {
            warn!(diagnostic = %diag, "角色模型检查");
        }
        info!(
            name = %model.metadata.name,
            layers = model.assets.layers.len(),
            poses = model.controller.poses.len(),
            "角色模型加载完成"
        );

        Ok(model)
    }

    /// 所有图层
    pub fn layers(&self) -> &[Layer] {
        &self.assets.layers
    }

    /// 按 ID 查找图层
    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.assets.layers.iter().find(|l| l.id == id)
    }

    /// 组内所有图层
    pub fn layers_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Layer> + 'a {
        self.assets.layers.iter().filter(move |l| l.group == group)
    }

    /// 姿势表
    pub fn poses(&self) -> &PoseTable {
        &self.controller.poses
    }

    /// 是否定义了该姿势
    pub fn has_pose(&self, name: &str) -> bool {
        self.controller.poses.contains_key(name)
    }

    /// 图层图片的完整地址（`settings.basePath` + `path`）
    pub fn asset_url(&self, layer: &Layer) -> String {
        resolve_asset_url(&self.settings.base_path, &layer.path)
    }
}
