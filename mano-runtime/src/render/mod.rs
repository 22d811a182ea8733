//! # Render 模块
//!
//! 渲染协作方的接口边界。
//!
//! 运行时只决定每个图层“是否可见”，纹理加载、混合与绘制都由实现
//! [`SpriteBackend`] 的宿主负责。
//!
//! - [`SpriteDesc`]：创建精灵所需的描述（地址、绘制顺序、混合模式）
//! - [`BlendMode`]：由图层名推导的混合模式
//! - [`HeadlessBackend`]：无渲染设备的记录型实现，用于测试与命令行

pub mod headless;

pub use headless::{HeadlessBackend, HeadlessSprite};

use crate::model::{CharacterModel, Layer};

/// 混合模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// 默认合成
    #[default]
    Normal,
    /// 叠加
    Overlay,
    /// 柔光
    SoftLight,
    /// 正片叠底
    Multiply,
}

impl BlendMode {
    /// 由图层名推导混合模式（不区分大小写，按 overlay / softlight / multiply 顺序匹配）
    pub fn from_layer_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("overlay") {
            Self::Overlay
        } else if name.contains("softlight") {
            Self::SoftLight
        } else if name.contains("multiply") {
            Self::Multiply
        } else {
            Self::Normal
        }
    }
}

impl std::fmt::Display for BlendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Overlay => write!(f, "overlay"),
            Self::SoftLight => write!(f, "softlight"),
            Self::Multiply => write!(f, "multiply"),
        }
    }
}

/// 精灵描述，构造时由图层一次性推导
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteDesc {
    /// 图层 ID
    pub layer_id: String,
    /// 解析后的图片地址
    pub url: String,
    /// 绘制顺序
    pub z_index: i32,
    /// 混合模式
    pub blend_mode: BlendMode,
}

impl SpriteDesc {
    /// 从模型中的图层构造描述
    pub fn from_layer(model: &CharacterModel, layer: &Layer) -> Self {
        Self {
            layer_id: layer.id.clone(),
            url: model.asset_url(layer),
            z_index: layer.order,
            blend_mode: BlendMode::from_layer_name(&layer.name),
        }
    }
}

/// 渲染协作方
///
/// 所有方法都是同步的；纹理在播放器构造前应已就绪。
pub trait SpriteBackend {
    /// 精灵句柄
    type Handle;

    /// 为图层创建精灵，初始为不可见
    fn create_sprite(&mut self, desc: &SpriteDesc) -> Self::Handle;

    /// 设置精灵可见性
    fn set_visible(&mut self, handle: &mut Self::Handle, visible: bool);

    /// 释放精灵
    fn release(&mut self, _handle: Self::Handle) {}

    /// 可见性更新后按绘制顺序重新排序
    fn sort_children(&mut self) {}
}
