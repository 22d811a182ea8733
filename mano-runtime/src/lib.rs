//! # Mano Runtime
//!
//! 分层立绘（差分图层）角色的运行时核心库。
//!
//! ## 架构概述
//!
//! `mano-runtime` 读取编辑器导出的角色模型，决定每个图层此刻是否可见。
//! 纹理加载与绘制由宿主通过 [`SpriteBackend`] 完成：
//!
//! ```text
//! CharacterModel ──► Resolver（纯函数） ──► CharacterPlayer（状态） ──► SpriteBackend
//! ```
//!
//! ## 核心类型
//!
//! - [`LayerCommand`]：图层显隐指令（`+` / `-` / `>`）
//! - [`CharacterModel`]：角色模型文档
//! - [`CharacterPlayer`]：维护激活姿势与手动覆盖的播放器
//! - [`VisibilityMap`]：图层 ID -> 是否可见
//!
//! ## 使用示例
//!
//! ```ignore
//! use mano_runtime::{CharacterModel, CharacterPlayer, HeadlessBackend};
//!
//! let model = CharacterModel::load_and_validate("assets/Sherry/model.char.json")?;
//! let mut player = CharacterPlayer::new(model, HeadlessBackend::new());
//!
//! player.set_pose("Smile");
//! player.set_pose("ArmL_Wave");
//! player.set_layer_visible("Facial/Sweat/Sweat01", true);
//!
//! for id in player.backend().visible_in_draw_order() {
//!     println!("{id}");
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`command`]：指令语法与解析
//! - [`resolver`]：姿势展开与指令合并
//! - [`model`]：角色模型文档
//! - [`state`]：播放器运行时状态
//! - [`player`]：播放器
//! - [`render`]：渲染协作方接口
//! - [`diagnostic`]：模型静态检查
//! - [`path`]：图片地址解析
//! - [`error`]：错误类型定义

pub mod command;
pub mod diagnostic;
pub mod error;
pub mod model;
pub mod path;
pub mod player;
pub mod render;
pub mod resolver;
pub mod state;

// 重导出核心类型
pub use command::{LayerCommand, LayerOp, parse_command};
pub use diagnostic::{
    Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_model, find_cyclic_poses, group_names,
    pose_names,
};
pub use error::{ModelError, ModelResult};
pub use model::{
    CharacterModel, Controller, Layer, ModelAssets, ModelMetadata, ModelSettings, PoseTable,
};
pub use path::resolve_asset_url;
pub use player::CharacterPlayer;
pub use render::{BlendMode, HeadlessBackend, HeadlessSprite, SpriteBackend, SpriteDesc};
pub use resolver::{
    VisibilityMap, affected_groups, calculate_states, resolve_pose, resolve_pose_with, visible_ids,
};
pub use state::PlayerState;
