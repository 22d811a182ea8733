//! # Player 模块
//!
//! 角色播放器：维护激活姿势与手动覆盖，每次状态变化后重新计算可见性。
//!
//! ## 计算顺序
//!
//! ```text
//! baseLayers ──► 激活姿势（按激活顺序） ──► 手动覆盖
//!   (最低)                                   (最高)
//! ```
//!
//! 每一阶段的输出作为下一阶段的初始表。
//!
//! ## 冲突处理
//!
//! - [`CharacterPlayer::set_pose`]：移除与新姿势影响组有交集的已激活姿势
//! - [`CharacterPlayer::add_pose`]：直接叠加，不检查冲突
//!
//! 所有公开操作都是同步的，返回前完成状态修改与重新计算。

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::model::CharacterModel;
use crate::render::{SpriteBackend, SpriteDesc};
use crate::resolver::{VisibilityMap, affected_groups, calculate_states, resolve_pose};
use crate::state::PlayerState;

/// 角色播放器
///
/// # 使用示例
///
/// ```ignore
/// let model = CharacterModel::load("assets/Sherry/model.char.json")?;
/// let mut player = CharacterPlayer::new(model, HeadlessBackend::new());
///
/// player.set_pose("ArmL_Wave");
/// player.set_layer_visible("Facial/Sweat/Sweat01", true);
/// player.clear_group_overrides("Facial/Sweat");
/// player.reset_to_default();
/// ```
pub struct CharacterPlayer<B: SpriteBackend> {
    /// 角色模型（只读）
    model: CharacterModel,
    /// 渲染协作方
    backend: B,
    /// 图层 ID -> 精灵句柄
    sprites: HashMap<String, B::Handle>,
    /// 运行时状态
    state: PlayerState,
}

impl<B: SpriteBackend> CharacterPlayer<B> {
    /// 创建播放器
    ///
    /// 为每个图层创建精灵，随后执行一次 [`reset_to_default`](Self::reset_to_default)。
    pub fn new(model: CharacterModel, mut backend: B) -> Self {
        let mut sprites = HashMap::with_capacity(model.layers().len());
        for layer in model.layers() {
            let desc = SpriteDesc::from_layer(&model, layer);
            let handle = backend.create_sprite(&desc);
            // 重复 ID 时后者生效
            if let Some(replaced) = sprites.insert(layer.id.clone(), handle) {
                backend.release(replaced);
            }
        }

        let mut player = Self {
            model,
            backend,
            sprites,
            state: PlayerState::new(),
        };
        player.reset_to_default();
        player
    }

    /// 角色模型
    pub fn model(&self) -> &CharacterModel {
        &self.model
    }

    /// 渲染协作方
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// 运行时状态
    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// 激活的姿势（按激活顺序）
    pub fn active_poses(&self) -> &[String] {
        self.state.active_poses()
    }

    /// 姿势是否激活
    pub fn is_pose_active(&self, pose: &str) -> bool {
        self.state.is_active(pose)
    }

    /// 姿势影响的组
    pub fn affected_groups(&self, pose: &str) -> BTreeSet<String> {
        affected_groups(pose, self.model.poses())
    }

    /// 切换姿势，自动移除同组冲突的姿势
    ///
    /// 未知姿势被忽略。
    pub fn set_pose(&mut self, pose: &str) {
        if !self.model.has_pose(pose) {
            debug!(pose, "set_pose: 忽略未定义的姿势");
            return;
        }

        let new_groups = affected_groups(pose, self.model.poses());
        let poses = self.model.poses();
        let evicted = self
            .state
            .evict_poses(|active| !affected_groups(active, poses).is_disjoint(&new_groups));
        if !evicted.is_empty() {
            debug!(pose, evicted = ?evicted, "set_pose: 移除冲突姿势");
        }

        self.state.activate(pose);
        self.update();
    }

    /// 叠加姿势（不检查冲突）
    ///
    /// 未知姿势被忽略。
    pub fn add_pose(&mut self, pose: &str) {
        if !self.model.has_pose(pose) {
            debug!(pose, "add_pose: 忽略未定义的姿势");
            return;
        }

        self.state.activate(pose);
        self.update();
    }

    /// 移除姿势
    pub fn remove_pose(&mut self, pose: &str) {
        if !self.state.deactivate(pose) {
            debug!(pose, "remove_pose: 姿势未激活");
        }
        self.update();
    }

    /// 手动设置图层可见性，优先级高于所有姿势
    pub fn set_layer_visible(&mut self, layer_id: &str, visible: bool) {
        self.state.set_override(layer_id, visible);
        self.update();
    }

    /// 清除所有 ID 以 `group` 开头的手动覆盖
    pub fn clear_group_overrides(&mut self, group: &str) {
        let removed = self.state.clear_overrides_with_prefix(group);
        debug!(group, removed, "清除手动覆盖");
        self.update();
    }

    /// 重置为默认姿势，并清除所有手动覆盖
    ///
    /// 默认姿势整体载入，不做冲突移除。
    pub fn reset_to_default(&mut self) {
        self.state.clear();
        for pose in &self.model.controller.default_poses {
            self.state.activate(pose);
        }
        self.update();
    }

    /// 计算当前可见性表
    ///
    /// 纯派生值：基础图层 -> 激活姿势 -> 手动覆盖。
    pub fn visibility(&self) -> VisibilityMap {
        let layers = self.model.layers();

        let mut states = calculate_states(
            &self.model.controller.base_layers,
            layers,
            &VisibilityMap::new(),
        );

        for pose in self.state.active_poses() {
            let commands = resolve_pose(pose, self.model.poses());
            states = calculate_states(&commands, layers, &states);
        }

        for (id, visible) in self.state.manual_overrides() {
            states.insert(id.clone(), *visible);
        }

        states
    }

    /// 图层当前是否可见
    pub fn is_layer_visible(&self, layer_id: &str) -> bool {
        self.visibility().get(layer_id).copied().unwrap_or(false)
    }

    /// 释放所有精灵并清空状态
    ///
    /// 可重复调用；播放器析构时自动执行。
    pub fn teardown(&mut self) {
        for (_, handle) in self.sprites.drain() {
            self.backend.release(handle);
        }
        self.state.clear();
    }

    /// 重新计算并同步到精灵
    fn update(&mut self) {
        let states = self.visibility();

        let mut visible_count = 0;
        for (id, handle) in self.sprites.iter_mut() {
            let visible = states.get(id).copied().unwrap_or(false);
            if visible {
                visible_count += 1;
            }
            self.backend.set_visible(handle, visible);
        }
        self.backend.sort_children();

        debug!(
            active_poses = self.state.active_poses().len(),
            overrides = self.state.manual_overrides().len(),
            visible = visible_count,
            "图层可见性已更新"
        );
    }
}

impl<B: SpriteBackend> Drop for CharacterPlayer<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Layer;
    use crate::render::HeadlessBackend;

    fn model(
        layers: Vec<Layer>,
        base: &[&str],
        defaults: &[&str],
        poses: &[(&str, &[&str])],
    ) -> CharacterModel {
        let mut model = CharacterModel::default();
        model.assets.layers = layers;
        model.controller.base_layers = base.iter().map(|s| s.to_string()).collect();
        model.controller.default_poses = defaults.iter().map(|s| s.to_string()).collect();
        for (name, items) in poses {
            let items = items.iter().map(|s| s.to_string()).collect();
            model.controller.poses.insert(name.to_string(), items);
        }
        model
    }

    fn arm_model() -> CharacterModel {
        model(
            vec![Layer::new("Arm", "Up"), Layer::new("Arm", "Down")],
            &[],
            &[],
            &[("ArmUp", &["Arm>Up"]), ("ArmDown", &["Arm>Down"])],
        )
    }

    #[test]
    fn test_arm_scenario() {
        let mut player = CharacterPlayer::new(arm_model(), HeadlessBackend::new());

        player.set_pose("ArmUp");
        assert!(player.backend().is_visible("Arm/Up"));
        assert!(!player.backend().is_visible("Arm/Down"));

        player.set_pose("ArmDown");
        assert!(!player.backend().is_visible("Arm/Up"));
        assert!(player.backend().is_visible("Arm/Down"));
        assert_eq!(player.active_poses(), &["ArmDown".to_string()]);
    }

    #[test]
    fn test_base_layers_only() {
        let model = model(
            vec![Layer::new("Body", "Base"), Layer::new("Arm", "Up")],
            &["Body+Base"],
            &[],
            &[],
        );
        let player = CharacterPlayer::new(model, HeadlessBackend::new());

        let visible: Vec<String> = player
            .visibility()
            .into_iter()
            .filter(|(_, v)| *v)
            .map(|(id, _)| id)
            .collect();
        assert_eq!(visible, vec!["Body/Base"]);
        assert!(player.backend().is_visible("Body/Base"));
        assert!(!player.backend().is_visible("Arm/Up"));
    }

    #[test]
    fn test_unknown_pose_ignored() {
        let mut player = CharacterPlayer::new(arm_model(), HeadlessBackend::new());
        player.set_pose("ArmUp");

        player.set_pose("Nope");
        player.add_pose("Nope");
        player.remove_pose("Nope");

        assert_eq!(player.active_poses(), &["ArmUp".to_string()]);
        assert!(player.is_layer_visible("Arm/Up"));
    }

    #[test]
    fn test_add_pose_stacks_without_eviction() {
        let mut player = CharacterPlayer::new(arm_model(), HeadlessBackend::new());
        player.add_pose("ArmUp");
        player.add_pose("ArmDown");

        assert!(player.is_pose_active("ArmUp"));
        assert!(player.is_pose_active("ArmDown"));
        // 后激活的姿势覆盖前者
        assert!(player.is_layer_visible("Arm/Down"));
        assert!(!player.is_layer_visible("Arm/Up"));
    }

    #[test]
    fn test_remove_pose() {
        let mut player = CharacterPlayer::new(arm_model(), HeadlessBackend::new());
        player.set_pose("ArmUp");
        player.remove_pose("ArmUp");

        assert!(player.active_poses().is_empty());
        assert!(!player.backend().is_visible("Arm/Up"));
    }

    #[test]
    fn test_manual_override_wins() {
        let mut player = CharacterPlayer::new(arm_model(), HeadlessBackend::new());
        player.set_pose("ArmUp");
        player.set_layer_visible("Arm/Down", true);
        player.set_layer_visible("Arm/Up", false);

        player.set_pose("ArmUp");
        player.add_pose("ArmDown");
        player.remove_pose("ArmDown");

        assert!(player.backend().is_visible("Arm/Down"));
        assert!(!player.backend().is_visible("Arm/Up"));

        player.clear_group_overrides("Arm");
        assert!(player.backend().is_visible("Arm/Up"));
        assert!(!player.backend().is_visible("Arm/Down"));
    }

    #[test]
    fn test_reset_to_default() {
        let model = model(
            vec![Layer::new("Arm", "Up"), Layer::new("Arm", "Down")],
            &[],
            &["ArmDown"],
            &[("ArmUp", &["Arm>Up"]), ("ArmDown", &["Arm>Down"])],
        );
        let mut player = CharacterPlayer::new(model, HeadlessBackend::new());
        assert_eq!(player.active_poses(), &["ArmDown".to_string()]);

        player.set_pose("ArmUp");
        player.set_layer_visible("Arm/Down", true);
        player.reset_to_default();

        assert_eq!(player.active_poses(), &["ArmDown".to_string()]);
        assert!(player.state().manual_overrides().is_empty());
        assert!(player.backend().is_visible("Arm/Down"));
    }

    #[test]
    fn test_teardown_releases_sprites() {
        let mut player = CharacterPlayer::new(arm_model(), HeadlessBackend::new());
        player.set_pose("ArmUp");
        player.teardown();

        assert_eq!(player.backend().released_count(), 2);
        assert!(player.active_poses().is_empty());

        // 重复调用无副作用
        player.teardown();
        assert_eq!(player.backend().released_count(), 2);
    }

    #[test]
    fn test_update_sorts_children() {
        let mut player = CharacterPlayer::new(arm_model(), HeadlessBackend::new());
        let before = player.backend().sort_count();
        player.set_pose("ArmUp");
        assert_eq!(player.backend().sort_count(), before + 1);
    }

    #[test]
    fn test_duplicate_layer_id_releases_earlier_sprite() {
        let layers = vec![
            Layer::new("Arm", "Up"),
            Layer::new("Arm", "Up").with_order(9),
        ];
        let model = model(layers, &["Arm+Up"], &[], &[]);
        let player = CharacterPlayer::new(model, HeadlessBackend::new());

        let backend = player.backend();
        assert_eq!(backend.sprites().len(), 2);
        assert_eq!(backend.released_count(), 1);
        // 后出现的同 ID 精灵仍然存活并可见
        assert!(player.is_layer_visible("Arm/Up"));
        assert!(backend.is_visible("Arm/Up"));
        assert_eq!(backend.sprite("Arm/Up").map(|s| s.desc.z_index), Some(9));
        assert_eq!(backend.visible_in_draw_order(), vec!["Arm/Up"]);
    }
}
