//! # State 模块
//!
//! 播放器的可变运行时状态。
//!
//! ## 设计原则
//!
//! - 只保存两个容器：激活的姿势与手动覆盖
//! - 当前可见性是**派生值**，每次由状态重新计算，从不单独保存

use std::collections::BTreeMap;

/// 播放器运行时状态
///
/// `active_poses` 语义上是集合，但保留插入顺序，
/// 使重叠姿势（通过 `add_pose` 叠加）的应用顺序可预测。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerState {
    active_poses: Vec<String>,
    manual_overrides: BTreeMap<String, bool>,
}

impl PlayerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 激活的姿势（按激活顺序）
    pub fn active_poses(&self) -> &[String] {
        &self.active_poses
    }

    /// 手动覆盖
    pub fn manual_overrides(&self) -> &BTreeMap<String, bool> {
        &self.manual_overrides
    }

    /// 姿势是否激活
    pub fn is_active(&self, pose: &str) -> bool {
        self.active_poses.iter().any(|p| p == pose)
    }

    /// 激活姿势；已激活时保持原位置，返回 false
    pub fn activate(&mut self, pose: &str) -> bool {
        if self.is_active(pose) {
            return false;
        }
        self.active_poses.push(pose.to_string());
        true
    }

    /// 取消激活；未激活时返回 false
    pub fn deactivate(&mut self, pose: &str) -> bool {
        let before = self.active_poses.len();
        self.active_poses.retain(|p| p != pose);
        self.active_poses.len() != before
    }

    /// 移除所有满足条件的姿势，返回被移除的姿势
    pub fn evict_poses(&mut self, mut predicate: impl FnMut(&str) -> bool) -> Vec<String> {
        let mut evicted = Vec::new();
        self.active_poses.retain(|p| {
            if predicate(p.as_str()) {
                evicted.push(p.clone());
                false
            } else {
                true
            }
        });
        evicted
    }

    /// 设置手动覆盖（新建或覆盖）
    pub fn set_override(&mut self, layer_id: &str, visible: bool) {
        self.manual_overrides.insert(layer_id.to_string(), visible);
    }

    /// 移除所有以 `prefix` 开头的手动覆盖，返回移除数量
    ///
    /// 按字符串前缀匹配：`"Arm"` 同样会匹配 `"Armor/Plate"`。
    pub fn clear_overrides_with_prefix(&mut self, prefix: &str) -> usize {
        let overrides = &mut self.manual_overrides;
        let before = overrides.len();
        overrides.retain(|id, _| !id.starts_with(prefix));
        before - overrides.len()
    }

    /// 清空全部状态
    pub fn clear(&mut self) {
        self.active_poses.clear();
        self.manual_overrides.clear();
    }
}
