//! # Headless 后端
//!
//! 不依赖任何渲染设备的 [`SpriteBackend`] 实现，记录每个精灵的描述与可见性。

use super::{SpriteBackend, SpriteDesc};

/// 记录的精灵
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessSprite {
    pub desc: SpriteDesc,
    pub visible: bool,
    pub released: bool,
}

/// 记录型后端
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    sprites: Vec<HeadlessSprite>,
    sort_count: usize,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有创建过的精灵（按创建顺序）
    pub fn sprites(&self) -> &[HeadlessSprite] {
        &self.sprites
    }

    /// 按图层 ID 查找精灵
    ///
    /// 同一 ID 创建过多次时返回最后创建的精灵。
    pub fn sprite(&self, layer_id: &str) -> Option<&HeadlessSprite> {
        self.sprites
            .iter()
            .rev()
            .find(|s| s.desc.layer_id == layer_id)
    }

    /// 图层是否可见（未创建或已释放视为不可见）
    pub fn is_visible(&self, layer_id: &str) -> bool {
        let sprite = self.sprite(layer_id);
        sprite.is_some_and(|s| s.visible && !s.released)
    }

    /// 当前可见的图层 ID，按绘制顺序排列
    pub fn visible_in_draw_order(&self) -> Vec<&str> {
        let mut visible: Vec<&HeadlessSprite> = self
            .sprites
            .iter()
            .filter(|s| s.visible && !s.released)
            .collect();
        // 稳定排序：同一 z_index 保持创建顺序
        visible.sort_by_key(|s| s.desc.z_index);
        visible.iter().map(|s| s.desc.layer_id.as_str()).collect()
    }

    /// 已释放的精灵数量
    pub fn released_count(&self) -> usize {
        self.sprites.iter().filter(|s| s.released).count()
    }

    /// 排序钩子被调用的次数
    pub fn sort_count(&self) -> usize {
        self.sort_count
    }
}

impl SpriteBackend for HeadlessBackend {
    type Handle = usize;

    fn create_sprite(&mut self, desc: &SpriteDesc) -> usize {
        self.sprites.push(HeadlessSprite {
            desc: desc.clone(),
            visible: false,
            released: false,
        });
        self.sprites.len() - 1
    }

    fn set_visible(&mut self, handle: &mut usize, visible: bool) {
        if let Some(sprite) = self.sprites.get_mut(*handle) {
            sprite.visible = visible;
        }
    }

    fn release(&mut self, handle: usize) {
        if let Some(sprite) = self.sprites.get_mut(handle) {
            sprite.visible = false;
            sprite.released = true;
        }
    }

    fn sort_children(&mut self) {
        self.sort_count += 1;
    }
}
