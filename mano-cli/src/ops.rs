//! # 播放器操作
//!
//! 命令行中 `--op` 参数的解析与执行，按给出的顺序依次作用于播放器。
//!
//! ```text
//! set:<pose>      set_pose
//! add:<pose>      add_pose
//! remove:<pose>   remove_pose
//! show:<layer>    set_layer_visible(layer, true)
//! hide:<layer>    set_layer_visible(layer, false)
//! clear:<group>   clear_group_overrides
//! reset           reset_to_default
//! ```

use std::str::FromStr;

use mano_runtime::{CharacterPlayer, SpriteBackend};

/// 单个播放器操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerOp {
    SetPose(String),
    AddPose(String),
    RemovePose(String),
    Show(String),
    Hide(String),
    ClearGroup(String),
    Reset,
}

impl PlayerOp {
    /// 作用于播放器
    pub fn apply<B: SpriteBackend>(&self, player: &mut CharacterPlayer<B>) {
        match self {
            Self::SetPose(pose) => player.set_pose(pose),
            Self::AddPose(pose) => player.add_pose(pose),
            Self::RemovePose(pose) => player.remove_pose(pose),
            Self::Show(layer) => player.set_layer_visible(layer, true),
            Self::Hide(layer) => player.set_layer_visible(layer, false),
            Self::ClearGroup(group) => player.clear_group_overrides(group),
            Self::Reset => player.reset_to_default(),
        }
    }
}

impl FromStr for PlayerOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "reset" {
            return Ok(Self::Reset);
        }

        let (kind, arg) = s
            .split_once(':')
            .ok_or_else(|| format!("无效的操作 '{}'，应为 <kind>:<arg> 或 reset", s))?;
        if arg.is_empty() {
            return Err(format!("操作 '{}' 缺少参数", kind));
        }

        let arg = arg.to_string();
        match kind {
            "set" => Ok(Self::SetPose(arg)),
            "add" => Ok(Self::AddPose(arg)),
            "remove" => Ok(Self::RemovePose(arg)),
            "show" => Ok(Self::Show(arg)),
            "hide" => Ok(Self::Hide(arg)),
            "clear" => Ok(Self::ClearGroup(arg)),
            other => Err(format!(
                "未知操作 '{}'，可用：set/add/remove/show/hide/clear/reset",
                other
            )),
        }
    }
}
