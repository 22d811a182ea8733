//! # Resolver 模块
//!
//! 纯函数层：姿势展开与指令合并，不持有任何状态。
//!
//! ```text
//! 姿势名 ──resolve_pose──► 原始指令列表 ──calculate_states──► VisibilityMap
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::trace;

use crate::command::{LayerCommand, LayerOp};
use crate::model::{Layer, PoseTable};

/// 图层可见性表：图层 ID -> 是否可见
///
/// 未出现的 ID 视为不可见。
pub type VisibilityMap = BTreeMap<String, bool>;

/// 将姿势展开为扁平的原始指令列表
///
/// 条目若是已定义的姿势名则递归展开，否则按字面指令追加。
/// 顺序为定义顺序、深度优先。
///
/// 每个姿势在一次展开中最多贡献一次：自引用与循环引用都会被截断。
pub fn resolve_pose(pose_name: &str, poses: &PoseTable) -> Vec<String> {
    let mut visited = HashSet::new();
    resolve_pose_with(pose_name, poses, &mut visited)
}

/// 带访问集合的姿势展开
///
/// `visited` 在所有分支间共享，跨分支的循环同样会被截断。
pub fn resolve_pose_with(
    pose_name: &str,
    poses: &PoseTable,
    visited: &mut HashSet<String>,
) -> Vec<String> {
    if visited.contains(pose_name) {
        return Vec::new();
    }
    let Some(items) = poses.get(pose_name) else {
        return Vec::new();
    };
    visited.insert(pose_name.to_string());

    let mut commands = Vec::new();
    for item in items {
        if poses.contains_key(item) {
            commands.extend(resolve_pose_with(item, poses, visited));
        } else {
            commands.push(item.clone());
        }
    }
    commands
}

/// 按顺序合并指令，得到新的可见性表
///
/// 从 `initial` 的副本开始，后面的指令覆盖前面的指令。
/// 不修改 `layers` 与 `initial`，可用于分阶段串联。
pub fn calculate_states<S: AsRef<str>>(
    commands: &[S],
    layers: &[Layer],
    initial: &VisibilityMap,
) -> VisibilityMap {
    let mut states = initial.clone();

    for raw in commands {
        let raw = raw.as_ref();
        let cmd = LayerCommand::parse(raw);
        if cmd.is_noop() {
            trace!(command = raw, "跳过无效指令");
            continue;
        }
        apply_command(&cmd, layers, &mut states);
    }

    states
}

/// 应用单条已解析指令
fn apply_command(cmd: &LayerCommand, layers: &[Layer], states: &mut VisibilityMap) {
    if cmd.is_group_clear() {
        for layer in layers.iter().filter(|l| l.group == cmd.group) {
            states.insert(layer.id.clone(), false);
        }
        return;
    }

    match cmd.op {
        LayerOp::Show => {
            states.insert(cmd.layer_id(), true);
        }
        LayerOp::Hide => {
            states.insert(cmd.layer_id(), false);
        }
        LayerOp::Select => {
            // 按当前图层列表整体决定组内成员
            for layer in layers.iter().filter(|l| l.group == cmd.group) {
                states.insert(layer.id.clone(), layer.name == cmd.name);
            }
        }
    }
}

/// 姿势影响的组集合（用于冲突检测）
///
/// 收集 `+`、`>` 以及整组关闭指令的组名。带名称的 `-` 不计入。
pub fn affected_groups(pose_name: &str, poses: &PoseTable) -> BTreeSet<String> {
    resolve_pose(pose_name, poses)
        .iter()
        .map(|raw| LayerCommand::parse(raw))
        .filter(|cmd| !cmd.is_noop() && cmd.claims_group())
        .map(|cmd| cmd.group)
        .collect()
}

/// 可见图层 ID 列表（按 ID 排序）
pub fn visible_ids(states: &VisibilityMap) -> Vec<&str> {
    states
        .iter()
        .filter(|(_, visible)| **visible)
        .map(|(id, _)| id.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poses(entries: &[(&str, &[&str])]) -> PoseTable {
        entries
            .iter()
            .map(|(name, items)| {
                (
                    name.to_string(),
                    items.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect()
    }

    fn arm_layers() -> Vec<Layer> {
        vec![
            Layer::new("G", "a"),
            Layer::new("G", "b"),
            Layer::new("G", "c"),
            Layer::new("H", "x"),
        ]
    }

    #[test]
    fn test_resolve_flat_pose() {
        let table = poses(&[("Smile", &["Mouth>Smile", "Eyes>Open"])]);
        assert_eq!(
            resolve_pose("Smile", &table),
            vec!["Mouth>Smile", "Eyes>Open"]
        );
    }

    #[test]
    fn test_resolve_nested_pose_keeps_order() {
        let table = poses(&[
            ("Happy", &["Blush+On", "Smile", "Sweat-"]),
            ("Smile", &["Mouth>Smile", "Eyes>Closed"]),
        ]);
        assert_eq!(
            resolve_pose("Happy", &table),
            vec!["Blush+On", "Mouth>Smile", "Eyes>Closed", "Sweat-"]
        );
    }

    #[test]
    fn test_resolve_unknown_pose() {
        let table = poses(&[("A", &["x+y"])]);
        assert!(resolve_pose("Missing", &table).is_empty());
    }

    #[test]
    fn test_resolve_mutual_cycle_terminates() {
        let table = poses(&[("A", &["B"]), ("B", &["A"])]);
        assert!(resolve_pose("A", &table).is_empty());
    }

    #[test]
    fn test_resolve_self_reference() {
        let table = poses(&[("A", &["A", "x"])]);
        assert_eq!(resolve_pose("A", &table), vec!["x"]);
    }

    #[test]
    fn test_resolve_shared_subpose_expands_once() {
        let table = poses(&[
            ("Root", &["Left", "Right"]),
            ("Left", &["Common", "L+1"]),
            ("Right", &["Common", "R+1"]),
            ("Common", &["C+1"]),
        ]);
        assert_eq!(resolve_pose("Root", &table), vec!["C+1", "L+1", "R+1"]);
    }

    #[test]
    fn test_resolve_cycle_with_payload() {
        let table = poses(&[("A", &["a+1", "B"]), ("B", &["b+1", "A", "b+2"])]);
        assert_eq!(resolve_pose("A", &table), vec!["a+1", "b+1", "b+2"]);
    }

    #[test]
    fn test_show_and_hide() {
        let layers = arm_layers();
        let states = calculate_states(&["G+a", "H-x"], &layers, &VisibilityMap::new());
        assert_eq!(states.get("G/a"), Some(&true));
        assert_eq!(states.get("H/x"), Some(&false));
        assert_eq!(states.get("G/b"), None);
    }

    #[test]
    fn test_last_write_wins() {
        let layers = arm_layers();
        let empty = VisibilityMap::new();
        let pairs = [
            ("G+a", "G-a"),
            ("G-a", "G+a"),
            ("G+a", "G+a"),
            ("G-a", "G-a"),
        ];

        for (c1, c2) in pairs {
            let both = calculate_states(&[c1, c2], &layers, &empty);
            let last = calculate_states(&[c2], &layers, &empty);
            assert_eq!(both.get("G/a"), last.get("G/a"), "{c1} then {c2}");
        }
    }

    #[test]
    fn test_exclusive_select_ignores_prior_state() {
        let layers = arm_layers();
        let prior: VisibilityMap = [("G/a", true), ("G/b", false), ("G/c", true), ("H/x", true)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let states = calculate_states(&["G>b"], &layers, &prior);
        assert_eq!(states.get("G/a"), Some(&false));
        assert_eq!(states.get("G/b"), Some(&true));
        assert_eq!(states.get("G/c"), Some(&false));
        // 其他组不受影响
        assert_eq!(states.get("H/x"), Some(&true));
    }

    #[test]
    fn test_group_clear() {
        let layers = arm_layers();
        let states = calculate_states(&["G+a", "G+b", "G+c", "G-"], &layers, &VisibilityMap::new());
        assert_eq!(states.get("G/a"), Some(&false));
        assert_eq!(states.get("G/b"), Some(&false));
        assert_eq!(states.get("G/c"), Some(&false));
    }

    #[test]
    fn test_malformed_commands_skipped() {
        let layers = arm_layers();
        let states = calculate_states(
            &["garbage", "", "+x", "G+a"],
            &layers,
            &VisibilityMap::new(),
        );
        assert_eq!(states.len(), 1);
        assert_eq!(states.get("G/a"), Some(&true));
    }

    #[test]
    fn test_initial_not_mutated() {
        let layers = arm_layers();
        let initial: VisibilityMap = [("G/a".to_string(), true)].into_iter().collect();
        let states = calculate_states(&["G-a"], &layers, &initial);

        assert_eq!(initial.get("G/a"), Some(&true));
        assert_eq!(states.get("G/a"), Some(&false));
    }

    #[test]
    fn test_select_unknown_name_hides_group() {
        let layers = arm_layers();
        let states = calculate_states(&["G+a", "G>zzz"], &layers, &VisibilityMap::new());
        assert_eq!(states.get("G/a"), Some(&false));
        assert_eq!(states.get("G/zzz"), None);
    }

    #[test]
    fn test_select_matches_group_and_name_not_id() {
        // ID 不符合约定时，`>` 仍按 group/name 匹配，而 `+` 按合成 ID 写入
        let layers = vec![Layer {
            id: "custom-id".to_string(),
            ..Layer::new("G", "a")
        }];

        let selected = calculate_states(&["G>a"], &layers, &VisibilityMap::new());
        assert_eq!(selected.get("custom-id"), Some(&true));

        let shown = calculate_states(&["G+a"], &layers, &VisibilityMap::new());
        assert_eq!(shown.get("custom-id"), None);
        assert_eq!(shown.get("G/a"), Some(&true));
    }

    #[test]
    fn test_affected_groups() {
        let wave = ["ArmL>Wave", "Hand+Open", "Sleeve-", "Sweat-Drop", "noise"];
        let table = poses(&[("Wave", &wave)]);
        let groups = affected_groups("Wave", &table);
        let expected: BTreeSet<String> = ["ArmL", "Hand", "Sleeve"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(groups, expected);
    }

    #[test]
    fn test_visible_ids() {
        let layers = arm_layers();
        let states = calculate_states(&["G>b", "H+x"], &layers, &VisibilityMap::new());
        assert_eq!(visible_ids(&states), vec!["G/b", "H/x"]);
    }

    #[test]
    fn test_select_snapshot() {
        let layers = arm_layers();
        let states = calculate_states(&["G>c", "H-"], &layers, &VisibilityMap::new());
        insta::assert_yaml_snapshot!(states, @r"
        G/a: false
        G/b: false
        G/c: true
        H/x: false
        ");
    }
}
