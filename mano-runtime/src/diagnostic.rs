//! # 诊断模块
//!
//! 提供角色模型的静态检查 API，不依赖 IO 或渲染。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 检查结果只用于报告，运行时对不一致的文档保持宽容

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::command::{LayerCommand, LayerOp};
use crate::model::{CharacterModel, PoseTable};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 诊断对象（如 `layers[3]`、`poses.ArmUp`、`controller.baseLayers`）
    pub subject: String,
    /// 诊断消息
    pub message: String,
    /// 诊断详情（可选，如原始指令）
    pub detail: Option<String>,
}

impl Diagnostic {
    /// 创建错误诊断
    pub fn error(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, subject, message)
    }

    /// 创建警告诊断
    pub fn warn(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warn, subject, message)
    }

    /// 创建信息诊断
    pub fn info(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, subject, message)
    }

    fn with_level(
        level: DiagnosticLevel,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            subject: subject.into(),
            message: message.into(),
            detail: None,
        }
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.subject, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    /// 创建空结果
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加诊断
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// 获取错误数量
    pub fn error_count(&self) -> usize {
        self.count_level(DiagnosticLevel::Error)
    }

    /// 获取警告数量
    pub fn warn_count(&self) -> usize {
        self.count_level(DiagnosticLevel::Warn)
    }

    fn count_level(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 按级别过滤
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }
}

//=============================================================================
// 模型分析 API
//=============================================================================

/// 指令检查所需的图层索引
struct LayerIndex<'a> {
    ids: HashSet<&'a str>,
    groups: HashSet<&'a str>,
}

impl<'a> LayerIndex<'a> {
    fn new(model: &'a CharacterModel) -> Self {
        Self {
            ids: model.layers().iter().map(|l| l.id.as_str()).collect(),
            groups: model.layers().iter().map(|l| l.group.as_str()).collect(),
        }
    }
}

/// 分析角色模型，返回诊断结果
///
/// 执行以下检查：
/// - 重复的图层 ID（Error）
/// - 图层 ID 不符合 `group/name` 约定（Warn）
/// - `defaultPoses` 引用未定义的姿势（Error）
/// - 无法解析的指令、指向不存在的组或图层的指令（Warn）
/// - 姿势间的循环引用（Info，运行时会截断）
pub fn analyze_model(model: &CharacterModel) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    let index = LayerIndex::new(model);

    check_layers(model, &mut result);

    for (i, pose) in model.controller.default_poses.iter().enumerate() {
        if !model.has_pose(pose) {
            result.push(Diagnostic::error(
                format!("controller.defaultPoses[{}]", i),
                format!("默认姿势 '{}' 未定义", pose),
            ));
        }
    }

    for raw in &model.controller.base_layers {
        check_command(raw, "controller.baseLayers", &index, &mut result);
    }

    for name in pose_names(model) {
        let subject = format!("poses.{}", name);
        for item in &model.controller.poses[name] {
            if model.has_pose(item) {
                continue;
            }
            check_command(item, &subject, &index, &mut result);
        }
    }

    for name in find_cyclic_poses(model.poses()) {
        result.push(
            Diagnostic::info(format!("poses.{}", name), "姿势处于循环引用中")
                .with_detail("展开时重复出现的姿势会被忽略"),
        );
    }

    result
}

/// 检查图层表
fn check_layers(model: &CharacterModel, result: &mut DiagnosticResult) {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();

    for (i, layer) in model.layers().iter().enumerate() {
        let subject = format!("layers[{}]", i);

        if let Some(first) = first_seen.get(layer.id.as_str()) {
            result.push(
                Diagnostic::error(&subject, format!("图层 ID '{}' 重复", layer.id))
                    .with_detail(format!("首次出现于 layers[{}]", first)),
            );
        } else {
            first_seen.insert(&layer.id, i);
        }

        if !layer.has_conventional_id() {
            result.push(
                Diagnostic::warn(
                    &subject,
                    format!(
                        "图层 ID '{}' 与 group/name 不一致，应为 '{}'",
                        layer.id,
                        layer.conventional_id()
                    ),
                )
                .with_detail("`+`/`-` 指令按 group/name 合成 ID，将无法作用于该图层"),
            );
        }
    }
}

/// 检查单条原始指令
fn check_command(raw: &str, subject: &str, index: &LayerIndex<'_>, result: &mut DiagnosticResult) {
    let cmd = LayerCommand::parse(raw);

    if cmd.is_noop() {
        result.push(
            Diagnostic::warn(subject, "无法解析的条目，将被忽略")
                .with_detail(format!("'{}' 既不是姿势名也不是图层指令", raw)),
        );
        return;
    }

    if !index.groups.contains(cmd.group.as_str()) {
        result.push(
            Diagnostic::warn(subject, format!("指令引用了不存在的组 '{}'", cmd.group))
                .with_detail(raw.to_string()),
        );
        return;
    }

    let targets_single_layer = match cmd.op {
        LayerOp::Show => true,
        LayerOp::Hide => !cmd.is_group_clear(),
        LayerOp::Select => false,
    };
    if targets_single_layer && !index.ids.contains(cmd.layer_id().as_str()) {
        result.push(
            Diagnostic::warn(
                subject,
                format!("指令引用了不存在的图层 '{}'", cmd.layer_id()),
            )
            .with_detail(raw.to_string()),
        );
    }
}

/// 找出所有处于循环引用中的姿势（按名称排序）
pub fn find_cyclic_poses(poses: &PoseTable) -> BTreeSet<&str> {
    let mut cyclic = BTreeSet::new();

    for name in poses.keys() {
        let mut stack: Vec<&str> = vec![name.as_str()];
        let mut seen: HashSet<&str> = HashSet::new();

        while let Some(current) = stack.pop() {
            let Some(items) = poses.get(current) else {
                continue;
            };
            for item in items.iter().filter(|item| poses.contains_key(*item)) {
                if item == name {
                    cyclic.insert(name.as_str());
                }
                if seen.insert(item.as_str()) {
                    stack.push(item.as_str());
                }
            }
        }
    }

    cyclic
}

/// 获取模型中所有组名（去重，排序）
pub fn group_names(model: &CharacterModel) -> Vec<&str> {
    let groups: BTreeSet<&str> = model.layers().iter().map(|l| l.group.as_str()).collect();
    groups.into_iter().collect()
}

/// 获取模型中所有姿势名（排序）
pub fn pose_names(model: &CharacterModel) -> Vec<&str> {
    let mut names: Vec<&str> = model.poses().keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}
