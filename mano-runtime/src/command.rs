//! # Command 模块
//!
//! 定义图层显隐指令的语法与解析。
//!
//! ## 语法
//!
//! ```text
//! <group>+<name>   打开图层 group/name
//! <group>-<name>   关闭图层 group/name
//! <group>-         关闭 group 下的所有图层
//! <group>><name>   组内单选：只显示 group/name，组内其余图层全部关闭
//! ```
//!
//! 解析采用**宽松策略**：无法识别的字符串解析为空指令（`group` 为空），
//! 由调用方跳过，从不报错。

use std::fmt;

/// 指令操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerOp {
    /// `+` 打开指定图层
    Show,
    /// `-` 关闭指定图层；名称为空时关闭整组
    Hide,
    /// `>` 组内单选
    Select,
}

impl LayerOp {
    /// 从操作符字符解析
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Show),
            '-' => Some(Self::Hide),
            '>' => Some(Self::Select),
            _ => None,
        }
    }

    /// 操作符字符
    pub fn as_char(self) -> char {
        match self {
            Self::Show => '+',
            Self::Hide => '-',
            Self::Select => '>',
        }
    }
}

impl fmt::Display for LayerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// 解析后的图层指令
///
/// # 示例
///
/// ```text
/// "Arm>Up"   -> LayerCommand { group: "Arm", name: "Up", op: Select }
/// "Sweat-"   -> LayerCommand { group: "Sweat", name: "", op: Hide }
/// "garbage"  -> LayerCommand { group: "", name: "", op: Show }  (空指令)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayerCommand {
    /// 目标组
    pub group: String,
    /// 组内图层名（可为空）
    pub name: String,
    /// 操作符
    pub op: LayerOp,
}

impl LayerCommand {
    /// 创建指令
    pub fn new(group: impl Into<String>, name: impl Into<String>, op: LayerOp) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            op,
        }
    }

    /// 空指令
    pub fn noop() -> Self {
        Self::new("", "", LayerOp::Show)
    }

    /// 解析原始指令字符串
    ///
    /// 取第一个出现的 `+`、`-`、`>` 作为操作符，其前为组名，其后为图层名。
    /// 形如 `"Group-"` 的字符串自然落在这条规则里，得到名称为空的整组关闭指令。
    /// 没有操作符时返回空指令。
    pub fn parse(raw: &str) -> Self {
        let found = raw
            .char_indices()
            .find_map(|(i, c)| LayerOp::from_char(c).map(|op| (i, op)));

        match found {
            // 操作符均为单字节 ASCII
            Some((index, op)) => Self::new(&raw[..index], &raw[index + 1..], op),
            None => Self::noop(),
        }
    }

    /// 是否为空指令（应被忽略）
    pub fn is_noop(&self) -> bool {
        self.group.is_empty()
    }

    /// 是否为整组关闭（`Group-`）
    pub fn is_group_clear(&self) -> bool {
        self.op == LayerOp::Hide && self.name.is_empty()
    }

    /// 指令是否“占用”目标组，用于姿势冲突检测
    ///
    /// `+`、`>` 与整组关闭占用组；带名称的 `-` 不占用。
    pub fn claims_group(&self) -> bool {
        match self.op {
            LayerOp::Show | LayerOp::Select => true,
            LayerOp::Hide => self.name.is_empty(),
        }
    }

    /// 由组名与图层名合成的图层 ID（`group/name`）
    pub fn layer_id(&self) -> String {
        format!("{}/{}", self.group, self.name)
    }
}

impl fmt::Display for LayerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.group, self.op, self.name)
    }
}

impl From<&str> for LayerCommand {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// 解析原始指令字符串，等价于 [`LayerCommand::parse`]
pub fn parse_command(raw: &str) -> LayerCommand {
    LayerCommand::parse(raw)
}
