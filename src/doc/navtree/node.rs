//! 导航节点数据结构定义
//!
//! 定义导航树中的节点、链接与子节点列表。节点在Doxygen输出中以
//! `[label, link-or-null, children-or-null-or-script]` 三元组表示。

use serde_json::Value;

use crate::doc::error::{DocError, Result};

/// 导航链接（页面 + 可选锚点）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NavLink {
    /// 原始链接标记，例如 `files.html#autotoc_md120`
    token: String,
}

impl NavLink {
    /// 创建新的导航链接
    ///
    /// 空字符串不是合法的链接，返回校验错误。
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(DocError::validation("链接不能为空字符串"));
        }
        Ok(Self { token })
    }

    /// 原始链接标记
    pub fn token(&self) -> &str {
        &self.token
    }

    /// 页面部分（第一个 `#` 之前的内容）
    pub fn page(&self) -> &str {
        match self.token.split_once('#') {
            Some((page, _)) => page,
            None => &self.token,
        }
    }

    /// 锚点部分（第一个 `#` 之后的内容，空锚点视为没有锚点）
    pub fn anchor(&self) -> Option<&str> {
        self.token
            .split_once('#')
            .map(|(_, anchor)| anchor)
            .filter(|anchor| !anchor.is_empty())
    }

    /// 是否带有页内锚点
    pub fn has_anchor(&self) -> bool {
        self.anchor().is_some()
    }
}

impl std::fmt::Display for NavLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token)
    }
}

/// 子节点列表
///
/// Doxygen 在三元组第三项中既可以内联子节点，也可以写一个脚本名，
/// 由浏览器在展开节点时再加载 `<name>.js`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavChildren {
    /// 内联子节点（空列表等价于没有子节点）
    Inline(Vec<NavNode>),
    /// 外部子节点脚本名（不含 `.js` 后缀）
    External(String),
}

impl NavChildren {
    /// 没有子节点
    pub fn none() -> Self {
        NavChildren::Inline(Vec::new())
    }

    /// 已加载的子节点（外部脚本未解析时为空切片）
    pub fn as_slice(&self) -> &[NavNode] {
        match self {
            NavChildren::Inline(children) => children,
            NavChildren::External(_) => &[],
        }
    }

    /// 外部脚本名
    pub fn external(&self) -> Option<&str> {
        match self {
            NavChildren::External(name) => Some(name),
            NavChildren::Inline(_) => None,
        }
    }
}

impl Default for NavChildren {
    fn default() -> Self {
        Self::none()
    }
}

/// 导航节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavNode {
    /// 显示文本
    label: String,
    /// 目标链接；纯分组节点没有链接
    link: Option<NavLink>,
    /// 子节点
    children: NavChildren,
}

impl NavNode {
    /// 创建没有子节点的导航节点
    pub fn new(label: impl Into<String>, link: Option<NavLink>) -> Result<Self> {
        let label = label.into();
        if label.is_empty() {
            return Err(DocError::validation("节点标签不能为空"));
        }
        Ok(Self {
            label,
            link,
            children: NavChildren::none(),
        })
    }

    /// 创建带链接的叶子节点
    pub fn leaf(label: impl Into<String>, link: impl Into<String>) -> Result<Self> {
        Self::new(label, Some(NavLink::new(link)?))
    }

    /// 设置子节点
    pub fn with_children(mut self, children: Vec<NavNode>) -> Self {
        self.children = NavChildren::Inline(children);
        self
    }

    /// 设置外部子节点脚本
    pub fn with_external_children(mut self, script: impl Into<String>) -> Self {
        self.children = NavChildren::External(script.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn link(&self) -> Option<&NavLink> {
        self.link.as_ref()
    }

    /// 链接标记（没有链接时为 None）
    pub fn link_token(&self) -> Option<&str> {
        self.link.as_ref().map(NavLink::token)
    }

    /// 是否有可导航的目标
    pub fn has_target(&self) -> bool {
        self.link.is_some()
    }

    /// 已加载的子节点
    pub fn children(&self) -> &[NavNode] {
        self.children.as_slice()
    }

    /// 子节点列表（包括外部脚本引用）
    pub fn nav_children(&self) -> &NavChildren {
        &self.children
    }

    /// 是否为叶子节点（没有已加载的子节点，也没有外部脚本）
    pub fn is_leaf(&self) -> bool {
        matches!(&self.children, NavChildren::Inline(children) if children.is_empty())
    }

    /// 获取节点深度（叶子为1）
    pub fn get_depth(&self) -> u32 {
        1 + self
            .children()
            .iter()
            .map(NavNode::get_depth)
            .max()
            .unwrap_or(0)
    }

    /// 获取节点及其所有子节点的数量
    pub fn get_total_nodes(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(NavNode::get_total_nodes)
            .sum::<usize>()
    }

    /// 根据路径数组获取子节点
    ///
    /// - `[]` 表示当前节点本身
    /// - `[0, 1]` 表示第一个子节点的第二个子节点
    pub fn get_node_by_path(&self, path: &[usize]) -> Option<&NavNode> {
        match path.split_first() {
            None => Some(self),
            Some((&first, rest)) => self.children().get(first)?.get_node_by_path(rest),
        }
    }

    /// 替换子节点列表，供外部脚本解析使用
    pub(crate) fn children_mut(&mut self) -> &mut NavChildren {
        &mut self.children
    }

    /// 从 `[label, link, children]` 三元组解析节点
    ///
    /// # 参数
    /// * `value` - 三元组的JSON值
    /// * `location` - 用于错误信息的位置描述，例如 `NAVTREE[0]`
    pub fn from_value(value: &Value, location: &str) -> Result<Self> {
        let triple = value
            .as_array()
            .ok_or_else(|| DocError::validation(format!("{location}: 节点必须是数组")))?;

        if triple.len() != 3 {
            return Err(DocError::validation(format!(
                "{location}: 节点必须是三元组, 实际有 {} 项",
                triple.len()
            )));
        }

        let label = match &triple[0] {
            Value::String(label) if !label.is_empty() => label.clone(),
            Value::String(_) => {
                return Err(DocError::validation(format!("{location}: 节点标签为空")));
            }
            _ => {
                return Err(DocError::validation(format!("{location}: 节点标签必须是字符串")));
            }
        };

        let link = match &triple[1] {
            Value::Null => None,
            Value::String(token) if !token.is_empty() => Some(NavLink {
                token: token.clone(),
            }),
            Value::String(_) => {
                return Err(DocError::validation(format!("{location}: 链接为空字符串")));
            }
            _ => {
                return Err(DocError::validation(format!(
                    "{location}: 链接必须是字符串或null"
                )));
            }
        };

        let children = match &triple[2] {
            Value::Null => NavChildren::none(),
            Value::String(script) => {
                check_script_name(script).map_err(|reason| {
                    DocError::validation(format!("{location}: {reason}"))
                })?;
                NavChildren::External(script.clone())
            }
            Value::Array(_) => NavChildren::Inline(Self::list_from_value(
                &triple[2],
                &format!("{location}[2]"),
            )?),
            _ => {
                return Err(DocError::validation(format!(
                    "{location}: 子节点必须是数组、脚本名或null"
                )));
            }
        };

        Ok(Self {
            label,
            link,
            children,
        })
    }

    /// 解析三元组数组
    pub fn list_from_value(value: &Value, location: &str) -> Result<Vec<NavNode>> {
        let items = value
            .as_array()
            .ok_or_else(|| DocError::validation(format!("{location}: 子节点列表必须是数组")))?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| Self::from_value(item, &format!("{location}[{index}]")))
            .collect()
    }

    /// 转换回三元组
    pub fn to_value(&self) -> Value {
        let link = match &self.link {
            Some(link) => Value::String(link.token.clone()),
            None => Value::Null,
        };
        let children = match &self.children {
            NavChildren::Inline(children) if children.is_empty() => Value::Null,
            NavChildren::Inline(children) => {
                Value::Array(children.iter().map(NavNode::to_value).collect())
            }
            NavChildren::External(script) => Value::String(script.clone()),
        };
        Value::Array(vec![Value::String(self.label.clone()), link, children])
    }
}

/// 校验外部子节点脚本名
///
/// 脚本名会拼接成文档根目录下的 `<name>.js`，因此不能为空，也不能包含路径分隔符或 `..`。
pub(crate) fn check_script_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("外部子节点脚本名为空".to_string());
    }
    if name.contains(['/', '\\']) || name.contains("..") {
        return Err(format!("外部子节点脚本名不能包含路径: {name}"));
    }
    Ok(())
}
