//! 导航树模块
//!
//! 提供只读的导航树模型：遍历、按链接查找、按路径定位以及分页索引访问。
//! 导航树在构造时一次性完成校验，之后不再修改。

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::doc::error::{DocError, Result};
use crate::doc::navtree::node::check_script_name;
use crate::doc::navtree::{NavChildren, NavIndex, NavNode, Script, ScriptWriter};

/// 导航树变量名
pub const NAVTREE_VAR: &str = "NAVTREE";
/// 分页索引变量名
pub const NAVTREEINDEX_VAR: &str = "NAVTREEINDEX";
/// “点击关闭同步”提示变量名
pub const SYNCONMSG_VAR: &str = "SYNCONMSG";
/// “点击开启同步”提示变量名
pub const SYNCOFFMSG_VAR: &str = "SYNCOFFMSG";

/// 侧边栏同步按钮的两条提示文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMessages {
    /// 同步开启时显示（点击关闭同步）
    pub on: String,
    /// 同步关闭时显示（点击开启同步）
    pub off: String,
}

impl SyncMessages {
    pub fn new(on: impl Into<String>, off: impl Into<String>) -> Self {
        Self {
            on: on.into(),
            off: off.into(),
        }
    }
}

impl Default for SyncMessages {
    fn default() -> Self {
        Self::new(
            "click to disable panel synchronisation",
            "click to enable panel synchronisation",
        )
    }
}

/// 深度优先遍历中的一项
#[derive(Debug, Clone)]
pub struct NavEntry<'a> {
    /// 从根节点出发的子节点索引路径（根节点为空路径）
    pub path: Vec<usize>,
    /// 节点
    pub node: &'a NavNode,
}

impl NavEntry<'_> {
    /// 节点深度（根节点为0）
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

/// 深度优先遍历迭代器
///
/// 父节点先于子节点，子节点按声明顺序访问；未解析的外部子节点不会被访问。
pub struct DepthFirst<'a> {
    stack: Vec<NavEntry<'a>>,
}

impl<'a> DepthFirst<'a> {
    fn new(root: &'a NavNode) -> Self {
        Self {
            stack: vec![NavEntry {
                path: Vec::new(),
                node: root,
            }],
        }
    }
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = NavEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.stack.pop()?;
        for (index, child) in entry.node.children().iter().enumerate().rev() {
            let mut path = entry.path.clone();
            path.push(index);
            self.stack.push(NavEntry { path, node: child });
        }
        Some(entry)
    }
}

/// 导航树
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavTree {
    root: NavNode,
    index: NavIndex,
    sync_messages: SyncMessages,
}

impl NavTree {
    /// 由已构造的部件组装导航树
    pub fn from_parts(root: NavNode, index: NavIndex, sync_messages: SyncMessages) -> Self {
        Self {
            root,
            index,
            sync_messages,
        }
    }

    /// 解析 `navtreedata.js` 脚本
    ///
    /// # 参数
    /// * `source` - 脚本文本
    ///
    /// # 返回值
    /// * `Result<NavTree>` - 校验通过的导航树；任何错误都不会返回部分结果
    pub fn from_script(source: &str) -> Result<Self> {
        let script = Script::parse(source)?;
        Self::from_values(
            script.get(NAVTREE_VAR),
            script.get(NAVTREEINDEX_VAR),
            script.get(SYNCONMSG_VAR),
            script.get(SYNCOFFMSG_VAR),
        )
    }

    /// 解析JSON快照
    ///
    /// 快照格式：`{"navtree": [...], "navtreeindex": [...], "synconmsg": "...", "syncoffmsg": "..."}`
    pub fn from_json(source: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(source)?;
        let object = value
            .as_object()
            .ok_or_else(|| DocError::validation("JSON快照必须是对象"))?;

        Self::from_values(
            object.get("navtree"),
            object.get("navtreeindex"),
            object.get("synconmsg"),
            object.get("syncoffmsg"),
        )
    }

    fn from_values(
        navtree: Option<&Value>,
        index: Option<&Value>,
        sync_on: Option<&Value>,
        sync_off: Option<&Value>,
    ) -> Result<Self> {
        let navtree = navtree.ok_or_else(|| DocError::validation("缺少 NAVTREE 定义"))?;
        let mut roots = NavNode::list_from_value(navtree, NAVTREE_VAR)?;
        if roots.len() != 1 {
            return Err(DocError::validation(format!(
                "NAVTREE 必须只包含一个根节点, 实际有 {} 个",
                roots.len()
            )));
        }
        let root = roots.remove(0);

        let index = match index {
            Some(value) => NavIndex::from_value(value)?,
            None => NavIndex::default(),
        };

        let defaults = SyncMessages::default();
        let sync_messages = SyncMessages {
            on: Self::message_or(sync_on, SYNCONMSG_VAR, defaults.on)?,
            off: Self::message_or(sync_off, SYNCOFFMSG_VAR, defaults.off)?,
        };

        let tree = Self::from_parts(root, index, sync_messages);
        debug!(
            nodes = tree.root.get_total_nodes(),
            pages = tree.index.len(),
            "导航树构造完成"
        );
        Ok(tree)
    }

    fn message_or(value: Option<&Value>, name: &str, default: String) -> Result<String> {
        match value {
            None => Ok(default),
            Some(Value::String(text)) => Ok(text.clone()),
            Some(_) => Err(DocError::validation(format!("{name} 必须是字符串"))),
        }
    }

    /// 解析外部子节点脚本
    ///
    /// `loader` 根据脚本名（不含 `.js`）返回脚本文本；返回 `None` 表示脚本不存在，
    /// 此时保留外部引用。脚本直接或间接引用正在解析的祖先脚本时返回校验错误，
    /// 原导航树被消费，不会留下部分解析的结果。
    pub fn resolve_external<F>(mut self, mut loader: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<Option<String>>,
    {
        let mut chain = Vec::new();
        Self::resolve_node(&mut self.root, &mut loader, &mut chain)?;
        Ok(self)
    }

    fn resolve_node<F>(node: &mut NavNode, loader: &mut F, chain: &mut Vec<String>) -> Result<()>
    where
        F: FnMut(&str) -> Result<Option<String>>,
    {
        if let NavChildren::Inline(children) = node.children_mut() {
            for child in children.iter_mut() {
                Self::resolve_node(child, loader, chain)?;
            }
            return Ok(());
        }

        let Some(script_name) = node.nav_children().external().map(str::to_string) else {
            return Ok(());
        };

        check_script_name(&script_name).map_err(DocError::Validation)?;

        if chain.contains(&script_name) {
            chain.push(script_name);
            return Err(DocError::validation(format!(
                "外部子节点脚本存在循环引用: {}",
                chain.join(" -> ")
            )));
        }

        let Some(source) = loader(&script_name)? else {
            warn!(script = %script_name, label = node.label(), "外部子节点脚本不存在, 保留引用");
            return Ok(());
        };

        let script = Script::parse(&source)?;
        let value = script.get(&script_name).ok_or_else(|| {
            DocError::validation(format!("脚本 {script_name}.js 中缺少变量 {script_name}"))
        })?;
        let mut children = NavNode::list_from_value(value, &script_name)?;

        chain.push(script_name);
        for child in children.iter_mut() {
            Self::resolve_node(child, loader, chain)?;
        }
        chain.pop();

        debug!(label = node.label(), children = children.len(), "已解析外部子节点");
        *node.children_mut() = NavChildren::Inline(children);
        Ok(())
    }

    /// 根节点
    pub fn root(&self) -> &NavNode {
        &self.root
    }

    /// 分页索引
    pub fn index(&self) -> &NavIndex {
        &self.index
    }

    /// 同步按钮提示文本
    pub fn sync_messages(&self) -> &SyncMessages {
        &self.sync_messages
    }

    /// 深度优先遍历所有节点（文档顺序）
    pub fn depth_first_traverse(&self) -> impl Iterator<Item = &NavNode> {
        self.entries().map(|entry| entry.node)
    }

    /// 深度优先遍历，同时给出节点路径
    pub fn entries(&self) -> DepthFirst<'_> {
        DepthFirst::new(&self.root)
    }

    /// 查找链接完全相同的所有节点（按文档顺序）
    ///
    /// 没有匹配时返回空列表。
    pub fn find_by_link(&self, token: &str) -> Vec<&NavNode> {
        self.depth_first_traverse()
            .filter(|node| node.link_token() == Some(token))
            .collect()
    }

    /// 查找指向同一页面的所有节点（忽略锚点）
    pub fn find_by_page(&self, page: &str) -> Vec<&NavNode> {
        self.depth_first_traverse()
            .filter(|node| node.link().is_some_and(|link| link.page() == page))
            .collect()
    }

    /// 获取指定页的链接
    pub fn page_at(&self, index: usize) -> Result<&str> {
        self.index.page_at(index)
    }

    /// 根据路径获取节点，空路径表示根节点
    pub fn node_by_path(&self, path: &[usize]) -> Option<&NavNode> {
        self.root.get_node_by_path(path)
    }

    /// 第一个链接为 `token` 的节点路径
    pub fn path_of_first(&self, token: &str) -> Option<Vec<usize>> {
        self.entries()
            .find(|entry| entry.node.link_token() == Some(token))
            .map(|entry| entry.path)
    }

    /// 从根节点到指定路径的标签列表（面包屑）
    pub fn breadcrumbs(&self, path: &[usize]) -> Option<Vec<&str>> {
        let mut labels = vec![self.root.label()];
        let mut current = &self.root;
        for &step in path {
            current = current.children().get(step)?;
            labels.push(current.label());
        }
        Some(labels)
    }

    /// 未解析的外部子节点脚本名（按文档顺序）
    pub fn external_refs(&self) -> Vec<&str> {
        self.depth_first_traverse()
            .filter_map(|node| node.nav_children().external())
            .collect()
    }

    /// 统计信息
    pub fn statistics(&self) -> NavStatistics {
        let mut stats = NavStatistics::default();
        for entry in self.entries() {
            stats.total_nodes += 1;
            stats.max_depth = stats.max_depth.max(entry.depth() + 1);
            if entry.node.is_leaf() {
                stats.leaf_count += 1;
            }
            if entry.node.has_target() {
                stats.linked_nodes += 1;
            } else {
                stats.grouping_nodes += 1;
            }
            if entry.node.nav_children().external().is_some() {
                stats.external_refs += 1;
            }
        }
        stats.index_pages = self.index.len();
        stats
    }

    /// 转换为JSON快照值
    pub fn to_json_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("navtree".to_string(), Value::Array(vec![self.root.to_value()]));
        object.insert(
            "navtreeindex".to_string(),
            Value::Array(
                self.index
                    .iter()
                    .map(|token| Value::String(token.to_string()))
                    .collect(),
            ),
        );
        object.insert(
            "synconmsg".to_string(),
            Value::String(self.sync_messages.on.clone()),
        );
        object.insert(
            "syncoffmsg".to_string(),
            Value::String(self.sync_messages.off.clone()),
        );
        Value::Object(object)
    }

    /// 导出为格式化的JSON快照
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json_value())?)
    }

    /// 导出为 `navtreedata.js` 脚本
    pub fn to_script(&self) -> String {
        let mut writer = ScriptWriter::new();
        writer
            .declare_tree(NAVTREE_VAR, &[self.root.to_value()])
            .declare_list(NAVTREEINDEX_VAR, self.index.entries())
            .declare_string(SYNCONMSG_VAR, &self.sync_messages.on)
            .declare_string(SYNCOFFMSG_VAR, &self.sync_messages.off);
        writer.finish()
    }
}

/// 导航树统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavStatistics {
    /// 总节点数
    pub total_nodes: usize,
    /// 叶子节点数
    pub leaf_count: usize,
    /// 最大深度（只有根节点时为1）
    pub max_depth: usize,
    /// 带链接的节点数
    pub linked_nodes: usize,
    /// 纯分组节点数
    pub grouping_nodes: usize,
    /// 未解析的外部子节点脚本数
    pub external_refs: usize,
    /// 分页数
    pub index_pages: usize,
}

impl Display for NavStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "导航统计: {} 个节点, {} 个叶子节点, 最大深度: {}, {} 个带链接, {} 个分组, {} 个外部脚本, {} 个分页",
            self.total_nodes,
            self.leaf_count,
            self.max_depth,
            self.linked_nodes,
            self.grouping_nodes,
            self.external_refs,
            self.index_pages
        )
    }
}
