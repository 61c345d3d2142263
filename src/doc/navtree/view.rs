//! 导航树文本视图
//!
//! 把导航树渲染为终端可读的纯文本。

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::doc::navtree::{NavChildren, NavNode, NavTree};

/// 导航树显示样式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TreeStyle {
    /// 使用树状符号（├── └──）
    #[default]
    TreeSymbols,
    /// 使用缩进和符号（• ）
    Indented,
}

/// 导航树视图
#[derive(Debug, Clone)]
pub struct TreeView<'a> {
    tree: &'a NavTree,
    /// 标题（None 时不输出标题行）
    pub title: Option<String>,
    /// 显示样式
    pub style: TreeStyle,
    /// 是否显示链接
    pub show_links: bool,
    /// 最大显示深度（None表示显示所有）
    pub max_depth: Option<u32>,
}

impl<'a> TreeView<'a> {
    /// 创建新的视图
    pub fn new(tree: &'a NavTree) -> Self {
        Self {
            tree,
            title: None,
            style: TreeStyle::TreeSymbols,
            show_links: true,
            max_depth: None,
        }
    }

    /// 设置标题
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// 设置显示样式
    pub fn with_style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }

    /// 设置是否显示链接
    pub fn with_show_links(mut self, show_links: bool) -> Self {
        self.show_links = show_links;
        self
    }

    /// 设置最大显示深度
    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn within_depth(&self, depth: u32) -> bool {
        self.max_depth.is_none_or(|max| depth < max)
    }

    fn node_content(&self, node: &NavNode) -> String {
        let mut content = node.label().to_string();
        if self.show_links {
            match node.link_token() {
                Some(token) => content.push_str(&format!(" → {token}")),
                None => content.push_str(" (分组)"),
            }
        }
        if let NavChildren::External(script) = node.nav_children() {
            content.push_str(&format!(" [+{script}.js]"));
        }
        content
    }

    fn render_tree_style(
        &self,
        node: &NavNode,
        depth: u32,
        is_last: bool,
        prefix: &str,
        result: &mut String,
    ) {
        if !self.within_depth(depth) {
            return;
        }

        // 根节点不加连接符
        let connector = match (depth, is_last) {
            (0, _) => "",
            (_, true) => "└── ",
            (_, false) => "├── ",
        };
        result.push_str(&format!("{prefix}{connector}{}\n", self.node_content(node)));

        let child_prefix = match (depth, is_last) {
            (0, _) => String::new(),
            (_, true) => format!("{prefix}    "),
            (_, false) => format!("{prefix}│   "),
        };
        let children = node.children();
        for (index, child) in children.iter().enumerate() {
            let is_child_last = index == children.len() - 1;
            self.render_tree_style(child, depth + 1, is_child_last, &child_prefix, result);
        }
    }

    fn render_indent_style(&self, node: &NavNode, depth: u32, result: &mut String) {
        if !self.within_depth(depth) {
            return;
        }

        let indent = "  ".repeat(depth as usize);
        result.push_str(&format!("{indent}• {}\n", self.node_content(node)));

        for child in node.children() {
            self.render_indent_style(child, depth + 1, result);
        }
    }
}

impl Display for TreeView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut result = String::new();

        if let Some(ref title) = self.title {
            let depth_info = match self.max_depth {
                Some(max_depth) => format!(" (深度限制: {max_depth})"),
                None => String::new(),
            };
            result.push_str(&format!("📖 {title}{depth_info}\n"));
            result.push_str("═══════════════════════════════════════\n\n");
        }

        match self.style {
            TreeStyle::TreeSymbols => {
                self.render_tree_style(self.tree.root(), 0, true, "", &mut result)
            }
            TreeStyle::Indented => self.render_indent_style(self.tree.root(), 0, &mut result),
        }

        write!(f, "{result}")
    }
}
