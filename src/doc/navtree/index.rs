//! 导航索引模块
//!
//! `NAVTREEINDEX` 是一个平铺的链接列表，每一项对应一个 `navtreeindexN.js`
//! 分页脚本的第一个链接；分页脚本本身把链接映射到导航树中的节点路径。

use std::collections::HashMap;

use serde_json::Value;

use crate::doc::error::{DocError, Result};

/// 导航分页索引
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavIndex {
    entries: Vec<String>,
}

impl NavIndex {
    /// 创建分页索引
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// 从 `NAVTREEINDEX` 的值解析
    pub fn from_value(value: &Value) -> Result<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| DocError::validation("NAVTREEINDEX 必须是数组"))?;

        let entries = items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(token) => Ok(token.clone()),
                _ => Err(DocError::validation(format!(
                    "NAVTREEINDEX[{i}] 必须是字符串"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// 获取指定页的链接
    ///
    /// # 返回值
    /// * `Result<&str>` - 越界时返回 `IndexOutOfRange`
    pub fn page_at(&self, index: usize) -> Result<&str> {
        self.entries
            .get(index)
            .map(String::as_str)
            .ok_or(DocError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    /// 查找覆盖指定链接的分页
    ///
    /// 与浏览器端的查找方式一致：从头扫描，只要下一项按字典序不大于
    /// `token` 就前进；如果第一项就大于 `token`，使用第0页。
    pub fn page_for_link(&self, token: &str) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let passed = self
            .entries
            .iter()
            .take_while(|entry| entry.as_str() <= token)
            .count();
        Some(passed.saturating_sub(1))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

/// 分页脚本 `navtreeindexN.js` 的内容
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexChunk {
    /// 分页序号
    pub number: usize,
    /// 链接 -> 节点路径（从根节点的子节点开始计数）
    paths: HashMap<String, Vec<usize>>,
}

impl IndexChunk {
    /// 分页脚本中的变量名
    pub fn variable_name(number: usize) -> String {
        format!("NAVTREEINDEX{number}")
    }

    /// 从分页脚本变量值解析
    pub fn from_value(number: usize, value: &Value) -> Result<Self> {
        let name = Self::variable_name(number);
        let object = value
            .as_object()
            .ok_or_else(|| DocError::validation(format!("{name} 必须是对象")))?;

        let mut paths = HashMap::with_capacity(object.len());
        for (link, path) in object {
            let steps = path
                .as_array()
                .ok_or_else(|| DocError::validation(format!("{name}[{link}] 必须是数组")))?;
            let path = steps
                .iter()
                .map(|step| {
                    step.as_u64()
                        .and_then(|n| usize::try_from(n).ok())
                        .ok_or_else(|| {
                            DocError::validation(format!("{name}[{link}] 包含无效的路径索引"))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            paths.insert(link.clone(), path);
        }

        Ok(Self { number, paths })
    }

    /// 查找链接对应的节点路径
    ///
    /// 完整链接不存在时回退到去掉锚点的页面链接。
    pub fn path_for(&self, token: &str) -> Option<&[usize]> {
        self.paths
            .get(token)
            .or_else(|| {
                let page = token.split_once('#').map(|(page, _)| page)?;
                self.paths.get(page)
            })
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
