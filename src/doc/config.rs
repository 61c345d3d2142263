//! 查看器配置模块
//!
//! 提供导航文档查看器的配置管理功能，支持从YAML文件加载配置。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::doc::error::{DocError, Result};
use crate::doc::navtree::TreeStyle;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "navforge.yaml";

/// 文本视图配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// 显示样式
    pub style: TreeStyle,
    /// 是否显示链接
    pub show_links: bool,
    /// 最大显示深度
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            style: TreeStyle::TreeSymbols,
            show_links: true,
            max_depth: None,
        }
    }
}

/// 查看器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// 导航数据脚本文件名
    pub navtree_script: String,
    /// 分页脚本文件名前缀（`<prefix>N.js`）
    pub index_chunk_prefix: String,
    /// 加载时是否解析外部子节点脚本
    pub resolve_external: bool,
    /// 文本视图配置
    pub view: ViewConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl ViewerConfig {
    /// 获取默认配置
    pub fn default_config() -> Self {
        Self {
            navtree_script: "navtreedata.js".to_string(),
            index_chunk_prefix: "navtreeindex".to_string(),
            resolve_external: true,
            view: ViewConfig::default(),
        }
    }

    /// 从默认配置文件中加载配置
    ///
    /// 配置文件默认为当前目录下的 `navforge.yaml`
    pub fn from_file() -> Result<Self> {
        Self::from_path(DEFAULT_CONFIG_PATH)
    }

    /// 从指定路径加载配置
    ///
    /// # 参数
    /// * `path` - YAML配置文件路径
    ///
    /// # 返回值
    /// * `Result<Self>` - 加载成功返回配置实例，失败返回错误
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| DocError::Config(format!("无法读取配置文件: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// 从YAML文本解析配置
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yml::from_str(content)
            .map_err(|e| DocError::Config(format!("配置文件格式错误: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 加载配置；文件不存在时使用默认配置
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) if path.as_ref().exists() => Self::from_path(path),
            Some(path) => {
                debug!(path = %path.as_ref().display(), "配置文件不存在, 使用默认配置");
                Ok(Self::default_config())
            }
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(),
            None => Ok(Self::default_config()),
        }
    }

    /// 生成默认配置文件
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let yaml_content = serde_yml::to_string(&Self::default_config())
            .map_err(|e| DocError::Config(format!("序列化配置失败: {}", e)))?;

        let content_with_header = format!(
            "# navforge 查看器配置文件\n# 定义导航数据脚本位置、外部脚本解析方式和文本视图样式\n\n{}",
            yaml_content
        );

        fs::write(path.as_ref(), content_with_header)
            .map_err(|e| DocError::Config(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.navtree_script.trim().is_empty() {
            return Err(DocError::Config("navtree_script 不能为空".to_string()));
        }
        if self.index_chunk_prefix.trim().is_empty() {
            return Err(DocError::Config("index_chunk_prefix 不能为空".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ViewerConfig::default_config();
        assert_eq!(config.navtree_script, "navtreedata.js");
        assert_eq!(config.index_chunk_prefix, "navtreeindex");
        assert!(config.resolve_external);
        assert_eq!(config.view.style, TreeStyle::TreeSymbols);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "resolve_external: false\nview:\n  style: indented\n  max_depth: 3\n";
        let config = ViewerConfig::from_yaml(yaml).unwrap();

        assert!(!config.resolve_external);
        assert_eq!(config.navtree_script, "navtreedata.js");
        assert_eq!(config.view.style, TreeStyle::Indented);
        assert_eq!(config.view.max_depth, Some(3));
        assert!(config.view.show_links);
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ViewerConfig::from_yaml("view: [1, 2").unwrap_err();
        assert!(matches!(err, DocError::Config(_)));

        let err = ViewerConfig::from_yaml("navtree_script: ''").unwrap_err();
        assert!(matches!(err, DocError::Config(_)));
    }

    #[test]
    fn test_generate_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("navforge.yaml");

        ViewerConfig::generate_default_config(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# navforge"));

        let config = ViewerConfig::from_path(&path).unwrap();
        assert_eq!(config, ViewerConfig::default_config());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ViewerConfig::load_or_default(Some(dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(config, ViewerConfig::default_config());
    }
}
