pub mod doc;

// === 核心API重新导出 ===

/// 文档包读取器（主要接口）
pub use doc::DocBundle;

/// 错误处理
pub use doc::{DocError, Result};

/// 配置
pub use doc::{ViewConfig, ViewerConfig};

// === 导航树组件 ===

pub use doc::{
    IndexChunk,
    NavChildren,
    NavEntry,
    NavIndex,
    NavLink,
    NavNode,
    NavStatistics,
    NavTree,
    Script,
    SyncMessages,
    TreeStyle,
    TreeView,
};

// === 库信息 ===

/// navforge库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// navforge库的描述
pub const DESCRIPTION: &str = "一个读取Doxygen导航树数据的Rust库";

// === 便捷函数 ===

/// 快速加载文档包中的导航树
///
/// 这是 `DocBundle::from_path` + `load_tree` 的便捷包装函数，使用默认配置。
///
/// # 参数
/// * `path` - Doxygen `html/` 目录、`navtreedata.js` 文件或zip文件
///
/// # 返回值
/// * `Result<NavTree>` - 导航树
///
/// # 示例
///
/// ```rust,no_run
/// let tree = navforge::open("docs/html")?;
/// for node in tree.depth_first_traverse() {
///     println!("{}", node.label());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<NavTree> {
    DocBundle::from_path(path)?.load_tree()
}
