pub mod error;
pub mod config;
pub mod bundle;
pub mod page;
pub mod navtree;

// 重新导出错误处理
pub use error::{DocError, Result};

// 重新导出配置
pub use config::{ViewConfig, ViewerConfig, DEFAULT_CONFIG_PATH};

// 重新导出文档包
pub use bundle::DocBundle;

// 重新导出导航树相关
pub use navtree::{
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
