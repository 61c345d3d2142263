//! 导航树（Doxygen navtree）解析模块
//!
//! 此模块提供Doxygen HTML输出中导航数据脚本的解析功能，包括导航树、
//! 分页索引以及外部子节点脚本。导航数据只在加载时构造一次，之后只读。

pub mod index;
pub mod node;
pub mod script;
pub mod tree;
pub mod view;

pub use index::{IndexChunk, NavIndex};
pub use node::{NavChildren, NavLink, NavNode};
pub use script::{Declaration, Script, ScriptWriter};
pub use tree::{
    DepthFirst, NAVTREE_VAR, NAVTREEINDEX_VAR, NavEntry, NavStatistics, NavTree, SYNCOFFMSG_VAR,
    SYNCONMSG_VAR, SyncMessages,
};
pub use view::{TreeStyle, TreeView};
