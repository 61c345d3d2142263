use clap::{ArgAction, Parser};
use navforge::doc::DEFAULT_CONFIG_PATH;
use navforge::{DocBundle, NavTree, Result, TreeStyle, TreeView, ViewerConfig};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// 🧭 navforge - Doxygen导航树查看工具
#[derive(Parser)]
#[command(name = "navforge")]
#[command(about = "一个用于查看Doxygen导航树数据的Rust工具")]
#[command(version)]
struct Args {
    /// 文档路径
    #[arg(help = "Doxygen html目录、navtreedata.js文件或zip文件")]
    doc_path: String,

    /// 日志详细程度
    #[arg(short, long, action = ArgAction::Count, help = "日志详细程度（-v info, -vv debug, -vvv trace）")]
    verbose: u8,

    /// 配置文件
    #[arg(short, long, help = "YAML配置文件路径（默认 navforge.yaml）")]
    config: Option<String>,

    /// 生成默认配置文件
    #[arg(long, help = "生成默认配置文件后退出")]
    init_config: bool,

    /// 显示导航树
    #[arg(short, long, help = "显示导航树结构")]
    tree: bool,

    /// 导航树显示样式
    #[arg(long, value_enum, help = "导航树的显示样式")]
    style: Option<StyleArg>,

    /// 不显示链接
    #[arg(long, help = "显示导航树时不显示链接")]
    no_links: bool,

    /// 最大显示深度
    #[arg(long, help = "导航树最大显示深度")]
    max_depth: Option<u32>,

    /// 显示统计信息
    #[arg(short, long, help = "显示导航树统计信息")]
    stats: bool,

    /// 显示分页索引
    #[arg(short, long, help = "显示分页索引")]
    index: bool,

    /// 显示页面标题
    #[arg(long, help = "显示分页索引时读取页面标题")]
    titles: bool,

    /// 按链接查找节点
    #[arg(short, long, help = "查找链接完全相同的所有节点")]
    find: Option<String>,

    /// 显示指定分页
    #[arg(short, long, help = "显示指定分页的链接（从0开始）")]
    page: Option<usize>,

    /// 通过分页脚本定位链接
    #[arg(short, long, help = "通过navtreeindex分页脚本定位链接对应的节点")]
    locate: Option<String>,

    /// 导出格式
    #[arg(short, long, value_enum, help = "将导航数据导出到标准输出")]
    export: Option<ExportFormat>,
}

/// 导航树显示样式
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StyleArg {
    /// 树状符号
    Tree,
    /// 缩进列表
    Indented,
}

impl From<StyleArg> for TreeStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Tree => TreeStyle::TreeSymbols,
            StyleArg::Indented => TreeStyle::Indented,
        }
    }
}

/// 导出格式
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ExportFormat {
    /// JSON快照
    Json,
    /// navtreedata.js脚本
    Script,
}

fn main() {
    let args = Args::parse();

    setup_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("❌ 错误: {}", e);
        std::process::exit(1);
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    // RUST_LOG 优先于 -v
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn run(args: &Args) -> Result<()> {
    if args.init_config {
        let path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        ViewerConfig::generate_default_config(path)?;
        println!("📝 已生成默认配置文件: {}", path);
        return Ok(());
    }

    let config = ViewerConfig::load_or_default(args.config.as_deref())?;
    let mut bundle = DocBundle::open(&args.doc_path, config)?;
    let tree = bundle.load_tree()?;

    if let Some(format) = args.export {
        let output = match format {
            ExportFormat::Json => tree.to_json()?,
            ExportFormat::Script => tree.to_script(),
        };
        print!("{}", output);
        return Ok(());
    }

    println!("🧭 navforge - 导航树查看工具");
    println!("📂 文档: {}", args.doc_path);
    println!("  根节点: {}", tree.root().label());

    if args.stats {
        println!("\n📈 {}", tree.statistics());
        let unresolved = tree.external_refs();
        if !unresolved.is_empty() {
            println!("  未解析的外部脚本: {}", unresolved.join(", "));
        }
    }

    if args.tree {
        display_tree(&tree, &bundle, args);
    }

    if args.index {
        display_index(&tree, &mut bundle, args.titles)?;
    }

    if let Some(number) = args.page {
        println!("\n📄 第 {} 页: {}", number, tree.page_at(number)?);
    }

    if let Some(ref token) = args.find {
        display_matches(&tree, token);
    }

    if let Some(ref token) = args.locate {
        println!("\n📍 定位: {}", token);
        match bundle.locate(&tree, token)? {
            Some(path) => {
                let crumbs = tree
                    .breadcrumbs(&path)
                    .map(|labels| labels.join(" › "))
                    .unwrap_or_else(|| "（路径超出已加载的导航树）".to_string());
                println!("  路径: {:?}", path);
                println!("  位置: {}", crumbs);
            }
            None => println!("  分页脚本中没有该链接"),
        }
    }

    Ok(())
}

fn display_tree(tree: &NavTree, bundle: &DocBundle, args: &Args) {
    let view_config = &bundle.config().view;
    let view = TreeView::new(tree)
        .with_title(Some(tree.root().label().to_string()))
        .with_style(args.style.map(TreeStyle::from).unwrap_or(view_config.style))
        .with_show_links(view_config.show_links && !args.no_links)
        .with_max_depth(args.max_depth.or(view_config.max_depth));

    println!("\n🌳 导航树:\n");
    print!("{}", view);
}

fn display_index(tree: &NavTree, bundle: &mut DocBundle, with_titles: bool) -> Result<()> {
    println!("\n📑 分页索引 ({} 页):", tree.index().len());
    for (number, token) in tree.index().iter().enumerate() {
        if with_titles {
            let title = bundle
                .page_title(token)?
                .unwrap_or_else(|| "（无标题）".to_string());
            println!("  {}. {}: {}", number, token, title);
        } else {
            println!("  {}. {}", number, token);
        }
    }

    let messages = tree.sync_messages();
    println!("\n🔄 同步提示:");
    println!("  开启时: {}", messages.on);
    println!("  关闭时: {}", messages.off);
    Ok(())
}

fn display_matches(tree: &NavTree, token: &str) {
    let matches = tree.find_by_link(token);
    println!("\n🔍 查找链接 {}: {} 个结果", token, matches.len());
    for entry in tree
        .entries()
        .filter(|entry| entry.node.link_token() == Some(token))
    {
        let crumbs = tree
            .breadcrumbs(&entry.path)
            .map(|labels| labels.join(" › "))
            .unwrap_or_default();
        println!("  {:?} {}", entry.path, crumbs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "navforge",
            "docs/html",
            "-vv",
            "--tree",
            "--style",
            "indented",
            "--find",
            "annotated.html",
        ])
        .unwrap();

        assert_eq!(args.verbose, 2);
        assert!(args.tree);
        assert!(matches!(args.style, Some(StyleArg::Indented)));
        assert_eq!(args.find.as_deref(), Some("annotated.html"));
    }
}
