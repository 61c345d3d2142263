use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::doc::config::ViewerConfig;
use crate::doc::error::{DocError, Result};
use crate::doc::navtree::{IndexChunk, NavTree, Script};
use crate::doc::page;

/// 文档包的存储位置
enum BundleSource {
    /// Doxygen `html/` 目录
    Directory(PathBuf),
    /// zip压缩包，`prefix` 为导航脚本所在目录（以 `/` 结尾或为空）
    Archive {
        archive: ZipArchive<File>,
        prefix: String,
    },
}

/// 表示一份Doxygen生成的HTML文档
pub struct DocBundle {
    source: BundleSource,
    config: ViewerConfig,
}

impl DocBundle {
    /// 打开文档包
    ///
    /// # 参数
    /// * `path` - Doxygen `html/` 目录、其中的导航脚本文件，或包含文档的zip文件
    /// * `config` - 查看器配置
    ///
    /// # 返回值
    /// * `Result<DocBundle>` - 找不到导航脚本时返回 `MissingFile`
    pub fn open<P: AsRef<Path>>(path: P, config: ViewerConfig) -> Result<DocBundle> {
        let path = path.as_ref();

        let source = if path.is_dir() {
            BundleSource::Directory(path.to_path_buf())
        } else if Self::is_script_path(path) {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            BundleSource::Directory(dir.to_path_buf())
        } else {
            let file = File::open(path)?;
            let archive = ZipArchive::new(file)?;
            let prefix = Self::find_archive_prefix(&archive, &config.navtree_script)?;
            BundleSource::Archive { archive, prefix }
        };

        let mut bundle = DocBundle { source, config };
        bundle.validate()?;
        info!(path = %path.display(), "文档包已打开");

        Ok(bundle)
    }

    /// 使用默认配置打开文档包
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<DocBundle> {
        Self::open(path, ViewerConfig::default_config())
    }

    fn is_script_path(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "js")
    }

    /// 在压缩包中定位导航脚本所在目录
    fn find_archive_prefix(archive: &ZipArchive<File>, script: &str) -> Result<String> {
        let suffix = format!("/{script}");
        archive
            .file_names()
            .filter(|name| *name == script || name.ends_with(&suffix))
            // 目录层级最浅的优先
            .min_by_key(|name| name.matches('/').count())
            .map(|name| name[..name.len() - script.len()].to_string())
            .ok_or_else(|| DocError::MissingFile(script.to_string()))
    }

    /// 验证导航脚本存在
    fn validate(&mut self) -> Result<()> {
        let script = self.config.navtree_script.clone();
        if self.read_file(&script)?.is_none() {
            return Err(DocError::MissingFile(script));
        }
        debug!(script = %script, "找到导航脚本");
        Ok(())
    }

    /// 查看器配置
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// 读取文档包中的文件，文件不存在时返回 None
    ///
    /// # 参数
    /// * `name` - 相对于文档根目录的文件名
    pub fn read_file(&mut self, name: &str) -> Result<Option<String>> {
        match &mut self.source {
            BundleSource::Directory(dir) => {
                let path = dir.join(name);
                if !path.is_file() {
                    return Ok(None);
                }
                Ok(Some(fs::read_to_string(path)?))
            }
            BundleSource::Archive { archive, prefix } => {
                let full_name = format!("{prefix}{name}");
                let mut file = match archive.by_name(&full_name) {
                    Ok(file) => file,
                    Err(ZipError::FileNotFound) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };
                let mut content = String::new();
                file.read_to_string(&mut content)?;
                Ok(Some(content))
            }
        }
    }

    /// 读取必须存在的文件
    pub fn read_required(&mut self, name: &str) -> Result<String> {
        self.read_file(name)?
            .ok_or_else(|| DocError::MissingFile(name.to_string()))
    }

    /// 列出文档包中的所有文件（相对路径，已排序）
    pub fn list_files(&mut self) -> Result<Vec<String>> {
        let mut files = Vec::new();

        match &self.source {
            BundleSource::Directory(dir) => {
                // 不跟随符号链接
                for entry in WalkDir::new(dir) {
                    let entry = entry.map_err(|e| DocError::Io(e.into()))?;
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    if let Ok(relative) = entry.path().strip_prefix(dir) {
                        files.push(relative.to_string_lossy().replace('\\', "/"));
                    }
                }
            }
            BundleSource::Archive { archive, prefix } => {
                files.extend(
                    archive
                        .file_names()
                        .filter(|name| !name.ends_with('/'))
                        .filter_map(|name| name.strip_prefix(prefix.as_str()))
                        .map(str::to_string),
                );
            }
        }

        files.sort();
        Ok(files)
    }

    /// 加载导航树
    ///
    /// 读取导航脚本并校验；配置启用 `resolve_external` 时，外部子节点脚本
    /// 会被递归加载并内联，缺失的脚本保留为外部引用。
    pub fn load_tree(&mut self) -> Result<NavTree> {
        let script = self.config.navtree_script.clone();
        let source = self.read_required(&script)?;
        let tree = NavTree::from_script(&source)?;

        if !self.config.resolve_external {
            return Ok(tree);
        }

        let tree = tree.resolve_external(|name| self.read_file(&format!("{name}.js")))?;
        info!(
            nodes = tree.statistics().total_nodes,
            unresolved = tree.external_refs().len(),
            "导航树加载完成"
        );
        Ok(tree)
    }

    /// 加载第 `number` 个分页脚本
    pub fn load_index_chunk(&mut self, number: usize) -> Result<IndexChunk> {
        let file_name = format!("{}{}.js", self.config.index_chunk_prefix, number);
        let source = self.read_required(&file_name)?;
        let script = Script::parse(&source)?;

        let variable = IndexChunk::variable_name(number);
        let value = script.get(&variable).ok_or_else(|| {
            DocError::validation(format!("{file_name} 中缺少变量 {variable}"))
        })?;
        IndexChunk::from_value(number, value)
    }

    /// 通过分页脚本定位链接对应的节点路径
    ///
    /// # 返回值
    /// * `Result<Option<Vec<usize>>>` - 从根节点的子节点开始计数的路径；
    ///   分页索引为空或分页中没有该链接时返回 None
    pub fn locate(&mut self, tree: &NavTree, token: &str) -> Result<Option<Vec<usize>>> {
        let Some(number) = tree.index().page_for_link(token) else {
            return Ok(None);
        };
        let chunk = self.load_index_chunk(number)?;
        debug!(token, page = number, "在分页脚本中查找链接");
        Ok(chunk.path_for(token).map(<[usize]>::to_vec))
    }

    /// 获取页面标题
    ///
    /// # 参数
    /// * `link` - 页面链接，锚点部分会被忽略
    pub fn page_title(&mut self, link: &str) -> Result<Option<String>> {
        let page = link.split_once('#').map_or(link, |(page, _)| page);
        Ok(self
            .read_file(page)?
            .and_then(|html| page::extract_title(&html)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    const NAVTREEDATA: &str = r#"var NAVTREE =
[
  [ "Docs", "index.html", [
    [ "Ficheiros", "files.html", [
      [ "Lista de ficheiros", "files.html", "files_dup" ]
    ] ]
  ] ]
];

var NAVTREEINDEX =
[
"files.html"
];

var SYNCONMSG = 'clique para desativar a sincronização do painel';
var SYNCOFFMSG = 'clique para ativar a sincronização do painel';
"#;

    const FILES_DUP: &str = r#"var files_dup =
[
    [ "main.c", "main_8c.html", null ]
];"#;

    const NAVTREEINDEX0: &str = r#"var NAVTREEINDEX0 =
{
"files.html":[0],
"index.html":[],
"main_8c.html":[0,0,0]
};"#;

    const FILES_HTML: &str = r#"<html><head><title>Docs: Ficheiros</title></head>
<body><div class="headertitle"><div class="title">Lista de ficheiros</div></div></body></html>"#;

    fn write_bundle_dir(dir: &Path) {
        fs::write(dir.join("navtreedata.js"), NAVTREEDATA).unwrap();
        fs::write(dir.join("files_dup.js"), FILES_DUP).unwrap();
        fs::write(dir.join("navtreeindex0.js"), NAVTREEINDEX0).unwrap();
        fs::write(dir.join("files.html"), FILES_HTML).unwrap();
        fs::create_dir(dir.join("search")).unwrap();
        fs::write(dir.join("search/search.js"), "// search").unwrap();
    }

    fn write_bundle_zip(path: &Path) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        for (name, content) in [
            ("docs/html/navtreedata.js", NAVTREEDATA),
            ("docs/html/files_dup.js", FILES_DUP),
            ("docs/html/navtreeindex0.js", NAVTREEINDEX0),
            ("docs/html/files.html", FILES_HTML),
        ] {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_directory_bundle() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle_dir(dir.path());

        let mut bundle = DocBundle::from_path(dir.path()).unwrap();
        let tree = bundle.load_tree().unwrap();

        assert!(tree.external_refs().is_empty());
        assert_eq!(tree.find_by_link("main_8c.html").len(), 1);
        assert_eq!(tree.sync_messages().on, "clique para desativar a sincronização do painel");

        let files = bundle.list_files().unwrap();
        assert!(files.contains(&"search/search.js".to_string()));
        assert!(files.contains(&"navtreedata.js".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_list_files_does_not_follow_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle_dir(dir.path());
        std::os::unix::fs::symlink(dir.path(), dir.path().join("search/loop")).unwrap();

        let mut bundle = DocBundle::from_path(dir.path()).unwrap();
        let files = bundle.list_files().unwrap();

        assert_eq!(
            files,
            vec![
                "files.html",
                "files_dup.js",
                "navtreedata.js",
                "navtreeindex0.js",
                "search/search.js",
            ]
        );
    }

    #[test]
    fn test_open_script_file_directly() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle_dir(dir.path());

        let mut bundle = DocBundle::from_path(dir.path().join("navtreedata.js")).unwrap();
        assert_eq!(bundle.load_tree().unwrap().root().label(), "Docs");
    }

    #[test]
    fn test_without_external_resolution() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle_dir(dir.path());

        let mut config = ViewerConfig::default_config();
        config.resolve_external = false;
        let mut bundle = DocBundle::open(dir.path(), config).unwrap();
        let tree = bundle.load_tree().unwrap();
        assert_eq!(tree.external_refs(), vec!["files_dup"]);
    }

    #[test]
    fn test_missing_navtree_script() {
        let dir = tempfile::tempdir().unwrap();
        match DocBundle::from_path(dir.path()) {
            Err(DocError::MissingFile(name)) => assert_eq!(name, "navtreedata.js"),
            Err(other) => panic!("期望MissingFile错误, 实际: {other}"),
            Ok(_) => panic!("期望MissingFile错误"),
        }
    }

    #[test]
    fn test_zip_bundle_with_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("docs.zip");
        write_bundle_zip(&zip_path);

        let mut bundle = DocBundle::from_path(&zip_path).unwrap();
        let tree = bundle.load_tree().unwrap();
        assert_eq!(tree.statistics().total_nodes, 4);

        let files = bundle.list_files().unwrap();
        assert_eq!(
            files,
            vec!["files.html", "files_dup.js", "navtreedata.js", "navtreeindex0.js"]
        );
    }

    #[test]
    fn test_locate_and_page_title() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle_dir(dir.path());

        let mut bundle = DocBundle::from_path(dir.path()).unwrap();
        let tree = bundle.load_tree().unwrap();

        let path = bundle.locate(&tree, "main_8c.html").unwrap().unwrap();
        assert_eq!(path, vec![0, 0, 0]);
        assert_eq!(tree.node_by_path(&path).unwrap().label(), "main.c");

        assert_eq!(bundle.locate(&tree, "nowhere.html").unwrap(), None);

        assert_eq!(
            bundle.page_title("files.html#details").unwrap(),
            Some("Lista de ficheiros".to_string())
        );
        assert_eq!(bundle.page_title("absent.html").unwrap(), None);
    }
}
