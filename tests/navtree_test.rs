use std::fs;
use std::path::Path;

use navforge::{DocBundle, DocError, NavTree, TreeStyle, TreeView, ViewerConfig};

const FIXTURE: &str = include_str!("fixtures/navtreedata.js");

fn fixture_tree() -> NavTree {
    NavTree::from_script(FIXTURE).expect("解析navtreedata.js失败")
}

#[test]
fn test_fixture_structure() {
    let tree = fixture_tree();
    let root = tree.root();

    assert_eq!(root.label(), "Sensores_e_Atuadores_do_Kit_BitDogLab");
    assert_eq!(root.link_token(), Some("index.html"));
    assert_eq!(root.children().len(), 7);

    let labels: Vec<&str> = root.children().iter().map(|node| node.label()).collect();
    assert_eq!(labels[0], "Sensores e Atuadores do KIT");
    assert_eq!(labels[5], "Estruturas de dados");
    assert_eq!(labels[6], "Ficheiros");

    let stats = tree.statistics();
    assert_eq!(stats.total_nodes, 43);
    assert_eq!(stats.leaf_count, 27);
    assert_eq!(stats.max_depth, 4);
    assert_eq!(stats.grouping_nodes, 0);
    assert_eq!(stats.external_refs, 7);
    assert_eq!(stats.index_pages, 7);
}

#[test]
fn test_fixture_external_refs_in_document_order() {
    let tree = fixture_tree();
    assert_eq!(
        tree.external_refs(),
        vec![
            "index",
            "annotated_dup",
            "functions_dup",
            "files_dup",
            "globals_dup",
            "globals_func",
            "globals_defs",
        ]
    );
}

#[test]
fn test_traversal_visits_every_node_once() {
    let tree = fixture_tree();
    let entries: Vec<_> = tree.entries().collect();
    assert_eq!(entries.len(), tree.root().get_total_nodes());

    // 路径唯一，且父节点先于子节点出现
    for (position, entry) in entries.iter().enumerate() {
        assert!(std::ptr::eq(entry.node, tree.node_by_path(&entry.path).unwrap()));
        if let Some((_, parent_path)) = entry.path.split_last() {
            let parent_position = entries
                .iter()
                .position(|candidate| candidate.path == parent_path)
                .unwrap();
            assert!(parent_position < position);
        }
    }

    // 同级节点按声明顺序
    let readme_children: Vec<&str> = tree
        .node_by_path(&[3])
        .unwrap()
        .children()
        .iter()
        .map(|node| node.label())
        .collect();
    assert_eq!(readme_children.first(), Some(&"Pré\u{2011}requisitos"));
    assert_eq!(readme_children.last(), Some(&"Licença"));
}

#[test]
fn test_find_by_link_on_fixture() {
    let tree = fixture_tree();

    let annotated = tree.find_by_link("annotated.html");
    assert_eq!(annotated.len(), 2);
    assert!(annotated.iter().all(|node| node.label() == "Estruturas de dados"));

    assert_eq!(tree.find_by_link("index.html").len(), 2);
    assert_eq!(tree.find_by_link("globals_eval.html").len(), 1);
    assert!(tree.find_by_link("nao_existe.html").is_empty());

    let anchored = tree.find_by_link(
        "md_no-OS-FatFS-SD-SPI-RPi-Pico_2example_2README_8pt.html#autotoc_md133",
    );
    assert_eq!(anchored.len(), 1);
    assert_eq!(anchored[0].label(), "Configuração de Hardware");
    assert_eq!(anchored[0].link().unwrap().anchor(), Some("autotoc_md133"));

    let same_page = tree.find_by_page("md_no-OS-FatFS-SD-SPI-RPi-Pico_2README_8pt.html");
    assert_eq!(same_page.len(), 8);
}

#[test]
fn test_pagination_on_fixture() {
    let tree = fixture_tree();

    assert_eq!(tree.page_at(0).unwrap(), "BH1750-RP2040-RP3050_2main_8cpp.html");
    assert_eq!(
        tree.page_at(6).unwrap(),
        "util_8h.html#ac47c47e23cb9765cfa41fea8436039f6"
    );
    for index in [7, 8, usize::MAX] {
        assert!(matches!(
            tree.page_at(index),
            Err(DocError::IndexOutOfRange { len: 7, .. })
        ));
    }

    assert_eq!(tree.index().page_for_link("files.html"), Some(3));
    assert_eq!(tree.index().page_for_link("annotated.html"), Some(0));
    assert_eq!(tree.index().page_for_link("ssd1306_8h.html"), Some(4));
}

#[test]
fn test_sync_messages_on_fixture() {
    let tree = fixture_tree();
    assert_eq!(
        tree.sync_messages().on,
        "clique para desativar a sincronização do painel"
    );
    assert_eq!(
        tree.sync_messages().off,
        "clique para ativar a sincronização do painel"
    );
}

#[test]
fn test_fixture_round_trips() {
    let tree = fixture_tree();

    let from_script = NavTree::from_script(&tree.to_script()).unwrap();
    assert_eq!(from_script, tree);

    let from_json = NavTree::from_json(&tree.to_json().unwrap()).unwrap();
    assert_eq!(from_json, tree);
}

#[test]
fn test_view_renders_fixture() {
    let tree = fixture_tree();
    let text = TreeView::new(&tree)
        .with_style(TreeStyle::Indented)
        .with_show_links(false)
        .with_max_depth(Some(2))
        .to_string();

    assert_eq!(text.lines().count(), 8);
    assert!(text.starts_with("• Sensores_e_Atuadores_do_Kit_BitDogLab\n"));
    assert!(text.contains("  • Ficheiros\n"));
}

fn write_bundle(dir: &Path) {
    fs::write(dir.join("navtreedata.js"), FIXTURE).unwrap();
    fs::write(
        dir.join("annotated_dup.js"),
        r#"var annotated_dup =
[
    [ "sd_card_t", "structsd__card__t.html", "structsd__card__t" ],
    [ "spi_t", "structspi__t.html", null ]
];"#,
    )
    .unwrap();
    fs::write(
        dir.join("structsd__card__t.js"),
        r#"var structsd__card__t =
[
    [ "state", "structsd__card__t.html#a1", null ]
];"#,
    )
    .unwrap();
}

#[test]
fn test_bundle_resolves_available_external_scripts() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path());

    let mut bundle = DocBundle::from_path(dir.path()).unwrap();
    let tree = bundle.load_tree().unwrap();

    // annotated_dup 已内联，其它脚本不存在，保留引用
    assert!(!tree.external_refs().contains(&"annotated_dup"));
    assert_eq!(tree.external_refs().len(), 6);

    let card = tree.find_by_link("structsd__card__t.html");
    assert_eq!(card.len(), 1);
    assert_eq!(card[0].children().len(), 1);
    assert_eq!(tree.statistics().total_nodes, 46);

    let path = tree.path_of_first("structsd__card__t.html#a1").unwrap();
    assert_eq!(path, vec![5, 0, 0, 0]);
    assert_eq!(
        tree.breadcrumbs(&path).unwrap(),
        vec![
            "Sensores_e_Atuadores_do_Kit_BitDogLab",
            "Estruturas de dados",
            "Estruturas de dados",
            "sd_card_t",
            "state",
        ]
    );
}

#[test]
fn test_bundle_rejects_external_cycle() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path());
    fs::write(
        dir.path().join("structsd__card__t.js"),
        r#"var structsd__card__t = [ [ "loop", "annotated.html", "annotated_dup" ] ];"#,
    )
    .unwrap();

    let mut bundle = DocBundle::from_path(dir.path()).unwrap();
    let err = bundle.load_tree().unwrap_err();
    assert!(err.is_validation(), "期望校验错误, 实际: {err}");

    // 不解析外部脚本时可以正常加载
    let mut config = ViewerConfig::default_config();
    config.resolve_external = false;
    let mut bundle = DocBundle::open(dir.path(), config).unwrap();
    assert_eq!(bundle.load_tree().unwrap().external_refs().len(), 7);
}

#[test]
fn test_convenience_open() {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path());

    let tree = navforge::open(dir.path()).unwrap();
    assert_eq!(tree.root().children().len(), 7);
}
