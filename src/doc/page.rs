//! 文档页面模块
//!
//! 从Doxygen生成的HTML页面中提取页面标题。

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static TITLE_DIV_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.title").unwrap());
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

/// 提取页面标题
///
/// 优先使用正文中的 `div.title`，其次使用 `<title>`；文本中的连续空白会被合并。
///
/// # 参数
/// * `html` - HTML页面内容
///
/// # 返回值
/// * `Option<String>` - 页面标题，没有标题或标题为空时返回 None
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    document
        .select(&TITLE_DIV_SELECTOR)
        .chain(document.select(&TITLE_SELECTOR))
        .map(element_text)
        .find(|title| !title.is_empty())
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_div_preferred() {
        let html = r#"<!DOCTYPE html>
<html><head><title>Sensores_e_Atuadores: Estruturas de dados</title></head>
<body>
<div class="header">
  <div class="headertitle"><div class="title">Estruturas   de
  dados</div></div>
</div>
</body></html>"#;
        assert_eq!(extract_title(html), Some("Estruturas de dados".to_string()));
    }

    #[test]
    fn test_falls_back_to_head_title() {
        let html = "<html><head><title> Ficheiros </title></head><body><p>x</p></body></html>";
        assert_eq!(extract_title(html), Some("Ficheiros".to_string()));
    }

    #[test]
    fn test_no_title() {
        assert_eq!(extract_title("<html><body><p>sem título</p></body></html>"), None);
        assert_eq!(
            extract_title("<html><head><title>  </title></head></html>"),
            None
        );
    }
}
