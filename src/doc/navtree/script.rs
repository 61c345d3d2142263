//! 导航脚本解析器模块
//!
//! 解析Doxygen生成的 `navtreedata.js`、`navtreeindexN.js` 以及外部子节点脚本。
//! 这些文件只包含 `var NAME = <字面量>;` 形式的声明，字面量是JavaScript
//! 对象语法的一个子集，解析结果用 `serde_json::Value` 表示。

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag, take_until, take_while, take_while_m_n, take_while1},
    character::complete::{anychar, char, digit1, multispace1, satisfy},
    combinator::{cut, map, map_opt, opt, recognize, value, verify},
    error::{Error, ErrorKind},
    multi::{fold_many0, many0_count, separated_list0},
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, terminated},
};
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::doc::error::{DocError, Result};

/// 数组和对象的最大嵌套层数
pub const MAX_NESTING_DEPTH: usize = 128;

/// 单个变量声明
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// 变量名
    pub name: String,
    /// 变量值
    pub value: Value,
}

/// 脚本解析结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    declarations: Vec<Declaration>,
}

impl Script {
    /// 解析脚本内容
    ///
    /// # 参数
    /// * `source` - 脚本文本
    ///
    /// # 返回值
    /// * `Result<Script>` - 按声明顺序排列的变量
    ///
    /// 同名变量重复声明时，值相同则忽略后一次声明，值不同则返回校验错误。
    /// 嵌套超过 [`MAX_NESTING_DEPTH`] 层时返回语法错误。
    pub fn parse(source: &str) -> Result<Script> {
        let source = source.trim_start_matches('\u{feff}');
        let mut script = Script::default();
        let mut rest = source;

        loop {
            let (after, _) = trivia(rest).map_err(|e| script_error(source, e))?;
            rest = after;
            if rest.is_empty() {
                break;
            }
            if let Some(after) = rest.strip_prefix(';') {
                rest = after;
                continue;
            }

            let (after, (name, value)) =
                declaration(rest).map_err(|e| script_error(source, e))?;
            script.declare(name, value)?;
            rest = after;
        }

        debug!(declarations = script.declarations.len(), "脚本解析完成");
        Ok(script)
    }

    /// 添加声明
    pub fn declare(&mut self, name: String, value: Value) -> Result<()> {
        if let Some(existing) = self.get(&name) {
            if *existing != value {
                return Err(DocError::validation(format!(
                    "变量 {name} 被重复声明且取值不一致"
                )));
            }
            return Ok(());
        }
        self.declarations.push(Declaration { name, value });
        Ok(())
    }

    /// 根据变量名获取值
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.declarations
            .iter()
            .find(|declaration| declaration.name == name)
            .map(|declaration| &declaration.value)
    }

    /// 所有声明
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// 所有变量名
    pub fn names(&self) -> Vec<&str> {
        self.declarations.iter().map(|d| d.name.as_str()).collect()
    }
}

/// 把nom错误转换为带行列号的脚本错误
fn script_error(source: &str, err: nom::Err<Error<&str>>) -> DocError {
    let (remaining, code) = match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => (e.input, Some(e.code)),
        nom::Err::Incomplete(_) => ("", None),
    };

    let consumed = &source[..source.len() - remaining.len()];
    let line = consumed.matches('\n').count() + 1;
    let column = consumed
        .rsplit('\n')
        .next()
        .map_or(0, |tail| tail.chars().count())
        + 1;

    let reason = match code {
        Some(ErrorKind::TooLarge) => format!("嵌套超过 {MAX_NESTING_DEPTH} 层"),
        Some(ErrorKind::Char) => "缺少预期的分隔符".to_string(),
        Some(ErrorKind::Verify) => "不支持的语句".to_string(),
        Some(ErrorKind::TakeUntil) => "块注释未闭合".to_string(),
        Some(ErrorKind::MapOpt) => "无效的转义序列或数字".to_string(),
        Some(other) => format!("语法错误 ({})", other.description()),
        None => "脚本不完整".to_string(),
    };
    let found = match remaining.chars().next() {
        Some(ch) => format!("'{ch}'"),
        None => "脚本结尾".to_string(),
    };

    DocError::Script {
        line,
        column,
        message: format!("{reason}, 位于 {found}"),
    }
}

// --- 组合子 ---

type ParseResult<'a, O> = IResult<&'a str, O>;

/// 空白和注释
fn trivia(input: &str) -> ParseResult<'_, ()> {
    map(
        many0_count(alt((multispace1, line_comment, block_comment))),
        |_| (),
    )
    .parse(input)
}

fn line_comment(input: &str) -> ParseResult<'_, &str> {
    recognize(pair(tag("//"), opt(is_not("\n")))).parse(input)
}

fn block_comment(input: &str) -> ParseResult<'_, &str> {
    recognize(delimited(tag("/*"), cut(take_until("*/")), tag("*/"))).parse(input)
}

/// 消耗 `inner` 两侧的空白和注释
fn ws<'a, F, O>(inner: F) -> impl Parser<&'a str, Output = O, Error = Error<&'a str>>
where
    F: Parser<&'a str, Output = O, Error = Error<&'a str>>,
{
    delimited(trivia, inner, trivia)
}

fn identifier(input: &str) -> ParseResult<'_, &str> {
    recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_' || c == '$'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
    ))
    .parse(input)
}

/// `var NAME = value;`
fn declaration(input: &str) -> ParseResult<'_, (String, Value)> {
    let (input, _) = verify(identifier, |word: &str| {
        matches!(word, "var" | "let" | "const")
    })
    .parse(input)?;

    let (input, (name, value)) = cut((
        preceded(trivia, identifier),
        preceded(ws(char('=')), |i| literal_value(i, 0)),
    ))
    .parse(input)?;
    let (input, _) = opt(preceded(trivia, char(';'))).parse(input)?;

    Ok((input, (name.to_string(), value)))
}

fn literal_value(input: &str, depth: usize) -> ParseResult<'_, Value> {
    preceded(
        trivia,
        alt((
            |i| array(i, depth),
            |i| object(i, depth),
            map(string, Value::String),
            number,
            keyword,
        )),
    )
    .parse(input)
}

fn too_deep(input: &str) -> nom::Err<Error<&str>> {
    nom::Err::Failure(Error::new(input, ErrorKind::TooLarge))
}

fn array(input: &str, depth: usize) -> ParseResult<'_, Value> {
    let (input, _) = char('[').parse(input)?;
    if depth >= MAX_NESTING_DEPTH {
        return Err(too_deep(input));
    }

    let (input, items) = cut(terminated(
        separated_list0(ws(char(',')), |i| literal_value(i, depth + 1)),
        (opt(ws(char(','))), ws(char(']'))),
    ))
    .parse(input)?;

    Ok((input, Value::Array(items)))
}

fn object(input: &str, depth: usize) -> ParseResult<'_, Value> {
    let (input, _) = char('{').parse(input)?;
    if depth >= MAX_NESTING_DEPTH {
        return Err(too_deep(input));
    }

    let (input, entries) = cut(terminated(
        separated_list0(ws(char(',')), |i| object_entry(i, depth + 1)),
        (opt(ws(char(','))), ws(char('}'))),
    ))
    .parse(input)?;

    Ok((input, Value::Object(entries.into_iter().collect::<Map<_, _>>())))
}

fn object_entry(input: &str, depth: usize) -> ParseResult<'_, (String, Value)> {
    let (input, key) = preceded(trivia, object_key).parse(input)?;
    let (input, value) =
        cut(preceded(ws(char(':')), |i| literal_value(i, depth))).parse(input)?;
    Ok((input, (key, value)))
}

/// 对象键：字符串、数字或裸标识符
fn object_key(input: &str) -> ParseResult<'_, String> {
    alt((
        string,
        map(digit1, str::to_string),
        map(identifier, str::to_string),
    ))
    .parse(input)
}

fn keyword(input: &str) -> ParseResult<'_, Value> {
    map_opt(identifier, |word: &str| match word {
        "null" | "undefined" => Some(Value::Null),
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => None,
    })
    .parse(input)
}

/// 整数优先解析为 i64，其余为 f64
fn number(input: &str) -> ParseResult<'_, Value> {
    map_opt(recognize_float, |literal: &str| {
        let literal = literal.strip_prefix('+').unwrap_or(literal);
        if let Ok(integer) = literal.parse::<i64>() {
            return Some(Value::from(integer));
        }
        literal
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
    })
    .parse(input)
}

// --- 字符串 ---

#[derive(Debug, Clone)]
enum Fragment<'a> {
    Literal(&'a str),
    Escaped(char),
    /// 反斜杠加换行
    Continuation,
}

fn string(input: &str) -> ParseResult<'_, String> {
    alt((quoted('"'), quoted('\''))).parse(input)
}

fn quoted<'a>(quote: char) -> impl Parser<&'a str, Output = String, Error = Error<&'a str>> {
    preceded(
        char(quote),
        cut(terminated(
            fold_many0(
                move |i| string_fragment(i, quote),
                String::new,
                |mut text: String, fragment: Fragment<'a>| {
                    match fragment {
                        Fragment::Literal(s) => text.push_str(s),
                        Fragment::Escaped(c) => text.push(c),
                        Fragment::Continuation => {}
                    }
                    text
                },
            ),
            char(quote),
        )),
    )
}

fn string_fragment(input: &str, quote: char) -> ParseResult<'_, Fragment<'_>> {
    alt((
        map(
            take_while1(move |c: char| c != quote && c != '\\' && c != '\n'),
            Fragment::Literal,
        ),
        preceded(char('\\'), escape),
    ))
    .parse(input)
}

fn escape(input: &str) -> ParseResult<'_, Fragment<'_>> {
    alt((
        value(Fragment::Continuation, char('\n')),
        map(preceded(char('u'), cut(unicode_escape)), Fragment::Escaped),
        map(
            preceded(char('x'), cut(map_opt(hex_code(2), char::from_u32))),
            Fragment::Escaped,
        ),
        map(anychar, |c| {
            Fragment::Escaped(match c {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                'b' => '\u{8}',
                'f' => '\u{c}',
                'v' => '\u{b}',
                '0' => '\0',
                other => other,
            })
        }),
    ))
    .parse(input)
}

fn hex_code<'a>(count: usize) -> impl Parser<&'a str, Output = u32, Error = Error<&'a str>> {
    map_opt(
        take_while_m_n(count, count, |c: char| c.is_ascii_hexdigit()),
        |digits: &str| u32::from_str_radix(digits, 16).ok(),
    )
}

/// `\u{...}`、代理对或单个 `\uXXXX`
fn unicode_escape(input: &str) -> ParseResult<'_, char> {
    let braced = map_opt(
        delimited(
            char('{'),
            take_while_m_n(1, 6, |c: char| c.is_ascii_hexdigit()),
            char('}'),
        ),
        |digits: &str| u32::from_str_radix(digits, 16).ok().and_then(char::from_u32),
    );
    let surrogate_pair = map_opt(
        (
            verify(hex_code(4), |high: &u32| (0xD800..0xDC00).contains(high)),
            preceded(
                tag("\\u"),
                verify(hex_code(4), |low: &u32| (0xDC00..0xE000).contains(low)),
            ),
        ),
        |(high, low)| char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)),
    );

    alt((braced, surrogate_pair, map_opt(hex_code(4), char::from_u32))).parse(input)
}

/// 脚本写入器
///
/// 按Doxygen的排版输出声明，生成的文本可以被 [`Script::parse`] 重新解析。
#[derive(Debug, Default)]
pub struct ScriptWriter {
    output: String,
}

impl ScriptWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入导航树声明（值为三元组数组）
    pub fn declare_tree(&mut self, name: &str, nodes: &[Value]) -> &mut Self {
        self.output.push_str(&format!("var {name} =\n[\n"));
        let rendered: Vec<String> = nodes.iter().map(|node| render_triple(node, 1)).collect();
        self.output.push_str(&rendered.join(",\n"));
        self.output.push_str("\n];\n\n");
        self
    }

    /// 写入字符串列表声明，每行一项
    pub fn declare_list(&mut self, name: &str, items: &[String]) -> &mut Self {
        self.output.push_str(&format!("var {name} =\n[\n"));
        let rendered: Vec<String> = items.iter().map(|item| quote_double(item)).collect();
        self.output.push_str(&rendered.join(",\n"));
        if !items.is_empty() {
            self.output.push('\n');
        }
        self.output.push_str("];\n\n");
        self
    }

    /// 写入单引号字符串声明
    pub fn declare_string(&mut self, name: &str, text: &str) -> &mut Self {
        self.output
            .push_str(&format!("var {name} = {};\n", quote_single(text)));
        self
    }

    /// 写入任意值声明
    pub fn declare_value(&mut self, name: &str, value: &Value) -> &mut Self {
        self.output.push_str(&format!("var {name} =\n{value};\n\n"));
        self
    }

    /// 获取生成的脚本文本
    pub fn finish(self) -> String {
        self.output
    }
}

/// 按Doxygen的缩进风格渲染三元组
fn render_triple(node: &Value, level: usize) -> String {
    let indent = "  ".repeat(level);
    match node.as_array().map(Vec::as_slice) {
        Some([label, link, Value::Array(children)]) if !children.is_empty() => {
            let rendered: Vec<String> = children
                .iter()
                .map(|child| render_triple(child, level + 1))
                .collect();
            format!(
                "{indent}[ {label}, {link}, [\n{}\n{indent}] ]",
                rendered.join(",\n")
            )
        }
        Some([label, link, children]) => {
            format!("{indent}[ {label}, {link}, {children} ]")
        }
        _ => format!("{indent}{node}"),
    }
}

fn quote_double(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

fn quote_single(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for ch in text.chars() {
        match ch {
            '\'' => quoted.push_str("\\'"),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if (c as u32) < 0x20 => quoted.push_str(&format!("\\u{:04x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}
