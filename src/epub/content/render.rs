//! 标记到纯文本的转换
//!
//! 转换器是一个可替换的外部服务：输入一段XHTML标记，输出保留段落分隔的纯文本。
//! 它不会因为标记残缺而失败，只会尽力给出降级的结果。

use std::borrow::Cow;

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use scraper::{ElementRef, Html, Node, Selector};

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("body是合法的选择器"));

/// 水平分隔线的文本表示
const RULE: &str = "* * *";

/// 把一段标记转换为纯文本
pub trait TextRenderer {
    /// 转换标记，返回纯文本
    fn render(&self, markup: &str) -> String;
}

impl<F> TextRenderer for F
where
    F: Fn(&str) -> String,
{
    fn render(&self, markup: &str) -> String {
        self(markup)
    }
}

/// 基于scraper的默认转换器
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTextRenderer;

impl HtmlTextRenderer {
    pub fn new() -> Self {
        Self
    }

    fn process_element(element: ElementRef, text: &mut TextBuilder) {
        let tag_name = element.value().name();

        if matches!(
            tag_name,
            "head" | "script" | "style" | "title" | "noscript" | "template"
        ) {
            return;
        }

        match tag_name {
            "img" => {
                if let Some(alt) = element.value().attr("alt").filter(|alt| !alt.trim().is_empty()) {
                    text.push_text(&format!("[{}]", alt.trim()));
                }
                return;
            }
            "br" => {
                text.line_break();
                return;
            }
            "hr" => {
                text.paragraph_break();
                text.push_text(RULE);
                text.paragraph_break();
                return;
            }
            _ => {}
        }

        let block = is_block(tag_name);
        if block {
            text.paragraph_break();
        }

        let preformatted = tag_name == "pre";
        if preformatted {
            text.preformatted += 1;
        }

        for node in element.children() {
            match node.value() {
                Node::Text(t) if text.preformatted > 0 => text.push_preformatted(t),
                Node::Text(t) => text.push_text(t),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(node) {
                        Self::process_element(child, text);
                    }
                }
                _ => {}
            }
        }

        if preformatted {
            text.preformatted -= 1;
        }
        if block {
            text.paragraph_break();
        }
    }
}

impl TextRenderer for HtmlTextRenderer {
    fn render(&self, markup: &str) -> String {
        let markup = expand_self_closing(markup);
        let document = Html::parse_document(&markup);

        let mut text = TextBuilder::default();
        let root = document
            .select(&BODY_SELECTOR)
            .next()
            .unwrap_or_else(|| document.root_element());
        Self::process_element(root, &mut text);

        text.finish()
    }
}

/// 把XHTML中自闭合的非空元素展开成一对标签
///
/// HTML解析器把`<title/>`、`<script src="a.js"/>`当作开始标签，
/// 之后的全部内容都会被吞进这个元素。不是格式良好的XML时原样返回。
fn expand_self_closing(markup: &str) -> Cow<'_, str> {
    match rewrite_self_closing(markup) {
        Ok(Some(rewritten)) => Cow::Owned(rewritten),
        Ok(None) => Cow::Borrowed(markup),
        Err(e) => {
            log::debug!("正文不是格式良好的XHTML，按HTML解析: {}", e);
            Cow::Borrowed(markup)
        }
    }
}

fn rewrite_self_closing(markup: &str) -> crate::epub::error::Result<Option<String>> {
    let mut reader = Reader::from_str(markup);
    let mut writer = Writer::new(Vec::with_capacity(markup.len()));
    let mut changed = false;

    loop {
        match reader.read_event()? {
            Event::Empty(e) if !is_void(e.local_name().as_ref()) => {
                let end = e.to_end().into_owned();
                writer.write_event(Event::Start(e))?;
                writer.write_event(Event::End(end))?;
                changed = true;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    if !changed {
        return Ok(None);
    }
    Ok(String::from_utf8(writer.into_inner()).ok())
}

/// HTML中没有内容的元素，保持自闭合
fn is_void(tag_name: &[u8]) -> bool {
    matches!(
        tag_name,
        b"area"
            | b"base"
            | b"br"
            | b"col"
            | b"embed"
            | b"hr"
            | b"img"
            | b"input"
            | b"link"
            | b"meta"
            | b"param"
            | b"source"
            | b"track"
            | b"wbr"
    )
}

fn is_block(tag_name: &str) -> bool {
    matches!(
        tag_name,
        "p" | "div"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "li"
            | "ul"
            | "ol"
            | "dl"
            | "dt"
            | "dd"
            | "tr"
            | "table"
            | "blockquote"
            | "pre"
            | "section"
            | "article"
            | "aside"
            | "header"
            | "footer"
            | "nav"
            | "figure"
            | "figcaption"
            | "address"
    )
}

/// 累积输出文本，负责空白折叠和段落分隔
#[derive(Debug, Default)]
struct TextBuilder {
    out: String,
    pending_space: bool,
    preformatted: usize,
}

impl TextBuilder {
    fn push_text(&mut self, text: &str) {
        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }

        let mut first = true;
        for word in text.split_whitespace() {
            let separated = !first || self.pending_space;
            if separated && !self.out.is_empty() && !self.out.ends_with('\n') {
                self.out.push(' ');
            }
            self.out.push_str(word);
            first = false;
        }

        if !first {
            self.pending_space = text.ends_with(char::is_whitespace);
        }
    }

    /// `pre`中的文本：保留换行和行内空白
    fn push_preformatted(&mut self, text: &str) {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.line_break();
            }
            self.out.push_str(line.trim_end_matches('\r'));
        }
        self.pending_space = false;
    }

    fn line_break(&mut self) {
        self.out.push('\n');
        self.pending_space = false;
    }

    fn paragraph_break(&mut self) {
        self.pending_space = false;
        if self.out.is_empty() {
            return;
        }
        let trailing = self.out.len() - self.out.trim_end_matches('\n').len();
        for _ in trailing..2 {
            self.out.push('\n');
        }
    }

    fn finish(self) -> String {
        clean_excessive_newlines(&self.out)
    }
}

/// 把超过两个的连续换行压缩为两个，并去掉首尾空白
fn clean_excessive_newlines(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut newline_count = 0;

    for ch in text.chars() {
        if ch == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                result.push(ch);
            }
        } else {
            newline_count = 0;
            result.push(ch);
        }
    }

    result.trim().to_string()
}
