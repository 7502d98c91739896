//! NCX解析器模块
//!
//! 用一个栈式状态机把嵌套的navPoint展开成按文档顺序排列的条目列表。
//! 条目在开始标签处就追加到结果中，栈里只保存仍未关闭的祖先条目的下标。

use crate::epub::error::Result;
use crate::epub::ncx::NavigationEntry;
use crate::epub::xml;
use percent_encoding::percent_decode_str;
use quick_xml::events::{BytesStart, Event};

/// NCX导航文档解析状态机
#[derive(Debug, Default)]
pub struct NavigationParser {
    entries: Vec<NavigationEntry>,
    open: Vec<usize>,
    label: Option<String>,
}

impl NavigationParser {
    /// 创建新的解析状态机
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析NCX文件内容
    ///
    /// # 参数
    /// * `xml_content` - NCX文件的XML内容
    ///
    /// # 返回值
    /// * `Result<Vec<NavigationEntry>>` - 按文档顺序排列的目录条目
    pub fn parse(xml_content: &str) -> Result<Vec<NavigationEntry>> {
        let mut parser = NavigationParser::new();
        let mut reader = xml::reader(xml_content);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => parser.start_element(e)?,
                Event::Text(e) => parser.characters(&e.unescape()?),
                Event::CData(e) => parser.characters(&String::from_utf8_lossy(&e)),
                Event::End(ref e) => parser.end_element(e.local_name().as_ref()),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(parser.finish())
    }

    /// 处理开始标签
    pub fn start_element(&mut self, e: &BytesStart) -> Result<()> {
        match e.local_name().as_ref() {
            b"navPoint" => {
                let id = xml::attribute(e, b"id")?.unwrap_or_default();
                let play_order = xml::attribute(e, b"playOrder")?
                    .and_then(|value| value.trim().parse().ok())
                    .unwrap_or_else(|| {
                        log::debug!("导航点 {} 的playOrder缺失或无效，按0处理", id);
                        0
                    });

                let level = self.open.len();
                self.open.push(self.entries.len());
                self.entries.push(NavigationEntry::new(id, play_order, level));
            }
            b"content" => {
                if let Some(&current) = self.open.last() {
                    let src = xml::attribute(e, b"src")?.unwrap_or_default();
                    self.entries[current].target_path = target_path(&src);
                }
            }
            b"text" => {
                self.label = Some(String::new());
            }
            _ => {}
        }
        Ok(())
    }

    /// 处理字符数据
    pub fn characters(&mut self, text: &str) {
        if let Some(label) = self.label.as_mut() {
            label.push_str(text);
        }
    }

    /// 处理结束标签
    pub fn end_element(&mut self, local_name: &[u8]) {
        match local_name {
            b"text" => {
                if let (Some(label), Some(&current)) = (self.label.take(), self.open.last()) {
                    self.entries[current].text = xml::collapse_whitespace(&label);
                }
            }
            b"navPoint" => {
                self.open.pop();
            }
            _ => {}
        }
    }

    /// 结束解析，返回按文档顺序排列的条目
    pub fn finish(self) -> Vec<NavigationEntry> {
        for entry in self.entries.iter().filter(|entry| !entry.has_target()) {
            log::warn!("导航点 {} 没有引用任何内容文件", entry.id);
        }
        self.entries
    }
}

/// 解码content的src属性并去掉#片段标识
pub fn target_path(src: &str) -> String {
    let decoded = percent_decode_str(src).decode_utf8_lossy();
    decoded.split('#').next().unwrap_or_default().to_string()
}
