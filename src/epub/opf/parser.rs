//! OPF解析器模块
//!
//! 以事件驱动的状态机解析包文档。状态机本身不依赖XML读取器，
//! 可以直接喂入合成的事件序列。

use crate::epub::error::{EpubError, Result};
use crate::epub::opf::PackageDescriptor;
use crate::epub::xml;
use quick_xml::events::{BytesStart, Event};

/// 导航文档在manifest中的惯用ID
pub const DEFAULT_NAVIGATION_IDS: [&str; 3] = ["ncx", "toc", "ncxtoc"];

/// 当前正在累积文本的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Author,
}

/// 包文档解析状态机
#[derive(Debug)]
pub struct PackageParser<'a> {
    navigation_ids: &'a [String],
    field: Option<Field>,
    buffer: String,
    descriptor: PackageDescriptor,
}

impl<'a> PackageParser<'a> {
    /// 创建新的解析状态机
    ///
    /// # 参数
    /// * `navigation_ids` - 被视为导航文档的manifest项ID
    pub fn new(navigation_ids: &'a [String]) -> Self {
        Self {
            navigation_ids,
            field: None,
            buffer: String::new(),
            descriptor: PackageDescriptor::default(),
        }
    }

    /// 解析OPF文件内容
    ///
    /// # 参数
    /// * `xml_content` - OPF文件的XML内容
    /// * `navigation_ids` - 被视为导航文档的manifest项ID
    ///
    /// # 返回值
    /// * `Result<PackageDescriptor>` - 书名、作者和导航文档路径
    pub fn parse(xml_content: &str, navigation_ids: &[String]) -> Result<PackageDescriptor> {
        let mut parser = PackageParser::new(navigation_ids);
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
            b"title" => self.begin(Field::Title),
            b"creator" => self.begin(Field::Author),
            b"item" => self.inspect_manifest_item(e)?,
            _ => {}
        }
        Ok(())
    }

    /// 处理字符数据，同一字段的多段文本按文档顺序拼接
    pub fn characters(&mut self, text: &str) {
        if self.field.is_some() {
            self.buffer.push_str(text);
        }
    }

    /// 处理结束标签
    pub fn end_element(&mut self, local_name: &[u8]) {
        let field = match local_name {
            b"title" => Field::Title,
            b"creator" => Field::Author,
            _ => return,
        };
        if self.field != Some(field) {
            return;
        }

        let value = xml::collapse_whitespace(&self.buffer);
        match field {
            Field::Title => self.descriptor.title = value,
            Field::Author => self.descriptor.author = value,
        }
        self.buffer.clear();
        self.field = None;
    }

    /// 结束解析，返回结果
    pub fn finish(self) -> PackageDescriptor {
        self.descriptor
    }

    fn begin(&mut self, field: Field) {
        self.buffer.clear();
        self.field = Some(field);
    }

    /// 检查manifest项是否为导航文档，多个候选时以最后一个为准
    fn inspect_manifest_item(&mut self, e: &BytesStart) -> Result<()> {
        let Some(id) = xml::attribute(e, b"id")? else {
            return Ok(());
        };
        if !self.navigation_ids.iter().any(|candidate| *candidate == id) {
            return Ok(());
        }

        let href = xml::attribute(e, b"href")?.ok_or_else(|| {
            EpubError::Structural(format!("manifest项 {} 缺少href属性", id))
        })?;
        if self.descriptor.has_navigation() {
            log::warn!(
                "manifest中有多个导航文档候选，{} 覆盖了 {}",
                href,
                self.descriptor.navigation_path
            );
        }
        self.descriptor.navigation_path = href;
        Ok(())
    }
}
