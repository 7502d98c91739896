//! 正文组装
//!
//! 按目录顺序依次解析每个条目引用的内容文件，交给文本转换器渲染，
//! 输出带层级标记的文本块。同一个内容文件被多个条目引用时会被重复读取和渲染。

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::{self, Read, Seek, Write};

use crate::epub::config::ConvertConfig;
use crate::epub::content::TextRenderer;
use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::NavigationEntry;
use crate::epub::path::resolve_path;
use crate::epub::reader::Epub;

/// 一个目录条目对应的三行文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    /// 标记行，例如 `** 第一节`
    pub heading: String,
    /// 带层级分隔符的显示文本，例如 `第一节{{{2`
    pub label: String,
    /// 渲染后的正文
    pub body: String,
}

impl Display for TextBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{}", self.heading)?;
        writeln!(f, "{}", self.label)?;
        writeln!(f, "{}", self.body)
    }
}

/// 整本书的文本输出，文本块按目录顺序排列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedOutput {
    pub blocks: Vec<TextBlock>,
}

impl RenderedOutput {
    /// 把全部文本写入输出流
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for block in &self.blocks {
            write!(writer, "{}", block)?;
        }
        Ok(())
    }

    /// 输出文本的字符数，每个文本块另有三个换行符
    pub fn char_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|block| {
                block.heading.chars().count()
                    + block.label.chars().count()
                    + block.body.chars().count()
                    + 3
            })
            .sum()
    }
}

impl Display for RenderedOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for block in &self.blocks {
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}

/// 正文组装器
pub struct ContentAssembler<'a> {
    config: &'a ConvertConfig,
    renderer: &'a dyn TextRenderer,
}

impl<'a> ContentAssembler<'a> {
    pub fn new(config: &'a ConvertConfig, renderer: &'a dyn TextRenderer) -> Self {
        Self { config, renderer }
    }

    /// 按目录顺序组装全书文本
    ///
    /// # 参数
    /// * `epub` - 已打开的EPUB
    /// * `entries` - 按文档顺序排列的目录条目
    /// * `base_dir` - 包文档所在目录，条目的目标路径相对于它解析
    ///
    /// # 返回值
    /// * `Result<RenderedOutput>` - 内容文件缺失时默认返回`MissingResource`错误
    pub fn assemble<R: Read + Seek>(
        &self,
        epub: &mut Epub<R>,
        entries: &[NavigationEntry],
        base_dir: &str,
    ) -> Result<RenderedOutput> {
        let mut output = RenderedOutput::default();

        for entry in entries {
            let body = self.render_body(epub, entry, base_dir)?;
            output.blocks.push(TextBlock {
                heading: self.heading(entry),
                label: self.label(entry),
                body,
            });
        }

        Ok(output)
    }

    /// 标记行：层级加一个标记字符，空格，显示文本
    pub fn heading(&self, entry: &NavigationEntry) -> String {
        let marker = self.config.heading_marker.to_string().repeat(entry.level + 1);
        format!("{} {}", marker, entry.text)
    }

    /// 第二行：显示文本，分隔符，层级加一
    pub fn label(&self, entry: &NavigationEntry) -> String {
        format!("{}{}{}", entry.text, self.config.level_delimiter, entry.level + 1)
    }

    fn render_body<R: Read + Seek>(
        &self,
        epub: &mut Epub<R>,
        entry: &NavigationEntry,
        base_dir: &str,
    ) -> Result<String> {
        if !entry.has_target() {
            return Ok(String::new());
        }

        let path = resolve_path(base_dir, &entry.target_path);
        log::debug!("渲染导航点 {} -> {}", entry.id, path);

        match epub.read_text(&path) {
            Ok(markup) => Ok(self.renderer.render(&markup)),
            Err(EpubError::MissingResource(missing)) if self.config.skip_missing_content => {
                log::warn!("导航点 {} 引用的内容文件 {} 不存在，已跳过正文", entry.id, missing);
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }
}
