//! 正文内容模块
//!
//! 把目录条目引用的XHTML内容文件渲染为纯文本并按目录顺序组装。

pub mod assembler;
pub mod render;

pub use assembler::{ContentAssembler, RenderedOutput, TextBlock};
pub use render::{HtmlTextRenderer, TextRenderer};
