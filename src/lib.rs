pub mod epub;

// === 核心API重新导出 ===

/// EPUB文件读取器（主要接口）
pub use epub::{Conversion, Epub};

/// 错误处理
pub use epub::{EpubError, Result};

/// 转换配置
pub use epub::{ConvertConfig, DEFAULT_CONFIG_PATH};

// === 解析阶段（高级用法） ===

/// 容器组件
pub use epub::{CONTAINER_PATH, Container, PACKAGE_MEDIA_TYPE, RootFile};

/// 包文档组件
pub use epub::{DEFAULT_NAVIGATION_IDS, PackageDescriptor, PackageParser};

/// 导航组件
pub use epub::{NavigationEntry, NavigationParser};

/// 正文组件
pub use epub::{ContentAssembler, HtmlTextRenderer, RenderedOutput, TextBlock, TextRenderer};

/// 库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 快速打开EPUB文件
///
/// 这是 `Epub::new` 的便捷包装函数。
pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Epub> {
    Epub::new(path)
}

/// 按目录顺序提取EPUB的全部文本
///
/// # 示例
///
/// ```rust,no_run
/// let conversion = epubtext::convert("book.epub")?;
/// println!("书名: {}", conversion.descriptor.title);
/// print!("{}", conversion.output);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn convert<P: AsRef<std::path::Path>>(path: P) -> Result<Conversion> {
    Epub::new(path)?.extract_text()
}
