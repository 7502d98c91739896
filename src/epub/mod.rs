pub mod config;
pub mod container;
pub mod content;
pub mod error;
pub mod ncx;
pub mod opf;
pub mod path;
pub mod reader;
mod xml;

// 重新导出错误处理
pub use error::{EpubError, Result};

// 重新导出配置
pub use config::{ConvertConfig, DEFAULT_CONFIG_PATH};

// 重新导出容器相关
pub use container::{CONTAINER_PATH, Container, PACKAGE_MEDIA_TYPE, RootFile};

// 重新导出EPUB读取器
pub use reader::{Conversion, Epub};

// 重新导出OPF相关
pub use opf::{DEFAULT_NAVIGATION_IDS, PackageDescriptor, PackageParser};

// 重新导出NCX相关
pub use ncx::{NavigationEntry, NavigationParser};

// 重新导出正文相关
pub use content::{ContentAssembler, HtmlTextRenderer, RenderedOutput, TextBlock, TextRenderer};
