//! NCX（Navigation Control file for XML）文件解析模块
//!
//! 把NCX导航文档中嵌套的navPoint解析为按文档顺序平铺的目录条目。

pub mod navigation;
pub mod parser;

pub use navigation::NavigationEntry;
pub use parser::{NavigationParser, target_path};
