//! OPF（Open Packaging Format）包文档解析模块
//!
//! 从包文档中提取书名、作者以及导航文档的路径。

mod descriptor;
mod parser;

pub use descriptor::PackageDescriptor;
pub use parser::{DEFAULT_NAVIGATION_IDS, PackageParser};
