//! 包文档描述信息

/// 从OPF包文档中恢复出的书籍信息
///
/// 源文档中缺失的字段保持为空字符串，由使用方决定是否致命。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// 书名（dc:title）
    pub title: String,
    /// 作者（dc:creator）
    pub author: String,
    /// 导航文档（NCX）相对于包文档目录的路径
    pub navigation_path: String,
}

impl PackageDescriptor {
    /// 是否找到了导航文档
    pub fn has_navigation(&self) -> bool {
        !self.navigation_path.is_empty()
    }
}
