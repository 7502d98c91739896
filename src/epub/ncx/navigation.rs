//! NCX导航条目数据结构定义

use std::fmt::{Display, Formatter, Result as FmtResult};

/// 一个目录条目
///
/// 条目按文档顺序平铺存放，层级只作为渲染用的元数据。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEntry {
    /// 唯一标识符
    pub id: String,
    /// 声明的播放顺序，不参与排序
    pub play_order: u32,
    /// 嵌套层级，顶层为0
    pub level: usize,
    /// 目标内容文件路径（已解码，去掉了#片段）
    pub target_path: String,
    /// 显示文本
    pub text: String,
}

impl NavigationEntry {
    /// 创建新的目录条目，目标路径和文本稍后由解析器填充
    pub fn new(id: String, play_order: u32, level: usize) -> Self {
        Self {
            id,
            play_order,
            level,
            target_path: String::new(),
            text: String::new(),
        }
    }

    /// 是否引用了内容文件
    pub fn has_target(&self) -> bool {
        !self.target_path.is_empty()
    }
}

impl Display for NavigationEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}{}", "  ".repeat(self.level), self.text)?;
        if self.has_target() {
            write!(f, " -> {}", self.target_path)?;
        }
        Ok(())
    }
}
