//! 转换配置模块
//!
//! 提供文本输出格式和容错策略的配置，支持从YAML文件加载。

use crate::epub::error::{EpubError, Result};
use crate::epub::opf::DEFAULT_NAVIGATION_IDS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "epubtext.yaml";

/// 文本提取配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// 标题行使用的标记字符，重复次数为层级加一
    pub heading_marker: char,
    /// 第二行显示文本之后、层级数字之前的分隔符
    pub level_delimiter: String,
    /// 被视为导航文档的manifest项ID
    pub navigation_ids: Vec<String>,
    /// 内容文件缺失时跳过该条目的正文而不是中止整本书
    pub skip_missing_content: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            heading_marker: '*',
            level_delimiter: "{{{".to_string(),
            navigation_ids: DEFAULT_NAVIGATION_IDS.iter().map(|id| id.to_string()).collect(),
            skip_missing_content: false,
        }
    }
}

impl ConvertConfig {
    /// 从YAML配置文件加载
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 示例
    ///
    /// ```rust,no_run
    /// use epubtext::ConvertConfig;
    /// let config = ConvertConfig::from_file("epubtext.yaml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| EpubError::Config(format!("无法读取配置文件: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// 从YAML文本解析，缺失的字段使用默认值
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yml::from_str(content)
            .map_err(|e| EpubError::Config(format!("配置文件格式错误: {}", e)))?;

        if config.navigation_ids.is_empty() {
            return Err(EpubError::Config("navigation_ids不能为空".to_string()));
        }
        Ok(config)
    }

    /// 生成带注释的默认配置文件
    ///
    /// # 参数
    /// * `path` - 要写入的文件路径
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let yaml_content = serde_yml::to_string(&Self::default())
            .map_err(|e| EpubError::Config(format!("序列化配置失败: {}", e)))?;

        let content_with_header = format!(
            "# EPUB文本提取配置文件\n# heading_marker: 标题行标记字符\n# level_delimiter: 层级分隔符\n# navigation_ids: 导航文档的manifest项ID\n# skip_missing_content: 内容文件缺失时是否继续\n\n{}",
            yaml_content
        );

        fs::write(path.as_ref(), content_with_header)
            .map_err(|e| EpubError::Config(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }

    /// 尝试从文件加载，文件不存在时使用默认配置
    ///
    /// 文件存在但无法解析时同样回退到默认配置，并记录警告。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::metadata(path) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("配置文件 {} 不存在，使用默认配置", path.display());
                return Self::default();
            }
            _ => {}
        }

        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}，使用默认配置", e);
                Self::default()
            }
        }
    }
}
