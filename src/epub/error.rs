use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpubError>;

/// Epub文本提取过程中的错误类型
#[derive(Error, Debug)]
pub enum EpubError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("无法读取压缩包: {0}")]
    ArchiveRead(#[from] zip::result::ZipError),

    #[error("压缩包中缺少文件: {0}")]
    MissingResource(String),

    #[error("EPUB结构错误: {0}")]
    Structural(String),

    #[error("XML解析错误: {0}")]
    MalformedXml(#[from] quick_xml::Error),

    #[error("文件 {path} 不是有效的UTF-8文本: {source}")]
    Encoding {
        path: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("配置文件错误: {0}")]
    Config(String),
}

impl From<quick_xml::events::attributes::AttrError> for EpubError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        EpubError::MalformedXml(quick_xml::Error::InvalidAttr(err))
    }
}
