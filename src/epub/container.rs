use crate::epub::error::{EpubError, Result};
use crate::epub::xml;
use quick_xml::events::Event;

/// container.xml在压缩包中的固定位置
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// OPF包文档的媒体类型
pub const PACKAGE_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// Container.xml中的rootfile信息
#[derive(Debug, Clone, PartialEq)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: Option<String>,
}

/// Container.xml的解析结果
#[derive(Debug, Clone, Default)]
pub struct Container {
    pub rootfiles: Vec<RootFile>,
}

impl RootFile {
    /// 是否声明为OPF包文档
    pub fn is_package(&self) -> bool {
        self.media_type.as_deref() == Some(PACKAGE_MEDIA_TYPE)
    }
}

impl Container {
    /// 解析container.xml内容
    ///
    /// 只关心rootfile的开始标签。没有rootfile时返回空列表，是否致命由调用方决定。
    ///
    /// # 参数
    /// * `xml_content` - container.xml的文件内容
    pub fn parse_xml(xml_content: &str) -> Result<Container> {
        let mut reader = xml::reader(xml_content);
        let mut container = Container::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.local_name().as_ref() == b"rootfile" => {
                    let full_path = xml::attribute(e, b"full-path")?.ok_or_else(|| {
                        EpubError::Structural("rootfile元素缺少full-path属性".to_string())
                    })?;
                    let media_type = xml::attribute(e, b"media-type")?;
                    container.rootfiles.push(RootFile {
                        full_path,
                        media_type,
                    });
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(container)
    }

    /// 获取包文档（OPF）的路径
    ///
    /// 优先使用媒体类型为OPF的rootfile，都没有声明时退回到全部rootfile；
    /// 多个候选时以最后一个为准，一个都没有时返回空字符串。
    pub fn package_path(&self) -> String {
        self.rootfiles
            .iter()
            .rev()
            .find(|rf| rf.is_package())
            .or_else(|| self.rootfiles.last())
            .map(|rf| rf.full_path.clone())
            .unwrap_or_default()
    }
}
