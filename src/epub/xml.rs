//! 三个XML解析器共用的小工具

use crate::epub::error::Result;
use quick_xml::events::BytesStart;
use quick_xml::reader::Reader;

/// 创建解析器使用的XML读取器
///
/// 空元素会被展开为开始和结束两个事件，这样状态机只需要处理两种标签事件。
/// 文本不做裁剪，分段的字符数据由调用方拼接后再处理。
pub(crate) fn reader(xml_content: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml_content);
    reader.config_mut().expand_empty_elements = true;
    reader
}

/// 去掉命名空间前缀，`dc:title` -> `title`
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// 按本地名读取属性值，实体会被解码
pub(crate) fn attribute(e: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr_result in e.attributes() {
        let attr = attr_result?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// 把连续空白（包括换行）折叠为一个空格，并去掉首尾空白
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 去掉UTF-8 BOM
pub(crate) fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}
