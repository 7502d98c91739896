use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use percent_encoding::percent_decode_str;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::epub::config::ConvertConfig;
use crate::epub::container::{CONTAINER_PATH, Container};
use crate::epub::content::{ContentAssembler, HtmlTextRenderer, RenderedOutput, TextRenderer};
use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::{NavigationEntry, NavigationParser};
use crate::epub::opf::{PackageDescriptor, PackageParser};
use crate::epub::path::{package_directory, resolve_path};
use crate::epub::xml;

const EPUB_MIMETYPE: &str = "application/epub+zip";

/// 一次完整转换的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// 包文档在压缩包中的路径
    pub package_path: String,
    /// 书名、作者和导航文档路径
    pub descriptor: PackageDescriptor,
    /// 按文档顺序排列的目录条目
    pub entries: Vec<NavigationEntry>,
    /// 组装好的文本
    pub output: RenderedOutput,
}

/// 表示一个打开的EPUB文件
///
/// 压缩包在整个转换期间只读持有，`Epub`被丢弃时释放。
pub struct Epub<R = File> {
    archive: ZipArchive<R>,
    config: ConvertConfig,
}

impl Epub<File> {
    /// 从文件路径创建Epub实例
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    ///
    /// # 返回值
    /// * `Result<Epub>` - 成功返回Epub实例，文件无法打开或不是zip时返回错误
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Epub> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> Epub<R> {
    /// 从任意可读可寻址的数据源创建Epub实例
    pub fn from_reader(reader: R) -> Result<Epub<R>> {
        let archive = ZipArchive::new(reader)?;

        let mut epub = Epub {
            archive,
            config: ConvertConfig::default(),
        };
        epub.validate()?;

        Ok(epub)
    }

    /// 使用指定的转换配置
    pub fn with_config(mut self, config: ConvertConfig) -> Self {
        self.config = config;
        self
    }

    /// 当前的转换配置
    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// 检查mimetype文件
    ///
    /// 只做宽松检查：缺失或内容不符时记录警告，不中止转换。
    fn validate(&mut self) -> Result<()> {
        match self.read_entry("mimetype") {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes);
                let content = content.trim();
                if content != EPUB_MIMETYPE {
                    log::warn!("mimetype不是 {}，找到: {}", EPUB_MIMETYPE, content);
                }
            }
            Err(EpubError::MissingResource(_)) => {
                log::warn!("缺少mimetype文件");
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// 列出EPUB文件中的所有条目
    pub fn list_files(&self) -> Vec<String> {
        self.archive.file_names().map(String::from).collect()
    }

    /// 压缩包中是否存在指定条目
    pub fn contains(&self, path: &str) -> bool {
        self.archive.index_for_name(path).is_some()
    }

    /// 读取指定条目的二进制内容
    ///
    /// 找不到时会再尝试一次百分号解码后的路径。
    ///
    /// # 返回值
    /// * `Result<Vec<u8>>` - 条目不存在时返回`MissingResource`
    pub fn read_bytes(&mut self, path: &str) -> Result<Vec<u8>> {
        match self.read_entry(path) {
            Err(EpubError::MissingResource(_)) => {
                let decoded = percent_decode_str(path).decode_utf8_lossy().into_owned();
                if decoded == path {
                    return Err(EpubError::MissingResource(path.to_string()));
                }
                match self.read_entry(&decoded) {
                    Err(EpubError::MissingResource(_)) => {
                        Err(EpubError::MissingResource(path.to_string()))
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    /// 读取指定条目并按UTF-8解码，开头的BOM会被去掉
    pub fn read_text(&mut self, path: &str) -> Result<String> {
        let bytes = self.read_bytes(path)?;
        let text = std::str::from_utf8(xml::strip_bom(&bytes)).map_err(|source| {
            EpubError::Encoding {
                path: path.to_string(),
                source,
            }
        })?;
        Ok(text.to_string())
    }

    fn read_entry(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = match self.archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => {
                return Err(EpubError::MissingResource(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// 解析container.xml文件
    pub fn parse_container(&mut self) -> Result<Container> {
        let content = self.read_text(CONTAINER_PATH)?;
        Container::parse_xml(&content)
    }

    /// 获取包文档（OPF）的路径
    ///
    /// # 返回值
    /// * `Result<String>` - container.xml中没有rootfile时返回`Structural`错误
    pub fn package_path(&mut self) -> Result<String> {
        let package_path = self.parse_container()?.package_path();
        if package_path.is_empty() {
            return Err(EpubError::Structural(
                "container.xml中没有找到rootfile".to_string(),
            ));
        }
        Ok(package_path)
    }

    /// 解析包文档，获取书名、作者和导航文档路径
    pub fn package_descriptor(&mut self) -> Result<PackageDescriptor> {
        let package_path = self.package_path()?;
        self.parse_package(&package_path)
    }

    /// 解析导航文档，获取按文档顺序排列的目录条目
    ///
    /// # 返回值
    /// * `Result<Vec<NavigationEntry>>` - 包文档没有声明导航文档时返回`Structural`错误
    pub fn navigation(&mut self) -> Result<Vec<NavigationEntry>> {
        let package_path = self.package_path()?;
        let descriptor = self.parse_package(&package_path)?;
        self.parse_navigation(package_directory(&package_path), &descriptor)
    }

    /// 使用默认的HTML转换器提取全书文本
    ///
    /// # 示例
    ///
    /// ```rust,no_run
    /// use epubtext::Epub;
    ///
    /// let mut epub = Epub::new("book.epub")?;
    /// let conversion = epub.extract_text()?;
    /// println!("书名: {}", conversion.descriptor.title);
    /// print!("{}", conversion.output);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn extract_text(&mut self) -> Result<Conversion> {
        self.extract_text_with(&HtmlTextRenderer::new())
    }

    /// 使用指定的转换器提取全书文本
    pub fn extract_text_with(&mut self, renderer: &dyn TextRenderer) -> Result<Conversion> {
        let package_path = self.package_path()?;
        let base_dir = package_directory(&package_path).to_string();
        log::info!("包文档: {}", package_path);

        let descriptor = self.parse_package(&package_path)?;
        log::info!("书名: {}, 作者: {}", descriptor.title, descriptor.author);

        let entries = self.parse_navigation(&base_dir, &descriptor)?;
        log::info!("导航文档中共有 {} 个目录条目", entries.len());

        let config = self.config.clone();
        let output = ContentAssembler::new(&config, renderer).assemble(self, &entries, &base_dir)?;

        Ok(Conversion {
            package_path,
            descriptor,
            entries,
            output,
        })
    }

    fn parse_package(&mut self, package_path: &str) -> Result<PackageDescriptor> {
        let content = self.read_text(package_path)?;
        PackageParser::parse(&content, &self.config.navigation_ids)
    }

    fn parse_navigation(
        &mut self,
        base_dir: &str,
        descriptor: &PackageDescriptor,
    ) -> Result<Vec<NavigationEntry>> {
        if !descriptor.has_navigation() {
            return Err(EpubError::Structural(
                "包文档的manifest中没有找到导航文档".to_string(),
            ));
        }

        let navigation_path = resolve_path(base_dir, &descriptor.navigation_path);
        log::info!("导航文档: {}", navigation_path);
        let content = self.read_text(&navigation_path)?;
        NavigationParser::parse(&content)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;
    use zip::ZipWriter;
    use zip::write::FileOptions;

    /// 在内存中创建一个zip压缩包
    pub(crate) fn build_archive(files: &[(&str, &str)]) -> Cursor<Vec<u8>> {
        let files: Vec<(&str, &[u8])> = files
            .iter()
            .map(|(name, content)| (*name, content.as_bytes()))
            .collect();
        build_binary_archive(&files)
    }

    pub(crate) fn build_binary_archive(files: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in files {
            zip.start_file(*name, FileOptions::<()>::default()).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap()
    }

    pub(crate) const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
    </rootfiles>
</container>"#;

    pub(crate) const OPF_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="2.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="BookId">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
        <dc:title>T</dc:title>
        <dc:creator>A</dc:creator>
    </metadata>
    <manifest>
        <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
        <item id="chap1" href="text/chap1.xhtml" media-type="application/xhtml+xml"/>
        <item id="chap2" href="text/chap2.xhtml" media-type="application/xhtml+xml"/>
    </manifest>
    <spine toc="ncx">
        <itemref idref="chap1"/>
        <itemref idref="chap2"/>
    </spine>
</package>"#;

    pub(crate) const NCX_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
    <docTitle><text>T</text></docTitle>
    <navMap>
        <navPoint id="np-1" playOrder="1">
            <navLabel><text>Chapter 1</text></navLabel>
            <content src="text/chap1.xhtml"/>
            <navPoint id="np-2" playOrder="2">
                <navLabel><text>Section 1.1</text></navLabel>
                <content src="text/chap1.xhtml#s11"/>
            </navPoint>
        </navPoint>
        <navPoint id="np-3" playOrder="3">
            <navLabel><text>Chapter 2</text></navLabel>
            <content src="text/chap2.xhtml"/>
        </navPoint>
    </navMap>
</ncx>"#;

    const CHAPTER1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>1</title></head>
<body><p>One.</p></body></html>"#;

    const CHAPTER2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>2</title></head>
<body><p>Two.</p></body></html>"#;

    /// 两个顶层条目加一个嵌套条目、两个内容文件的示例书
    pub(crate) fn sample_book() -> Vec<(&'static str, &'static str)> {
        vec![
            ("mimetype", EPUB_MIMETYPE),
            ("META-INF/container.xml", CONTAINER_XML),
            ("OEBPS/content.opf", OPF_XML),
            ("OEBPS/toc.ncx", NCX_XML),
            ("OEBPS/text/chap1.xhtml", CHAPTER1),
            ("OEBPS/text/chap2.xhtml", CHAPTER2),
        ]
    }

    fn replace(files: &mut Vec<(&'static str, &'static str)>, name: &str, content: &'static str) {
        for file in files.iter_mut() {
            if file.0 == name {
                file.1 = content;
            }
        }
    }

    const EXPECTED: &str = "* Chapter 1\nChapter 1{{{1\nOne.\n** Section 1.1\nSection 1.1{{{2\nOne.\n* Chapter 2\nChapter 2{{{1\nTwo.\n";

    #[test]
    fn test_extract_sample_book() {
        let mut epub = Epub::from_reader(build_archive(&sample_book())).unwrap();
        let conversion = epub.extract_text().unwrap();

        assert_eq!(conversion.package_path, "OEBPS/content.opf");
        assert_eq!(conversion.descriptor.title, "T");
        assert_eq!(conversion.descriptor.author, "A");
        assert_eq!(conversion.descriptor.navigation_path, "toc.ncx");

        let ids: Vec<&str> = conversion.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["np-1", "np-2", "np-3"]);

        assert_eq!(conversion.output.blocks.len(), 3);
        assert_eq!(conversion.output.blocks[1].heading, "** Section 1.1");
        assert_eq!(conversion.output.to_string(), EXPECTED);
    }

    #[test]
    fn test_extract_is_idempotent() {
        let bytes = build_archive(&sample_book()).into_inner();

        let first = Epub::from_reader(Cursor::new(bytes.clone()))
            .unwrap()
            .extract_text()
            .unwrap();
        let second = Epub::from_reader(Cursor::new(bytes))
            .unwrap()
            .extract_text()
            .unwrap();

        assert_eq!(first.output.to_string(), second.output.to_string());
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_navigation_item_is_structural() {
        let mut files = sample_book();
        replace(
            &mut files,
            "OEBPS/content.opf",
            r#"<package><metadata><dc:title>T</dc:title></metadata>
<manifest><item id="chap1" href="text/chap1.xhtml" media-type="application/xhtml+xml"/></manifest></package>"#,
        );

        let mut epub = Epub::from_reader(build_archive(&files)).unwrap();
        let descriptor = epub.package_descriptor().unwrap();
        assert!(!descriptor.has_navigation());

        assert!(matches!(epub.extract_text(), Err(EpubError::Structural(_))));
        assert!(matches!(epub.navigation(), Err(EpubError::Structural(_))));
    }

    #[test]
    fn test_container_without_rootfile_is_structural() {
        let mut files = sample_book();
        replace(&mut files, "META-INF/container.xml", "<container><rootfiles/></container>");

        let mut epub = Epub::from_reader(build_archive(&files)).unwrap();
        assert!(matches!(epub.package_path(), Err(EpubError::Structural(_))));
    }

    #[test]
    fn test_missing_container() {
        let files: Vec<_> = sample_book()
            .into_iter()
            .filter(|(name, _)| *name != "META-INF/container.xml")
            .collect();

        let mut epub = Epub::from_reader(build_archive(&files)).unwrap();
        match epub.extract_text() {
            Err(EpubError::MissingResource(path)) => assert_eq!(path, CONTAINER_PATH),
            other => panic!("期望MissingResource错误, 实际: {:?}", other.map(|c| c.output)),
        }
    }

    #[test]
    fn test_missing_fragment_aborts() {
        let files: Vec<_> = sample_book()
            .into_iter()
            .filter(|(name, _)| *name != "OEBPS/text/chap2.xhtml")
            .collect();

        let mut epub = Epub::from_reader(build_archive(&files)).unwrap();
        assert!(matches!(epub.extract_text(), Err(EpubError::MissingResource(_))));

        let config = ConvertConfig {
            skip_missing_content: true,
            ..ConvertConfig::default()
        };
        let mut epub = Epub::from_reader(build_archive(&files))
            .unwrap()
            .with_config(config);
        let conversion = epub.extract_text().unwrap();
        assert_eq!(conversion.output.blocks.len(), 3);
        assert_eq!(conversion.output.blocks[2].body, "");
    }

    #[test]
    fn test_package_at_archive_root() {
        let files = vec![
            (
                "META-INF/container.xml",
                r#"<container><rootfiles><rootfile full-path="content.opf" media-type="application/oebps-package+xml"/></rootfiles></container>"#,
            ),
            (
                "content.opf",
                r#"<package><metadata><dc:title>Root</dc:title></metadata><manifest><item id="toc" href="toc.ncx"/></manifest></package>"#,
            ),
            (
                "toc.ncx",
                r#"<ncx><navMap><navPoint id="a" playOrder="1"><navLabel><text>Only</text></navLabel><content src="./body.xhtml#top"/></navPoint></navMap></ncx>"#,
            ),
            ("body.xhtml", "<p>Root body</p>"),
        ];

        let mut epub = Epub::from_reader(build_archive(&files)).unwrap();
        let conversion = epub.extract_text().unwrap();
        assert_eq!(conversion.output.to_string(), "* Only\nOnly{{{1\nRoot body\n");
    }

    #[test]
    fn test_percent_encoded_navigation_href() {
        let mut files = sample_book();
        replace(
            &mut files,
            "OEBPS/content.opf",
            r#"<package><manifest><item id="ncx" href="my%20toc.ncx"/></manifest></package>"#,
        );
        files.push(("OEBPS/my toc.ncx", NCX_XML));

        let mut epub = Epub::from_reader(build_archive(&files)).unwrap();
        assert_eq!(epub.navigation().unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_utf8_fragment() {
        let book = sample_book();
        let mut files: Vec<(&str, &[u8])> = book
            .iter()
            .filter(|(name, _)| *name != "OEBPS/text/chap2.xhtml")
            .map(|(name, content)| (*name, content.as_bytes()))
            .collect();
        files.push(("OEBPS/text/chap2.xhtml", &b"<p>\xff\xfe</p>"[..]));

        let mut epub = Epub::from_reader(build_binary_archive(&files)).unwrap();
        match epub.extract_text() {
            Err(EpubError::Encoding { path, .. }) => assert_eq!(path, "OEBPS/text/chap2.xhtml"),
            other => panic!("期望Encoding错误, 实际: {:?}", other.map(|c| c.output)),
        }
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut files = sample_book();
        replace(&mut files, "META-INF/container.xml", "\u{feff}<container><rootfiles><rootfile full-path=\"OEBPS/content.opf\"/></rootfiles></container>");

        let mut epub = Epub::from_reader(build_archive(&files)).unwrap();
        assert_eq!(epub.package_path().unwrap(), "OEBPS/content.opf");
    }

    #[test]
    fn test_missing_mimetype_is_tolerated() {
        let files: Vec<_> = sample_book()
            .into_iter()
            .filter(|(name, _)| *name != "mimetype")
            .collect();

        let mut epub = Epub::from_reader(build_archive(&files)).unwrap();
        assert!(!epub.contains("mimetype"));
        assert!(epub.contains("OEBPS/toc.ncx"));
        assert_eq!(epub.extract_text().unwrap().output.to_string(), EXPECTED);
    }

    #[test]
    fn test_open_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.epub");
        fs::write(&path, build_archive(&sample_book()).into_inner()).unwrap();

        let mut epub = Epub::new(&path).unwrap();
        assert_eq!(epub.list_files().len(), 6);
        assert_eq!(epub.extract_text().unwrap().output.to_string(), EXPECTED);

        let not_zip = dir.path().join("broken.epub");
        fs::write(&not_zip, b"definitely not a zip").unwrap();
        assert!(matches!(Epub::new(&not_zip), Err(EpubError::ArchiveRead(_))));
    }
}
