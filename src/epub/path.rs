//! 压缩包内部路径处理

/// 包文档所在的目录前缀（带结尾的`/`），位于根目录时为空
///
/// `OEBPS/content.opf` -> `OEBPS/`
pub fn package_directory(package_path: &str) -> &str {
    match package_path.rfind('/') {
        Some(pos) => &package_path[..=pos],
        None => "",
    }
}

/// 把相对路径解析到目录前缀下，并处理`./`和`../`
///
/// 以`/`开头的路径从压缩包根目录开始解析。
pub fn resolve_path(base_dir: &str, href: &str) -> String {
    let mut components: Vec<&str> = if href.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|s| !s.is_empty()).collect()
    };

    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(segment),
        }
    }

    components.join("/")
}
