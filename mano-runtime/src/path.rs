//! # 资源地址模块
//!
//! 将模型中的 `settings.basePath` 与图层 `path` 组合为可加载的地址。
//!
//! ## 规则
//!
//! - 绝对 URL（`scheme://...`）与 `data:` URI 原样返回
//! - `basePath` 为网络地址时按 URL 语义拼接（支持 `/` 开头的根路径与 `..`）
//! - 其他情况用单个 `/` 连接 `basePath` 与 `path`

/// 是否为无需拼接的地址（绝对 URL 或 `data:` URI）
pub fn is_absolute_url(path: &str) -> bool {
    if path.starts_with("data:") || path.starts_with("blob:") {
        return true;
    }

    match path.find("://") {
        Some(pos) if pos > 0 => path[..pos]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        _ => false,
    }
}

/// 拆分网络地址为 (origin, path)
///
/// ```text
/// "https://cdn.example.com/chars/a" -> ("https://cdn.example.com", "/chars/a")
/// "https://cdn.example.com"         -> ("https://cdn.example.com", "")
/// ```
fn split_network_origin(base: &str) -> Option<(&str, &str)> {
    let authority_start = if base.starts_with("http://") || base.starts_with("https://") {
        base.find("://")? + 3
    } else if base.starts_with("//") {
        2
    } else {
        return None;
    };

    let end = base[authority_start..]
        .find('/')
        .map(|i| authority_start + i)
        .unwrap_or(base.len());
    Some((&base[..end], &base[end..]))
}

/// 规范化 URL 路径部分，处理 `.` 与 `..`
fn normalize_url_path(path: &str) -> String {
    let mut components: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(component),
        }
    }
    format!("/{}", components.join("/"))
}

/// 解析图层图片地址
///
/// # 示例
///
/// ```text
/// ("assets/Sherry", "arm.png")                  -> "assets/Sherry/arm.png"
/// ("assets/Sherry/", "/arm.png")                -> "assets/Sherry/arm.png"
/// ("https://cdn.example.com/c/", "../x/a.png")  -> "https://cdn.example.com/x/a.png"
/// ("https://cdn.example.com/c", "/a.png")       -> "https://cdn.example.com/a.png"
/// ("assets", "https://other.host/a.png")        -> "https://other.host/a.png"
/// ```
pub fn resolve_asset_url(base_path: &str, path: &str) -> String {
    if is_absolute_url(path) || base_path.is_empty() {
        return path.to_string();
    }

    if let Some((origin, base_dir)) = split_network_origin(base_path) {
        let joined = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("{}/{}", base_dir.trim_end_matches('/'), path)
        };
        return format!("{}{}", origin, normalize_url_path(&joined));
    }

    format!(
        "{}/{}",
        base_path.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
