use url::Url;

/// Normalize a URL to its origin (scheme + host + optional port).
///
/// Falls back to trimming trailing slashes if the input cannot be parsed.
pub fn normalize_origin(input: &str) -> String {
    match Url::parse(input) {
        Ok(parsed) => parsed
            .origin()
            .ascii_serialization()
            .trim_end_matches('/')
            .to_string(),
        Err(_) => input.trim_end_matches('/').to_string(),
    }
}

/// Join a site path onto the origin of `site_url`.
///
/// Absolute http(s) inputs are returned unchanged.
pub fn absolute_url(site_url: &str, path: &str) -> String {
    if is_absolute_http(path) {
        return path.to_string();
    }
    let origin = normalize_origin(site_url);
    if path.starts_with('/') {
        format!("{origin}{path}")
    } else {
        format!("{origin}/{path}")
    }
}

/// Site-relative path of a page url.
///
/// Accepts `/path` as-is and extracts the path from absolute http(s) urls.
/// Returns `None` for anything else (empty strings, relative paths,
/// whitespace, other schemes).
pub fn page_path(url: &str) -> Option<String> {
    if url.is_empty() || url.chars().any(char::is_whitespace) {
        return None;
    }
    if url.starts_with('/') {
        return Some(url.to_string());
    }
    if is_absolute_http(url) {
        return Url::parse(url).ok().map(|parsed| parsed.path().to_string());
    }
    None
}

/// Absolute url of a page on `site_url`, whatever origin the record carries.
pub fn site_page_url(site_url: &str, url: &str) -> String {
    let path = page_path(url).unwrap_or_else(|| url.to_string());
    absolute_url(site_url, &path)
}

fn is_absolute_http(input: &str) -> bool {
    matches!(Url::parse(input), Ok(parsed) if matches!(parsed.scheme(), "http" | "https"))
}

/// Lowercase ASCII slug: runs of anything but letters and digits become `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
