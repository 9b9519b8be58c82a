//! Path normalization shared by the metadata resolver and the modal's
//! index lookup.

/// Normalizes an image path or URL for comparison.
///
/// Strips the origin (`https://host`, `//host`), query and fragment, leading
/// `./` and `/`, and the base prefix when the path starts with it.
pub fn normalize_path(raw: &str, base_prefix: Option<&str>) -> String {
    let mut path = raw.trim();

    if let Some(cut) = path.find(['?', '#']) {
        path = &path[..cut];
    }

    if let Some(scheme_end) = path.find("://") {
        let after = &path[scheme_end + 3..];
        path = after.find('/').map_or("", |slash| &after[slash..]);
    } else if let Some(after) = path.strip_prefix("//") {
        path = after.find('/').map_or("", |slash| &after[slash..]);
    }

    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest;
        } else {
            break;
        }
    }

    if let Some(prefix) = base_prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        if let Some(rest) = path.strip_prefix(prefix) {
            if let Some(rest) = rest.strip_prefix('/') {
                path = rest;
            }
        }
    }

    path.to_string()
}

/// File name without directories.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Splits a path's file name into stem and lowercase extension.
///
/// Dotfiles with no further dot keep their whole name as the stem.
pub fn split_file_name(path: &str) -> (&str, Option<String>) {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(dot) => (&name[..dot], Some(name[dot + 1..].to_ascii_lowercase())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_origin_and_query() {
        assert_eq!(
            normalize_path("https://example.com/images/2023/a.jpg?v=3#top", None),
            "images/2023/a.jpg"
        );
        assert_eq!(normalize_path("//cdn.example.com/a.webp", None), "a.webp");
        assert_eq!(normalize_path("https://example.com", None), "");
    }

    #[test]
    fn test_normalize_strips_leading_segments_and_prefix() {
        assert_eq!(normalize_path("./images/a.jpg", Some("images")), "a.jpg");
        assert_eq!(normalize_path("/images/a.jpg", Some("/images/")), "a.jpg");
        assert_eq!(normalize_path("imagesx/a.jpg", Some("images")), "imagesx/a.jpg");
        assert_eq!(normalize_path("  /a/b.png ", None), "a/b.png");
    }

    #[test]
    fn test_split_file_name() {
        assert_eq!(split_file_name("a/b/photo.JPG"), ("photo", Some("jpg".into())));
        assert_eq!(split_file_name("photo.final.webp"), ("photo.final", Some("webp".into())));
        assert_eq!(split_file_name("noext"), ("noext", None));
        assert_eq!(split_file_name(".hidden"), (".hidden", None));
    }
}
