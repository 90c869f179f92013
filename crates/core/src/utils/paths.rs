//! Host path helpers
//!
//! Paths reported by the host use its own separator conventions regardless
//! of the platform hostpilot runs on, so comparisons go through a lowercased,
//! forward-slash form instead of `std::path`.

/// Comparison form of a path: lowercase, `/` separators, `.` and `..` folded
pub fn normalize(path: &str) -> String {
    let unified = path.trim().replace('\\', "/").to_lowercase();
    let (prefix, rest) = if let Some(rest) = unified.strip_prefix("//") {
        ("//", rest)
    } else if let Some(rest) = unified.strip_prefix('/') {
        ("/", rest)
    } else {
        ("", unified.as_str())
    };

    let mut parts: Vec<&str> = Vec::new();
    for part in rest.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." && !is_drive(last) => {
                    parts.pop();
                }
                // relative paths keep leading parents, rooted ones stop at the root
                _ if prefix.is_empty() && !parts.first().is_some_and(|p| is_drive(p)) => {
                    parts.push("..")
                }
                _ => {}
            },
            part => parts.push(part),
        }
    }

    format!("{prefix}{}", parts.join("/"))
}

/// Absolute path on either convention: `/x`, `\x`, `C:\x`
///
/// Drive-relative paths (`C:x`) are not rooted.
pub fn is_rooted(path: &str) -> bool {
    let bytes = path.as_bytes();
    matches!(bytes.first(), Some(b'/') | Some(b'\\'))
        || (bytes.len() >= 3
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
            && matches!(bytes[2], b'/' | b'\\'))
}

pub fn has_separator(path: &str) -> bool {
    path.contains(['/', '\\'])
}

/// Last component, splitting on both separators
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Last component without its extension
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Directory part, splitting on both separators
pub fn parent(path: &str) -> Option<&str> {
    let index = path.rfind(['/', '\\'])?;
    Some(if index == 0 { &path[..1] } else { &path[..index] })
}

fn is_drive(part: &str) -> bool {
    let bytes = part.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_separators_and_case() {
        assert_eq!(normalize(r"C:\Src\App\Program.cs"), "c:/src/app/program.cs");
        assert_eq!(normalize("/home/me/App/./Program.cs"), "/home/me/app/program.cs");
        assert_eq!(normalize(r"\\server\share\x.cs"), "//server/share/x.cs");
    }

    #[test]
    fn test_normalize_parent_components() {
        assert_eq!(normalize(r"C:\src\app\..\lib\a.cs"), "c:/src/lib/a.cs");
        assert_eq!(normalize(r"C:\..\a.cs"), "c:/a.cs");
        assert_eq!(normalize("/../a.cs"), "/a.cs");
        assert_eq!(normalize("../shared/a.cs"), "../shared/a.cs");
    }

    #[test]
    fn test_rooted_detection() {
        assert!(is_rooted(r"C:\src\a.cs"));
        assert!(is_rooted("/src/a.cs"));
        assert!(is_rooted(r"\src\a.cs"));
        assert!(!is_rooted(r"src\a.cs"));
        assert!(!is_rooted("a.cs"));
        assert!(is_rooted("c:/src/a.cs"));
        assert!(!is_rooted("C:foo.cs"));
        assert!(!is_rooted("C:"));
    }

    #[test]
    fn test_name_helpers() {
        assert_eq!(file_name(r"C:\src\App\App.csproj"), "App.csproj");
        assert_eq!(file_stem(r"C:\src\App\App.csproj"), "App");
        assert_eq!(file_stem("/src/.editorconfig"), ".editorconfig");
        assert_eq!(file_stem("Makefile"), "Makefile");
        assert_eq!(parent(r"C:\src\App\App.csproj"), Some(r"C:\src\App"));
        assert_eq!(parent("/App.csproj"), Some("/"));
        assert_eq!(parent("App.csproj"), None);
    }
}
