/// Normalize a fence language marker through the alias table.
/// Unknown markers pass through lowercased; an empty marker means `text`.
pub fn normalize_language(marker: &str) -> String {
    let marker = marker.trim().to_lowercase();
    let normalized = match marker.as_str() {
        "" => "text",
        "py" | "python" => "python",
        "js" | "jsx" | "javascript" => "javascript",
        "ts" | "tsx" | "typescript" => "typescript",
        "html" => "html",
        "css" => "css",
        "sql" => "sql",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "md" | "markdown" => "markdown",
        "sh" | "bash" => "bash",
        _ => return marker,
    };
    normalized.to_string()
}

/// Languages a block editor can offer to run
pub fn is_executable(language: &str) -> bool {
    matches!(language, "python" | "javascript" | "sql")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(normalize_language("py"), "python");
        assert_eq!(normalize_language("ts"), "typescript");
        assert_eq!(normalize_language("tsx"), "typescript");
        assert_eq!(normalize_language("jsx"), "javascript");
        assert_eq!(normalize_language("sh"), "bash");
        assert_eq!(normalize_language("bash"), "bash");
        assert_eq!(normalize_language("yml"), "yaml");
        assert_eq!(normalize_language("md"), "markdown");
    }

    #[test]
    fn test_passthrough_and_default() {
        assert_eq!(normalize_language("Rust"), "rust");
        assert_eq!(normalize_language("PY"), "python");
        assert_eq!(normalize_language(""), "text");
        assert_eq!(normalize_language("   "), "text");
    }

    #[test]
    fn test_executable() {
        assert!(is_executable("python"));
        assert!(is_executable("javascript"));
        assert!(is_executable("sql"));
        assert!(!is_executable("typescript"));
        assert!(!is_executable("text"));
    }
}
