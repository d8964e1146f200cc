//! Filename normalization and tokenization for fuzzy matching.

use regex::Regex;
use std::sync::LazyLock;

/// Runs of underscores, hyphens or whitespace.
static SEPARATOR_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_\-\s]+").unwrap());

/// Runs of underscores, hyphens or dots.
static TOKEN_SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_\-.]+").unwrap());

fn is_path_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Final path component of a name.
///
/// Both `/` and `\` count as separators: workflows authored on Windows carry
/// backslash subfolders even when analyzed elsewhere.
pub fn basename(path: &str) -> &str {
    match path.rfind(is_path_separator) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Split a name into `(stem, extension)` at the last dot of its final
/// component.
///
/// The extension keeps its dot. Leading dots of the final component never
/// start an extension, so `.hidden` has none.
///
/// ```
/// use model_linker::matcher::split_extension;
///
/// assert_eq!(split_extension("sd_xl_base_1.0.safetensors"), ("sd_xl_base_1.0", ".safetensors"));
/// assert_eq!(split_extension("sd_xl_base_1.0"), ("sd_xl_base_1", ".0"));
/// assert_eq!(split_extension(".hidden"), (".hidden", ""));
/// ```
pub fn split_extension(name: &str) -> (&str, &str) {
    let sep_end = name.rfind(is_path_separator).map(|p| p + 1).unwrap_or(0);
    let Some(dot) = name.rfind('.') else {
        return (name, "");
    };
    if dot < sep_end {
        return (name, "");
    }
    if name[sep_end..dot].chars().all(|c| c == '.') {
        return (name, "");
    }
    name.split_at(dot)
}

/// Name without its extension.
pub fn strip_extension(name: &str) -> &str {
    split_extension(name).0
}

/// Normalize a filename for exact-match detection.
///
/// Strips the extension, lowercases, collapses every run of `_`, `-` or
/// whitespace into one space and trims.
///
/// ```
/// use model_linker::matcher::normalize_filename;
///
/// assert_eq!(normalize_filename("SD_XL--Base 1.safetensors"), "sd xl base 1");
/// ```
pub fn normalize_filename(filename: &str) -> String {
    let lowered = strip_extension(filename).to_lowercase();
    SEPARATOR_RUNS.replace_all(&lowered, " ").trim().to_string()
}

/// Split a filename into lowercase tokens.
///
/// Unlike [`normalize_filename`], dots also separate tokens so version-like
/// suffixes (`1.0`) become distinct tokens.
pub fn tokenize_model_name(filename: &str) -> Vec<String> {
    let lowered = strip_extension(filename).to_lowercase();
    TOKEN_SEPARATOR_RUNS
        .replace_all(&lowered, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basename() {
        assert_eq!(basename("model.safetensors"), "model.safetensors");
        assert_eq!(basename("sdxl/model.safetensors"), "model.safetensors");
        assert_eq!(basename("SDXL\\base\\model.ckpt"), "model.ckpt");
        assert_eq!(basename("dir/"), "");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("model.ckpt"), ("model", ".ckpt"));
        assert_eq!(split_extension("model"), ("model", ""));
        assert_eq!(split_extension("a.b/model"), ("a.b/model", ""));
        assert_eq!(split_extension("..double"), ("..double", ""));
        assert_eq!(split_extension("dir/.hidden.bin"), ("dir/.hidden", ".bin"));
    }

    #[test]
    fn test_normalize_filename() {
        assert_eq!(normalize_filename("MODEL.CKPT"), "model");
        assert_eq!(normalize_filename("my_model-v2.safetensors"), "my model v2");
        assert_eq!(normalize_filename("  spaced__out  .pt"), "spaced out");
        assert_eq!(normalize_filename("sd_xl_base_1.0.safetensors"), "sd xl base 1.0");
        assert_eq!(normalize_filename(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent_on_normalized_names() {
        let once = normalize_filename("Juggernaut_XL-v9");
        assert_eq!(normalize_filename(&once), once);
    }

    #[test]
    fn test_tokenize_model_name() {
        assert_eq!(
            tokenize_model_name("sd_xl_base_1.0.safetensors"),
            vec!["sd", "xl", "base", "1", "0"]
        );
        assert_eq!(
            tokenize_model_name("Flux-Dev__fp8.sft"),
            vec!["flux", "dev", "fp8"]
        );
        assert!(tokenize_model_name("").is_empty());
        assert!(tokenize_model_name("___.pt").is_empty());
    }
}
