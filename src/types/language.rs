//! Language detection from file paths.
//!
//! Produces the editor-style language identifier passed to the analysis
//! call. Unknown extensions yield `None` and the provider omits the field.

use std::path::Path;

/// Extension to language identifier
const EXTENSIONS: &[(&str, &str)] = &[
    ("rs", "rust"),
    ("ts", "typescript"),
    ("tsx", "typescriptreact"),
    ("js", "javascript"),
    ("mjs", "javascript"),
    ("cjs", "javascript"),
    ("jsx", "javascriptreact"),
    ("py", "python"),
    ("go", "go"),
    ("java", "java"),
    ("kt", "kotlin"),
    ("kts", "kotlin"),
    ("rb", "ruby"),
    ("c", "c"),
    ("h", "c"),
    ("cpp", "cpp"),
    ("cc", "cpp"),
    ("cxx", "cpp"),
    ("hpp", "cpp"),
    ("cs", "csharp"),
    ("swift", "swift"),
    ("scala", "scala"),
    ("php", "php"),
    ("lua", "lua"),
    ("sh", "shellscript"),
    ("bash", "shellscript"),
    ("zsh", "shellscript"),
];

/// Detect the language identifier for a path
pub fn detect_language<P: AsRef<Path>>(path: P) -> Option<&'static str> {
    let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
    EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
}

/// Whether the path looks like reviewable source code
pub fn is_source_file<P: AsRef<Path>>(path: P) -> bool {
    detect_language(path).is_some()
}
