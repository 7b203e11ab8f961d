//! Stylesheet merging and compilation
//!
//! Site partials are copied next to the vendored stylesheets, the entry
//! stylesheet gets `@import` lines for them, and every non-partial source is
//! compiled into the target tree.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result, bail};
use cow_utils::CowUtils;
use log::{debug, info};

use crate::config::StylesConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    Expanded,
    Compressed,
}

impl OutputStyle {
    /// Compressed output when minifying, readable output otherwise
    pub fn for_minify(minify: bool) -> Self {
        if minify { Self::Compressed } else { Self::Expanded }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expanded => "expanded",
            Self::Compressed => "compressed",
        }
    }
}

impl fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait StyleCompiler {
    /// Compile one stylesheet source file to CSS
    fn compile(&self, source: &Path, style: OutputStyle) -> Result<Vec<u8>>;
}

/// Runs the `sass` command line compiler
#[derive(Debug, Clone)]
pub struct SassCommand {
    binary: PathBuf,
}

impl SassCommand {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl StyleCompiler for SassCommand {
    fn compile(&self, source: &Path, style: OutputStyle) -> Result<Vec<u8>> {
        let output = Command::new(&self.binary)
            .arg(format!("--style={style}"))
            .arg("--no-source-map")
            .arg(source)
            .output()
            .with_context(|| format!("Failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            bail!(
                "SASS run failed for {}: {}",
                source.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.stdout)
    }
}

/// Copy the site's custom partials into the working stylesheet directory.
///
/// Only regular files directly inside `partials` are copied. A missing
/// `partials` directory means there is nothing to merge.
pub fn merge_partials(partials: &Path, stylesheets: &Path) -> Result<Vec<PathBuf>> {
    if !partials.exists() {
        debug!("No custom stylesheets in {}", partials.display());
        return Ok(Vec::new());
    }

    let mut copied = Vec::new();
    for entry in sorted_files(partials)? {
        let Some(name) = entry.file_name() else {
            continue;
        };
        let target = stylesheets.join(name);
        fs::copy(&entry, &target).with_context(|| {
            format!("failed to copy custom SASS {} to {}", entry.display(), target.display())
        })?;
        copied.push(target);
    }
    Ok(copied)
}

/// Add `@import` lines for the site partials after the anchor in the entry stylesheet
pub fn insert_imports(stylesheets: &Path, styles: &StylesConfig) -> Result<()> {
    if styles.imports.is_empty() {
        return Ok(());
    }

    let entry = stylesheets.join(&styles.entry);
    let content = fs::read_to_string(&entry)
        .with_context(|| format!("Failed to read {}", entry.display()))?;

    if !content.contains(styles.anchor.as_str()) {
        bail!(
            "{} does not contain `{}`; cannot insert custom imports",
            entry.display(),
            styles.anchor
        );
    }

    let mut replacement = styles.anchor.clone();
    for import in &styles.imports {
        replacement.push_str(&format!("\n@import '{import}';"));
    }
    let merged = content.cow_replace(styles.anchor.as_str(), &replacement);

    fs::write(&entry, merged.as_bytes())
        .with_context(|| format!("Failed to write {}", entry.display()))?;
    Ok(())
}

/// Compile every non-partial stylesheet in `source` into `target`.
///
/// Files starting with `_` are partials and are only reached through
/// imports. Output names drop the `.scss`/`.sass` suffix, so
/// `screen.css.scss` becomes `screen.css`.
pub fn compile_all(
    source: &Path,
    target: &Path,
    compiler: &dyn StyleCompiler,
    style: OutputStyle,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(target).with_context(|| format!("Failed to create {}", target.display()))?;

    let mut written = Vec::new();
    for file in sorted_files(source)? {
        let Some(name) = file.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name.starts_with('_') {
            continue;
        }
        let Some(target_name) = name
            .strip_suffix(".scss")
            .or_else(|| name.strip_suffix(".sass"))
        else {
            continue;
        };

        info!("Compile {name} to {target_name}");
        let css = compiler
            .compile(&file, style)
            .with_context(|| format!("Failed to compile {name}"))?;

        let output = target.join(target_name);
        fs::write(&output, css).with_context(|| format!("Failed to write {}", output.display()))?;
        written.push(output);
    }
    Ok(written)
}

fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[derive(Debug, Default)]
    struct FakeCompiler {
        compiled: RefCell<Vec<(String, OutputStyle)>>,
    }

    impl StyleCompiler for FakeCompiler {
        fn compile(&self, source: &Path, style: OutputStyle) -> Result<Vec<u8>> {
            let name = source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.compiled.borrow_mut().push((name.clone(), style));
            Ok(format!("/* {name} {style} */").into_bytes())
        }
    }

    fn styles_config() -> StylesConfig {
        StylesConfig {
            entry: "screen.css.scss".to_owned(),
            anchor: "@import 'icon-font';".to_owned(),
            imports: vec!["docuapi".to_owned()],
        }
    }

    #[test]
    fn test_output_style_follows_minify_flag() {
        assert_eq!(OutputStyle::for_minify(true), OutputStyle::Compressed);
        assert_eq!(OutputStyle::for_minify(false), OutputStyle::Expanded);
        assert_eq!(OutputStyle::Compressed.to_string(), "compressed");
    }

    #[test]
    fn test_merge_partials_copies_top_level_files() -> Result<()> {
        let temp = TempDir::new()?;
        let partials = temp.path().join("assets/stylesheets");
        let stylesheets = temp.path().join("work");
        fs::create_dir_all(partials.join("nested"))?;
        fs::create_dir_all(&stylesheets)?;
        fs::write(partials.join("_docuapi.scss"), ".x { color: red; }")?;
        fs::write(partials.join("nested/_skip.scss"), "")?;

        let copied = merge_partials(&partials, &stylesheets)?;

        assert_eq!(copied, vec![stylesheets.join("_docuapi.scss")]);
        assert_eq!(
            fs::read_to_string(stylesheets.join("_docuapi.scss"))?,
            ".x { color: red; }"
        );
        assert!(!stylesheets.join("_skip.scss").exists());
        Ok(())
    }

    #[test]
    fn test_merge_partials_without_directory_is_noop() -> Result<()> {
        let temp = TempDir::new()?;
        let copied = merge_partials(&temp.path().join("missing"), temp.path())?;
        assert!(copied.is_empty());
        Ok(())
    }

    #[test]
    fn test_insert_imports_after_anchor() -> Result<()> {
        let temp = TempDir::new()?;
        fs::write(
            temp.path().join("screen.css.scss"),
            "@charset \"utf-8\";\n@import 'variables';\n@import 'icon-font';\n\nbody {}\n",
        )?;

        insert_imports(temp.path(), &styles_config())?;

        assert_eq!(
            fs::read_to_string(temp.path().join("screen.css.scss"))?,
            "@charset \"utf-8\";\n@import 'variables';\n@import 'icon-font';\n@import 'docuapi';\n\nbody {}\n"
        );
        Ok(())
    }

    #[test]
    fn test_insert_imports_requires_anchor() -> Result<()> {
        let temp = TempDir::new()?;
        fs::write(temp.path().join("screen.css.scss"), "body {}\n")?;

        let err = insert_imports(temp.path(), &styles_config()).expect_err("anchor is missing");
        assert!(err.to_string().contains("@import 'icon-font';"));
        Ok(())
    }

    #[test]
    fn test_compile_all_skips_partials() -> Result<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("stylesheets");
        let target = temp.path().join("out");
        fs::create_dir_all(&source)?;
        fs::write(source.join("screen.css.scss"), "")?;
        fs::write(source.join("print.css.scss"), "")?;
        fs::write(source.join("_variables.scss"), "")?;
        fs::write(source.join("README"), "")?;

        let compiler = FakeCompiler::default();
        let written = compile_all(&source, &target, &compiler, OutputStyle::Compressed)?;

        assert_eq!(written, vec![target.join("print.css"), target.join("screen.css")]);
        assert_eq!(
            compiler.compiled.borrow().clone(),
            vec![
                ("print.css.scss".to_owned(), OutputStyle::Compressed),
                ("screen.css.scss".to_owned(), OutputStyle::Compressed),
            ]
        );
        assert_eq!(
            fs::read_to_string(target.join("screen.css"))?,
            "/* screen.css.scss compressed */"
        );
        Ok(())
    }

    #[test]
    fn test_sass_command_reports_missing_binary() {
        let temp = TempDir::new().expect("temp dir");
        let source = temp.path().join("screen.css.scss");
        fs::write(&source, "body {}").expect("write source");

        let compiler = SassCommand::new(temp.path().join("no-such-sass"));
        assert!(compiler.compile(&source, OutputStyle::Expanded).is_err());
    }
}
