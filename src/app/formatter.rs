use crate::app::models::{FileEntry, FormattedOutput, OutputOptions, PathStyle};
use pathdiff::diff_paths;
use std::fs;
use std::path::Path;

pub struct OutputGenerator;

impl OutputGenerator {
    /// Renders every entry in order into one payload.
    ///
    /// A file that cannot be read or decoded becomes an inline error block;
    /// it never stops the remaining files from being rendered.
    pub fn format(entries: &[FileEntry], options: &OutputOptions) -> FormattedOutput {
        let mut blocks = Vec::with_capacity(entries.len());
        let mut output = FormattedOutput::default();

        for (idx, entry) in entries.iter().enumerate() {
            let shown = display_path(&entry.path, &options.path_style);

            match read_text(&entry.path) {
                Ok(content) => {
                    output.files_included += 1;
                    output.total_chars += content.chars().count();
                    log::debug!("Formatted {} file {}", entry.key, entry.path.display());
                    blocks.push(Self::content_block(idx, entry, &shown, &content, options));
                }
                Err(reason) => {
                    log::warn!("Skipping content of {}: {}", entry.path.display(), reason);
                    blocks.push(Self::error_block(idx, entry, &shown, &reason, options));
                }
            }
        }

        output.text = blocks.join("\n\n");
        output
    }

    fn content_block(
        idx: usize,
        entry: &FileEntry,
        shown: &str,
        content: &str,
        options: &OutputOptions,
    ) -> String {
        let content = content.strip_suffix('\n').unwrap_or(content);

        if options.use_xml_tags {
            format!(
                "<file {} type=\"{}\">\n{}\n</file>",
                tag_key(idx, shown, options.include_path),
                escape_attr(&entry.key),
                content
            )
        } else if options.include_path {
            format!("# {}\n{}", shown, content)
        } else {
            content.to_string()
        }
    }

    fn error_block(
        idx: usize,
        entry: &FileEntry,
        shown: &str,
        reason: &str,
        options: &OutputOptions,
    ) -> String {
        if options.use_xml_tags {
            format!(
                "<file {} type=\"{}\" error=\"true\">Error reading file: {}</file>",
                tag_key(idx, shown, options.include_path),
                escape_attr(&entry.key),
                reason
            )
        } else if options.include_path {
            format!("# {}\n[error: {}]", shown, reason)
        } else {
            format!("[error: {}]", reason)
        }
    }
}

fn read_text(path: &Path) -> Result<String, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|_| "content is not valid UTF-8".to_string())
}

fn tag_key(idx: usize, shown: &str, include_path: bool) -> String {
    if include_path {
        format!("path=\"{}\"", escape_attr(shown))
    } else {
        format!("index=\"{}\"", idx + 1)
    }
}

fn display_path(path: &Path, style: &PathStyle) -> String {
    let shown = match style {
        PathStyle::Absolute => path.to_path_buf(),
        PathStyle::Relative(base) => diff_paths(path, base).unwrap_or_else(|| path.to_path_buf()),
    };
    shown.to_string_lossy().replace('\\', "/")
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn entry(dir: &TempDir, name: &str, content: &[u8]) -> FileEntry {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        let key = format!(".{}", name.rsplit('.').next().unwrap());
        FileEntry::new(path, key)
    }

    fn options(include_path: bool, use_xml_tags: bool) -> OutputOptions {
        OutputOptions {
            include_path,
            use_xml_tags,
            path_style: PathStyle::Absolute,
        }
    }

    #[test]
    fn test_plain_output_joins_with_blank_line() {
        let dir = TempDir::new().unwrap();
        let entries = vec![entry(&dir, "a.py", b"x"), entry(&dir, "b.py", b"y")];

        let out = OutputGenerator::format(&entries, &options(false, false));

        assert_eq!(out.text, "x\n\ny");
        assert_eq!(out.files_included, 2);
        assert_eq!(out.total_chars, 2);
    }

    #[test]
    fn test_trailing_newline_does_not_widen_separator() {
        let dir = TempDir::new().unwrap();
        let entries = vec![entry(&dir, "a.py", b"x\n"), entry(&dir, "b.py", b"y\n")];

        let out = OutputGenerator::format(&entries, &options(false, false));
        assert_eq!(out.text, "x\n\ny");
    }

    #[test]
    fn test_plain_output_with_path_headers() {
        let dir = TempDir::new().unwrap();
        let entries = vec![entry(&dir, "a.py", b"x"), entry(&dir, "b.py", b"y")];

        let out = OutputGenerator::format(&entries, &options(true, false));

        let expected = format!(
            "# {}\nx\n\n# {}\ny",
            entries[0].path.display(),
            entries[1].path.display()
        );
        assert_eq!(out.text, expected);
    }

    #[test]
    fn test_tags_keyed_by_path() {
        let dir = TempDir::new().unwrap();
        let entries = vec![entry(&dir, "a.py", b"x"), entry(&dir, "b.css", b"y")];

        let out = OutputGenerator::format(&entries, &options(true, true));

        let a = entries[0].path.display();
        let b = entries[1].path.display();
        let expected = format!(
            "<file path=\"{a}\" type=\".py\">\nx\n</file>\n\n<file path=\"{b}\" type=\".css\">\ny\n</file>"
        );
        assert_eq!(out.text, expected);
    }

    #[test]
    fn test_tags_keyed_by_index_without_paths() {
        let dir = TempDir::new().unwrap();
        let entries = vec![entry(&dir, "a.py", b"x"), entry(&dir, "b.py", b"y")];

        let out = OutputGenerator::format(&entries, &options(false, true));

        assert_eq!(
            out.text,
            "<file index=\"1\" type=\".py\">\nx\n</file>\n\n<file index=\"2\" type=\".py\">\ny\n</file>"
        );
        assert!(!out.text.contains(&dir.path().to_string_lossy().to_string()));
    }

    #[test]
    fn test_invalid_utf8_degrades_to_marker() {
        let dir = TempDir::new().unwrap();
        let entries = vec![
            entry(&dir, "a.py", b"x"),
            entry(&dir, "bad.py", &[0xff, 0xfe, 0x00]),
            entry(&dir, "c.py", b"z"),
        ];

        let plain = OutputGenerator::format(&entries, &options(false, false));
        assert_eq!(plain.text, "x\n\n[error: content is not valid UTF-8]\n\nz");
        assert_eq!(plain.files_included, 2);

        let tagged = OutputGenerator::format(&entries, &options(false, true));
        assert!(tagged
            .text
            .contains("<file index=\"2\" type=\".py\" error=\"true\">Error reading file:"));
        assert!(tagged.text.contains("<file index=\"1\" type=\".py\">\nx\n</file>"));
        assert!(tagged.text.contains("<file index=\"3\" type=\".py\">\nz\n</file>"));
        assert_eq!(tagged.files_included, 2);
    }

    #[test]
    fn test_vanished_file_degrades_to_marker() {
        let dir = TempDir::new().unwrap();
        let gone = FileEntry::new(dir.path().join("gone.py"), ".py".to_string());
        let entries = vec![gone, entry(&dir, "a.py", b"x")];

        let out = OutputGenerator::format(&entries, &options(true, false));

        assert!(out.text.contains("gone.py\n[error: "));
        assert!(out.text.ends_with("\nx"));
        assert_eq!(out.files_included, 1);
    }

    #[test]
    fn test_flag_combinations_are_deterministic() {
        let dir = TempDir::new().unwrap();
        let entries = vec![entry(&dir, "a.py", b"x"), entry(&dir, "b.py", b"y")];

        let mut seen = Vec::new();
        for include_path in [false, true] {
            for use_xml_tags in [false, true] {
                let opts = options(include_path, use_xml_tags);
                let first = OutputGenerator::format(&entries, &opts);
                let second = OutputGenerator::format(&entries, &opts);
                assert_eq!(first, second);
                seen.push(first.text);
            }
        }
        seen.dedup();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_relative_path_style() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        let entries = vec![entry(&dir, "src/a.py", b"x")];
        let opts = OutputOptions {
            include_path: true,
            use_xml_tags: false,
            path_style: PathStyle::Relative(dir.path().to_path_buf()),
        };

        let out = OutputGenerator::format(&entries, &opts);
        assert_eq!(out.text, "# src/a.py\nx");
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_base_through_symlink() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        fs::create_dir(&real).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let path = fs::canonicalize(&real).unwrap().join("a.py");
        fs::write(&path, "x").unwrap();
        let entries = vec![FileEntry::new(path, ".py".to_string())];
        let opts = OutputOptions {
            include_path: true,
            use_xml_tags: false,
            path_style: PathStyle::relative_to(link),
        };

        let out = OutputGenerator::format(&entries, &opts);
        assert_eq!(out.text, "# a.py\nx");
    }

    #[test]
    fn test_attribute_escaping() {
        assert_eq!(escape_attr("a\"b<c>&"), "a&quot;b&lt;c&gt;&amp;");
        let shown = display_path(&PathBuf::from("/tmp/x.py"), &PathStyle::Absolute);
        assert_eq!(tag_key(0, &shown, true), "path=\"/tmp/x.py\"");
        assert_eq!(tag_key(4, &shown, false), "index=\"5\"");
    }
}
