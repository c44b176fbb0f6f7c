//! In-place editing of recipe YAML.
//!
//! Rewrites individual scalar values line by line so comments, key order,
//! quoting and indentation survive the update. Only block-style YAML is
//! handled; anything else is reported as an error instead of being
//! reformatted.

use serde_yaml::Value;

/// Replace `context.version` and the single `source` entry's `sha256`.
///
/// The result is re-parsed and compared with the original document: the two
/// fields must hold the new values and nothing else may have changed.
pub fn update_version_and_sha(
    text: &str,
    new_version: &str,
    new_sha256: &str,
) -> Result<String, String> {
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();

    let version_line = find_nested_key(&lines, "context", "version")
        .ok_or("cannot locate context.version for editing")?;
    lines[version_line] = replace_value(&lines[version_line], "version", new_version)
        .ok_or("unsupported context.version value")?;

    let sha_line = find_nested_key(&lines, "source", "sha256")
        .ok_or("cannot locate source.sha256 for editing")?;
    lines[sha_line] = replace_value(&lines[sha_line], "sha256", new_sha256)
        .ok_or("unsupported source.sha256 value")?;

    let mut updated = lines.join("\n");
    if text.ends_with('\n') {
        updated.push('\n');
    }

    verify(text, &updated, new_version, new_sha256)?;
    Ok(updated)
}

/// Check that `updated` equals `original` except for the two bumped fields.
fn verify(original: &str, updated: &str, new_version: &str, new_sha256: &str) -> Result<(), String> {
    let mut expected: Value =
        serde_yaml::from_str(original).map_err(|e| format!("invalid YAML: {e}"))?;
    let actual: Value =
        serde_yaml::from_str(updated).map_err(|e| format!("edit produced invalid YAML: {e}"))?;

    if let Some(context) = expected.get_mut("context").and_then(Value::as_mapping_mut) {
        context.insert("version".into(), new_version.into());
    }
    let source = match expected.get_mut("source") {
        Some(Value::Sequence(items)) => items.first_mut(),
        other => other,
    };
    if let Some(source) = source.and_then(Value::as_mapping_mut) {
        source.insert("sha256".into(), new_sha256.into());
    }

    if expected != actual {
        return Err("edited recipe differs from the original beyond version and sha256".into());
    }
    Ok(())
}

/// Indentation width of a line.
fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_content(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty() && !t.starts_with('#')
}

/// Content of a line with any leading `- ` sequence marker removed, and the
/// column at which that content starts.
fn strip_item_marker(line: &str) -> (usize, &str) {
    let indent = indent_of(line);
    let mut rest = &line[indent..];
    let mut column = indent;
    while let Some(after) = rest.strip_prefix("- ") {
        let trimmed = after.trim_start();
        column += rest.len() - trimmed.len();
        rest = trimmed;
    }
    (column, rest)
}

/// True if `content` is the mapping key `key`.
fn is_key(content: &str, key: &str) -> bool {
    let Some(rest) = content.strip_prefix(key) else {
        return false;
    };
    let rest = rest.trim_start_matches([' ', '\t']);
    match rest.strip_prefix(':') {
        Some(after) => after.is_empty() || after.starts_with([' ', '\t']),
        None => false,
    }
}

/// Line index of `child` directly under the top-level key `parent`.
fn find_nested_key(lines: &[String], parent: &str, child: &str) -> Option<usize> {
    let parent_line = lines
        .iter()
        .position(|l| indent_of(l) == 0 && is_key(l, parent))?;

    // The child level is the column of the first content line in the block.
    let mut child_column = None;
    for (i, line) in lines.iter().enumerate().skip(parent_line + 1) {
        if !is_content(line) {
            continue;
        }
        let indent = indent_of(line);
        let is_top_level_item = indent == 0 && line.starts_with("- ");
        if indent == 0 && !is_top_level_item {
            break;
        }

        let (column, content) = strip_item_marker(line);
        let level = *child_column.get_or_insert(column);
        if column < level {
            break;
        }
        if column == level && is_key(content, child) {
            return Some(i);
        }
    }
    None
}

/// Source text of the plain scalar `parent.child`, up to any trailing comment.
///
/// YAML reads `version: 1.10` as the float `1.1`; this recovers what was written.
pub(crate) fn plain_scalar(text: &str, parent: &str, child: &str) -> Option<String> {
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    let line = &lines[find_nested_key(&lines, parent, child)?];
    let (_, content) = strip_item_marker(line);
    let value = content.strip_prefix(child)?.trim_start().strip_prefix(':')?;
    let value = value.split(" #").next().unwrap_or_default().trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Rewrite the scalar after `key:` on `line`, keeping quoting and any
/// trailing comment.
fn replace_value(line: &str, key: &str, new_value: &str) -> Option<String> {
    let (_, content) = strip_item_marker(line);
    let prefix_len = line.len() - content.len();

    let after_key = content.strip_prefix(key)?;
    let colon = after_key.find(':')?;
    let after_colon = &after_key[colon + 1..];
    let value_start = after_colon.len() - after_colon.trim_start().len();
    let value_and_rest = &after_colon[value_start..];

    let (quote, rest) = match value_and_rest.chars().next() {
        Some(q @ ('"' | '\'')) => {
            let close = value_and_rest[1..].find(q)? + 1;
            (Some(q), &value_and_rest[close + 1..])
        }
        Some('|' | '>' | '[' | '{' | '&' | '*' | '!') => return None,
        Some(_) => {
            let end = value_and_rest.find(" #").unwrap_or(value_and_rest.len());
            let end = value_and_rest[..end].trim_end().len();
            (None, &value_and_rest[end..])
        }
        None => (None, ""),
    };

    let rendered = match quote {
        Some('\'') => format!("'{}'", new_value.replace('\'', "''")),
        Some(_) => format!("\"{}\"", new_value.replace('\\', "\\\\").replace('"', "\\\"")),
        None if reads_back_as_string(new_value) => new_value.to_string(),
        None => format!("\"{new_value}\""),
    };

    let head = &line[..prefix_len + key.len() + colon + 1];
    let gap = if value_start == 0 { " " } else { &after_colon[..value_start] };
    Some(format!("{head}{gap}{rendered}{rest}"))
}

/// True if `value` written as a plain scalar parses back as the same string.
fn reads_back_as_string(value: &str) -> bool {
    matches!(serde_yaml::from_str::<Value>(value), Ok(Value::String(s)) if s == value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_comments_and_other_keys() {
        let text = "\
# zlib recipe
context:
  name: zlib # package name
  version: 1.3.0  # upstream version

package:
  name: ${{ name }}
  version: ${{ version }}

source:
  url: https://zlib.net/zlib-${{ version }}.tar.gz
  sha256: aaaa # checksum
";
        let updated = update_version_and_sha(text, "1.3.1", "bbbb").unwrap();
        assert_eq!(
            updated,
            text.replace("version: 1.3.0  #", "version: 1.3.1  #")
                .replace("sha256: aaaa", "sha256: bbbb")
        );
    }

    #[test]
    fn test_keeps_quote_style() {
        let text = "context:\n  version: '1.0'\nsource:\n  url: u\n  sha256: \"aa\"\n";
        let updated = update_version_and_sha(text, "1.1", "bb").unwrap();
        assert_eq!(
            updated,
            "context:\n  version: '1.1'\nsource:\n  url: u\n  sha256: \"bb\"\n"
        );
    }

    #[test]
    fn test_quotes_values_that_would_change_type() {
        let text = "context:\n  version: 1.0.0\nsource:\n  url: u\n  sha256: aa\n";
        let updated = update_version_and_sha(text, "1.10", "bb").unwrap();
        assert!(updated.contains("version: \"1.10\""));
    }

    #[test]
    fn test_source_list_item() {
        let text = "\
context:
  version: \"2.0\"
source:
  - url: https://x/{{ version }}.tgz
    sha256: aa
";
        let updated = update_version_and_sha(text, "2.1", "bb").unwrap();
        assert_eq!(
            updated,
            text.replace("\"2.0\"", "\"2.1\"").replace("sha256: aa", "sha256: bb")
        );
    }

    #[test]
    fn test_source_list_at_parent_indent() {
        let text = "context:\n  version: '1'\nsource:\n- url: u\n  sha256: aa\n";
        let updated = update_version_and_sha(text, "2", "bb").unwrap();
        assert_eq!(updated, "context:\n  version: '2'\nsource:\n- url: u\n  sha256: bb\n");
    }

    #[test]
    fn test_ignores_deeper_keys_with_same_name() {
        let text = "\
context:
  extra:
    version: nested
  version: '3.0'
source:
  url: u
  sha256: aa
";
        let updated = update_version_and_sha(text, "3.1", "bb").unwrap();
        assert!(updated.contains("    version: nested"));
        assert!(updated.contains("  version: '3.1'"));
    }

    #[test]
    fn test_rejects_block_scalars() {
        let text = "context:\n  version: |\n    1.0\nsource:\n  url: u\n  sha256: aa\n";
        assert!(update_version_and_sha(text, "1.1", "bb").is_err());
    }

    #[test]
    fn test_is_key_word_boundary() {
        assert!(is_key("version: 1", "version"));
        assert!(is_key("version:", "version"));
        assert!(!is_key("version_extra: 1", "version"));
        assert!(!is_key("versions: 1", "version"));
    }

    #[test]
    fn test_plain_scalar_keeps_written_digits() {
        let text = "context:\n  version: 1.10  # pinned\nsource:\n  - sha256: 00\n";
        assert_eq!(plain_scalar(text, "context", "version").as_deref(), Some("1.10"));
        assert_eq!(plain_scalar(text, "source", "sha256").as_deref(), Some("00"));
        assert_eq!(plain_scalar(text, "context", "name"), None);
    }
}
