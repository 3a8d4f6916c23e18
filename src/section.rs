//! Section-level surgery on the smb.conf document
//!
//! A document is the comment-stripped file content as one string. A section
//! spans its `[tag]` header up to the next `[` or the end of the document,
//! which mirrors Samba's own tolerant grammar. Every mutation is funneled
//! through [`replace_section_content`], so a section rewrite is all-or-nothing.

use crate::error::{Ps2NetError, Ps2NetResult};
use regex::{NoExpand, Regex};
use std::ops::Range;

/// Indentation applied to every setting line on rewrite
const SETTING_INDENT: &str = "   ";

/// Locate a section: full span (header through next-tag-or-EOF) and the
/// offset where its content starts
fn section_span(tag: &str, conf_data: &str) -> Option<(Range<usize>, usize)> {
    let header = format!("[{}]", tag);
    let start = conf_data.find(&header)?;
    let after_header = start + header.len();

    let end = conf_data[after_header..]
        .find('[')
        .map(|i| after_header + i)
        .unwrap_or(conf_data.len());

    let skipped: usize = conf_data[after_header..end]
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| c.len_utf8())
        .sum();

    Some((start..end, after_header + skipped))
}

/// Compile a per-line matcher for `key = value` inside section content
///
/// Keys are matched case-sensitively; whitespace around the `=` is free.
fn setting_regex(key: &str) -> Ps2NetResult<Regex> {
    Regex::new(&format!(r"(?m)^[ \t]*{}[ \t]*=[ \t]*(.*)$", regex::escape(key)))
        .map_err(|e| Ps2NetError::ParseError(e.to_string()))
}

/// Extract the content of a section, or None if the tag is absent
pub fn section_content(tag: &str, conf_data: &str) -> Option<String> {
    let (span, content_start) = section_span(tag, conf_data)?;
    Some(conf_data[content_start..span.end].to_string())
}

/// Extract the content of a section, failing with `TagNotFound` if absent
pub fn require_section_content(tag: &str, conf_data: &str) -> Ps2NetResult<String> {
    section_content(tag, conf_data).ok_or_else(|| Ps2NetError::TagNotFound(tag.to_string()))
}

/// True if the tag header appears anywhere in the document
pub fn section_exists(tag: &str, conf_data: &str) -> bool {
    conf_data.contains(&format!("[{}]", tag))
}

/// Append a new, empty, blank-line-separated section header at the end of
/// the document
pub fn append_empty_section(tag: &str, conf_data: &str) -> String {
    let mut out = conf_data.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
    out.push('[');
    out.push_str(tag);
    out.push_str("]\n");
    out
}

/// Rebuild a section body from an ordered list of setting lines
///
/// Lines are trimmed, empties dropped, backslashes doubled, and each line
/// indented by three spaces under the header. The new block replaces the old
/// section span wholesale; a single blank line separates it from a following
/// section.
pub fn replace_section_content(
    tag: &str,
    new_lines: &[String],
    conf_data: &str,
) -> Ps2NetResult<String> {
    let (span, _) = section_span(tag, conf_data)
        .ok_or_else(|| Ps2NetError::TagNotFound(tag.to_string()))?;

    let mut block = String::new();
    block.push('[');
    block.push_str(tag);
    block.push_str("]\n");

    for line in new_lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        block.push_str(SETTING_INDENT);
        block.push_str(&trimmed.replace('\\', "\\\\"));
        block.push('\n');
    }

    let mut out = String::with_capacity(conf_data.len() + block.len());
    out.push_str(&conf_data[..span.start]);
    out.push_str(&block);
    if span.end < conf_data.len() {
        out.push('\n');
    }
    out.push_str(&conf_data[span.end..]);
    Ok(out)
}

/// Set a setting inside a section, replacing the value in place if the key
/// exists and appending `key = value` at the end of the section otherwise
pub fn upsert_setting(
    tag: &str,
    key: &str,
    value: &str,
    conf_data: &str,
) -> Ps2NetResult<String> {
    let content = require_section_content(tag, conf_data)?;
    let re = setting_regex(key)?;

    let new_line = format!("{} = {}", key, value);
    let new_content = if re.is_match(&content) {
        re.replace(&content, NoExpand(new_line.as_str())).into_owned()
    } else {
        let mut appended = content;
        if !appended.is_empty() && !appended.ends_with('\n') {
            appended.push('\n');
        }
        appended.push_str(&new_line);
        appended
    };

    let lines: Vec<String> = new_content.lines().map(str::to_string).collect();
    replace_section_content(tag, &lines, conf_data)
}

/// Strip any `key = ...` line from a section; no-op if the key is absent
pub fn remove_setting(tag: &str, key: &str, conf_data: &str) -> Ps2NetResult<String> {
    let content = require_section_content(tag, conf_data)?;
    let re = setting_regex(key)?;

    let lines: Vec<String> = content
        .lines()
        .filter(|line| !re.is_match(line))
        .map(str::to_string)
        .collect();
    replace_section_content(tag, &lines, conf_data)
}

/// Read the value of a setting inside a section
///
/// Fails with `SettingNotFound` if the key has no assignment in the section.
pub fn read_setting(tag: &str, key: &str, conf_data: &str) -> Ps2NetResult<String> {
    let content = require_section_content(tag, conf_data)?;
    let re = setting_regex(key)?;

    match re.captures(&content) {
        Some(caps) => Ok(caps[1].trim().to_string()),
        None => Err(Ps2NetError::SettingNotFound(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONF: &str = "[global]\n   workgroup = WORKGROUP\n   netbios name = PS2\n\n[PS2SMB]\n   path = /srv/ps2\n   guest ok = yes\n";

    #[test]
    fn test_section_content_extraction() {
        let global = section_content("global", CONF).unwrap();
        assert!(global.contains("workgroup = WORKGROUP"));
        assert!(!global.contains("path"));

        let share = section_content("PS2SMB", CONF).unwrap();
        assert!(share.contains("path = /srv/ps2"));
        assert!(share.contains("guest ok = yes"));

        assert!(section_content("printers", CONF).is_none());
    }

    #[test]
    fn test_require_section_content_raises() {
        let err = require_section_content("printers", CONF).unwrap_err();
        assert!(matches!(err, Ps2NetError::TagNotFound(tag) if tag == "printers"));
    }

    #[test]
    fn test_section_exists() {
        assert!(section_exists("global", CONF));
        assert!(section_exists("PS2SMB", CONF));
        assert!(!section_exists("homes", CONF));
    }

    #[test]
    fn test_append_empty_section() {
        let out = append_empty_section("PS2SMB", "[global]\n   workgroup = WG\n");
        assert!(out.ends_with("\n\n[PS2SMB]\n"));
        assert!(section_exists("PS2SMB", &out));
    }

    #[test]
    fn test_replace_section_content_keeps_neighbors() {
        let lines = vec!["a = 1".to_string(), "  b = 2  ".to_string(), "".to_string()];
        let out = replace_section_content("global", &lines, CONF).unwrap();

        let global = section_content("global", &out).unwrap();
        assert_eq!(global.trim_end(), "a = 1\n   b = 2");
        // Untouched neighbor section
        assert_eq!(section_content("PS2SMB", &out).unwrap(), section_content("PS2SMB", CONF).unwrap());
        // Blank line separates the rewritten section from the next header
        assert!(out.contains("b = 2\n\n[PS2SMB]"));
    }

    #[test]
    fn test_replace_section_content_doubles_backslashes() {
        let lines = vec![r"path = C:\ps2".to_string()];
        let out = replace_section_content("PS2SMB", &lines, CONF).unwrap();
        assert!(out.contains(r"path = C:\\ps2"));
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let out = upsert_setting("global", "workgroup", "HOME", CONF).unwrap();
        assert_eq!(read_setting("global", "workgroup", &out).unwrap(), "HOME");
        // Relative order preserved
        let global = section_content("global", &out).unwrap();
        assert!(global.find("workgroup").unwrap() < global.find("netbios name").unwrap());
    }

    #[test]
    fn test_upsert_appends_when_absent() {
        let out = upsert_setting("PS2SMB", "read only", "no", CONF).unwrap();
        assert_eq!(read_setting("PS2SMB", "read only", &out).unwrap(), "no");
        let share = section_content("PS2SMB", &out).unwrap();
        assert!(share.find("guest ok").unwrap() < share.find("read only").unwrap());
    }

    #[test]
    fn test_upsert_read_round_trip_under_unrelated_upserts() {
        let mut conf = CONF.to_string();
        let settings = [
            ("comment", "PS2 share"),
            ("browseable", "yes"),
            ("create mask", "0777"),
            ("force user", "alice"),
        ];

        for (key, value) in settings {
            conf = upsert_setting("PS2SMB", key, value, &conf).unwrap();
        }

        for (key, value) in settings {
            assert_eq!(read_setting("PS2SMB", key, &conf).unwrap(), value);
        }
        // Prior settings survived every unrelated upsert
        assert_eq!(read_setting("PS2SMB", "path", &conf).unwrap(), "/srv/ps2");
        assert_eq!(read_setting("global", "workgroup", &conf).unwrap(), "WORKGROUP");
    }

    #[test]
    fn test_remove_setting() {
        let out = remove_setting("PS2SMB", "guest ok", CONF).unwrap();
        assert!(matches!(
            read_setting("PS2SMB", "guest ok", &out),
            Err(Ps2NetError::SettingNotFound(_))
        ));
        assert_eq!(read_setting("PS2SMB", "path", &out).unwrap(), "/srv/ps2");

        // Removing an absent key is a no-op
        let again = remove_setting("PS2SMB", "guest ok", &out).unwrap();
        assert_eq!(again, out);
    }

    #[test]
    fn test_read_setting_is_whitespace_insensitive_around_equals() {
        let conf = "[global]\n   netbios name=PS2\n   server min protocol   =   NT1\n";
        assert_eq!(read_setting("global", "netbios name", conf).unwrap(), "PS2");
        assert_eq!(read_setting("global", "server min protocol", conf).unwrap(), "NT1");
    }

    #[test]
    fn test_read_setting_is_case_sensitive_on_keys() {
        let conf = "[global]\n   Netbios Name = PS2\n";
        assert!(read_setting("global", "netbios name", conf).is_err());
    }

    #[test]
    fn test_last_section_runs_to_end_of_document() {
        let share = section_content("PS2SMB", CONF).unwrap();
        assert!(share.ends_with("guest ok = yes\n"));

        let lines = vec!["path = /data".to_string()];
        let out = replace_section_content("PS2SMB", &lines, CONF).unwrap();
        assert!(out.ends_with("[PS2SMB]\n   path = /data\n"));
    }
}
