//! The PS2 share section
//!
//! One named share, wide open on purpose: the PS2 cannot authenticate, so all
//! access is mapped to a single forced user and the masks stay permissive.
//! Access control on this share is "anyone on the LAN", by design of the
//! original tool.

use crate::error::{Ps2NetError, Ps2NetResult};
use crate::section;
use regex::Regex;
use std::path::PathBuf;

/// Name the share is exported under
pub const SHARE_NAME: &str = "PS2SMB";

const SHARE_COMMENT: &str = "PS2 file share";

/// The canonical PS2 share block, in write order
///
/// Only `path` and `force user` depend on the environment; everything else is
/// a fixed literal.
pub fn default_settings(user_name: &str) -> Vec<(String, String)> {
    vec![
        ("comment".to_string(), SHARE_COMMENT.to_string()),
        ("path".to_string(), default_share_path(user_name).display().to_string()),
        ("guest ok".to_string(), "yes".to_string()),
        ("read only".to_string(), "no".to_string()),
        ("browseable".to_string(), "yes".to_string()),
        ("create mask".to_string(), "0777".to_string()),
        ("directory mask".to_string(), "0777".to_string()),
        ("force user".to_string(), user_name.to_string()),
    ]
}

/// Default folder the share exports
pub fn default_share_path(user_name: &str) -> PathBuf {
    PathBuf::from(format!("/home/{}/{}", user_name, SHARE_NAME))
}

/// Check the share section against the canonical block
///
/// Fail-fast: section presence first (`TagNotFound`), then the `path`
/// assignment (`SettingNotFound("path")`), then every other default except
/// `comment`, in write order; the first mismatch is reported and the rest is
/// not inspected.
pub fn validate(conf_data: &str, user_name: &str) -> Ps2NetResult<()> {
    if !section::section_exists(SHARE_NAME, conf_data) {
        return Err(Ps2NetError::TagNotFound(SHARE_NAME.to_string()));
    }

    let content = section::require_section_content(SHARE_NAME, conf_data)?;

    section::read_setting(SHARE_NAME, "path", conf_data)?;

    for (key, value) in default_settings(user_name) {
        if key == "path" || key == "comment" {
            continue;
        }
        let pattern = format!(
            r"(?m)^[ \t]*{}[ \t]*=[ \t]*{}[ \t]*$",
            regex::escape(&key),
            regex::escape(&value)
        );
        let re = Regex::new(&pattern).map_err(|e| Ps2NetError::ParseError(e.to_string()))?;
        if !re.is_match(&content) {
            return Err(Ps2NetError::SettingNotFound(key));
        }
    }

    Ok(())
}

/// Create the share section if absent, or reset it to the canonical block
///
/// This is a destructive recreate: custom settings in an existing section are
/// discarded. A caller that wants to keep a custom `path` reads it out first
/// and re-applies it afterwards.
pub fn create_or_replace(conf_data: &str, user_name: &str) -> Ps2NetResult<String> {
    let base = if section::section_exists(SHARE_NAME, conf_data) {
        conf_data.to_string()
    } else {
        section::append_empty_section(SHARE_NAME, conf_data)
    };

    let lines: Vec<String> = default_settings(user_name)
        .into_iter()
        .map(|(key, value)| format!("{} = {}", key, value))
        .collect();

    section::replace_section_content(SHARE_NAME, &lines, &base)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLOBAL_ONLY: &str = "[global]\n   netbios name = PS2\n";

    #[test]
    fn test_default_settings_determinism() {
        let settings = default_settings("alice");
        assert_eq!(settings[1], ("path".to_string(), "/home/alice/PS2SMB".to_string()));
        assert_eq!(settings[7], ("force user".to_string(), "alice".to_string()));

        // The other settings are fixed regardless of user name
        let other = default_settings("bob");
        assert_eq!(settings[2], other[2]); // guest ok
        assert_eq!(settings[3], other[3]); // read only
        assert_eq!(settings[4], other[4]); // browseable
        assert_eq!(settings[5], other[5]); // create mask
        assert_eq!(settings[6], other[6]); // directory mask
    }

    #[test]
    fn test_create_section_from_scratch() {
        let conf = create_or_replace(GLOBAL_ONLY, "alice").unwrap();

        assert!(validate(&conf, "alice").is_ok());
        assert_eq!(section::read_setting(SHARE_NAME, "path", &conf).unwrap(), "/home/alice/PS2SMB");
        assert_eq!(section::read_setting(SHARE_NAME, "force user", &conf).unwrap(), "alice");
        assert_eq!(section::read_setting(SHARE_NAME, "guest ok", &conf).unwrap(), "yes");
        // [global] untouched
        assert_eq!(section::read_setting("global", "netbios name", &conf).unwrap(), "PS2");
    }

    #[test]
    fn test_validate_missing_section() {
        let err = validate(GLOBAL_ONLY, "alice").unwrap_err();
        assert!(matches!(err, Ps2NetError::TagNotFound(tag) if tag == SHARE_NAME));
    }

    #[test]
    fn test_validate_missing_path_reported_first() {
        let conf = "[global]\n   netbios name = PS2\n\n[PS2SMB]\n   guest ok = yes\n";
        let err = validate(conf, "alice").unwrap_err();
        assert!(matches!(err, Ps2NetError::SettingNotFound(key) if key == "path"));
    }

    #[test]
    fn test_validate_fail_fast_on_first_wrong_setting() {
        let mut conf = create_or_replace(GLOBAL_ONLY, "alice").unwrap();
        conf = section::upsert_setting(SHARE_NAME, "read only", "yes", &conf).unwrap();
        conf = section::remove_setting(SHARE_NAME, "browseable", &conf).unwrap();

        // "read only" comes before "browseable" in write order
        let err = validate(&conf, "alice").unwrap_err();
        assert!(matches!(err, Ps2NetError::SettingNotFound(key) if key == "read only"));
    }

    #[test]
    fn test_validate_checks_force_user_value() {
        let conf = create_or_replace(GLOBAL_ONLY, "alice").unwrap();
        let err = validate(&conf, "bob").unwrap_err();
        assert!(matches!(err, Ps2NetError::SettingNotFound(key) if key == "force user"));
    }

    #[test]
    fn test_recreate_discards_custom_settings() {
        let mut conf = create_or_replace(GLOBAL_ONLY, "alice").unwrap();
        conf = section::upsert_setting(SHARE_NAME, "path", "/srv/old", &conf).unwrap();
        conf = section::upsert_setting(SHARE_NAME, "veto files", "/*.tmp/", &conf).unwrap();

        let recreated = create_or_replace(&conf, "alice").unwrap();
        assert_eq!(
            section::read_setting(SHARE_NAME, "path", &recreated).unwrap(),
            "/home/alice/PS2SMB"
        );
        assert!(section::read_setting(SHARE_NAME, "veto files", &recreated).is_err());
    }

    #[test]
    fn test_recreate_then_reapply_previous_path() {
        let mut conf = create_or_replace(GLOBAL_ONLY, "alice").unwrap();
        conf = section::upsert_setting(SHARE_NAME, "path", "/srv/old", &conf).unwrap();

        // Forced recreate, then the caller restores the path it read out
        let previous = section::read_setting(SHARE_NAME, "path", &conf).unwrap();
        let mut recreated = create_or_replace(&conf, "alice").unwrap();
        recreated = section::upsert_setting(SHARE_NAME, "path", &previous, &recreated).unwrap();

        assert_eq!(section::read_setting(SHARE_NAME, "path", &recreated).unwrap(), "/srv/old");
        assert_eq!(section::read_setting(SHARE_NAME, "force user", &recreated).unwrap(), "alice");
        assert_eq!(section::read_setting(SHARE_NAME, "guest ok", &recreated).unwrap(), "yes");
        assert_eq!(section::read_setting(SHARE_NAME, "create mask", &recreated).unwrap(), "0777");
    }
}
