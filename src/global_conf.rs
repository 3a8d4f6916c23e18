//! PS2 requirements on the [global] section
//!
//! The PS2 only speaks SMBv1, so both protocol floors must be pinned to NT1
//! and the server must carry a NetBIOS name it can be discovered by.

use crate::error::{Ps2NetError, Ps2NetResult};
use crate::section;
use regex::Regex;
use tracing::warn;

/// NetBIOS name applied when the configuration has none
pub const DEFAULT_NETBIOS_NAME: &str = "SAMBA";

/// Protocol floor the PS2 requires
const MIN_PROTOCOL: &str = "NT1";

const NETBIOS_NAME_KEY: &str = "netbios name";
const SERVER_MIN_PROTOCOL_KEY: &str = "server min protocol";
const CLIENT_MIN_PROTOCOL_KEY: &str = "client min protocol";

/// Check whether [global] carries the three settings the PS2 requires
///
/// Returns true only when all of `netbios name`, `server min protocol = NT1`
/// and `client min protocol = NT1` are present; the NT1 comparisons are exact
/// and case-sensitive. Fails with `GlobalSectionNotFound` when the section
/// itself is missing. Each violated requirement is logged as a warning.
pub fn validate(conf_data: &str) -> Ps2NetResult<bool> {
    let global = section::section_content("global", conf_data)
        .ok_or(Ps2NetError::GlobalSectionNotFound)?;

    let requirements = [
        (NETBIOS_NAME_KEY, r"(?m)^[ \t]*netbios name[ \t]*=[ \t]*\S.*$"),
        (SERVER_MIN_PROTOCOL_KEY, r"(?m)^[ \t]*server min protocol[ \t]*=[ \t]*NT1[ \t]*$"),
        (CLIENT_MIN_PROTOCOL_KEY, r"(?m)^[ \t]*client min protocol[ \t]*=[ \t]*NT1[ \t]*$"),
    ];

    let mut valid = true;
    for (name, pattern) in requirements {
        let re = Regex::new(pattern).map_err(|e| Ps2NetError::ParseError(e.to_string()))?;
        if !re.is_match(&global) {
            warn!("Global setting '{}' is missing or has the wrong value", name);
            valid = false;
        }
    }

    Ok(valid)
}

/// Rewrite [global] so the PS2 requirements hold
///
/// Post-conditions: `netbios name` is the first line (the pre-existing value
/// is kept, `SAMBA` otherwise), the two NT1 floors follow it, and every other
/// pre-existing setting keeps its original relative order. Running this on an
/// already-repaired document leaves the section unchanged.
pub fn repair(conf_data: &str) -> Ps2NetResult<String> {
    let global = section::section_content("global", conf_data)
        .ok_or(Ps2NetError::GlobalSectionNotFound)?;

    let netbios_name = section::read_setting("global", NETBIOS_NAME_KEY, conf_data)
        .unwrap_or_else(|_| DEFAULT_NETBIOS_NAME.to_string());

    let managed = [NETBIOS_NAME_KEY, SERVER_MIN_PROTOCOL_KEY, CLIENT_MIN_PROTOCOL_KEY];
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("{} = {}", NETBIOS_NAME_KEY, netbios_name));
    lines.push(format!("{} = {}", SERVER_MIN_PROTOCOL_KEY, MIN_PROTOCOL));
    lines.push(format!("{} = {}", CLIENT_MIN_PROTOCOL_KEY, MIN_PROTOCOL));

    for line in global.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let is_managed = managed.iter().any(|key| {
            trimmed
                .split_once('=')
                .map(|(k, _)| k.trim() == *key)
                .unwrap_or(false)
        });
        if !is_managed {
            lines.push(trimmed.to_string());
        }
    }

    section::replace_section_content("global", &lines, conf_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_all_three_settings() {
        let full = "[global]\n   netbios name = PS2\n   server min protocol = NT1\n   client min protocol = NT1\n";
        assert!(validate(full).unwrap());

        let missing_name = "[global]\n   server min protocol = NT1\n   client min protocol = NT1\n";
        assert!(!validate(missing_name).unwrap());

        let missing_server = "[global]\n   netbios name = PS2\n   client min protocol = NT1\n";
        assert!(!validate(missing_server).unwrap());

        let missing_client = "[global]\n   netbios name = PS2\n   server min protocol = NT1\n";
        assert!(!validate(missing_client).unwrap());
    }

    #[test]
    fn test_validate_pins_nt1_exactly() {
        let wrong_value = "[global]\n   netbios name = PS2\n   server min protocol = SMB2\n   client min protocol = NT1\n";
        assert!(!validate(wrong_value).unwrap());

        // Case-sensitive: nt1 is not NT1
        let wrong_case = "[global]\n   netbios name = PS2\n   server min protocol = nt1\n   client min protocol = NT1\n";
        assert!(!validate(wrong_case).unwrap());

        // NT1 with trailing junk is not NT1
        let trailing = "[global]\n   netbios name = PS2\n   server min protocol = NT12\n   client min protocol = NT1\n";
        assert!(!validate(trailing).unwrap());
    }

    #[test]
    fn test_validate_without_global_section() {
        let err = validate("[PS2SMB]\n   path = /srv/ps2\n").unwrap_err();
        assert!(matches!(err, Ps2NetError::GlobalSectionNotFound));
    }

    #[test]
    fn test_repair_inserts_defaults_and_keeps_existing_settings() {
        let conf = "[global]\n   workgroup = WORKGROUP\n";
        let repaired = repair(conf).unwrap();

        let global = section::section_content("global", &repaired).unwrap();
        let lines: Vec<&str> = global.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        assert_eq!(
            lines,
            vec![
                "netbios name = SAMBA",
                "server min protocol = NT1",
                "client min protocol = NT1",
                "workgroup = WORKGROUP",
            ]
        );
        assert!(validate(&repaired).unwrap());
    }

    #[test]
    fn test_repair_preserves_existing_netbios_name() {
        let conf = "[global]\n   workgroup = WORKGROUP\n   netbios name = MYPS2\n   server min protocol = SMB2\n";
        let repaired = repair(conf).unwrap();

        assert_eq!(
            section::read_setting("global", "netbios name", &repaired).unwrap(),
            "MYPS2"
        );
        assert_eq!(
            section::read_setting("global", "server min protocol", &repaired).unwrap(),
            "NT1"
        );

        // Name goes first, protocols right after
        let global = section::section_content("global", &repaired).unwrap();
        let lines: Vec<&str> = global.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        assert_eq!(lines[0], "netbios name = MYPS2");
        assert_eq!(lines[1], "server min protocol = NT1");
        assert_eq!(lines[2], "client min protocol = NT1");
        assert_eq!(lines[3], "workgroup = WORKGROUP");
    }

    #[test]
    fn test_repair_is_idempotent() {
        let conf = "[global]\n   workgroup = WORKGROUP\n\n[PS2SMB]\n   path = /srv/ps2\n";
        let once = repair(conf).unwrap();
        let twice = repair(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_repair_leaves_other_sections_alone() {
        let conf = "[global]\n   workgroup = WORKGROUP\n\n[PS2SMB]\n   path = /srv/ps2\n";
        let repaired = repair(conf).unwrap();
        assert_eq!(
            section::read_setting("PS2SMB", "path", &repaired).unwrap(),
            "/srv/ps2"
        );
    }
}
