//! Controller hostname and acting-user resolution.
//!
//! The run records which machine and which account drove it. Both can be
//! overridden in configuration; otherwise they come from the OS. An
//! unresolvable hostname or user leaves the field unset rather than
//! failing the run.

use nix::unistd::{getuid, User};
use tracing::debug;

use crate::domain::models::{HostnameFormat, RecorderConfig};

/// Resolve the controller hostname in the requested format.
///
/// No DNS round trip is made: `gethostname(2)` frequently returns a fully
/// qualified name already, and the short formats take the first
/// dot-separated segment.
pub fn hostname(format: HostnameFormat) -> Option<String> {
    let raw = nix::unistd::gethostname().ok()?.into_string().ok()?;
    if raw.is_empty() {
        return None;
    }
    let resolved = match format {
        HostnameFormat::Fqdn | HostnameFormat::Hostname => raw,
        HostnameFormat::FqdnShort | HostnameFormat::HostnameShort => {
            raw.split('.').next().unwrap_or(&raw).to_string()
        }
    };
    Some(resolved)
}

/// The controller name to record, honoring the explicit override and the
/// record toggle.
pub fn resolve_controller(config: &RecorderConfig) -> Option<String> {
    if !config.record_controller {
        return None;
    }
    if let Some(name) = &config.record_controller_name {
        return Some(name.clone());
    }
    let resolved = hostname(config.localhost_as_hostname_format);
    if resolved.is_none() {
        debug!("controller hostname could not be resolved, leaving unset");
    }
    resolved
}

/// The acting user to record, honoring the explicit override and the
/// record toggle.
pub fn resolve_user(config: &RecorderConfig) -> Option<String> {
    if !config.record_user {
        return None;
    }
    if let Some(name) = &config.record_user_name {
        return Some(name.clone());
    }
    User::from_uid(getuid()).ok().flatten().map(|user| user.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_formats_have_no_domain_part() {
        if let Some(short) = hostname(HostnameFormat::FqdnShort) {
            assert!(!short.contains('.'));
        }
    }

    #[test]
    fn explicit_controller_override_wins() {
        let config = RecorderConfig {
            record_controller_name: Some("deploy-bastion".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_controller(&config).as_deref(),
            Some("deploy-bastion")
        );
    }

    #[test]
    fn controller_recording_can_be_disabled() {
        let config = RecorderConfig {
            record_controller: false,
            record_controller_name: Some("ignored".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_controller(&config), None);
    }

    #[test]
    fn explicit_user_override_wins() {
        let config = RecorderConfig {
            record_user_name: Some("automation".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_user(&config).as_deref(), Some("automation"));
    }

    #[test]
    fn user_recording_can_be_disabled() {
        let config = RecorderConfig {
            record_user: false,
            ..Default::default()
        };
        assert_eq!(resolve_user(&config), None);
    }
}
