use std::{fs, path::Path};

use tracing::warn;

/// Process-wide defaults parsed from the settings file. Read-only after load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalSettings {
    pub global_jumphost: bool,
    pub jumpserver: String,
    pub jumpuser: String,
    pub ssh_user: String,
}

impl GlobalSettings {
    /// A missing settings file is not fatal: built-in defaults are used and a
    /// warning is emitted.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path.as_ref()) {
            Ok(text) => Self::parse(&text),
            Err(_) => {
                warn!(
                    path = %path.as_ref().display(),
                    "settings file not found, using built-in defaults"
                );
                Self::default()
            }
        }
    }

    pub fn parse(text: &str) -> Self {
        let mut settings = Self::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "global_jumphost" => settings.global_jumphost = truthy(value),
                "jumpserver" => settings.jumpserver = value.to_string(),
                "jumpuser" => settings.jumpuser = value.to_string(),
                "ssh_user" => settings.ssh_user = value.to_string(),
                // unknown keys are ignored, not errors
                _ => {}
            }
        }
        settings
    }
}

pub(crate) fn truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "yes" | "true" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_keys() {
        let settings = GlobalSettings::parse(
            "# defaults\n\
             global_jumphost = yes\n\
             jumpserver = bastion.example.com\n\
             jumpuser = jump\n\
             ssh_user = admin\n",
        );
        assert!(settings.global_jumphost);
        assert_eq!(settings.jumpserver, "bastion.example.com");
        assert_eq!(settings.jumpuser, "jump");
        assert_eq!(settings.ssh_user, "admin");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let settings = GlobalSettings::parse("color=blue\nssh_user=ops\n");
        assert_eq!(settings.ssh_user, "ops");
        assert!(!settings.global_jumphost);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let settings = GlobalSettings::parse("");
        assert_eq!(settings, GlobalSettings::default());
        assert!(settings.jumpserver.is_empty());
    }

    #[test]
    fn truthiness_variants() {
        for value in ["yes", "YES", "true", "1"] {
            assert!(truthy(value), "{value}");
        }
        for value in ["no", "0", "false", ""] {
            assert!(!truthy(value), "{value}");
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings = GlobalSettings::load("/nonexistent/config.ini");
        assert_eq!(settings, GlobalSettings::default());
    }
}
