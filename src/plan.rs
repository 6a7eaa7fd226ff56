//! Settings/entry/flag merge and argv rendering for the ssh client.

use crate::flags::FlagSet;
use crate::inventory::{HostEntry, DEFAULT_PORT};
use crate::settings::GlobalSettings;

pub const SSH_PROGRAM: &str = "ssh";

// compatibility option pairs for hosts stuck on old key algorithms
const LEGACY_HOSTKEY_OPT: &str = "HostKeyAlgorithms=+ssh-rsa";
const LEGACY_PUBKEY_OPT: &str = "PubkeyAcceptedAlgorithms=+ssh-rsa";

/// The final, merged record one connection attempt is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPlan {
    pub target_user: Option<String>,
    pub target_host: String,
    pub target_port: u16,
    pub jump_user: Option<String>,
    pub jump_host: Option<String>,
    pub use_legacy_kex: bool,
    pub verbose: bool,
    pub dry_run: bool,
}

impl ConnectionPlan {
    /// Merge the three sources. Each field resolves independently, first
    /// non-empty source wins.
    pub fn build(settings: &GlobalSettings, entry: &HostEntry, flags: &FlagSet) -> Self {
        let target_user = entry.user.clone().or_else(|| nonblank(&settings.ssh_user));

        // a per-host jumphost is always honored; the global one only when
        // global_jumphost is set; /o drops the jump entirely
        let jump_host = if flags.bypass_jumphost {
            None
        } else {
            entry.jumphost.clone().or_else(|| {
                if settings.global_jumphost {
                    nonblank(&settings.jumpserver)
                } else {
                    None
                }
            })
        };

        let jump_user = entry
            .jumpuser
            .clone()
            .or_else(|| nonblank(&settings.jumpuser))
            .or_else(|| target_user.clone());

        Self {
            target_user,
            target_host: entry.host.clone(),
            target_port: entry.port,
            jump_user,
            jump_host,
            use_legacy_kex: entry.legacy || flags.legacy,
            verbose: flags.verbose,
            dry_run: flags.dry_run,
        }
    }

    pub fn render_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.verbose {
            args.push("-v".to_string());
        }
        if self.use_legacy_kex {
            args.push("-o".to_string());
            args.push(LEGACY_HOSTKEY_OPT.to_string());
            args.push("-o".to_string());
            args.push(LEGACY_PUBKEY_OPT.to_string());
        }
        if let Some(jump_spec) = self.jump_spec() {
            args.push("-J".to_string());
            args.push(jump_spec);
        }
        if self.target_port != DEFAULT_PORT {
            args.push("-p".to_string());
            args.push(self.target_port.to_string());
        }
        args.push(self.target_spec());
        args
    }

    /// `jumpuser@jumphost`, bare `jumphost`, or nothing when no jump is in
    /// play.
    pub fn jump_spec(&self) -> Option<String> {
        self.jump_host.as_ref().map(|jump_host| match &self.jump_user {
            Some(jump_user) => format!("{jump_user}@{jump_host}"),
            None => jump_host.clone(),
        })
    }

    pub fn target_spec(&self) -> String {
        match &self.target_user {
            Some(user) => format!("{user}@{}", self.target_host),
            None => self.target_host.clone(),
        }
    }

    /// The full command line, as printed for dry runs.
    pub fn command_line(&self) -> String {
        let mut line = SSH_PROGRAM.to_string();
        for arg in self.render_args() {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}

fn nonblank(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::parse;

    fn entry(text: &str) -> HostEntry {
        let header = "hostname,host,port,user,jumphost,jumpuser,notes,legacy\n";
        parse(&format!("{header}{text}\n")).remove(0)
    }

    fn settings(global_jumphost: bool) -> GlobalSettings {
        GlobalSettings {
            global_jumphost,
            jumpserver: "gate".to_string(),
            jumpuser: "gateuser".to_string(),
            ssh_user: "default".to_string(),
        }
    }

    #[test]
    fn entry_user_beats_settings_user() {
        let plan = ConnectionPlan::build(
            &settings(false),
            &entry("web1,10.0.0.1,,admin"),
            &FlagSet::default(),
        );
        assert_eq!(plan.target_user.as_deref(), Some("admin"));
    }

    #[test]
    fn settings_user_fills_in() {
        let plan =
            ConnectionPlan::build(&settings(false), &entry("web1,10.0.0.1"), &FlagSet::default());
        assert_eq!(plan.target_user.as_deref(), Some("default"));
    }

    #[test]
    fn user_can_stay_unset() {
        let plan = ConnectionPlan::build(
            &GlobalSettings::default(),
            &entry("web1,10.0.0.1"),
            &FlagSet::default(),
        );
        assert_eq!(plan.target_user, None);
        assert_eq!(plan.render_args().last().unwrap(), "10.0.0.1");
    }

    #[test]
    fn global_jumphost_off_means_no_jump() {
        let plan =
            ConnectionPlan::build(&settings(false), &entry("web1,10.0.0.1"), &FlagSet::default());
        assert_eq!(plan.jump_host, None);
    }

    #[test]
    fn per_host_jumphost_ignores_global_switch() {
        let plan = ConnectionPlan::build(
            &settings(false),
            &entry("web1,10.0.0.1,,,bast"),
            &FlagSet::default(),
        );
        assert_eq!(plan.jump_host.as_deref(), Some("bast"));
    }

    #[test]
    fn global_jumphost_on_uses_jumpserver() {
        let plan =
            ConnectionPlan::build(&settings(true), &entry("web1,10.0.0.1"), &FlagSet::default());
        assert_eq!(plan.jump_host.as_deref(), Some("gate"));
        assert_eq!(plan.jump_user.as_deref(), Some("gateuser"));
    }

    #[test]
    fn bypass_flag_always_drops_jump() {
        let flags = FlagSet {
            bypass_jumphost: true,
            ..FlagSet::default()
        };
        let plan = ConnectionPlan::build(&settings(true), &entry("web1,10.0.0.1,,,bast"), &flags);
        assert_eq!(plan.jump_host, None);
    }

    #[test]
    fn jump_user_falls_back_to_target_user() {
        let mut s = settings(true);
        s.jumpuser = String::new();
        let plan = ConnectionPlan::build(&s, &entry("web1,10.0.0.1,,admin"), &FlagSet::default());
        assert_eq!(plan.jump_user.as_deref(), Some("admin"));
    }

    #[test]
    fn legacy_or_merge() {
        let flags = FlagSet {
            legacy: true,
            ..FlagSet::default()
        };
        let from_entry = ConnectionPlan::build(
            &settings(false),
            &entry("old1,10.0.0.9,,,,,,yes"),
            &FlagSet::default(),
        );
        let from_flags =
            ConnectionPlan::build(&settings(false), &entry("web1,10.0.0.1"), &flags);
        assert!(from_entry.use_legacy_kex);
        assert!(from_flags.use_legacy_kex);
    }

    #[test]
    fn rendered_args_full_shape() {
        let flags = FlagSet {
            verbose: true,
            legacy: true,
            ..FlagSet::default()
        };
        let plan = ConnectionPlan::build(
            &settings(true),
            &entry("web1,10.0.0.1,2222,admin,bast,jump"),
            &flags,
        );
        assert_eq!(
            plan.render_args(),
            [
                "-v",
                "-o",
                "HostKeyAlgorithms=+ssh-rsa",
                "-o",
                "PubkeyAcceptedAlgorithms=+ssh-rsa",
                "-J",
                "jump@bast",
                "-p",
                "2222",
                "admin@10.0.0.1",
            ]
        );
    }

    #[test]
    fn default_port_renders_no_port_arg() {
        let plan =
            ConnectionPlan::build(&settings(false), &entry("web1,10.0.0.1"), &FlagSet::default());
        assert!(!plan.render_args().contains(&"-p".to_string()));
    }

    #[test]
    fn jump_without_any_user_renders_bare() {
        let plan = ConnectionPlan::build(
            &GlobalSettings::default(),
            &entry("web1,10.0.0.1,,,bast"),
            &FlagSet::default(),
        );
        assert_eq!(plan.render_args(), ["-J", "bast", "10.0.0.1"]);
    }

    #[test]
    fn rendering_is_deterministic() {
        let s = settings(true);
        let e = entry("web1,10.0.0.1,2222,admin,bast,jump,,yes");
        let flags = FlagSet {
            verbose: true,
            ..FlagSet::default()
        };
        let a = ConnectionPlan::build(&s, &e, &flags);
        let b = ConnectionPlan::build(&s, &e, &flags);
        assert_eq!(a, b);
        assert_eq!(a.render_args(), b.render_args());
        assert_eq!(a.command_line(), b.command_line());
    }

    #[test]
    fn command_line_is_space_joined() {
        let plan = ConnectionPlan::build(
            &settings(true),
            &entry("web1,10.0.0.1"),
            &FlagSet::default(),
        );
        assert_eq!(plan.command_line(), "ssh -J gateuser@gate default@10.0.0.1");
    }
}
