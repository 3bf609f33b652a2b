//! rsync command construction
//!
//! [`build_rsync_command`] is a pure, total function from a settings
//! snapshot and a direction to the exact invocation to run. It performs
//! no I/O and never fails: malformed settings (empty host, nonsense
//! paths) produce a command whose errors surface when it is executed.

use crate::wsl::{is_wsl_binary, translate_windows_path};
use vaultsync_core::{Direction, SyncSettings};

/// Default binary name when no explicit path is configured.
const DEFAULT_BINARY: &str = "rsync";

/// Baseline behavior flags, identical for every direction: archive
/// mode with compression, progress and stats output, no symlink
/// following, delete extraneous destination files, and no
/// ownership/permission preservation (the two sides rarely share uids).
const BASE_FLAGS: &[&str] = &[
    "-avz",
    "--progress",
    "--stats",
    "--no-links",
    "--delete",
    "--no-perms",
    "--no-group",
    "--no-owner",
];

/// A fully built rsync invocation: a program and its argument vector.
///
/// Built as an argv rather than a shell string so it can be handed to
/// the process spawner without quoting hazards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsyncCommand {
    /// Program to spawn. Normally the rsync binary; `sshpass` when
    /// password authentication wraps the whole command.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
}

impl RsyncCommand {
    /// Render a single display line for logging and `show-command`.
    ///
    /// Arguments containing whitespace are quoted; this is a preview
    /// format, not what gets executed.
    pub fn to_command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(char::is_whitespace) {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// Build the rsync invocation for one direction.
///
/// The command is deterministic in its inputs: same settings and
/// direction, same argv, token for token. Dry-run differs from the
/// real run only by the presence of `--dry-run`, so its output is a
/// faithful preview.
pub fn build_rsync_command(settings: &SyncSettings, direction: Direction) -> RsyncCommand {
    let binary = if settings.binary_path.is_empty() {
        DEFAULT_BINARY.to_string()
    } else {
        settings.binary_path.clone()
    };
    // A WSL shim means every local path crossing into the command must
    // be rewritten to its /mnt form, independent of the auth branch.
    let wsl = is_wsl_binary(&binary);
    let localize = |path: &str| -> String {
        if wsl {
            translate_windows_path(path)
        } else {
            path.to_string()
        }
    };

    let mut args: Vec<String> = BASE_FLAGS.iter().map(ToString::to_string).collect();

    // Remote shell transport, passed to rsync as a single argument.
    let mut ssh = format!(
        "ssh -p {} -o StrictHostKeyChecking=accept-new",
        settings.ssh_port
    );
    if !settings.private_key_path.is_empty() {
        ssh.push_str(" -i ");
        ssh.push_str(&localize(&settings.private_key_path));
    }
    args.push("-e".to_string());
    args.push(ssh);

    // Direction-specific include/exclude policy derived from the
    // pull-only paths. Forced push deliberately skips it: every local
    // file participates, including pull-only ones.
    match direction {
        Direction::Pull => {
            for path in &settings.pull_paths {
                args.push(format!("--include={path}"));
            }
            if !settings.pull_paths.is_empty() {
                args.push("--exclude=*".to_string());
            }
        }
        Direction::Push => {
            for path in &settings.pull_paths {
                args.push(format!("--exclude={path}"));
            }
        }
        Direction::ForcedPush => {}
    }

    // User excludes apply verbatim to every direction, after the
    // direction-specific rules.
    for pattern in &settings.exclude_patterns {
        args.push(format!("--exclude={pattern}"));
    }

    if settings.dry_run {
        args.push("--dry-run".to_string());
    }

    if !settings.log_file_path.is_empty() {
        args.push(format!("--log-file={}", localize(&settings.log_file_path)));
    }

    // Both roots get a trailing separator so rsync copies directory
    // contents, not the directory node itself.
    let local = with_trailing_slash(&localize(&settings.local_dir_path));
    let remote = format!(
        "{}@{}:{}",
        settings.ssh_username,
        settings.remote_host,
        with_trailing_slash(&settings.remote_dir_path)
    );

    match direction {
        Direction::Pull => {
            args.push(remote);
            args.push(local);
        }
        Direction::Push | Direction::ForcedPush => {
            args.push(local);
            args.push(remote);
        }
    }

    // Password authentication wraps the entire command in sshpass so
    // the secret is fed to the ssh session non-interactively. A
    // configured private key wins over a password; see uses_password_auth.
    if settings.uses_password_auth() {
        tracing::warn!(
            "using password authentication: the password is visible to other \
             processes on this host via the process list; prefer a private key"
        );
        let mut wrapped = vec!["-p".to_string(), settings.ssh_password.clone(), binary];
        wrapped.append(&mut args);
        return RsyncCommand {
            program: "sshpass".to_string(),
            args: wrapped,
        };
    }
    if !settings.ssh_password.is_empty() && !settings.private_key_path.is_empty() {
        tracing::warn!("both ssh_password and private_key_path are set; using the key");
    }

    RsyncCommand {
        program: binary,
        args,
    }
}

fn with_trailing_slash(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    format!("{trimmed}/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SyncSettings {
        SyncSettings {
            remote_host: "192.168.1.100".to_string(),
            ssh_username: "sam".to_string(),
            local_dir_path: "/home/sam/vault".to_string(),
            remote_dir_path: "/srv/vault".to_string(),
            ..SyncSettings::default()
        }
    }

    fn args_of(cmd: &RsyncCommand) -> Vec<&str> {
        cmd.args.iter().map(String::as_str).collect()
    }

    #[test]
    fn default_binary_and_baseline_flags() {
        let cmd = build_rsync_command(&settings(), Direction::Push);
        assert_eq!(cmd.program, "rsync");
        assert_eq!(&cmd.args[..8], BASE_FLAGS);
    }

    #[test]
    fn configured_binary_path_is_used() {
        let mut s = settings();
        s.binary_path = "/opt/rsync/bin/rsync".to_string();
        let cmd = build_rsync_command(&s, Direction::Push);
        assert_eq!(cmd.program, "/opt/rsync/bin/rsync");
    }

    #[test]
    fn ssh_transport_carries_port_and_key() {
        let mut s = settings();
        s.ssh_port = 2222;
        s.private_key_path = "/home/sam/.ssh/id_ed25519".to_string();
        let cmd = build_rsync_command(&s, Direction::Push);

        let e_pos = cmd.args.iter().position(|a| a == "-e").unwrap();
        let ssh = &cmd.args[e_pos + 1];
        assert_eq!(
            ssh,
            "ssh -p 2222 -o StrictHostKeyChecking=accept-new -i /home/sam/.ssh/id_ed25519"
        );
    }

    #[test]
    fn pull_includes_each_path_then_catch_all_exclude() {
        let mut s = settings();
        s.pull_paths = vec!["Mobile-notes/".to_string(), "shared/".to_string()];
        let cmd = build_rsync_command(&s, Direction::Pull);
        let args = args_of(&cmd);

        let inc1 = args.iter().position(|a| *a == "--include=Mobile-notes/");
        let inc2 = args.iter().position(|a| *a == "--include=shared/");
        let catch_all = args.iter().position(|a| *a == "--exclude=*");
        // one include per entry, in order, immediately followed by the catch-all
        assert_eq!(inc2, inc1.map(|i| i + 1));
        assert_eq!(catch_all, inc2.map(|i| i + 1));
    }

    #[test]
    fn pull_without_pull_paths_has_no_catch_all() {
        let cmd = build_rsync_command(&settings(), Direction::Pull);
        assert!(!cmd.args.iter().any(|a| a == "--exclude=*"));
        assert!(!cmd.args.iter().any(|a| a.starts_with("--include=")));
    }

    #[test]
    fn push_excludes_pull_paths_without_catch_all() {
        let mut s = settings();
        s.pull_paths = vec!["Mobile-notes/".to_string(), "shared/".to_string()];
        let cmd = build_rsync_command(&s, Direction::Push);
        let args = args_of(&cmd);

        assert!(args.contains(&"--exclude=Mobile-notes/"));
        assert!(args.contains(&"--exclude=shared/"));
        assert!(!args.contains(&"--exclude=*"));
        assert!(!args.iter().any(|a| a.starts_with("--include=")));
    }

    #[test]
    fn forced_push_ignores_pull_paths_entirely() {
        let mut s = settings();
        s.pull_paths = vec!["Mobile-notes/".to_string(), "shared/".to_string()];
        s.exclude_patterns = vec!["*.tmp".to_string()];
        let cmd = build_rsync_command(&s, Direction::ForcedPush);
        let args = args_of(&cmd);

        assert!(!args.contains(&"--exclude=Mobile-notes/"));
        assert!(!args.contains(&"--exclude=shared/"));
        assert!(!args.contains(&"--exclude=*"));
        // user excludes still apply
        assert!(args.contains(&"--exclude=*.tmp"));
    }

    #[test]
    fn user_excludes_follow_direction_rules() {
        let mut s = settings();
        s.pull_paths = vec!["shared/".to_string()];
        s.exclude_patterns = vec!["*.log".to_string(), ".trash/".to_string()];
        let cmd = build_rsync_command(&s, Direction::Push);
        let args = args_of(&cmd);

        let pull_derived = args.iter().position(|a| *a == "--exclude=shared/").unwrap();
        let user1 = args.iter().position(|a| *a == "--exclude=*.log").unwrap();
        let user2 = args.iter().position(|a| *a == "--exclude=.trash/").unwrap();
        assert!(pull_derived < user1);
        assert!(user1 < user2);
    }

    #[test]
    fn push_with_only_excludes_has_exactly_one_exclude() {
        let mut s = settings();
        s.exclude_patterns = vec!["*.log".to_string()];
        let cmd = build_rsync_command(&s, Direction::Push);

        let excludes: Vec<_> = cmd
            .args
            .iter()
            .filter(|a| a.starts_with("--exclude"))
            .collect();
        assert_eq!(excludes, vec!["--exclude=*.log"]);
        assert!(!cmd.args.iter().any(|a| a.starts_with("--include")));
    }

    #[test]
    fn dry_run_differs_only_by_the_flag() {
        let mut s = settings();
        s.pull_paths = vec!["shared/".to_string()];
        s.exclude_patterns = vec!["*.log".to_string()];
        s.log_file_path = "/tmp/rsync.log".to_string();

        let real = build_rsync_command(&s, Direction::Push);
        s.dry_run = true;
        let dry = build_rsync_command(&s, Direction::Push);

        assert_eq!(real.program, dry.program);
        let without_flag: Vec<_> = dry.args.iter().filter(|a| *a != "--dry-run").collect();
        let real_refs: Vec<_> = real.args.iter().collect();
        assert_eq!(without_flag, real_refs);
        assert_eq!(dry.args.len(), real.args.len() + 1);
    }

    #[test]
    fn log_file_option_is_appended_when_set() {
        let mut s = settings();
        s.log_file_path = "/var/log/vaultsync.log".to_string();
        let cmd = build_rsync_command(&s, Direction::Push);
        assert!(
            cmd.args
                .iter()
                .any(|a| a == "--log-file=/var/log/vaultsync.log")
        );
    }

    #[test]
    fn source_and_destination_order_follows_direction() {
        let s = settings();

        let pull = build_rsync_command(&s, Direction::Pull);
        let n = pull.args.len();
        assert_eq!(pull.args[n - 2], "sam@192.168.1.100:/srv/vault/");
        assert_eq!(pull.args[n - 1], "/home/sam/vault/");

        let push = build_rsync_command(&s, Direction::Push);
        let n = push.args.len();
        assert_eq!(push.args[n - 2], "/home/sam/vault/");
        assert_eq!(push.args[n - 1], "sam@192.168.1.100:/srv/vault/");
    }

    #[test]
    fn trailing_slash_is_never_doubled() {
        let mut s = settings();
        s.local_dir_path = "/home/sam/vault/".to_string();
        let cmd = build_rsync_command(&s, Direction::Push);
        let n = cmd.args.len();
        assert_eq!(cmd.args[n - 2], "/home/sam/vault/");
    }

    #[test]
    fn password_auth_wraps_with_sshpass_and_omits_identity_file() {
        let mut s = settings();
        s.ssh_password = "hunter2".to_string();
        let cmd = build_rsync_command(&s, Direction::Push);

        assert_eq!(cmd.program, "sshpass");
        assert_eq!(&cmd.args[..3], &["-p", "hunter2", "rsync"]);
        let ssh = cmd.args.iter().find(|a| a.starts_with("ssh ")).unwrap();
        assert!(!ssh.contains("-i "));
    }

    #[test]
    fn private_key_wins_over_password() {
        let mut s = settings();
        s.ssh_password = "hunter2".to_string();
        s.private_key_path = "/home/sam/.ssh/id_ed25519".to_string();
        let cmd = build_rsync_command(&s, Direction::Push);

        assert_eq!(cmd.program, "rsync");
        assert!(!cmd.args.iter().any(|a| a == "hunter2"));
        let ssh = cmd.args.iter().find(|a| a.starts_with("ssh ")).unwrap();
        assert!(ssh.contains("-i /home/sam/.ssh/id_ed25519"));
    }

    #[test]
    fn wsl_binary_translates_every_local_path() {
        let mut s = settings();
        s.binary_path = r"C:\Windows\System32\wsl.exe rsync".to_string();
        s.private_key_path = r"C:\Users\sam\.ssh\id_rsa".to_string();
        s.local_dir_path = r"C:\Users\sam\vault".to_string();
        s.log_file_path = r"D:\logs\rsync.log".to_string();
        let cmd = build_rsync_command(&s, Direction::Push);

        let ssh = cmd.args.iter().find(|a| a.starts_with("ssh ")).unwrap();
        assert!(ssh.ends_with("-i /mnt/c/Users/sam/.ssh/id_rsa"));
        assert!(cmd.args.iter().any(|a| a == "--log-file=/mnt/d/logs/rsync.log"));
        let n = cmd.args.len();
        assert_eq!(cmd.args[n - 2], "/mnt/c/Users/sam/vault/");
        // the remote path is never a Windows path and is left alone
        assert_eq!(cmd.args[n - 1], "sam@192.168.1.100:/srv/vault/");
    }

    #[test]
    fn wsl_translation_applies_on_the_password_branch_too() {
        let mut s = settings();
        s.binary_path = "wsl rsync".to_string();
        s.ssh_password = "hunter2".to_string();
        s.local_dir_path = r"C:\Users\sam\vault".to_string();
        let cmd = build_rsync_command(&s, Direction::Push);

        assert_eq!(cmd.program, "sshpass");
        assert!(cmd.args.iter().any(|a| a == "/mnt/c/Users/sam/vault/"));
    }

    #[test]
    fn builder_is_deterministic() {
        let mut s = settings();
        s.pull_paths = vec!["shared/".to_string()];
        s.exclude_patterns = vec!["*.log".to_string()];
        assert_eq!(
            build_rsync_command(&s, Direction::Pull),
            build_rsync_command(&s, Direction::Pull)
        );
    }

    #[test]
    fn command_line_rendering_quotes_whitespace() {
        let s = settings();
        let cmd = build_rsync_command(&s, Direction::Push);
        let line = cmd.to_command_line();
        assert!(line.starts_with("rsync -avz"));
        assert!(line.contains("\"ssh -p 22 -o StrictHostKeyChecking=accept-new\""));
    }
}
