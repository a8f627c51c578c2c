//! # ACL Manager Integration Tests
//!
//! Builds an on-disk layout shaped like a production Shiny host:
//!
//! ```text
//! <tmp>/shared_space/project  -> <tmp>/nfs/www/shinyserver/project
//! <tmp>/shared_space/scratch  -> <tmp>/nfs/home/scratch
//! <tmp>/shared_space/dangling -> <tmp>/nowhere
//! <tmp>/nfs/www/shinyserver/project/
//!     app1/server.R
//!     app2_not_a_shiny_app/
//!     app3/server.R  .shiny_app.conf (a@a.com b@b.com)
//!     app4/server.R
//!     app5/index.Rmd
//! ```
//!
//! and drives the manager through its public API only.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use shinyacl_core::{AclError, AclManager, AppTree, MemoryAuditSink, CONFIG_FILE_NAME};

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    project: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(dir.path()).unwrap();
        let project = base.join("nfs/www/shinyserver/project");
        let scratch = base.join("nfs/home/scratch");
        let root = base.join("shared_space");

        for app in ["app1", "app3", "app4"] {
            fs::create_dir_all(project.join(app)).unwrap();
            fs::write(project.join(app).join("server.R"), "library(shiny)\n").unwrap();
        }
        fs::create_dir_all(project.join("app2_not_a_shiny_app")).unwrap();
        fs::create_dir_all(project.join("app5")).unwrap();
        fs::write(project.join("app5/index.Rmd"), "---\n").unwrap();
        fs::write(
            project.join("app3").join(CONFIG_FILE_NAME),
            "required_user a@a.com b@b.com;\n",
        )
        .unwrap();

        fs::create_dir_all(scratch.join("app")).unwrap();
        fs::write(scratch.join("app/server.R"), "").unwrap();

        fs::create_dir_all(&root).unwrap();
        symlink(&project, root.join("project")).unwrap();
        symlink(&scratch, root.join("scratch")).unwrap();
        symlink(base.join("nowhere"), root.join("dangling")).unwrap();

        Self {
            _dir: dir,
            root,
            project,
        }
    }

    fn app(&self, name: &str) -> PathBuf {
        self.project.join(name)
    }

    fn manager(&self) -> AclManager {
        AclManager::new(&self.root)
            .unwrap()
            .with_actor("esarmien")
            .with_sink(MemoryAuditSink::new())
    }

    fn config(&self, name: &str) -> PathBuf {
        self.app(name).join(CONFIG_FILE_NAME)
    }
}

#[test]
fn root_without_project_spaces_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("not_a_project")).unwrap();
    let tree = AppTree::discover(dir.path()).unwrap();
    assert!(tree.is_empty());
}

#[test]
fn missing_root_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let err = AclManager::new(dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, AclError::Discovery { .. }));
}

#[test]
fn unreadable_project_space_fails_construction() {
    use std::os::unix::fs::PermissionsExt;

    // Permission bits do not restrict root.
    if nix::unistd::geteuid().is_root() {
        return;
    }
    let fx = Fixture::new();
    fs::set_permissions(&fx.project, fs::Permissions::from_mode(0o000)).unwrap();
    let result = AclManager::new(&fx.root);
    fs::set_permissions(&fx.project, fs::Permissions::from_mode(0o755)).unwrap();

    let err = result.unwrap_err();
    assert!(matches!(err, AclError::Discovery { ref path, .. } if path == &fx.project));
}

#[test]
fn discovers_project_space_through_symlink() {
    let fx = Fixture::new();
    let manager = fx.manager();
    let tree = manager.list_applications();

    assert_eq!(tree.len(), 1);
    assert_eq!(tree.project_spaces().collect::<Vec<_>>(), vec![fx.project.as_path()]);

    let mut apps: Vec<PathBuf> = tree.applications(&fx.project).unwrap().to_vec();
    apps.sort();
    assert_eq!(
        apps,
        vec![fx.app("app1"), fx.app("app3"), fx.app("app4"), fx.app("app5")]
    );
    assert!(!tree.contains(&fx.app("app2_not_a_shiny_app")));
}

#[test]
fn app_without_config_has_no_users() {
    let fx = Fixture::new();
    assert!(fx.manager().get_users(&fx.app("app1")).unwrap().is_empty());
}

#[test]
fn users_are_read_in_file_order() {
    let fx = Fixture::new();
    assert_eq!(
        fx.manager().get_users(&fx.app("app3")).unwrap(),
        vec!["a@a.com", "b@b.com"]
    );
}

#[test]
fn unmanaged_paths_are_rejected_whether_or_not_they_exist() {
    let fx = Fixture::new();
    let manager = fx.manager();
    for path in [
        fx.app("app2_not_a_shiny_app"),
        PathBuf::from("app2_not_a_shiny_app"),
        fx.root.join("scratch/app"),
        PathBuf::from("/definitely/not/here"),
    ] {
        let err = manager.get_users(&path).unwrap_err();
        assert!(
            matches!(err, AclError::NotAManagedApplication(ref p) if p == &path),
            "{path:?} should be rejected, got {err:?}"
        );
    }
}

#[test]
fn add_is_idempotently_rejected() {
    let fx = Fixture::new();
    let manager = fx.manager();
    let app = fx.app("app4");

    manager.add_users(&app, &["c@c.com"]).unwrap();
    assert_eq!(manager.get_users(&app).unwrap(), vec!["c@c.com"]);

    let err = manager.add_users(&app, &["c@c.com"]).unwrap_err();
    assert!(matches!(
        err,
        AclError::UserAlreadyExists { ref user, ref app }
            if user == "c@c.com" && app == &fx.app("app4")
    ));
    assert_eq!(manager.get_users(&app).unwrap(), vec!["c@c.com"]);
}

#[test]
fn existing_member_cannot_be_added_again() {
    let fx = Fixture::new();
    let err = fx
        .manager()
        .add_users(&fx.app("app3"), &["a@a.com"])
        .unwrap_err();
    assert!(matches!(err, AclError::UserAlreadyExists { .. }));
}

#[test]
fn invalid_identity_performs_no_write() {
    let fx = Fixture::new();
    let manager = fx.manager();
    let sink = MemoryAuditSink::new();
    let manager = manager.with_sink(sink.clone());

    let err = manager
        .add_users(&fx.app("app1"), &["notanemail"])
        .unwrap_err();
    assert!(matches!(err, AclError::InvalidIdentity(ref id) if id == "notanemail"));
    assert!(!fx.config("app1").exists());
    assert!(sink.records().is_empty());
}

#[test]
fn batch_add_keeps_entries_before_failure() {
    let fx = Fixture::new();
    let sink = MemoryAuditSink::new();
    let manager = fx.manager().with_sink(sink.clone());
    let app = fx.app("app1");

    let err = manager
        .add_users(&app, &["c@c.com", "12345678", "bogus", "d@d.com"])
        .unwrap_err();
    assert!(matches!(err, AclError::InvalidIdentity(ref id) if id == "bogus"));
    assert_eq!(manager.get_users(&app).unwrap(), vec!["c@c.com", "12345678"]);
    assert_eq!(sink.records().len(), 2);
}

#[test]
fn duplicate_within_batch_is_rejected_at_second_occurrence() {
    let fx = Fixture::new();
    let manager = fx.manager();
    let app = fx.app("app1");

    let err = manager
        .add_users(&app, &["c@c.com", "c@c.com"])
        .unwrap_err();
    assert!(matches!(err, AclError::UserAlreadyExists { .. }));
    assert_eq!(manager.get_users(&app).unwrap(), vec!["c@c.com"]);
}

#[test]
fn delete_removes_member() {
    let fx = Fixture::new();
    let manager = fx.manager();
    let app = fx.app("app4");

    manager.add_users(&app, &["c@c.com"]).unwrap();
    manager.del_users(&app, &["c@c.com"]).unwrap();
    assert!(manager.get_users(&app).unwrap().is_empty());
}

#[test]
fn deleting_unknown_member_fails() {
    let fx = Fixture::new();
    let err = fx.manager().del_users(&fx.app("app3"), &["zzz"]).unwrap_err();
    assert!(matches!(err, AclError::UserDoesNotExist { ref user, .. } if user == "zzz"));
}

#[test]
fn batch_delete_keeps_entries_before_failure() {
    let fx = Fixture::new();
    let manager = fx.manager();
    let app = fx.app("app3");

    let err = manager
        .del_users(&app, &["a@a.com", "zzz@z.com", "b@b.com"])
        .unwrap_err();
    assert!(matches!(err, AclError::UserDoesNotExist { ref user, .. } if user == "zzz@z.com"));
    assert_eq!(manager.get_users(&app).unwrap(), vec!["b@b.com"]);
}

#[test]
fn del_all_writes_empty_entry() {
    let fx = Fixture::new();
    let sink = MemoryAuditSink::new();
    let manager = fx.manager().with_sink(sink.clone());
    let app = fx.app("app3");

    manager.del_all(&app).unwrap();
    assert!(manager.get_users(&app).unwrap().is_empty());
    assert_eq!(fs::read_to_string(fx.config("app3")).unwrap(), "required_user;\n");
    assert_eq!(
        sink.messages(),
        vec![format!("esarmien removed all users from {}", app.display())]
    );
}

#[test]
fn mutations_preserve_other_config_lines() {
    let fx = Fixture::new();
    let manager = fx.manager();
    let app = fx.app("app3");
    fs::write(
        fx.config("app3"),
        "# managed by hand\nrun_as shiny;\nrequired_user a@a.com b@b.com;\napp_idle_timeout 0;\n",
    )
    .unwrap();

    manager.add_users(&app, &["12345678"]).unwrap();
    manager.del_users(&app, &["a@a.com"]).unwrap();

    assert_eq!(
        fs::read_to_string(fx.config("app3")).unwrap(),
        "# managed by hand\nrun_as shiny;\nrequired_user b@b.com 12345678;\napp_idle_timeout 0;\n"
    );
}

#[test]
fn irregular_spacing_round_trips_cleanly() {
    let fx = Fixture::new();
    let manager = fx.manager();
    let app = fx.app("app1");
    fs::write(fx.config("app1"), "required_user   a@a.com    b@b.com  ;\n").unwrap();

    assert_eq!(manager.get_users(&app).unwrap(), vec!["a@a.com", "b@b.com"]);
    manager.add_users(&app, &["c@c.com"]).unwrap();
    assert_eq!(
        fs::read_to_string(fx.config("app1")).unwrap(),
        "required_user a@a.com b@b.com c@c.com;\n"
    );
}

#[test]
fn malformed_config_is_reported() {
    let fx = Fixture::new();
    fs::write(
        fx.config("app1"),
        "required_user a@a.com;\nrequired_user b@b.com;\n",
    )
    .unwrap();
    let err = fx.manager().get_users(&fx.app("app1")).unwrap_err();
    assert!(matches!(err, AclError::MalformedConfig { count: 2, .. }));
}

#[test]
fn reload_creates_and_advances_restart_file() {
    let fx = Fixture::new();
    let manager = fx.manager();
    let app = fx.app("app4");
    let restart = app.join("restart.txt");
    assert!(!restart.exists());

    manager.reload(&app).unwrap();
    assert!(restart.is_file());

    let stale = UNIX_EPOCH + Duration::from_secs(86_400);
    fs::File::options()
        .write(true)
        .open(&restart)
        .unwrap()
        .set_modified(stale)
        .unwrap();
    manager.reload(&app).unwrap();
    assert!(fs::metadata(&restart).unwrap().modified().unwrap() > stale);
}

#[test]
fn snapshot_does_not_see_new_apps_until_refresh() {
    let fx = Fixture::new();
    let mut manager = fx.manager();
    let app = fx.app("app6");
    fs::create_dir(&app).unwrap();
    fs::write(app.join("server.R"), "").unwrap();

    assert!(matches!(
        manager.add_users(&app, &["a@a.com"]),
        Err(AclError::NotAManagedApplication(_))
    ));
    assert!(!app.join(CONFIG_FILE_NAME).exists());

    manager.refresh().unwrap();
    manager.add_users(&app, &["a@a.com"]).unwrap();
    assert_eq!(manager.get_users(Path::new(&app)).unwrap(), vec!["a@a.com"]);
}
