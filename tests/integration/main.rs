//! Integration tests for Layerkit

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn layerkit() -> Command {
        let mut cmd = cargo_bin_cmd!("layerkit");
        cmd.env_remove("LAYERKIT_CONFIG");
        cmd
    }

    #[test]
    fn help_displays() {
        layerkit()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("serverless dependency layer builder"));
    }

    #[test]
    fn version_displays() {
        layerkit()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("layerkit"));
    }

    #[test]
    fn config_path_honors_flag() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        layerkit()
            .args(["--no-local", "config", "path", "--config"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("custom.toml"));
    }

    #[test]
    fn config_show_has_defaults() {
        let temp = TempDir::new().unwrap();
        layerkit()
            .current_dir(temp.path())
            .arg("--config")
            .arg(temp.path().join("missing.toml"))
            .args(["--no-local", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[layer]"))
            .stdout(predicate::str::contains("python-dependencies"));
    }

    #[test]
    fn init_writes_local_config() {
        let temp = TempDir::new().unwrap();
        layerkit()
            .args(["init", "--runtime", "python3.11", "--path"])
            .arg(temp.path())
            .assert()
            .success();

        let content = std::fs::read_to_string(temp.path().join(".layerkit.toml")).unwrap();
        assert!(content.contains("runtime = \"python3.11\""));
    }

    #[test]
    fn completions_generate() {
        layerkit()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("layerkit"));
    }

    #[test]
    fn verify_missing_archive_fails() {
        let temp = TempDir::new().unwrap();
        layerkit()
            .current_dir(temp.path())
            .arg("--config")
            .arg(temp.path().join("missing.toml"))
            .args(["--no-local", "verify", "nope.zip"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Path not found"));
    }

    #[test]
    fn unknown_runtime_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("requirements.txt"), "requests\n").unwrap();
        let config = temp.path().join("config.toml");
        std::fs::write(&config, "[general]\nhistory = false\n").unwrap();
        layerkit()
            .current_dir(temp.path())
            .arg("--config")
            .arg(&config)
            .args(["--no-local", "build", "--runtime", "ruby3.3"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported runtime: ruby3.3"))
            .stderr(predicate::str::contains("Hint:"));
    }
}

/// End-to-end builds against a stand-in pip that creates one package
/// directory and one dist-info directory per manifest line.
#[cfg(unix)]
mod build_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use layerkit::archive::ArchiveListing;
    use predicates::prelude::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const FAKE_PIP: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "pip 24.0 (fake)"
  exit 0
fi
manifest=""
target=""
while [ $# -gt 0 ]; do
  case "$1" in
    -r) manifest="$2"; shift 2 ;;
    -t) target="$2"; shift 2 ;;
    *) shift ;;
  esac
done
mkdir -p "$target"
while IFS= read -r line || [ -n "$line" ]; do
  case "$line" in ''|'#'*) continue ;; esac
  name=$(printf '%s' "$line" | sed 's/[]<>!~; =[].*//')
  echo "Collecting $line"
  if [ "$name" = "does-not-exist" ]; then
    echo "ERROR: No matching distribution found for $line" >&2
    exit 1
  fi
  mkdir -p "$target/$name" "$target/$name-0.0.0.dist-info"
  touch "$target/$name/__init__.py"
done < "$manifest"
echo "Successfully installed"
"#;

    const ROOT: &str = "python-dependencies/python/lib/python3.12/site-packages";

    struct Project {
        temp: TempDir,
        config: PathBuf,
        backend: String,
    }

    impl Project {
        fn new(manifest: &str, backend: &str) -> Self {
            let temp = TempDir::new().unwrap();

            let pip = temp.path().join("fake-pip");
            std::fs::write(&pip, FAKE_PIP).unwrap();
            std::fs::set_permissions(&pip, std::fs::Permissions::from_mode(0o755)).unwrap();

            let project = Self {
                config: temp.path().join("config.toml"),
                temp,
                backend: backend.to_string(),
            };
            project.write_config(false);
            project.write_manifest(manifest);
            project
        }

        /// History always goes to the project dir, never the user's state dir
        fn write_config(&self, history: bool) {
            std::fs::write(
                &self.config,
                format!(
                    "[general]\nhistory = {}\nhistory_file = \"{}\"\n\n\
                     [installer]\npip = \"{}\"\n\n[archive]\nbackend = \"{}\"\n",
                    history,
                    self.history_file().display(),
                    self.path().join("fake-pip").display(),
                    self.backend
                ),
            )
            .unwrap();
        }

        fn path(&self) -> &Path {
            self.temp.path()
        }

        fn history_file(&self) -> PathBuf {
            self.path().join("state/history.jsonl")
        }

        fn write_manifest(&self, content: &str) {
            std::fs::write(self.path().join("requirements.txt"), content).unwrap();
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("layerkit");
            cmd.env_remove("LAYERKIT_CONFIG")
                .current_dir(self.path())
                .arg("--no-local")
                .arg("--config")
                .arg(&self.config);
            cmd
        }

        fn archive(&self) -> PathBuf {
            self.path().join("python-dependencies.zip")
        }

        fn zip_count(&self) -> usize {
            std::fs::read_dir(self.path())
                .unwrap()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "zip"))
                .count()
        }

        fn installed(&self) -> std::collections::BTreeSet<String> {
            ArchiveListing::read(&self.archive())
                .unwrap()
                .installed_packages(ROOT)
        }
    }

    fn zip_available() -> bool {
        std::process::Command::new("zip")
            .arg("-v")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn builds_requests_layer() {
        let project = Project::new("requests==2.31.0\n", "native");

        project
            .cmd()
            .arg("build")
            .assert()
            .success()
            .stdout(predicate::str::contains("Layer archive created:"))
            .stdout(predicate::str::contains("python-dependencies.zip"))
            .stdout(predicate::str::contains("python3.12 runtime"));

        assert_eq!(project.zip_count(), 1);
        let listing = ArchiveListing::read(&project.archive()).unwrap();
        assert!(listing.names().contains(
            &"python-dependencies/python/lib/python3.12/site-packages/requests/"
        ));
        assert!(project
            .path()
            .join("python-dependencies/python/lib/python3.12/site-packages/requests")
            .is_dir());
    }

    #[test]
    fn no_subcommand_builds_with_defaults() {
        let project = Project::new("boto3\nsix\n", "native");

        project.cmd().assert().success();

        let installed = project.installed();
        assert!(installed.contains("boto3"));
        assert!(installed.contains("six"));
    }

    #[test]
    fn empty_manifest_yields_valid_archive() {
        let project = Project::new("# nothing pinned yet\n\n", "native");

        project.cmd().arg("build").assert().success();

        let listing = ArchiveListing::read(&project.archive()).unwrap();
        assert!(listing.has_entries_under(ROOT));
        assert!(project.installed().is_empty());
    }

    #[test]
    fn rerun_overwrites_archive() {
        let project = Project::new("requests\n", "native");
        project.cmd().arg("build").assert().success();

        project.write_manifest("requests\nurllib3\n");
        project.cmd().arg("build").assert().success();

        assert_eq!(project.zip_count(), 1);
        assert!(project.installed().contains("urllib3"));
    }

    #[test]
    fn clean_drops_stale_packages() {
        let project = Project::new("boto3\n", "native");
        project.cmd().arg("build").assert().success();

        project.write_manifest("requests\n");
        project.cmd().arg("build").assert().success();
        assert!(project.installed().contains("boto3"));

        project.cmd().args(["build", "--clean"]).assert().success();
        let installed = project.installed();
        assert!(!installed.contains("boto3"));
        assert!(installed.contains("requests"));
    }

    #[test]
    fn strip_bundle_dir_and_remove_staging() {
        let project = Project::new("requests\n", "native");

        project
            .cmd()
            .args(["build", "--strip-bundle-dir", "--remove-staging"])
            .assert()
            .success();

        let listing = ArchiveListing::read(&project.archive()).unwrap();
        assert!(listing.has_entries_under("python/lib/python3.12/site-packages/requests"));
        assert!(!project.path().join("python-dependencies").exists());
    }

    #[test]
    fn json_report() {
        let project = Project::new("requests\n", "native");

        let output = project
            .cmd()
            .args(["build", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["bundle"], "python-dependencies");
        assert_eq!(report["runtime"], "python3.12");
        assert_eq!(report["packages"], 1);
        assert_eq!(report["sha256"].as_str().map(str::len), Some(64));
    }

    #[test]
    fn missing_manifest_stops_early() {
        let project = Project::new("", "native");
        std::fs::remove_file(project.path().join("requirements.txt")).unwrap();

        project
            .cmd()
            .arg("build")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Requirements manifest not found"))
            .stderr(predicate::str::contains("Hint:"));

        assert_eq!(project.zip_count(), 0);
    }

    #[test]
    fn install_failure_stops_before_archive() {
        let project = Project::new("requests\ndoes-not-exist==1.0\n", "native");

        project
            .cmd()
            .arg("build")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Dependency installation failed"))
            .stderr(predicate::str::contains("No matching distribution found"));

        assert_eq!(project.zip_count(), 0);
    }

    #[test]
    fn verify_after_build() {
        let project = Project::new("requests\nsix\n", "native");
        project.cmd().arg("build").assert().success();

        project.cmd().arg("verify").assert().success();

        project.write_manifest("requests\nsix\nnumpy\n");
        project
            .cmd()
            .arg("verify")
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing packages: numpy"));

        project.cmd().args(["verify", "--no-manifest"]).assert().success();
    }

    #[test]
    fn builds_with_zip_tool() {
        if !zip_available() {
            eprintln!("zip not installed, skipping");
            return;
        }
        let project = Project::new("requests\n", "zip-cli");

        project.cmd().arg("build").assert().success();
        project.write_manifest("requests\nsix\n");
        project.cmd().arg("build").assert().success();

        assert_eq!(project.zip_count(), 1);
        let listing = ArchiveListing::read(&project.archive()).unwrap();
        let names = listing.names();
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert!(project.installed().contains("six"));
    }

    #[test]
    fn clean_command_removes_outputs() {
        let project = Project::new("requests\n", "native");
        project.cmd().arg("build").assert().success();

        project
            .cmd()
            .args(["clean", "--archive", "--yes"])
            .assert()
            .success();

        assert!(!project.path().join("python-dependencies").exists());
        assert_eq!(project.zip_count(), 0);
    }

    #[test]
    fn history_disabled_writes_nothing() {
        let project = Project::new("requests\n", "native");

        project.cmd().arg("build").assert().success();

        assert!(!project.history_file().exists());
    }

    #[test]
    fn history_records_success_and_failure() {
        let project = Project::new("requests\n", "native");
        project.write_config(true);

        project.cmd().arg("build").assert().success();
        project.write_manifest("does-not-exist\n");
        project.cmd().arg("build").assert().failure();

        let content = std::fs::read_to_string(project.history_file()).unwrap();
        let statuses: Vec<String> = content
            .lines()
            .map(|line| {
                let entry: serde_json::Value = serde_json::from_str(line).unwrap();
                entry["status"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(statuses, vec!["success", "failed"]);

        project
            .cmd()
            .args(["history", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("python-dependencies"));
    }

    #[test]
    fn url_requirement_reaches_installer() {
        let project = Project::new(
            "requests\nhttps://files.pythonhosted.org/packages/six-1.16.0-py2.py3-none-any.whl\n",
            "native",
        );

        // The stand-in pip reports every line it was handed
        project
            .cmd()
            .args(["-vv", "build"])
            .assert()
            .success()
            .stderr(predicate::str::contains(
                "Collecting https://files.pythonhosted.org/packages/six-1.16.0-py2.py3-none-any.whl",
            ));

        project.cmd().arg("verify").assert().success();
    }
}
