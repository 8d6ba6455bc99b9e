use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch directory holding a googlecloudproject.yaml
pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_spec(&self, content: &str) -> PathBuf {
        let path = self.root.path().join("googlecloudproject.yaml");
        fs::write(&path, content).unwrap();
        path
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Install an executable `gcloud` stand-in that records its arguments
    #[cfg(unix)]
    #[allow(dead_code)]
    pub fn install_fake_gcloud(&self, exit_code: i32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let bin = self.root.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let script = bin.join("gcloud");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\necho \"$@\" > \"{}\"\nexit {}\n",
                self.root.path().join("gcloud-args").display(),
                exit_code
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        bin
    }

    #[allow(dead_code)]
    pub fn recorded_gcloud_args(&self) -> String {
        fs::read_to_string(self.root.path().join("gcloud-args"))
            .unwrap()
            .trim()
            .to_string()
    }
}

pub const SAMPLE_SPEC: &str = r#"name: Demo Project
id: demo-project-123
labels:
  env: dev
apis:
  - compute
billing: enable
"#;
