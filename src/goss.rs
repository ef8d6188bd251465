// Staging of the goss binary and spec files
// The validator runs on the container's platform, so the host-side binary
// and specs are copied into the container at /goss before execution and,
// after an edit session, copied back out with host permissions restored

use crate::config::Settings;
use crate::docker::Docker;
use crate::errors::Result;
use crate::output;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Directory inside the container where everything is staged
pub const CONTAINER_DIR: &str = "/goss";

pub const GOSS_FILE_NAME: &str = "goss.yaml";
pub const VARS_FILE_NAME: &str = "goss_vars.yaml";
pub const WAIT_FILE_NAME: &str = "goss_wait.yaml";

pub struct GossFiles<'a> {
    settings: &'a Settings,
}

impl<'a> GossFiles<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Stage the binary and spec files into a host-side temp directory.
    /// Permissions are widened so the files stay usable regardless of the
    /// UID the container runs as.
    pub fn stage(&self) -> Result<TempDir> {
        let staged = TempDir::new()?;
        output::debug(format!("Created staging directory: {}", staged.path().display()));

        let binary = staged.path().join("goss");
        fs::copy(&self.settings.goss_binary, &binary)?;
        set_mode(staged.path(), 0o777)?;
        set_mode(&binary, 0o777)?;

        let goss_file = staged.path().join(GOSS_FILE_NAME);
        fs::copy(&self.settings.goss_file, &goss_file)?;
        set_mode(&goss_file, 0o666)?;

        if self.settings.vars_file.is_file() {
            let vars_file = staged.path().join(VARS_FILE_NAME);
            fs::copy(&self.settings.vars_file, &vars_file)?;
            set_mode(&vars_file, 0o666)?;
        }

        if self.settings.wait_file.is_file() {
            let wait_file = staged.path().join(WAIT_FILE_NAME);
            fs::copy(&self.settings.wait_file, &wait_file)?;
            set_mode(&wait_file, 0o666)?;
        }

        Ok(staged)
    }

    /// Stage and copy everything into the container
    pub fn copy_in(&self, docker: &Docker, container_id: &str) -> Result<()> {
        let staged = self.stage()?;
        docker.cp(
            &staged.path().to_string_lossy(),
            &format!("{}:{}", container_id, CONTAINER_DIR),
        )
    }

    /// Copy the staged directory back out of the container and restore the
    /// edited spec files to their original locations
    pub fn copy_out(&self, docker: &Docker, container_id: &str) -> Result<()> {
        let extracted = TempDir::new()?;
        docker.cp(
            &format!("{}:{}", container_id, CONTAINER_DIR),
            &extracted.path().to_string_lossy(),
        )?;

        self.restore_from(&extracted.path().join("goss"))
    }

    /// Restore spec files from an extracted `/goss` directory, keeping each
    /// host file's original permissions. Optional files are only restored
    /// when they already existed on the host before the session.
    pub fn restore_from(&self, extracted: &Path) -> Result<()> {
        restore_file(&extracted.join(GOSS_FILE_NAME), &self.settings.goss_file)?;

        if self.settings.vars_file.is_file() {
            restore_file(&extracted.join(VARS_FILE_NAME), &self.settings.vars_file)?;
        }

        if self.settings.wait_file.is_file() {
            restore_file(&extracted.join(WAIT_FILE_NAME), &self.settings.wait_file)?;
        }

        Ok(())
    }

    /// Base arguments selecting the staged spec and optional vars file
    pub fn validate_args(&self, spec_name: &str) -> Vec<String> {
        let mut args = vec![format!("--gossfile={}/{}", CONTAINER_DIR, spec_name)];

        if self.settings.vars_file.is_file() {
            args.push(format!("--vars={}/{}", CONTAINER_DIR, VARS_FILE_NAME));
        }

        args
    }
}

fn restore_file(extracted: &Path, host: &Path) -> Result<()> {
    if !extracted.is_file() {
        return Ok(());
    }

    let permissions = fs::metadata(host).ok().map(|meta| meta.permissions());

    output::debug(format!("Restoring {}", host.display()));
    fs::copy(extracted, host)?;

    if let Some(permissions) = permissions {
        fs::set_permissions(host, permissions)?;
    }

    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::settings_for;

    fn fixture() -> (TempDir, Settings) {
        let temp = TempDir::new().unwrap();
        let settings = settings_for(&temp);
        (temp, settings)
    }

    #[test]
    fn test_stage_copies_required_files() {
        let (_temp, settings) = fixture();
        let files = GossFiles::new(&settings);

        let staged = files.stage().unwrap();
        assert!(staged.path().join("goss").is_file());
        assert!(staged.path().join(GOSS_FILE_NAME).is_file());
        assert!(!staged.path().join(VARS_FILE_NAME).exists());
    }

    #[test]
    fn test_stage_includes_optional_files_when_present() {
        let (temp, settings) = fixture();
        fs::write(temp.path().join("goss_vars.yaml"), "env: test\n").unwrap();
        fs::write(temp.path().join("goss_wait.yaml"), "port: {}\n").unwrap();

        let files = GossFiles::new(&settings);
        let staged = files.stage().unwrap();

        assert!(staged.path().join(VARS_FILE_NAME).is_file());
        assert!(staged.path().join(WAIT_FILE_NAME).is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_stage_widens_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, settings) = fixture();
        let files = GossFiles::new(&settings);
        let staged = files.stage().unwrap();

        let binary_mode = fs::metadata(staged.path().join("goss"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(binary_mode & 0o777, 0o777);

        let spec_mode = fs::metadata(staged.path().join(GOSS_FILE_NAME))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(spec_mode & 0o777, 0o666);
    }

    #[test]
    fn test_restore_overwrites_host_spec() {
        let (temp, settings) = fixture();
        let files = GossFiles::new(&settings);

        let extracted = temp.path().join("extracted");
        fs::create_dir_all(&extracted).unwrap();
        fs::write(extracted.join(GOSS_FILE_NAME), "file:\n  /etc/passwd:\n    exists: true\n")
            .unwrap();

        files.restore_from(&extracted).unwrap();

        let content = fs::read_to_string(temp.path().join("goss.yaml")).unwrap();
        assert!(content.contains("/etc/passwd"));
    }

    #[test]
    fn test_restore_skips_optional_files_not_on_host() {
        let (temp, settings) = fixture();
        let files = GossFiles::new(&settings);

        let extracted = temp.path().join("extracted");
        fs::create_dir_all(&extracted).unwrap();
        fs::write(extracted.join(GOSS_FILE_NAME), "file: {}\n").unwrap();
        // Vars file created inside the container but never present on the host
        fs::write(extracted.join(VARS_FILE_NAME), "env: test\n").unwrap();

        files.restore_from(&extracted).unwrap();
        assert!(!temp.path().join("goss_vars.yaml").exists());
    }

    #[test]
    fn test_validate_args_include_vars_when_present() {
        let (temp, settings) = fixture();
        let files = GossFiles::new(&settings);
        assert_eq!(files.validate_args("goss.yaml"), vec!["--gossfile=/goss/goss.yaml"]);

        fs::write(temp.path().join("goss_vars.yaml"), "env: test\n").unwrap();
        assert_eq!(
            files.validate_args("goss.yaml"),
            vec!["--gossfile=/goss/goss.yaml", "--vars=/goss/goss_vars.yaml"]
        );
    }
}
