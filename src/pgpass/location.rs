use std::{env, path::PathBuf};

use super::{APPDATA_DIRECTORY, APPDATA_ENVIRONMENT_VAR, FILENAME, FILENAME_WINDOWS};

/// The platform details needed to find the default pgpass file.
///
/// Use [`current`][PlatformDirs::current] to read them from the running
/// process, or build one by hand to resolve paths for another platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformDirs {
    pub windows: bool,
    pub home_dir: Option<PathBuf>,
    pub app_data: Option<PathBuf>,
}

impl PlatformDirs {
    pub fn current() -> Self {
        Self {
            windows: cfg!(windows),
            home_dir: home::home_dir(),
            app_data: env::var_os(APPDATA_ENVIRONMENT_VAR).map(PathBuf::from),
        }
    }
    /// The default pgpass location: `~/.pgpass`, or
    /// `%APPDATA%\postgresql\pgpass.conf` on Windows. Returns `None` if the
    /// directory it lives in is unknown.
    pub fn pgpass_path(&self) -> Option<PathBuf> {
        if self.windows {
            self.app_data
                .as_ref()
                .map(|dir| dir.join(APPDATA_DIRECTORY).join(FILENAME_WINDOWS))
        } else {
            self.home_dir.as_ref().map(|dir| dir.join(FILENAME))
        }
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::*;

    #[test]
    fn unix_uses_home() {
        let dirs = PlatformDirs {
            windows: false,
            home_dir: Some("/home/alice".into()),
            app_data: Some("/ignored".into()),
        };
        let path = dirs.pgpass_path().unwrap();
        assert_eq!(path, Path::new("/home/alice/.pgpass"));
        assert!(path.ends_with(".pgpass"));
    }

    #[test]
    fn windows_uses_app_data() {
        let dirs = PlatformDirs {
            windows: true,
            home_dir: Some("/home/alice".into()),
            app_data: Some("/appdata".into()),
        };
        let path = dirs.pgpass_path().unwrap();
        assert!(path.starts_with("/appdata"));
        assert!(path.ends_with("postgresql/pgpass.conf"));
    }

    #[test]
    fn missing_directories() {
        let dirs = PlatformDirs {
            windows: false,
            home_dir: None,
            app_data: Some("/appdata".into()),
        };
        assert_eq!(dirs.pgpass_path(), None);

        let dirs = PlatformDirs {
            windows: true,
            home_dir: Some("/home/alice".into()),
            app_data: None,
        };
        assert_eq!(dirs.pgpass_path(), None);
    }

    #[test]
    fn current_matches_target() {
        assert_eq!(PlatformDirs::current().windows, cfg!(windows));
    }
}
