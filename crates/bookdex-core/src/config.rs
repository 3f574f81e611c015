use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_ROOT_DIRS: [&str; 5] = ["Documents", "PROC", "Books", "Papers", "Slides"];

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base directory the declared roots are resolved against.
    pub library_root: String,
    /// Top-level directories to scan, relative to `library_root`.
    pub root_dirs: Vec<String>,
    pub ignore_patterns: Vec<String>,
    /// Summary snapshot database, relative to `library_root` unless absolute.
    pub summary_db: String,
    /// Sync document store, relative to `library_root` unless absolute.
    pub sync_store: String,
}

impl AppConfig {
    pub fn summary_db_path(&self) -> PathBuf {
        self.resolve(&self.summary_db)
    }

    pub fn sync_store_path(&self) -> PathBuf {
        self.resolve(&self.sync_store)
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.library_root).join(path)
        }
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .set_default("library_root", default_library_root())?
        .set_default(
            "root_dirs",
            DEFAULT_ROOT_DIRS
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>(),
        )?
        .set_default("ignore_patterns", Vec::<String>::new())?
        .set_default("summary_db", "book-list.sqlite")?
        .set_default("sync_store", "book-index.rocks")?
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

fn default_library_root() -> String {
    dirs::home_dir()
        .map(|home| home.join("Library"))
        .unwrap_or_else(|| PathBuf::from("."))
        .to_string_lossy()
        .into_owned()
}

/// Remove roots that are subdirectories of other roots in the list.
pub fn non_overlapping_roots(dirs: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for dir in dirs {
        let dir_path = Path::new(&dir);
        let mut should_add = true;
        let result_clone = result.clone();

        for res_dir in &result_clone {
            let res_dir_path = Path::new(res_dir);

            if dir_path.starts_with(res_dir_path) {
                should_add = false;
                break;
            }

            if res_dir_path.starts_with(dir_path) {
                result.retain(|x| x != res_dir);
                break;
            }
        }

        if should_add {
            result.push(dir);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(library_root: &str) -> AppConfig {
        AppConfig {
            library_root: library_root.to_string(),
            root_dirs: vec!["Documents".to_string()],
            ignore_patterns: vec![],
            summary_db: "book-list.sqlite".to_string(),
            sync_store: "book-index.rocks".to_string(),
        }
    }

    #[test]
    fn test_relative_store_paths_resolve_under_library_root() {
        let config = test_config("/srv/library");
        assert_eq!(
            config.summary_db_path(),
            PathBuf::from("/srv/library/book-list.sqlite")
        );
        assert_eq!(
            config.sync_store_path(),
            PathBuf::from("/srv/library/book-index.rocks")
        );
    }

    #[test]
    fn test_absolute_store_paths_kept_as_is() {
        let mut config = test_config("/srv/library");
        config.summary_db = "/var/cache/books.sqlite".to_string();
        assert_eq!(
            config.summary_db_path(),
            PathBuf::from("/var/cache/books.sqlite")
        );
    }

    #[test]
    fn test_non_overlapping_no_overlap() {
        let dirs = vec![
            "Documents".to_string(),
            "Books".to_string(),
            "Papers".to_string(),
        ];
        let result = non_overlapping_roots(dirs);
        assert_eq!(result.len(), 3);
        assert!(result.contains(&"Documents".to_string()));
        assert!(result.contains(&"Books".to_string()));
        assert!(result.contains(&"Papers".to_string()));
    }

    #[test]
    fn test_non_overlapping_with_subdirectory() {
        let dirs = vec![
            "Documents".to_string(),
            "Documents/Archive".to_string(),
            "Books".to_string(),
        ];
        let result = non_overlapping_roots(dirs);
        assert_eq!(result.len(), 2);
        assert!(result.contains(&"Documents".to_string()));
        assert!(result.contains(&"Books".to_string()));
        assert!(!result.contains(&"Documents/Archive".to_string()));
    }
}
