//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["scribe.toml", ".scribe.toml"];

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `SCRIBE_` environment variables (`SCRIBE_ORCHESTRATOR__MAX_TOOL_RETRIES=3`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./scribe.toml` or `./.scribe.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/scribe/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path, Self::global_config_path(), Path::new("."))
            .extract()
            .map_err(Box::new)
    }

    fn figment(
        config_path: Option<&PathBuf>,
        global_path: Option<PathBuf>,
        project_dir: &Path,
    ) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = global_path.filter(|p| p.exists()) {
            figment = figment.merge(Toml::file(global_path));
        }

        if let Some(path) = Self::project_config_in(project_dir) {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("SCRIBE_").split("__"))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("scribe").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        Self::project_config_in(Path::new("."))
    }

    fn project_config_in(dir: &Path) -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources() {
        println!("Configuration sources (in priority order):");
        println!("  [ENV  ] SCRIBE_* variables");

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./scribe.toml or ./.scribe.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.orchestrator.max_tool_iterations, 5);
        assert_eq!(config.orchestrator.max_tool_retries, 2);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("scribe"));
    }

    #[test]
    fn test_project_file_overrides_global() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        fs::write(
            &global,
            "[orchestrator]\nmax_tool_iterations = 9\nmax_tool_retries = 4\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(".scribe.toml"),
            "[orchestrator]\nmax_tool_retries = 1\n",
        )
        .unwrap();

        let config: FileConfig = ConfigLoader::figment(None, Some(global), dir.path())
            .extract()
            .unwrap();
        assert_eq!(config.orchestrator.max_tool_iterations, 9);
        assert_eq!(config.orchestrator.max_tool_retries, 1);
    }

    #[test]
    fn test_explicit_path_has_highest_file_priority() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("scribe.toml"),
            "[provider]\nmodel = \"project-model\"\n",
        )
        .unwrap();
        let explicit = dir.path().join("explicit.toml");
        fs::write(&explicit, "[provider]\nmodel = \"explicit-model\"\n").unwrap();

        let config: FileConfig = ConfigLoader::figment(Some(&explicit), None, dir.path())
            .extract()
            .unwrap();
        assert_eq!(config.provider.model, "explicit-model");
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("bad.toml");
        fs::write(&explicit, "[orchestrator]\nmax_tool_retries = \"many\"\n").unwrap();

        let result: Result<FileConfig, _> =
            ConfigLoader::figment(Some(&explicit), None, dir.path()).extract();
        assert!(result.is_err());
    }
}
