// ⚙️ Runtime configuration - where the store lives, where outputs go, how
// loudly to log. Resolved once by the binary and passed down.

use std::path::{Path, PathBuf};

use crate::access::Actor;

pub const DEFAULT_DB_PATH: &str = "registry.db";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@local";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Normal
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub output_dir: PathBuf,
    pub verbosity: Verbosity,
    pub actor: Actor,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            output_dir: PathBuf::from("."),
            verbosity: Verbosity::default(),
            actor: Actor::admin(DEFAULT_ADMIN_EMAIL),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Act as a family representative instead of the administrator
    pub fn with_representative(mut self, family_name: &str, tribe_name: &str) -> Self {
        let email = format!("{}@representative", family_name);
        self.actor = Actor::representative(&email, family_name, tribe_name);
        self
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }

    /// Path of an output file inside the output directory
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        let name = Path::new(file_name);
        if name.is_absolute() {
            name.to_path_buf()
        } else {
            self.output_dir.join(name)
        }
    }
}

/// Install the global logger. `RUST_LOG` wins unless quiet/verbose is forced.
pub fn init_logging(verbosity: Verbosity) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match verbosity {
        Verbosity::Quiet => {
            builder.filter_level(log::LevelFilter::Warn);
        }
        Verbosity::Verbose => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        Verbosity::Normal => {}
    }
    builder.target(env_logger::Target::Stderr).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_act_as_admin() {
        let config = Config::new();
        assert_eq!(config.db_path, PathBuf::from("registry.db"));
        assert!(config.actor.is_admin());
    }

    #[test]
    fn test_representative_scope_from_config() {
        let config = Config::new().with_representative("بكاي", "انشاشبة");
        assert_eq!(config.actor.population_scope(), Some("بكاي"));
        assert_eq!(config.actor.project_scope(), Some("انشاشبة"));
    }

    #[test]
    fn test_builders_set_actor_and_verbosity() {
        let rep = Actor::representative("rep@example.com", "بكاي", "انشاشبة");
        let config = Config::new()
            .with_actor(rep.clone())
            .with_verbosity(Verbosity::Verbose);

        assert_eq!(config.actor, rep);
        assert_eq!(config.verbosity, Verbosity::Verbose);
        assert_eq!(Config::new().verbosity, Verbosity::Normal);
    }

    #[test]
    fn test_output_path_joins_relative_names() {
        let config = Config::new().with_output_dir("/tmp/out");
        assert_eq!(config.output_path("a.xlsx"), PathBuf::from("/tmp/out/a.xlsx"));
        assert_eq!(config.output_path("/abs/b.xlsx"), PathBuf::from("/abs/b.xlsx"));
    }
}
