use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, fs, io};

use serde::Deserialize;

use crate::storage::{ContentStore, GithubStore, LocalStore};

#[derive(Deserialize, Clone)]
pub struct Site {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Absolute base url, used by the sitemap and the social meta tags
    pub url: String,
    pub author_name: String,
}

#[derive(Deserialize, Clone)]
pub struct Paths {
    pub template_dir: PathBuf,
    pub public_dir: PathBuf,
}

#[derive(Deserialize, Clone)]
pub struct Defaults {
    pub page_size: u32,
}

#[derive(Deserialize, Clone)]
pub struct Server {
    pub address: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Github,
    Local,
}

#[derive(Deserialize, Clone)]
pub struct GithubStorage {
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
    /// Environment variable holding the API token
    #[serde(default = "default_token_env")]
    pub token_env: String,
    pub api_url: Option<String>,
}

fn default_token_env() -> String {
    "GITHUB_API_KEY".to_string()
}

#[derive(Deserialize, Clone)]
pub struct LocalStorage {
    pub root_dir: PathBuf,
}

#[derive(Deserialize, Clone)]
pub struct Storage {
    pub backend: Backend,
    #[serde(default = "default_posts_dir")]
    pub posts_dir: String,
    pub github: Option<GithubStorage>,
    pub local: Option<LocalStorage>,
}

fn default_posts_dir() -> String {
    "posts".to_string()
}

#[derive(Deserialize, Clone)]
pub struct AdminUser {
    pub token: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize, Clone, Default)]
pub struct Admin {
    #[serde(default)]
    pub show_drafts_to_admin: bool,
    #[serde(default)]
    pub users: Vec<AdminUser>,
}

#[derive(Deserialize, Clone)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, PartialEq, Debug)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Clone)]
pub struct Config {
    pub site: Site,
    pub paths: Paths,
    pub defaults: Defaults,
    pub server: Server,
    pub storage: Storage,
    #[serde(default)]
    pub admin: Admin,
    pub log: Option<Log>,
}

fn parse_path(path: PathBuf) -> PathBuf {
    let Some(str_path) = path.to_str() else {
        return path;
    };
    if !str_path.starts_with("${exe_dir}") {
        return path;
    }

    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    match exe_dir {
        Some(exe_dir) => PathBuf::from(str_path.replace("${exe_dir}", &exe_dir.to_string_lossy())),
        None => path,
    }
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths = Paths {
        template_dir: parse_path(cfg.paths.template_dir),
        public_dir: parse_path(cfg.paths.public_dir),
    };
    if let Some(ref mut local) = cfg.storage.local {
        local.root_dir = parse_path(local.root_dir.clone());
    }
    if cfg.defaults.page_size == 0 {
        return Err(io::Error::new(ErrorKind::InvalidData, "defaults.page_size has to be greater than 0"));
    }

    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}

pub const CFG_FILE_NAME: &str = "gitblog.toml";

/// Looks for the configuration next to the executable, in the current dir and in the user config dir.
pub fn locate_config() -> Option<PathBuf> {
    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let candidates = [exe_dir, env::current_dir().ok(), dirs::config_dir()];

    candidates.into_iter()
        .flatten()
        .map(|dir| dir.join(CFG_FILE_NAME))
        .find(|path| path.exists())
}

/// Builds the store named by `[storage]`. The github token is read from the environment.
pub fn open_store(storage: &Storage) -> io::Result<Arc<dyn ContentStore>> {
    match storage.backend {
        Backend::Github => {
            let Some(ref github) = storage.github else {
                return Err(io::Error::new(ErrorKind::InvalidData, "storage.backend is github but [storage.github] is missing"));
            };
            let token = match env::var(&github.token_env) {
                Ok(token) if !token.is_empty() => token,
                _ => return Err(io::Error::new(ErrorKind::NotFound, format!("Environment variable {} is not set", github.token_env))),
            };
            Ok(Arc::new(GithubStore::new(&github.owner, &github.repo, github.branch.clone(), token, github.api_url.clone())))
        }
        Backend::Local => {
            let Some(ref local) = storage.local else {
                return Err(io::Error::new(ErrorKind::InvalidData, "storage.backend is local but [storage.local] is missing"));
            };
            Ok(Arc::new(LocalStore::new(local.root_dir.clone())))
        }
    }
}
