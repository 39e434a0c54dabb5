use std::env;
use std::path::PathBuf;

use gitblog::config::{locate_config, read_config, Config, CFG_FILE_NAME};

fn default_log_location() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("gitblog").join("log").join("server.log"))
}

pub(crate) fn open_config(cfg_path: Option<PathBuf>) -> Result<Config, String> {
    let config_path = match cfg_path.or_else(locate_config) {
        Some(path) => path,
        None => return Err(format!("Could not find {}", CFG_FILE_NAME)),
    };

    if let Ok(cur_dir) = env::current_dir() {
        println!("Current dir: {}", cur_dir.display());
    }
    println!("Reading config from {}", config_path.display());
    let mut config = read_config(&config_path).map_err(|e| e.to_string())?;

    match config.log.as_mut() {
        Some(log) => {
            if log.location.is_none() {
                log.location = default_log_location();
            }
            match log.location {
                Some(ref location) => println!("Log enabled. Files will be written in {}", location.display()),
                None => println!("Log enabled. No cache dir found, logging to the console"),
            }
        }
        None => println!("Log disabled. Using stdout"),
    }

    Ok(config)
}
