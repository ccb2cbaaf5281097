use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

use crate::posts::DEFAULT_PAGE_SIZE;

#[derive(Deserialize)]
pub struct Database {
    pub path: PathBuf,
}

#[derive(Deserialize)]
pub struct Defaults {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Register the markdown renderer on the `the_content` hook
    #[serde(default)]
    pub render_markdown: bool,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            page_size: DEFAULT_PAGE_SIZE,
            render_markdown: false,
        }
    }
}

#[derive(Deserialize)]
pub struct Time {
    /// Offset of local time from UTC, e.g. `+08:00`
    pub utc_offset: String,
}

impl Default for Time {
    fn default() -> Self {
        Time { utc_offset: "+00:00".to_string() }
    }
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug, PartialEq)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize)]
pub struct Config {
    pub database: Database,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub time: Time,
    pub log: Option<Log>,
}

fn parse_path(path: PathBuf) -> io::Result<PathBuf> {
    let Some(str_path) = path.to_str() else {
        return Ok(path);
    };
    if !str_path.starts_with("${exe_dir}") {
        return Ok(path);
    }

    let cur_exe = env::current_exe()?;
    let exe_dir = cur_exe.parent()
        .and_then(|p| p.to_str())
        .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "Could not find the executable directory"))?;
    Ok(PathBuf::from(str_path.replace("${exe_dir}", exe_dir)))
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.database.path = parse_path(cfg.database.path)?;
    if let Some(ref mut log) = cfg.log {
        if let Some(location) = log.location.take() {
            log.location = Some(parse_path(location)?);
        }
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

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_full_config() {
        let cfg = parse_config(r##"
[database]
path = "/var/lib/blog/blog.db"

[defaults]
page_size = 15
render_markdown = true

[time]
utc_offset = "+08:00"

[log]
level = "Debug"
log_to_console = true
location = "/var/log/blog/server.log"
"##).unwrap();

        assert_eq!(cfg.database.path, PathBuf::from("/var/lib/blog/blog.db"));
        assert_eq!(cfg.defaults.page_size, 15);
        assert!(cfg.defaults.render_markdown);
        assert_eq!(cfg.time.utc_offset, "+08:00");
        let log = cfg.log.unwrap();
        assert_eq!(log.level, LogLevel::Debug);
        assert_eq!(log.location, Some(PathBuf::from("/var/log/blog/server.log")));
    }

    #[test]
    fn test_minimal_config() {
        let cfg = parse_config("[database]\npath = \"blog.db\"\n").unwrap();
        assert_eq!(cfg.defaults.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(cfg.time.utc_offset, "+00:00");
        assert!(cfg.log.is_none());
    }

    #[test]
    fn test_exe_dir_expansion() {
        let cfg = parse_config("[database]\npath = \"${exe_dir}/blog.db\"\n").unwrap();
        let path = cfg.database.path.to_str().unwrap().to_string();
        assert!(!path.contains("${exe_dir}"));
        assert!(path.ends_with("/blog.db"));
    }

    #[test]
    fn test_read_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[database]\npath = \"blog.db\"\n").unwrap();
        let cfg = read_config(file.path()).unwrap();
        assert_eq!(cfg.database.path, PathBuf::from("blog.db"));

        let err = read_config(Path::new("/does/not/exist.toml")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_config() {
        let err = parse_config("[database]\n").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
