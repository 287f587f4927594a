use crate::models::*;
use failure::Fail;
use serde_derive::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default, rename = "pipeline")]
    pub pipelines: Vec<Pipeline>,
}

#[derive(Debug, Fail)]
pub enum ConfigError {
    #[fail(display = "invalid config: {}", _0)]
    Parse(String),
    #[fail(display = "pipeline '{}' is defined more than once", _0)]
    DuplicatePipeline(String),
}

type Result<T> = std::result::Result<T, failure::Error>;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let mut file = std::fs::File::open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let mut seen = HashSet::new();
    for pipeline in &config.pipelines {
        if !seen.insert(pipeline.name.as_str()) {
            return Err(ConfigError::DuplicatePipeline(pipeline.name.clone()).into());
        }
    }
    Ok(config)
}

impl Config {
    pub fn pipeline(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.iter().find(|x| x.name == name)
    }
}
