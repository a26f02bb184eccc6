use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
    pub api_token: String,
    /// GitHub login of the student whose dashboard is shown.
    pub github_id: String,
    /// Courses to cycle through; the first one opens at startup.
    pub course_ids: Vec<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config at {}", path.display()))?;
                let config: Config = toml::from_str(&contents)
                    .with_context(|| "Failed to parse config.toml")?;
                config.validate()?;
                return Ok(config);
            }
        }

        let api_url = std::env::var("DASHBOARD_API_URL")
            .with_context(|| "DASHBOARD_API_URL not set. Create a config file or set the env var.")?;
        let api_token = std::env::var("DASHBOARD_API_TOKEN")
            .with_context(|| "DASHBOARD_API_TOKEN not set. Create a config file or set the env var.")?;
        let github_id = std::env::var("DASHBOARD_GITHUB_ID")
            .with_context(|| "DASHBOARD_GITHUB_ID not set. Create a config file or set the env var.")?;
        let course_ids = std::env::var("DASHBOARD_COURSE_IDS")
            .with_context(|| "DASHBOARD_COURSE_IDS not set. Create a config file or set the env var.")?;

        let config = Self {
            api_url,
            api_token,
            github_id,
            course_ids: parse_course_ids(&course_ids)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn generate_default() -> Result<PathBuf> {
        let path = Self::config_path()
            .with_context(|| "Could not determine config directory")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let default = Config {
            api_url: "https://app.example.org".into(),
            api_token: "your-api-token-here".into(),
            github_id: "your-github-login".into(),
            course_ids: vec![1],
        };

        let toml_str = toml::to_string_pretty(&default)?;
        std::fs::write(&path, toml_str)?;
        Ok(path)
    }

    /// Put `course_id` first so the dashboard opens on it.
    pub fn select_course(&mut self, course_id: u64) {
        self.course_ids.retain(|id| *id != course_id);
        self.course_ids.insert(0, course_id);
    }

    fn validate(&self) -> Result<()> {
        if self.course_ids.is_empty() {
            bail!("course_ids must list at least one course");
        }
        if self.github_id.trim().is_empty() {
            bail!("github_id must not be empty");
        }
        Ok(())
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("student-dashboard").join("config.toml"))
    }
}

/// Comma-separated course ids, e.g. `"11, 23"`.
pub fn parse_course_ids(raw: &str) -> Result<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .with_context(|| format!("Invalid course id: {s}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(course_ids: Vec<u64>) -> Config {
        Config {
            api_url: "https://app.example.org".into(),
            api_token: "t".into(),
            github_id: "student".into(),
            course_ids,
        }
    }

    #[test]
    fn parses_course_id_lists() {
        assert_eq!(parse_course_ids("11, 23,42").unwrap(), vec![11, 23, 42]);
        assert_eq!(parse_course_ids("7,").unwrap(), vec![7]);
        assert!(parse_course_ids("7, x").is_err());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&config(vec![3, 4])).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.course_ids, vec![3, 4]);
        assert_eq!(back.github_id, "student");
    }

    #[test]
    fn empty_course_list_is_rejected() {
        assert!(config(Vec::new()).validate().is_err());
        assert!(config(vec![1]).validate().is_ok());
    }

    #[test]
    fn selected_course_moves_to_front() {
        let mut c = config(vec![1, 2, 3]);
        c.select_course(3);
        assert_eq!(c.course_ids, vec![3, 1, 2]);
        c.select_course(9);
        assert_eq!(c.course_ids, vec![9, 3, 1, 2]);
    }
}
