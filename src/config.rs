use rocket::figment::Figment;
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER: &str = "default_user";

/// Service settings, read from the same figment Rocket uses, so they can be
/// set in `Rocket.toml` or through `ROCKET_*` environment variables.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CompanionConfig {
    pub database_path: String,
    pub default_user: String,
    /// Reject moving a locked task to "In Progress" or "Completed".
    pub enforce_task_locks: bool,
    pub celebrate_completions: bool,
    pub max_duration_weeks: i64,
    pub reminder_list_limit: i64,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        CompanionConfig {
            database_path: String::from("rcompanion.db"),
            default_user: String::from(DEFAULT_USER),
            enforce_task_locks: true,
            celebrate_completions: true,
            max_duration_weeks: 52,
            reminder_list_limit: 50,
        }
    }
}

impl CompanionConfig {
    pub fn from_figment(figment: &Figment) -> Result<CompanionConfig, rocket::figment::Error> {
        figment.extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::figment::providers::Serialized;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let figment = Figment::from(Serialized::defaults(rocket::Config::default()))
            .merge(("max_duration_weeks", 12));

        let config = CompanionConfig::from_figment(&figment).unwrap();

        assert_eq!(config.max_duration_weeks, 12);
        assert_eq!(config.database_path, "rcompanion.db");
        assert_eq!(config.default_user, DEFAULT_USER);
        assert!(config.enforce_task_locks);
    }
}
