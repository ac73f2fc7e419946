use serde::{Deserialize, Serialize};

use crate::types::BoardSize;

pub const DEFAULT_KOMI: f64 = 7.5;

/// Which whole-board repetition rule is enforced on top of simple ko.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuperkoRule {
    None,
    Positional,
    #[default]
    Situational,
}

/// Ruleset for one session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleConfig {
    pub board_size: BoardSize,
    pub komi: f64,
    pub superko: SuperkoRule,
}

impl RuleConfig {
    pub fn new(board_size: BoardSize, komi: f64) -> Self {
        Self {
            board_size,
            komi,
            superko: SuperkoRule::default(),
        }
    }

    pub fn with_superko(mut self, superko: SuperkoRule) -> Self {
        self.superko = superko;
        self
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self::new(BoardSize::default(), DEFAULT_KOMI)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_nine_by_nine_situational() {
        let config = RuleConfig::default();

        assert_eq!(config.board_size, BoardSize::Nine);
        assert_eq!(config.komi, DEFAULT_KOMI);
        assert_eq!(config.superko, SuperkoRule::Situational);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: RuleConfig =
            serde_json::from_str(r#"{ "boardSize": 19, "superko": "positional" }"#)
                .expect("config must deserialize");

        assert_eq!(config.board_size, BoardSize::Nineteen);
        assert_eq!(config.komi, DEFAULT_KOMI);
        assert_eq!(config.superko, SuperkoRule::Positional);
    }
}
