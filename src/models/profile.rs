use serde::{Deserialize, Serialize};

/// Per-user account configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Starting account balance; 0 until the user configures it.
    pub initial_balance: f64,
    /// Percent of the realized balance risked per new position.
    pub risk_percent: f64,
    pub pair_prefix: String,
    pub pair_suffix: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            initial_balance: 0.0,
            risk_percent: 1.0,
            pair_prefix: String::new(),
            pair_suffix: String::new(),
        }
    }
}

impl Profile {
    /// Decorate a stored pair symbol for display. Cosmetic only; the store
    /// always holds the undecorated symbol.
    pub fn format_pair(&self, pair: &str) -> String {
        format!("{}{}{}", self.pair_prefix, pair, self.pair_suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let profile = Profile::default();
        assert_eq!(profile.initial_balance, 0.0);
        assert_eq!(profile.risk_percent, 1.0);
        assert!(profile.pair_prefix.is_empty());
        assert!(profile.pair_suffix.is_empty());
    }

    #[test]
    fn test_format_pair() {
        let profile = Profile {
            pair_prefix: "FX:".to_string(),
            pair_suffix: "m".to_string(),
            ..Profile::default()
        };
        assert_eq!(profile.format_pair("EURUSD"), "FX:EURUSDm");
        assert_eq!(Profile::default().format_pair("EURUSD"), "EURUSD");
    }
}
