use std::path::PathBuf;

use askweb_core::AppError;

pub const DEFAULT_TABLE: &str = "conversations";

/// Where the conversation store lives.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub table: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Configuration for `path` with the default table. The file is created
    /// on first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: DEFAULT_TABLE.to_string(),
            max_connections: 1,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// The table name is spliced into SQL, so it must be a plain identifier.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_table_name(&self.table)?;
        if self.max_connections == 0 {
            return Err(AppError::ConfigError(
                "database max_connections must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// ASCII letter or underscore first, then letters, digits or underscores.
pub fn validate_table_name(table: &str) -> Result<(), AppError> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid && !table.to_ascii_lowercase().starts_with("sqlite_") {
        Ok(())
    } else {
        Err(AppError::ConfigError(format!(
            "Invalid database table name '{table}': use letters, digits and underscores"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let config = DatabaseConfig::new("/tmp/ask-web.db");
        assert_eq!(config.table, "conversations");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_table_names() {
        for ok in ["conversations", "_history", "runs2"] {
            assert!(validate_table_name(ok).is_ok(), "{ok}");
        }
        for bad in ["", "2runs", "drop table", "x;--", "sqlite_master", "naïve"] {
            assert!(validate_table_name(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_zero_connections_rejected() {
        let mut config = DatabaseConfig::new("a.db");
        config.max_connections = 0;
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }
}
