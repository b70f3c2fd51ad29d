use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn from_env() -> Self {
        Self::parse(&env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Read `key` and parse it, falling back to `default` when the variable is
/// unset or does not parse.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Read `key` as a string, treating an empty value as unset.
pub fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn parse_accepts_production_aliases() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("PROD"), Environment::Production);
        assert_eq!(Environment::parse("staging"), Environment::Development);
        assert_eq!(Environment::parse(""), Environment::Development);
    }

    #[test]
    #[serial]
    fn env_or_falls_back_on_unparsable_value() {
        unsafe { env::set_var("COMMON_TEST_NUMBER", "not-a-number") };
        assert_eq!(env_or("COMMON_TEST_NUMBER", 7u32), 7);

        unsafe { env::set_var("COMMON_TEST_NUMBER", " 42 ") };
        assert_eq!(env_or("COMMON_TEST_NUMBER", 7u32), 42);

        unsafe { env::remove_var("COMMON_TEST_NUMBER") };
        assert_eq!(env_or("COMMON_TEST_NUMBER", 7u32), 7);
    }

    #[test]
    #[serial]
    fn env_opt_treats_blank_as_unset() {
        unsafe { env::set_var("COMMON_TEST_PATH", "  ") };
        assert_eq!(env_opt("COMMON_TEST_PATH"), None);

        unsafe { env::set_var("COMMON_TEST_PATH", "/models/x.onnx") };
        assert_eq!(env_opt("COMMON_TEST_PATH").as_deref(), Some("/models/x.onnx"));

        unsafe { env::remove_var("COMMON_TEST_PATH") };
    }
}
