use std::str::FromStr;

use thiserror::Error;

/// An environment variable is set but its value could not be parsed.
#[derive(Debug, Error)]
#[error("Invalid value for environment variable {name}: {value:?}")]
pub struct InvalidEnvVarError {
    pub name: String,
    pub value: String,
}

/// Reads an optional environment variable.
///
/// Unset, non-unicode, and blank values all read as `None`; surrounding
/// whitespace is trimmed.
pub fn get_env_var_opt(name: &str) -> Option<String> {
    let value = std::env::var(name).ok()?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Reads and parses an optional environment variable.
///
/// Returns `Ok(None)` when the variable is unset or blank, and an
/// [`InvalidEnvVarError`] when it is set to something `T` cannot parse.
pub fn parse_env_var<T: FromStr>(name: &str) -> Result<Option<T>, InvalidEnvVarError> {
    let Some(raw) = get_env_var_opt(name) else {
        return Ok(None);
    };
    raw.parse::<T>().map(Some).map_err(|_| InvalidEnvVarError {
        name: name.to_string(),
        value: raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Variable names are unique per test so the suite can run in parallel.

    #[test]
    fn unset_var_reads_as_none() {
        assert_eq!(get_env_var_opt("SHARED_UTILS_TEST_NEVER_SET"), None);
    }

    #[test]
    fn blank_values_read_as_unset() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_BLANK", "   ") };
        assert_eq!(get_env_var_opt("SHARED_UTILS_TEST_BLANK"), None);
        assert!(matches!(parse_env_var::<u64>("SHARED_UTILS_TEST_BLANK"), Ok(None)));
    }

    #[test]
    fn parses_trimmed_numbers() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_NUM", " 8000 ") };
        assert_eq!(parse_env_var::<u64>("SHARED_UTILS_TEST_NUM").unwrap(), Some(8000));
    }

    #[test]
    fn unparsable_value_is_an_error() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_BAD", "eight") };
        let err = parse_env_var::<u64>("SHARED_UTILS_TEST_BAD").unwrap_err();
        assert_eq!(err.name, "SHARED_UTILS_TEST_BAD");
        assert_eq!(err.value, "eight");
    }
}
