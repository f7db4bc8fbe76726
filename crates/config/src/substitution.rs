use anyhow::Result;
use regex::{Captures, Regex};
use std::env;
use tracing::{debug, warn};

const ENV_VAR_PATTERN: &str = r"\$\{(\w+)\}|\$(\w+)";

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME.
///
/// Unset variables keep their placeholder; the validator reports them.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(ENV_VAR_PATTERN)?;
    let mut missing_vars = Vec::new();

    let result = re.replace_all(content, |caps: &Captures| {
        let placeholder = caps.get(0).map_or("", |m| m.as_str());
        let Some(var_name) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
            return placeholder.to_string();
        };

        match env::var(var_name) {
            Ok(value) => {
                debug!("Substituting environment variable: {}", var_name);
                value
            }
            Err(_) => {
                warn!("Environment variable '{}' not set", var_name);
                missing_vars.push(var_name.to_string());
                placeholder.to_string()
            }
        }
    });

    if !missing_vars.is_empty() {
        debug!("Environment variables not set: {:?}", missing_vars);
    }

    Ok(result.into_owned())
}

/// Names of placeholders still present in `content`
pub fn unresolved_env_vars(content: &str) -> Vec<String> {
    let Ok(re) = Regex::new(ENV_VAR_PATTERN) else {
        return Vec::new();
    };
    re.captures_iter(content)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_braced_and_bare() {
        env::set_var("NIFTYX_TEST_HOST", "10.0.0.5");
        let out = substitute_env_vars("url: http://${NIFTYX_TEST_HOST}:8000/$NIFTYX_TEST_HOST").unwrap();
        assert_eq!(out, "url: http://10.0.0.5:8000/10.0.0.5");
    }

    #[test]
    fn test_missing_var_keeps_placeholder() {
        let out = substitute_env_vars("url: ${NIFTYX_TEST_UNSET_VAR}/chain").unwrap();
        assert_eq!(out, "url: ${NIFTYX_TEST_UNSET_VAR}/chain");
        assert_eq!(unresolved_env_vars(&out), vec!["NIFTYX_TEST_UNSET_VAR".to_string()]);
        assert!(unresolved_env_vars("http://localhost:8000").is_empty());
    }
}
