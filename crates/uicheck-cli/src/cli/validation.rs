/// Parse a `NAME=VALUE` scenario parameter.
///
/// The value may itself contain `=`; only the first one separates.
///
/// # Errors
///
/// Returns an error message if there is no `=` or the name is empty.
pub fn parse_param(s: &str) -> Result<(String, String), String> {
    let Some((name, value)) = s.split_once('=') else {
        return Err(format!("Expected NAME=VALUE, got '{}'", s));
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Parameter name cannot be empty: '{}'", s));
    }
    if name.contains(['{', '}', '$']) {
        return Err(format!(
            "Parameter name must not contain '$', '{{' or '}}': '{}'",
            name
        ));
    }

    Ok((name.to_string(), value.to_string()))
}

/// Parse the `--jobs` value, which must be at least 1.
///
/// # Errors
///
/// Returns an error message for non-numbers and zero.
pub fn parse_jobs(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("Jobs must be at least 1".to_string()),
        Ok(jobs) => Ok(jobs),
        Err(_) => Err(format!("Jobs must be a positive number: '{}'", s)),
    }
}
