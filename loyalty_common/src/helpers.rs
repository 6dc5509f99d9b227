use std::{env, fmt::Display, str::FromStr};

use log::warn;

/// Parse a numeric setting from an optional string value.
///
/// Returns `Ok(default)` if the value is absent, and `Err` with a human-readable reason if the value is present but
/// cannot be parsed, so that callers can log the problem before falling back to the default.
pub fn parse_numeric_setting<T>(value: Option<String>, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        None => Ok(default),
        Some(v) => v.trim().parse::<T>().map_err(|e| format!("'{v}' is not a valid value. {e}")),
    }
}

/// Parse the numeric setting `name` from `value`, falling back to `default` (with a warning) when the value is
/// present but unparseable, or when `valid` rejects it.
pub fn checked_numeric_setting<T>(name: &str, value: Option<String>, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    match parse_numeric_setting(value, default) {
        Ok(v) if valid(&v) => v,
        Ok(v) => {
            warn!("🪛️ {v} is not a sensible value for {name}. Using the default, {default}, instead.");
            default
        },
        Err(e) => {
            warn!("🪛️ {name}: {e} Using the default, {default}, instead.");
            default
        },
    }
}

/// [`checked_numeric_setting`] for the environment variable `name`.
pub fn env_numeric_setting<T>(name: &str, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    checked_numeric_setting(name, env::var(name).ok(), default, valid)
}
