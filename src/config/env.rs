use std::fmt::Display;
use std::str::FromStr;

use crate::{DeviceError, DeviceResult};

/// Marks an [`EnvBuilder`] whose fallback value is not given yet.
#[derive(Clone, Debug)]
pub(crate) struct NotDetermined {
    _priv: (),
}

/// Resolves a value from an ordered list of environment variables.
///
/// The first environment variable that is set wins. If none is set, the fallback
/// is used.
#[derive(Debug)]
pub(crate) struct EnvBuilder<T> {
    keys: Vec<String>,
    fallback: T,
}

impl EnvBuilder<NotDetermined> {
    pub fn new() -> Self {
        Self {
            keys: vec![],
            fallback: NotDetermined { _priv: () },
        }
    }

    pub fn or_env<K: ToString>(mut self, key: K) -> Self {
        self.keys.push(key.to_string());
        self
    }

    pub fn or<T>(self, fallback: T) -> EnvBuilder<T> {
        EnvBuilder {
            keys: self.keys,
            fallback,
        }
    }
}

impl<T: FromStr> EnvBuilder<T>
where
    <T as FromStr>::Err: Display,
{
    pub fn build(self) -> DeviceResult<T> {
        for key in self.keys {
            match std::env::var(&key) {
                Ok(value) => return parse(&key, &value),
                Err(std::env::VarError::NotPresent) => continue,
                Err(err) => return Err(DeviceError::config_error(key, err)),
            }
        }

        Ok(self.fallback)
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> DeviceResult<T>
where
    <T as FromStr>::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| DeviceError::config_error(key, format!("'{value}', {e}")))
}
