//! Engine options exposed through `setoption`.

use crate::board::SearchParams;
use crate::tt::DEFAULT_TT_MB;

use super::UciError;

pub const MIN_HASH_MB: usize = 1;
pub const MAX_HASH_MB: usize = 65_536;
pub const MAX_THREADS: usize = 256;

/// What the engine must do after an option changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionChange {
    Hash(usize),
    Threads(usize),
    /// Empty path selects the built-in network
    EvalFile(String),
    Param { name: String, value: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UciOptions {
    pub hash_mb: usize,
    pub threads: usize,
    pub eval_file: String,
}

impl Default for UciOptions {
    fn default() -> Self {
        UciOptions {
            hash_mb: DEFAULT_TT_MB,
            threads: 1,
            eval_file: String::new(),
        }
    }
}

impl UciOptions {
    /// Option declarations for the `uci` reply, tunables included.
    #[must_use]
    pub fn declarations(&self, params: &SearchParams) -> Vec<String> {
        let mut lines = vec![
            format!("option name Hash type spin default {DEFAULT_TT_MB} min {MIN_HASH_MB} max {MAX_HASH_MB}"),
            format!("option name Threads type spin default 1 min 1 max {MAX_THREADS}"),
            "option name EvalFile type string default <empty>".to_string(),
        ];
        lines.extend(params.tunables().into_iter().map(|t| {
            format!(
                "option name {} type spin default {} min {} max {}",
                t.name, t.value, t.min, t.max
            )
        }));
        lines
    }

    /// Validate and record `setoption name <name> value <value>`. Tunables
    /// are matched against `params`, which is not modified here.
    pub fn apply(&mut self, name: &str, value: Option<&str>, params: &SearchParams) -> Result<OptionChange, UciError> {
        let key = name.trim().to_ascii_lowercase();
        match key.as_str() {
            "hash" => {
                let mb = parse_value::<usize>(name, value)?.clamp(MIN_HASH_MB, MAX_HASH_MB);
                self.hash_mb = mb;
                Ok(OptionChange::Hash(mb))
            }
            "threads" => {
                let threads = parse_value::<usize>(name, value)?.clamp(1, MAX_THREADS);
                self.threads = threads;
                Ok(OptionChange::Threads(threads))
            }
            "evalfile" => {
                let path = value.unwrap_or_default().trim();
                self.eval_file = if path == "<empty>" { String::new() } else { path.to_string() };
                Ok(OptionChange::EvalFile(self.eval_file.clone()))
            }
            _ => {
                let tunable = params
                    .tunables()
                    .into_iter()
                    .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
                    .ok_or_else(|| UciError::UnknownOption { name: name.to_string() })?;
                let value = parse_value::<i32>(name, value)?;
                Ok(OptionChange::Param {
                    name: tunable.name.to_string(),
                    value,
                })
            }
        }
    }
}

fn parse_value<T: std::str::FromStr>(option: &str, value: Option<&str>) -> Result<T, UciError> {
    let value = value.ok_or_else(|| UciError::MissingValue {
        option: option.to_string(),
    })?;
    value.trim().parse().map_err(|_| UciError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_threads() {
        let params = SearchParams::default();
        let mut options = UciOptions::default();
        assert_eq!(options.apply("Hash", Some("64"), &params), Ok(OptionChange::Hash(64)));
        assert_eq!(options.hash_mb, 64);
        assert_eq!(options.apply("threads", Some("1000"), &params), Ok(OptionChange::Threads(MAX_THREADS)));
        assert_eq!(
            options.apply("Hash", Some("lots"), &params),
            Err(UciError::InvalidValue {
                option: "Hash".to_string(),
                value: "lots".to_string()
            })
        );
        assert_eq!(
            options.apply("Threads", None, &params),
            Err(UciError::MissingValue {
                option: "Threads".to_string()
            })
        );
    }

    #[test]
    fn test_tunable_option() {
        let params = SearchParams::default();
        let mut options = UciOptions::default();
        assert_eq!(
            options.apply("ASP_DELTA", Some("40"), &params),
            Ok(OptionChange::Param {
                name: "asp_delta".to_string(),
                value: 40
            })
        );
        assert!(matches!(
            options.apply("NoSuchOption", Some("1"), &params),
            Err(UciError::UnknownOption { .. })
        ));
    }

    #[test]
    fn test_declarations_cover_tunables() {
        let params = SearchParams::default();
        let lines = UciOptions::default().declarations(&params);
        assert_eq!(lines.len(), 3 + params.tunables().len());
        assert!(lines.iter().any(|l| l.starts_with("option name rfp_mult type spin default 90")));
    }
}
