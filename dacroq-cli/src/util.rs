use std::fmt::{Debug, Display};
use std::fs;
use std::io::{stdin, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use dialoguer::Password;
use serde::de::DeserializeOwned;

use crate::{ClientError, DacroqError};

pub fn read_input<T>(prompt: &str) -> Result<T, DacroqError>
where
    T: Clone + FromStr + Display,
    T::Err: Display + Debug,
{
    dialoguer::Input::new()
        .with_prompt(prompt)
        .interact_text()
        .map_err(|e| ClientError::DialoguerError(e).into())
}

pub fn read_password(use_stdin: bool) -> Result<String, DacroqError> {
    Ok(if use_stdin {
        let mut buf = String::new();
        stdin()
            .read_to_string(&mut buf)
            .map_err(ClientError::FailedToReadStdin)?;
        buf.trim_end_matches(&['\r', '\n'][..]).to_string()
    } else {
        Password::new()
            .with_prompt("Enter Password")
            .interact()
            .map_err(ClientError::DialoguerError)?
    })
}

/// Reads text from a file, or from stdin when the path is `-`.
pub fn read_text_arg(path: &Path) -> Result<String, ClientError> {
    if path == Path::new("-") {
        let mut buf = String::new();
        stdin()
            .read_to_string(&mut buf)
            .map_err(ClientError::FailedToReadStdin)?;
        Ok(buf)
    } else {
        fs::read_to_string(path).map_err(ClientError::FailedToReadArgumentFile)
    }
}

/// Parses a json file argument, reading stdin when the argument is absent.
pub fn parse_json_from_arg_or_stdin<T: DeserializeOwned>(
    arg: Option<&PathBuf>,
) -> Result<T, ClientError> {
    let text = read_text_arg(arg.map(PathBuf::as_path).unwrap_or_else(|| Path::new("-")))?;
    serde_json::from_str(&text).map_err(ClientError::FailedToParseJsonInput)
}

/// Parses a plain lowercase enum value using its serde names, e.g. `queued` or `3SAT`.
pub fn parse_plain<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| format!("unrecognised value `{}`", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dacroq_model::tests::{ChipType, TestStatus};

    #[test]
    fn plain_enum_values() {
        assert_eq!(parse_plain::<TestStatus>("running"), Ok(TestStatus::Running));
        assert_eq!(parse_plain::<ChipType>("3SAT"), Ok(ChipType::ThreeSat));
        assert!(parse_plain::<ChipType>("4SAT").is_err());
    }

    #[test]
    fn json_file_argument() {
        let dir = std::env::temp_dir();
        let good = dir.join(format!("dacroq-good-{}.json", std::process::id()));
        let bad = dir.join(format!("dacroq-bad-{}.json", std::process::id()));
        fs::write(&good, r#"{"pinned": true}"#).unwrap();
        fs::write(&bad, "{").unwrap();
        let value: serde_json::Value = parse_json_from_arg_or_stdin(Some(&good)).unwrap();
        assert_eq!(value["pinned"], true);
        assert!(matches!(
            parse_json_from_arg_or_stdin::<serde_json::Value>(Some(&bad)),
            Err(ClientError::FailedToParseJsonInput(_))
        ));
        fs::remove_file(good).unwrap();
        fs::remove_file(bad).unwrap();
    }
}
