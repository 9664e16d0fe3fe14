use crate::DacroqError;
use derive_new::new;
use http_api_problem::HttpApiProblem;
use reqwest::blocking::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub trait ResponseExt
where
    Self: Sized,
{
    fn verify_success(self) -> Result<Self, DacroqError>;
    fn json_pretty(self) -> Result<String, DacroqError>;
    fn json_typed<T: DeserializeOwned>(self) -> Result<T, DacroqError>;
}

impl ResponseExt for Response {
    fn verify_success(self) -> Result<Self, DacroqError> {
        let status = self.status();
        if !status.is_success() {
            let text = self.text().map_err(|_| {
                UnknownApiError::new(
                    status.as_u16(),
                    String::from("Unable to parse response body"),
                )
            })?;
            let problem = serde_json::from_str::<HttpApiProblem>(&text)
                .map_err(|_| UnknownApiError::new(status.as_u16(), text))?;
            return Err(DacroqError::ApiError(problem));
        };
        Ok(self)
    }

    fn json_pretty(self) -> Result<String, DacroqError> {
        let value = self.json_typed::<serde_json::Value>()?;
        to_pretty(&value)
    }

    fn json_typed<T: DeserializeOwned>(self) -> Result<T, DacroqError> {
        let code = self.status().as_u16();
        self.json::<T>().map_err(|_| {
            UnknownApiError::new(code, String::from("Unable to parse response as JSON")).into()
        })
    }
}

pub fn to_pretty<T: Serialize>(value: &T) -> Result<String, DacroqError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| UnknownApiError::new(0, format!("Unable to format JSON: {}", e)).into())
}

#[derive(Debug, Error, Serialize, new)]
#[error("status code: {status_code}, body: {body}")]
pub struct UnknownApiError {
    status_code: u16,
    body: String,
}
