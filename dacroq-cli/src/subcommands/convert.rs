use crate::convert::{csv_to_json, json_to_csv};
use crate::response::to_pretty;
use crate::util::read_text_arg;
use crate::{ClientError, DacroqError, GlobalOpts, Runnable};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct Convert {
    #[clap(subcommand)]
    op: Operations,
}

#[derive(Subcommand, Debug)]
pub enum Operations {
    /// Convert a CSV file to a JSON array of objects
    CsvToJson(Files),
    /// Convert a JSON array of objects to CSV
    JsonToCsv(Files),
}

#[derive(Parser, Debug)]
pub struct Files {
    /// Input file (`-` for stdin)
    input: PathBuf,
    /// Output file, printed when omitted
    #[clap(long, short)]
    output: Option<PathBuf>,
}

impl Runnable for Convert {
    fn run(&self, _: &GlobalOpts) -> Result<String, DacroqError> {
        let (files, converted) = match &self.op {
            Operations::CsvToJson(files) => {
                let rows = csv_to_json(&read_text_arg(&files.input)?).map_err(ClientError::from)?;
                (files, to_pretty(&rows)?)
            }
            Operations::JsonToCsv(files) => {
                let csv = json_to_csv(&read_text_arg(&files.input)?).map_err(ClientError::from)?;
                (files, csv)
            }
        };
        match &files.output {
            None => Ok(converted),
            Some(path) => {
                fs::write(path, converted).map_err(ClientError::FailedToWriteOutputFile)?;
                Ok(format!("Wrote {}", path.display()))
            }
        }
    }
}

