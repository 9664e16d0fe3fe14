use std::io::{Cursor, Read};
use thiserror::Error;
use zip::ZipArchive;

#[derive(Debug, Error, PartialEq)]
pub enum BatchError {
    #[error("Only .cnf and .zip files are accepted")]
    UnsupportedUpload,
    #[error("Unable to read zip archive: {0}")]
    CorruptArchive(String),
    #[error("The archive does not contain any .cnf files")]
    NoProblems,
}

/// One problem file pulled out of an upload. A member that could not be read
/// carries the reason instead of its contents.
#[derive(Debug)]
pub struct ProblemFile {
    pub name: String,
    pub contents: Result<Vec<u8>, String>,
}

fn has_extension(name: &str, extension: &str) -> bool {
    name.rsplit_once('.')
        .map_or(false, |(_, ext)| ext.eq_ignore_ascii_case(extension))
}

/// Archive metadata written by macOS that looks like a problem file.
fn is_resource_fork(name: &str) -> bool {
    name.starts_with("__MACOSX/")
        || name
            .rsplit('/')
            .next()
            .map_or(false, |base| base.starts_with("._"))
}

/// Reads at most `limit` bytes of a member. The size recorded in the archive
/// is not trusted.
fn read_member<R: Read>(member: R, limit: u64) -> Result<Vec<u8>, String> {
    let mut contents = Vec::new();
    member
        .take(limit.saturating_add(1))
        .read_to_end(&mut contents)
        .map_err(|e| format!("Unable to extract: {}", e))?;
    if contents.len() as u64 > limit {
        return Err(format!("Extracted size exceeds {} bytes", limit));
    }
    Ok(contents)
}

/// Splits an upload into problem files, reading no more than `member_limit`
/// bytes out of any one archive member.
pub fn extract(
    file_name: &str,
    bytes: &[u8],
    member_limit: u64,
) -> Result<Vec<ProblemFile>, BatchError> {
    if has_extension(file_name, "cnf") {
        return Ok(vec![ProblemFile {
            name: file_name.to_owned(),
            contents: Ok(bytes.to_vec()),
        }]);
    }
    if !has_extension(file_name, "zip") {
        return Err(BatchError::UnsupportedUpload);
    }
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| BatchError::CorruptArchive(e.to_string()))?;
    let mut problems = Vec::new();
    for index in 0..archive.len() {
        let member = match archive.by_index(index) {
            Ok(member) => member,
            Err(e) => {
                log::warn!("Skipping unreadable member {} of {}: {}", index, file_name, e);
                continue;
            }
        };
        let name = member.name().to_owned();
        if member.is_dir() || is_resource_fork(&name) || !has_extension(&name, "cnf") {
            continue;
        }
        let contents = read_member(member, member_limit);
        if let Err(reason) = &contents {
            log::warn!("Member {} of {} rejected: {}", name, file_name, reason);
        }
        problems.push(ProblemFile { name, contents });
    }
    if problems.is_empty() {
        return Err(BatchError::NoProblems);
    }
    Ok(problems)
}
