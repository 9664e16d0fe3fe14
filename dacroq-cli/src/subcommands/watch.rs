use crate::profile::Profile;
use crate::response::ResponseExt;
use crate::{DacroqError, CLIENT};
use dacroq_model::api_v1::{Collection, WaitChangesRequest, WaitChangesResponse};
use std::time::Duration;

const WAIT_SECS: u64 = 25;

/// Long-polls the change feed, printing each event as a json line.
/// Returns after the first batch of events when `once` is set.
pub fn watch(profile: &Profile, collection: Collection, once: bool) -> Result<String, DacroqError> {
    let url = profile.route_url("v1/changes")?;
    let mut request = WaitChangesRequest {
        collection: Some(collection),
        since: None,
        timeout_secs: WAIT_SECS,
    };
    loop {
        let response = CLIENT
            .get(url.clone())
            .bearer_auth(&profile.token)
            .query(&request)
            .timeout(Duration::from_secs(WAIT_SECS + 10))
            .send()?
            .verify_success()?
            .json_typed::<WaitChangesResponse>()?;
        request.since = Some(response.cursor);
        for event in &response.events {
            if let Ok(line) = serde_json::to_string(event) {
                println!("{}", line);
            }
        }
        if once && !response.events.is_empty() {
            return Ok(format!("Received {} change(s)", response.events.len()));
        }
    }
}
