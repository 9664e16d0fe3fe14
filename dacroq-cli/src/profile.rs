use crate::ClientError;
use dacroq_model::api_v1::UserSummary;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

lazy_static! {
    static ref PROFILE_PATH: Option<PathBuf> = dirs::config_dir()
        .map(|dir| dir.join("dacroq").join("profile").with_extension("json"));
}

#[derive(Serialize, Deserialize)]
pub struct Profile {
    pub token: String,
    pub user: UserSummary,
    pub url: Url,
}

fn profile_path(path_override: Option<&PathBuf>) -> Result<&Path, ClientError> {
    match path_override {
        Some(path) => Ok(path.as_path()),
        None => PROFILE_PATH
            .as_deref()
            .ok_or(ClientError::NoConfigDirectory),
    }
}

impl Profile {
    pub fn load_profile(path_override: Option<&PathBuf>) -> Result<Self, ClientError> {
        let file = fs::read_to_string(profile_path(path_override)?)
            .map_err(ClientError::FailedToReadProfileFile)?;
        serde_json::from_str(&file).map_err(ClientError::FailedToParseProfile)
    }

    pub fn save_profile(&self, path_override: Option<&PathBuf>) -> Result<(), ClientError> {
        let json = serde_json::to_string_pretty(&self).map_err(ClientError::FailedToParseProfile)?;
        let path = profile_path(path_override)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ClientError::FailedToCreateAppDirectory)?;
        }
        fs::write(path, json).map_err(ClientError::FailedToWriteProfileFile)
    }

    pub fn exists(path_override: Option<&PathBuf>) -> bool {
        profile_path(path_override)
            .map(Path::exists)
            .unwrap_or(false)
    }

    pub fn delete(path_override: Option<&PathBuf>) -> Result<(), ClientError> {
        fs::remove_file(profile_path(path_override)?)
            .map_err(ClientError::FailedToDeleteProfileFile)
    }

    pub fn route_url(&self, route: &str) -> Result<Url, ClientError> {
        join_route(&self.url, route)
    }

    pub fn route_url_with_id<I: ToString>(&self, route: &str, id: &I) -> Result<Url, ClientError> {
        self.route_url_with_id_and(route, id, "")
    }

    /// Builds `<route><id>/<and>`, escaping the id as a single path segment.
    pub fn route_url_with_id_and<I: ToString>(
        &self,
        route: &str,
        id: &I,
        and: &str,
    ) -> Result<Url, ClientError> {
        debug_assert!(route.ends_with('/'));
        let mut url = join_route(&self.url, route)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidServerUrl)?;
            segments.pop_if_empty().push(&id.to_string());
            for part in and.split('/').filter(|s| !s.is_empty()) {
                segments.push(part);
            }
        }
        Ok(url)
    }
}

/// Server urls are treated as directories, so `http://host/api` and
/// `http://host/api/` resolve routes the same way.
pub fn join_route(base: &Url, route: &str) -> Result<Url, ClientError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(route)
        .map_err(ClientError::FailedToParsePathVariable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(url: &str) -> Profile {
        let user = json!({
            "id": 1,
            "name": "Ada",
            "email": "ada@example.com",
            "role": "admin",
            "enabled": true,
            "created": "2024-03-01T12:00:00Z",
            "last_online": null,
            "test_count": 0
        });
        Profile {
            token: "token".into(),
            user: serde_json::from_value(user).unwrap(),
            url: url.parse().unwrap(),
        }
    }

    #[test]
    fn routes_resolve_under_base_path() {
        let p = profile("http://localhost:8080/api");
        assert_eq!(
            p.route_url("v1/tests").unwrap().as_str(),
            "http://localhost:8080/api/v1/tests"
        );
        let p = profile("http://localhost:8080");
        assert_eq!(
            p.route_url("v1/tests").unwrap().as_str(),
            "http://localhost:8080/v1/tests"
        );
    }

    #[test]
    fn ids_are_single_segments() {
        let p = profile("http://localhost/");
        assert_eq!(
            p.route_url_with_id("v1/tests/", &42).unwrap().as_str(),
            "http://localhost/v1/tests/42"
        );
        assert_eq!(
            p.route_url_with_id("v1/docs/", &"a/b").unwrap().as_str(),
            "http://localhost/v1/docs/a%2Fb"
        );
        assert_eq!(
            p.route_url_with_id_and("v1/tests/", &7, "rerun")
                .unwrap()
                .as_str(),
            "http://localhost/v1/tests/7/rerun"
        );
    }

    #[test]
    fn profile_round_trips_through_file() {
        let path = std::env::temp_dir().join(format!("dacroq-profile-{}.json", std::process::id()));
        let p = profile("http://localhost/");
        p.save_profile(Some(&path)).unwrap();
        assert!(Profile::exists(Some(&path)));
        let loaded = Profile::load_profile(Some(&path)).unwrap();
        assert_eq!(loaded.user.email, "ada@example.com");
        Profile::delete(Some(&path)).unwrap();
        assert!(!Profile::exists(Some(&path)));
    }
}
