mod changes;
pub mod converters;
mod docs;
mod feedback;
mod hardware;
mod monitor;
mod notifications;
mod posts;
mod sat;
mod sessions;
mod system;
mod tests;
mod users;

use crate::api::api_scope;
use actix_extensible_rate_limit::backend::memory::InMemoryBackend;
use actix_web::web::ServiceConfig;

pub fn configure(api: &mut ServiceConfig, rate_limit_backend: &InMemoryBackend) {
    api.service(
        api_scope("v1")
            .configure(|v1| sessions::configure(v1, rate_limit_backend))
            .configure(users::configure)
            .configure(tests::configure)
            .configure(posts::configure)
            .configure(notifications::configure)
            .configure(system::configure)
            .configure(docs::configure)
            .configure(feedback::configure)
            .configure(monitor::configure)
            .configure(hardware::configure)
            .configure(sat::configure)
            .configure(changes::configure),
    );
}

/// Names used as keys in paths: flags, doc sections and hardware devices.
fn check_slug(slug: &str) -> Result<(), crate::api::error::DacroqApiError> {
    let valid = !slug.is_empty()
        && slug.len() <= 64
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(crate::api::error::bad_request(
            "Names must be 1 to 64 lower case letters, digits, '-' or '_'",
        ))
    }
}

#[cfg(test)]
mod test {
    use super::check_slug;

    #[test]
    fn slugs() {
        assert!(check_slug("getting-started").is_ok());
        assert!(check_slug("3sat").is_ok());
        assert!(check_slug("").is_err());
        assert!(check_slug("Intro").is_err());
        assert!(check_slug("../etc").is_err());
    }
}
