//! Shared User-Agent string for ClassyFire and converter HTTP clients.

/// Default User-Agent for outgoing requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("classyfire/{version} (chemical-classification-client)")
}
