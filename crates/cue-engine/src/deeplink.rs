//! Deep link construction
//!
//! Opaque application URIs attached to notification payloads. The
//! engine only builds them; the host app's router resolves them when
//! the user taps a notification.

use cue_core::DEEP_LINK_SCHEME;

pub fn home() -> String {
    format!("{}://", DEEP_LINK_SCHEME)
}

pub fn education(line_item_id: &str) -> String {
    format!("{}://education/{}", DEEP_LINK_SCHEME, line_item_id)
}

pub fn gear_item(gear_id: &str) -> String {
    format!("{}://gear/item/{}", DEEP_LINK_SCHEME, gear_id)
}

pub fn service(service_id: &str) -> String {
    format!("{}://services/{}", DEEP_LINK_SCHEME, service_id)
}

pub fn history_queue() -> String {
    format!("{}://history?filter=queue", DEEP_LINK_SCHEME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_link_shapes() {
        assert_eq!(home(), "cue://");
        assert_eq!(education("li-1"), "cue://education/li-1");
        assert_eq!(gear_item("g-1"), "cue://gear/item/g-1");
        assert_eq!(service("s-1"), "cue://services/s-1");
        assert_eq!(history_queue(), "cue://history?filter=queue");
    }
}
