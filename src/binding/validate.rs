//! Reference name check
//!
//! A flow placeholder `${taskId.name}` only matches ids and export names made
//! of ASCII letters, digits, `_` and `-`. Anything else can still be run, but
//! no later task can refer to its exports.

/// Whether `name` can appear in a `${taskId.name}` placeholder
pub fn is_referenceable_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_placeholder_charset() {
        assert!(is_referenceable_name("fetchA"));
        assert!(is_referenceable_name("get-daily-task-status"));
        assert!(is_referenceable_name("step_2"));
        assert!(is_referenceable_name("0"));
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!is_referenceable_name(""));
        assert!(!is_referenceable_name("weather.api"));
        assert!(!is_referenceable_name("with space"));
        assert!(!is_referenceable_name("名前"));
        assert!(!is_referenceable_name("a}b"));
    }
}
