//! Feature-name helpers (spec §4.F).
//!
//! A full feature name is `<type>.<talent-id>.<feature-name>{-in|-out}`.
//! These are pure string functions, specified once here rather than as
//! methods scattered across `Talent`/`FunctionTalent` (DESIGN NOTES §9.3).

/// Suffix identifying an input feature.
pub const IN_SUFFIX: &str = "-in";
/// Suffix identifying an output feature.
pub const OUT_SUFFIX: &str = "-out";

/// `feature-in`.
pub fn in_suffixed(feature: &str) -> String {
    format!("{feature}{IN_SUFFIX}")
}

/// `feature-out`.
pub fn out_suffixed(feature: &str) -> String {
    format!("{feature}{OUT_SUFFIX}")
}

/// `talent_id.feature-in`.
pub fn in_name(talent_id: &str, feature: &str) -> String {
    format!("{talent_id}.{}", in_suffixed(feature))
}

/// `talent_id.feature-out`.
pub fn out_name(talent_id: &str, feature: &str) -> String {
    format!("{talent_id}.{}", out_suffixed(feature))
}

/// `type.talent_id.feature-in`.
pub fn in_name_typed(r#type: &str, talent_id: &str, feature: &str) -> String {
    format!("{type}.{}", in_name(talent_id, feature))
}

/// `type.talent_id.feature-out`.
pub fn out_name_typed(r#type: &str, talent_id: &str, feature: &str) -> String {
    format!("{type}.{}", out_name(talent_id, feature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes_are_appended() {
        assert_eq!(in_suffixed("temp"), "temp-in");
        assert_eq!(out_suffixed("temp"), "temp-out");
    }

    #[test]
    fn talent_qualified_names() {
        assert_eq!(in_name("t1", "temp"), "t1.temp-in");
        assert_eq!(out_name("t1", "temp"), "t1.temp-out");
    }

    #[test]
    fn fully_qualified_names() {
        assert_eq!(in_name_typed("fridge", "t1", "temp"), "fridge.t1.temp-in");
        assert_eq!(out_name_typed("fridge", "t1", "temp"), "fridge.t1.temp-out");
    }
}
