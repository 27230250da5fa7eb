//! `Callee` — a handle to a remote function a talent intends to call (spec §3).

use crate::feature::in_name_typed;

/// A callable remote function: `(talent-id, function-name, type)`.
///
/// Equality ignores the `registered` flag — two callees naming the same
/// `(talent_id, func, type)` are the same callee regardless of whether the
/// platform currently has the function registered. `registered` exists for
/// wire/API parity with the original SDK; this runtime never flips it
/// automatically (see DESIGN.md).
#[derive(Debug, Clone)]
pub struct Callee {
    talent_id: String,
    func: String,
    r#type: String,
    registered: bool,
}

impl Callee {
    /// Construct a new, not-yet-registered callee.
    pub fn new(talent_id: impl Into<String>, func: impl Into<String>, r#type: impl Into<String>) -> Self {
        Self {
            talent_id: talent_id.into(),
            func: func.into(),
            r#type: r#type.into(),
            registered: false,
        }
    }

    /// The id of the talent providing the function.
    pub fn talent_id(&self) -> &str {
        &self.talent_id
    }

    /// The name of the callable function.
    pub fn func(&self) -> &str {
        &self.func
    }

    /// The type associated with the function.
    pub fn r#type(&self) -> &str {
        &self.r#type
    }

    /// Whether the platform currently reports this function as registered.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Mark this callee as currently registered (or not) by the platform.
    pub fn set_registered(&mut self, registered: bool) {
        self.registered = registered;
    }

    /// The feature name providing this function call: `<talent_id>.<func>-in`.
    pub fn feature(&self) -> String {
        in_name_typed(&self.r#type, &self.talent_id, &self.func)
    }
}

impl PartialEq for Callee {
    fn eq(&self, other: &Self) -> bool {
        self.talent_id == other.talent_id && self.func == other.func && self.r#type == other.r#type
    }
}

impl Eq for Callee {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_registered_flag() {
        let mut a = Callee::new("t1", "echo", "default");
        let b = Callee::new("t1", "echo", "default");
        assert_eq!(a, b);
        a.set_registered(true);
        assert_eq!(a, b);
    }

    #[test]
    fn inequality_on_any_other_field() {
        let a = Callee::new("t1", "echo", "default");
        let b = Callee::new("t2", "echo", "default");
        assert_ne!(a, b);
    }

    #[test]
    fn feature_name_is_fully_qualified() {
        let c = Callee::new("t1", "echo", "default");
        assert_eq!(c.feature(), "default.t1.echo-in");
    }
}
