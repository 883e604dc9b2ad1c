use rustc_hash::{FxHashMap, FxHashSet};

use super::{ExecutionErrorKind, Value};

/// The single global namespace of a run.
///
/// Every name in `constants` is also a key of `values`; removing a variable
/// removes its constant mark too.
#[derive(Debug, Clone)]
pub struct Environment {
    values: FxHashMap<String, Value>,
    constants: FxHashSet<String>,
    auto_status: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            values: FxHashMap::default(),
            constants: FxHashSet::default(),
            auto_status: true,
        }
    }

    /// Binds `name`, overwriting any previous binding. Constancy follows the
    /// latest declaration.
    pub fn declare(&mut self, name: String, value: Value, is_constant: bool) {
        if is_constant {
            self.constants.insert(name.clone());
        } else {
            self.constants.remove(&name);
        }
        self.values.insert(name, value);
    }

    pub fn ensure_assignable(&self, name: &str) -> Result<(), ExecutionErrorKind> {
        if !self.values.contains_key(name) {
            return Err(ExecutionErrorKind::UndeclaredVariable(name.to_string()));
        }
        if self.constants.contains(name) {
            return Err(ExecutionErrorKind::ConstantReassignment(name.to_string()));
        }
        Ok(())
    }

    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), ExecutionErrorKind> {
        self.ensure_assignable(name)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Missing names read as `undefined`.
    pub fn get(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or(Value::Undefined)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains(name)
    }

    /// Returns whether `name` was constant.
    pub fn unconst(&mut self, name: &str) -> bool {
        self.constants.remove(name)
    }

    /// Returns whether `name` was bound.
    pub fn banish(&mut self, name: &str) -> bool {
        self.constants.remove(name);
        self.values.remove(name).is_some()
    }

    pub fn auto_status(&self) -> bool {
        self.auto_status
    }

    pub fn toggle_auto_status(&mut self) -> bool {
        self.auto_status = !self.auto_status;
        self.auto_status
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn text(s: &str) -> Value {
        Value::String(s.to_string())
    }

    #[test]
    fn test_redeclaration_tracks_latest_constancy() {
        let mut env = Environment::new();
        env.declare("a".to_string(), text("1"), true);
        assert!(matches!(
            env.assign("a", text("2")),
            Err(ExecutionErrorKind::ConstantReassignment(_))
        ));

        env.declare("a".to_string(), text("3"), false);
        assert!(env.assign("a", text("4")).is_ok());
        assert_eq!(env.get("a"), text("4"));
    }

    #[test]
    fn test_assign_undeclared() {
        let mut env = Environment::new();
        assert!(matches!(
            env.assign("nope", Value::Null),
            Err(ExecutionErrorKind::UndeclaredVariable(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_banish_removes_constant_mark() {
        let mut env = Environment::new();
        env.declare("a".to_string(), text("1"), true);
        assert!(env.banish("a"));
        assert!(!env.contains("a"));
        assert!(!env.is_constant("a"));
        assert_eq!(env.get("a"), Value::Undefined);
        assert!(!env.banish("a"));
    }

    #[test]
    fn test_unconst_and_toggle() {
        let mut env = Environment::new();
        env.declare("a".to_string(), text("1"), true);
        assert!(env.unconst("a"));
        assert!(!env.unconst("a"));
        assert!(env.assign("a", text("2")).is_ok());

        assert!(env.auto_status());
        assert!(!env.toggle_auto_status());
        assert!(env.toggle_auto_status());
    }
}
