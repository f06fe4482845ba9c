// ABOUTME: Environment module for managing variable bindings and scopes

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new global environment with no parent
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment with a parent
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Defines a binding in THIS scope (doesn't walk parent chain)
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Looks up a symbol in THIS scope and parent scopes recursively
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }

        if let Some(ref parent) = self.parent {
            return parent.get(name);
        }

        None
    }

    /// Updates an existing binding in the nearest enclosing scope that
    /// defines it. Returns `false` if no scope in the chain defines `name`.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return true;
        }

        if let Some(ref parent) = self.parent {
            return parent.assign(name, value);
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let env = Environment::new();
        env.define("x", Value::Number(42.0));

        match env.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 42.0),
            _ => panic!("Expected Number(42.0)"),
        }
    }

    #[test]
    fn test_undefined_symbol() {
        let env = Environment::new();
        assert!(env.get("undefined").is_none());
    }

    #[test]
    fn test_shadowing() {
        let parent = Environment::new();
        parent.define("x", Value::Number(42.0));

        let child = Environment::with_parent(parent);
        child.define("x", Value::Number(100.0));

        match child.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 100.0),
            _ => panic!("Expected Number(100.0)"),
        }
    }

    #[test]
    fn test_parent_lookup() {
        let parent = Environment::new();
        parent.define("x", Value::Number(42.0));

        let child = Environment::with_parent(parent);

        match child.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 42.0),
            _ => panic!("Expected Number(42.0)"),
        }
    }

    #[test]
    fn test_multiple_levels() {
        let grandparent = Environment::new();
        grandparent.define("a", Value::Number(1.0));

        let parent = Environment::with_parent(grandparent);
        parent.define("b", Value::Number(2.0));

        let child = Environment::with_parent(parent);
        child.define("c", Value::Number(3.0));

        match child.get("a") {
            Some(Value::Number(n)) => assert_eq!(n, 1.0),
            _ => panic!("Expected Number(1.0)"),
        }
        match child.get("b") {
            Some(Value::Number(n)) => assert_eq!(n, 2.0),
            _ => panic!("Expected Number(2.0)"),
        }
        match child.get("c") {
            Some(Value::Number(n)) => assert_eq!(n, 3.0),
            _ => panic!("Expected Number(3.0)"),
        }
    }

    #[test]
    fn test_assign_updates_enclosing_scope() {
        let parent = Environment::new();
        parent.define("x", Value::Number(1.0));
        let child = Environment::with_parent(parent.clone());

        assert!(child.assign("x", Value::Number(2.0)));
        match parent.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 2.0),
            _ => panic!("Expected Number(2.0)"),
        }
    }

    #[test]
    fn test_assign_undefined_fails() {
        let env = Environment::new();
        assert!(!env.assign("missing", Value::Nil));
    }
}
