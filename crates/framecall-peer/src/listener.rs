use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

/// Error returned by a method handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ListenerError(String);

impl ListenerError {
    /// Create a listener error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<String> for ListenerError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for ListenerError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<serde_json::Error> for ListenerError {
    fn from(err: serde_json::Error) -> Self {
        Self(err.to_string())
    }
}

/// Result of a single method invocation.
pub type HandlerResult = std::result::Result<(), ListenerError>;

/// A receiver of inbound calls that implements some subset of methods.
///
/// Dispatch first asks [`Listener::implements`]; only listeners that answer
/// `true` are invoked. Handlers take `&self`; listeners that keep state use
/// interior mutability.
pub trait Listener {
    /// Whether this listener has a handler for `method`.
    fn implements(&self, method: &str) -> bool;

    /// Invoke the handler for `method` with positional arguments.
    fn invoke(&self, method: &str, args: &[Value]) -> HandlerResult;
}

type Handler = Box<dyn Fn(&[Value]) -> HandlerResult>;

/// A listener built from a table of named closures.
///
/// ```
/// use framecall_peer::MethodTable;
///
/// let table = MethodTable::new()
///     .on("greet", |args| {
///         println!("hello {}", args[0]);
///         Ok(())
///     });
/// ```
#[derive(Default)]
pub struct MethodTable {
    handlers: HashMap<String, Handler>,
}

impl MethodTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the handler for `method`.
    pub fn on<F>(mut self, method: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[Value]) -> HandlerResult + 'static,
    {
        self.handlers.insert(method.into(), Box::new(handler));
        self
    }

    /// Method names in this table, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }
}

impl Listener for MethodTable {
    fn implements(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    fn invoke(&self, method: &str, args: &[Value]) -> HandlerResult {
        match self.handlers.get(method) {
            Some(handler) => handler(args),
            None => Err(ListenerError::new(format!("no handler for {method}"))),
        }
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("methods", &self.methods())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;

    #[test]
    fn table_dispatches_by_name() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let table = MethodTable::new()
            .on("greet", move |args| {
                sink.borrow_mut().push(args.to_vec());
                Ok(())
            })
            .on("fail", |_| Err("boom".into()));

        assert!(table.implements("greet"));
        assert!(!table.implements("missing"));
        assert_eq!(table.methods(), vec!["fail", "greet"]);

        table.invoke("greet", &[json!("Alice")]).unwrap();
        assert_eq!(seen.borrow().as_slice(), &[vec![json!("Alice")]]);
        assert_eq!(
            table.invoke("fail", &[]),
            Err(ListenerError::new("boom"))
        );
        assert!(table.invoke("missing", &[]).is_err());
    }
}
