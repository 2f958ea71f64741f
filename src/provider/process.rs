use crate::core::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("process '{process}' failed: {message}")]
pub struct ProcessError {
    pub process: String,
    pub message: String,
}

/// Callable exposed by the scripting layer.
pub trait Process: Send + Sync {
    fn name(&self) -> &str;

    fn invoke(&self, args: &[Value]) -> Result<Value, ProcessError>;
}

/// Registry of processes maintained outside the compiler.
pub trait Processes: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Process>>;

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }
}

type Handler = dyn Fn(&[Value]) -> Result<Value, ProcessError> + Send + Sync;

/// Process implemented by a closure.
pub struct FnProcess {
    name: String,
    handler: Box<Handler>,
}

impl FnProcess {
    pub fn new<F>(name: &str, handler: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ProcessError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            handler: Box::new(handler),
        }
    }
}

impl Process for FnProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, args: &[Value]) -> Result<Value, ProcessError> {
        (self.handler)(args)
    }
}

/// In-process process table.
#[derive(Default, Clone)]
pub struct ProcessTable {
    handlers: HashMap<String, Arc<dyn Process>>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a process that echoes its arguments back as an array.
    pub fn with(mut self, name: &str) -> Self {
        self.register_fn(name, |args| Ok(Value::Array(args.to_vec())));
        self
    }

    pub fn register(&mut self, process: Arc<dyn Process>) {
        self.handlers.insert(process.name().to_string(), process);
    }

    pub fn register_fn<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&[Value]) -> Result<Value, ProcessError> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnProcess::new(name, handler)));
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Processes for ProcessTable {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Process>> {
        self.handlers.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_invoke() {
        let mut table = ProcessTable::new().with("scripts.echo.Run");
        table.register_fn("scripts.fail.Run", |_| {
            Err(ProcessError {
                process: "scripts.fail.Run".into(),
                message: "boom".into(),
            })
        });

        let echo = table.resolve("scripts.echo.Run").unwrap();
        assert_eq!(
            echo.invoke(&[Value::from("a")]).unwrap(),
            Value::Array(vec![Value::from("a")])
        );
        let err = table.resolve("scripts.fail.Run").unwrap().invoke(&[]).unwrap_err();
        assert_eq!(err.to_string(), "process 'scripts.fail.Run' failed: boom");
        assert!(!table.exists("scripts.none.Run"));
        assert_eq!(table.names(), vec!["scripts.echo.Run", "scripts.fail.Run"]);
    }
}
