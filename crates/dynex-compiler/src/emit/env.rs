//! Invocation environments.
//!
//! The root environment holds the declared parameter values of one
//! invocation. Every lambda call pushes a child holding its arguments, with
//! the environment the lambda was created in as parent.

use std::sync::Arc;

use dynex_core::Value;

#[derive(Debug)]
pub struct Env {
    values: Vec<Value>,
    parent: Option<Arc<Env>>,
}

impl Env {
    pub fn root(values: Vec<Value>) -> Arc<Env> {
        Arc::new(Self { values, parent: None })
    }

    pub fn child(parent: &Arc<Env>, values: Vec<Value>) -> Arc<Env> {
        Arc::new(Self {
            values,
            parent: Some(Arc::clone(parent)),
        })
    }

    fn frame(&self, depth: usize) -> &Env {
        let mut env = self;
        for _ in 0..depth {
            match &env.parent {
                Some(parent) => env = parent,
                None => break,
            }
        }
        env
    }

    /// Lambda argument `index` of the frame `depth` levels out.
    pub fn lambda_var(&self, depth: usize, index: usize) -> Value {
        self.frame(depth).values.get(index).cloned().unwrap_or(Value::Null)
    }

    /// Declared parameter `index`, read from a point `depth` frames deep.
    pub fn parameter(&self, depth: usize, index: usize) -> Value {
        self.lambda_var(depth, index)
    }
}
