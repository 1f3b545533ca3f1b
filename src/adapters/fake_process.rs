// Scripted process port for adapter unit tests

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::ports::*;

type Handler = Box<dyn Fn(&Invocation) -> Result<ProcessOutput, DomainError> + Send + Sync>;

/// Process port answering from a closure and recording every call
pub struct FakeProcess {
    calls: Mutex<Vec<Invocation>>,
    handler: Handler,
}

impl FakeProcess {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Invocation) -> Result<ProcessOutput, DomainError> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        }
    }

    /// Always exit with `code`, printing `stdout`
    pub fn replying(code: i32, stdout: &str) -> Self {
        let stdout = stdout.to_string();
        Self::new(move |_| {
            Ok(ProcessOutput {
                code: Some(code),
                stdout: stdout.clone(),
                stderr: String::new(),
            })
        })
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessPort for FakeProcess {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, DomainError> {
        self.calls.lock().unwrap().push(invocation.clone());
        (self.handler)(invocation)
    }
}
