//! A scripted [`CommandRunner`] for tests.

use crate::exec::{CommandRunner, Error, Invocation, Output};
use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex},
};

type Matcher = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

#[derive(Debug, Clone)]
pub enum Response {
    Output(Output),
    /// The program could not be started at all.
    SpawnError(io::ErrorKind),
    /// Panics inside `run`, to simulate a bug somewhere in the workflow.
    Panic(String),
}

struct Rule {
    matcher: Matcher,
    /// The last response repeats once the others are used up.
    responses: VecDeque<Response>,
}

impl Rule {
    fn next(&mut self) -> Response {
        if self.responses.len() > 1 {
            self.responses
                .pop_front()
                .unwrap_or_else(|| Response::Output(Output::success("")))
        } else {
            self.responses
                .front()
                .cloned()
                .unwrap_or_else(|| Response::Output(Output::success("")))
        }
    }
}

#[derive(Default)]
struct Inner {
    rules: Vec<Rule>,
    calls: Vec<Invocation>,
}

/// Records every invocation and answers with scripted responses. The first
/// matching rule wins; invocations no rule matches succeed with empty output.
#[derive(Default, Clone)]
pub struct FakeRunner {
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for FakeRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeRunner").finish_non_exhaustive()
    }
}

/// Matches invocations of the given program.
pub fn program(name: &'static str) -> impl Fn(&Invocation) -> bool + Send + Sync + 'static {
    move |inv| inv.program == name
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // a panicking Response poisons nothing, the lock is released first
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn on<F>(&self, matcher: F, output: Output)
    where
        F: Fn(&Invocation) -> bool + Send + Sync + 'static,
    {
        self.on_sequence(matcher, vec![Response::Output(output)]);
    }

    pub fn on_sequence<F>(&self, matcher: F, responses: Vec<Response>)
    where
        F: Fn(&Invocation) -> bool + Send + Sync + 'static,
    {
        self.lock().rules.push(Rule {
            matcher: Box::new(matcher),
            responses: responses.into(),
        });
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.lock().calls.clone()
    }

    pub fn count(&self, matcher: impl Fn(&Invocation) -> bool) -> usize {
        self.lock().calls.iter().filter(|inv| matcher(inv)).count()
    }
}

#[async_trait::async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> Result<Output, Error> {
        let response = {
            let mut inner = self.lock();
            inner.calls.push(invocation.clone());
            inner
                .rules
                .iter_mut()
                .find(|rule| (rule.matcher)(invocation))
                .map(Rule::next)
        };

        match response {
            None => Ok(Output::success("")),
            Some(Response::Output(output)) => Ok(output),
            Some(Response::SpawnError(kind)) => Err(Error::FailedToStart {
                program: invocation.program.clone(),
                source: io::Error::new(kind, "scripted spawn failure"),
            }),
            Some(Response::Panic(message)) => panic!("{}", message),
        }
    }
}
