use std::{fmt::Display, future::Future, time::Duration};

/// Retries a fallible async operation a fixed number of times with a fixed
/// delay in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    max_attempts: u32,
    delay: Duration,
}

/// The final result of a retried operation and how many attempts it took.
#[derive(Debug)]
pub struct Attempted<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

impl Retry {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Retry {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub async fn run<T, E, F, Fut>(&self, what: &str, mut operation: F) -> Attempted<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(error) if attempt < self.max_attempts => {
                    tracing::warn!(
                        "{} attempt {}/{} failed, retrying in {}s ({} more attempts left): {}",
                        what,
                        attempt,
                        self.max_attempts,
                        self.delay.as_secs(),
                        self.max_attempts - attempt,
                        error
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    return Attempted {
                        result: Err(error),
                        attempts: attempt,
                    }
                }
            }
        }
    }
}
