//! Console command patterns and handlers.

use super::{CommandError, EventBus};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether a console command claims an input line.
#[derive(Clone)]
pub enum ConsoleMatcher {
    /// Matches when the input equals one of the listed strings.
    Exact(Vec<String>),
    /// Matches when the predicate returns `true` for the input.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl ConsoleMatcher {
    /// Creates a matcher for one or more exact input strings.
    #[must_use]
    pub fn exact<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exact(patterns.into_iter().map(Into::into).collect())
    }

    /// Creates a matcher from an arbitrary predicate.
    #[must_use]
    pub fn predicate(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(predicate))
    }

    /// Matches the bare `word` or any input beginning with `"word "`.
    #[must_use]
    pub fn word(word: impl Into<String>) -> Self {
        let bare = word.into();
        let prefix = format!("{bare} ");
        Self::predicate(move |input| input == bare || input.starts_with(&prefix))
    }

    /// Returns whether the matcher claims `input`.
    #[must_use]
    pub fn matches(&self, input: &str) -> bool {
        match self {
            Self::Exact(patterns) => patterns.iter().any(|pattern| pattern == input),
            Self::Predicate(predicate) => predicate(input),
        }
    }
}

impl fmt::Debug for ConsoleMatcher {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(patterns) => formatter.debug_tuple("Exact").field(patterns).finish(),
            Self::Predicate(_) => formatter.write_str("Predicate(..)"),
        }
    }
}

/// Handler processing a console input line claimed by its matcher.
#[async_trait]
pub trait ConsoleHandler: Send + Sync {
    /// Processes the input and returns text for the console.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the command fails.
    async fn process(&self, bus: &EventBus, input: &str) -> Result<String, CommandError>;
}

/// A console command registration: matcher plus handler.
#[derive(Clone)]
pub struct ConsoleCommand {
    matcher: ConsoleMatcher,
    handler: Arc<dyn ConsoleHandler>,
}

impl ConsoleCommand {
    /// Creates a console command.
    #[must_use]
    pub fn new(matcher: ConsoleMatcher, handler: Arc<dyn ConsoleHandler>) -> Self {
        Self { matcher, handler }
    }

    /// Returns the matcher.
    #[must_use]
    pub const fn matcher(&self) -> &ConsoleMatcher {
        &self.matcher
    }

    /// Returns whether this command claims `input`.
    #[must_use]
    pub fn matches(&self, input: &str) -> bool {
        self.matcher.matches(input)
    }

    pub(super) fn handler(&self) -> Arc<dyn ConsoleHandler> {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for ConsoleCommand {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ConsoleCommand")
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}
