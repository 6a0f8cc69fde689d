//! Search state for interactive front ends.
//!
//! Remembers the previous identifier and whether it was fetched successfully,
//! so an identical follow-up can be skipped or flagged as a retry.

use crate::lookup::{Lookup, LookupError, Resolver};
use crate::models::ModelIdentifier;
use crate::relay::ErrorEnvelope;

/// What to do with a new query given the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Fresh,
    Retry,
    AlreadyFetched,
}

#[derive(Debug)]
pub enum SearchOutcome {
    Fetched(Box<Lookup>),
    /// Same identifier as the last successful search; nothing was sent
    AlreadyFetched(ModelIdentifier),
    Failed(ErrorEnvelope),
}

#[derive(Debug, Default)]
pub struct SearchSession {
    last: Option<ModelIdentifier>,
    last_succeeded: bool,
}

impl SearchSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn decide(&self, id: &ModelIdentifier) -> Decision {
        match &self.last {
            Some(last) if last == id && self.last_succeeded => Decision::AlreadyFetched,
            Some(last) if last == id => Decision::Retry,
            _ => Decision::Fresh,
        }
    }

    pub fn record(&mut self, id: ModelIdentifier, succeeded: bool) {
        self.last = Some(id);
        self.last_succeeded = succeeded;
    }

    #[must_use]
    pub fn last(&self) -> Option<&ModelIdentifier> {
        self.last.as_ref()
    }

    /// Run one search through `resolver`, applying the duplicate and retry rules
    ///
    /// Inputs that fail validation are reported but do not replace the last query.
    pub async fn search(&mut self, resolver: &Resolver, input: &str) -> SearchOutcome {
        let id = match ModelIdentifier::parse(input) {
            Ok(id) => id,
            Err(e) => return SearchOutcome::Failed(LookupError::Validation(e).to_envelope()),
        };

        let decision = self.decide(&id);
        match decision {
            Decision::AlreadyFetched => {
                tracing::info!("{id} was already fetched successfully");
                return SearchOutcome::AlreadyFetched(id);
            }
            Decision::Retry => tracing::warn!("Retrying {id}, which failed previously"),
            Decision::Fresh => {}
        }

        let outcome = match resolver.fetch(input).await {
            Ok(lookup) => SearchOutcome::Fetched(Box::new(lookup)),
            Err(e) => {
                let envelope = e.to_envelope();
                SearchOutcome::Failed(if decision == Decision::Retry {
                    envelope.as_retry()
                } else {
                    envelope
                })
            }
        };

        self.record(id, matches!(outcome, SearchOutcome::Fetched(_)));
        outcome
    }
}
