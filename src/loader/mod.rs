//! Resilient content loading.
//!
//! A load walks a strict fallback chain and always produces renderable
//! content:
//!
//! 1. the backend content API (filters applied, bounded by the query timeout)
//! 2. the kind's static asset (no filters)
//! 3. the built-in default set (`partial = true`)
//!
//! The first tier yielding a non-empty, well-formed collection wins. Errors
//! are logged and absorbed here; nothing past this boundary sees them.

mod normalize;
mod sequence;
mod source;

use std::marker::PhantomData;
use std::sync::Arc;

pub use normalize::{Payload, normalize};
pub use sequence::{QuerySequencer, Sequenced, Ticket};
pub use source::{ContentSource, RemoteSource, StaticAssetSource, StaticRoot};

use crate::error::{AppError, Result};
use crate::models::{
    Career, Config, Content, ContentItem, ContentKind, ContentQuery, InterviewQuestion,
    LoadResult, PracticeProblem, Resource, Source,
};
use crate::utils::http::create_async_client;

/// Generic fallback-chain loader for one content kind.
pub struct ContentLoader<T: Content> {
    remote: Arc<dyn ContentSource>,
    fallback: Arc<dyn ContentSource>,
    empty_remote_is_failure: bool,
    _kind: PhantomData<fn() -> T>,
}

impl<T: Content> Clone for ContentLoader<T> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            fallback: Arc::clone(&self.fallback),
            empty_remote_is_failure: self.empty_remote_is_failure,
            _kind: PhantomData,
        }
    }
}

impl<T: Content> ContentLoader<T> {
    pub fn new(remote: Arc<dyn ContentSource>, fallback: Arc<dyn ContentSource>) -> Self {
        Self {
            remote,
            fallback,
            empty_remote_is_failure: true,
            _kind: PhantomData,
        }
    }

    /// Whether an empty but well-formed remote collection falls through.
    pub fn with_empty_remote_policy(mut self, is_failure: bool) -> Self {
        self.empty_remote_is_failure = is_failure;
        self
    }

    /// Query for this loader's kind using the configured default timeout.
    pub fn query(&self) -> ContentQuery {
        ContentQuery::new(T::KIND)
    }

    /// Run the fallback chain. Never fails.
    pub async fn load(&self, query: &ContentQuery) -> LoadResult<T> {
        let corrected;
        let query = if query.kind == T::KIND {
            query
        } else {
            log::warn!(
                "{} loader received a {} query; loading {} instead",
                T::KIND,
                query.kind,
                T::KIND
            );
            corrected = ContentQuery {
                kind: T::KIND,
                ..query.clone()
            };
            &corrected
        };

        let primary = self.remote.tier();
        match self.try_source(self.remote.as_ref(), query).await {
            Ok(items) if !items.is_empty() || !self.empty_remote_is_failure => {
                log::debug!("{}: {} items from {}", T::KIND, items.len(), primary);
                return LoadResult::from_source(items, primary);
            }
            Ok(_) => log::warn!("{}: {} returned an empty collection", T::KIND, primary),
            Err(e) if e.is_transport() => {
                log::warn!("{}: {} unreachable: {}", T::KIND, primary, e)
            }
            Err(e) => log::warn!("{}: {} load failed: {}", T::KIND, primary, e),
        }

        let secondary = self.fallback.tier();
        match self.try_source(self.fallback.as_ref(), query).await {
            Ok(items) if !items.is_empty() => {
                log::info!(
                    "{}: serving {} items from {}",
                    T::KIND,
                    items.len(),
                    secondary
                );
                return LoadResult::from_source(items, secondary);
            }
            Ok(_) => log::warn!("{}: {} is empty", T::KIND, secondary),
            Err(e) => log::warn!("{}: {} failed: {}", T::KIND, secondary, e),
        }

        let items = T::builtin_defaults();
        log::warn!(
            "{}: serving {} built-in default items",
            T::KIND,
            items.len()
        );
        LoadResult::from_source(items, Source::BuiltInDefault)
    }

    async fn try_source(&self, source: &dyn ContentSource, query: &ContentQuery) -> Result<Vec<T>> {
        let value = source.fetch(query).await?;
        normalize::<T>(value)
    }
}

/// One loader per content kind, dispatched at runtime.
#[derive(Clone)]
pub struct Catalog {
    careers: ContentLoader<Career>,
    resources: ContentLoader<Resource>,
    practice: ContentLoader<PracticeProblem>,
    interview: ContentLoader<InterviewQuestion>,
    default_timeout: std::time::Duration,
}

impl Catalog {
    /// Share two sources across every kind.
    pub fn new(
        remote: Arc<dyn ContentSource>,
        fallback: Arc<dyn ContentSource>,
        empty_remote_is_failure: bool,
    ) -> Self {
        fn loader<T: Content>(
            remote: &Arc<dyn ContentSource>,
            fallback: &Arc<dyn ContentSource>,
            empty_is_failure: bool,
        ) -> ContentLoader<T> {
            ContentLoader::new(Arc::clone(remote), Arc::clone(fallback))
                .with_empty_remote_policy(empty_is_failure)
        }

        Self {
            careers: loader(&remote, &fallback, empty_remote_is_failure),
            resources: loader(&remote, &fallback, empty_remote_is_failure),
            practice: loader(&remote, &fallback, empty_remote_is_failure),
            interview: loader(&remote, &fallback, empty_remote_is_failure),
            default_timeout: crate::models::DEFAULT_TIMEOUT,
        }
    }

    /// Build HTTP-backed sources from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.api.timeout_ms == 0 {
            return Err(AppError::config("api.timeout_ms must be > 0"));
        }
        let client = create_async_client(&config.api)?;
        let remote = RemoteSource::new(client.clone(), config.api.base_url.clone());
        // Fail early on a base URL that can never produce a request.
        remote.request_url(&ContentQuery::new(ContentKind::Careers))?;
        let fallback =
            StaticAssetSource::new(client, StaticRoot::parse(&config.api.static_base));

        let mut catalog = Self::new(
            Arc::new(remote),
            Arc::new(fallback),
            config.loader.empty_remote_is_failure,
        );
        catalog.default_timeout = config.api.timeout();
        Ok(catalog)
    }

    /// Query for a kind with the configured timeout.
    pub fn query(&self, kind: ContentKind) -> ContentQuery {
        ContentQuery::new(kind).with_timeout(self.default_timeout)
    }

    pub fn careers(&self) -> &ContentLoader<Career> {
        &self.careers
    }

    pub fn resources(&self) -> &ContentLoader<Resource> {
        &self.resources
    }

    pub fn practice_problems(&self) -> &ContentLoader<PracticeProblem> {
        &self.practice
    }

    pub fn interview_prep(&self) -> &ContentLoader<InterviewQuestion> {
        &self.interview
    }

    /// Load any kind, erasing the record type.
    pub async fn load(&self, query: &ContentQuery) -> LoadResult<ContentItem> {
        match query.kind {
            ContentKind::Careers => self.careers.load(query).await.map(Content::into_item),
            ContentKind::Resources => self.resources.load(query).await.map(Content::into_item),
            ContentKind::PracticeProblems => {
                self.practice.load(query).await.map(Content::into_item)
            }
            ContentKind::InterviewPrep => {
                self.interview.load(query).await.map(Content::into_item)
            }
        }
    }

    /// Load unless a newer query supersedes this one first.
    ///
    /// Returns `None` when the ticket was superseded, in which case the
    /// in-flight requests are dropped.
    pub async fn load_latest(
        &self,
        mut ticket: Ticket,
        query: &ContentQuery,
    ) -> Option<Sequenced<LoadResult<ContentItem>>> {
        let seq = ticket.seq();
        let result = tokio::select! {
            result = self.load(query) => result,
            _ = ticket.superseded() => {
                log::debug!("Query #{seq} superseded; abandoning in-flight load");
                return None;
            }
        };
        ticket.is_current().then(|| ticket.stamp(result))
    }
}
