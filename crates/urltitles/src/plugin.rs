//! Message handler and its builder

use crate::client::{FetchOptions, Fetcher};
use crate::collaborators::{LopdfInspector, PdfInspector, VideoLookup, YouTubeLookup};
use crate::error::FetchError;
use crate::message::{extract_urls, ChatMessage};
use crate::summarizer::Summarizer;
use crate::transport::{HttpTransport, Transport};
use crate::DEFAULT_IGNORES;
use async_trait::async_trait;
use reqwest::cookie::Jar;
use std::sync::Arc;
use tracing::{debug, info};

/// Something that answers chat messages
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Replies for `message`, in order; empty when nothing applies
    async fn handle(&self, message: &ChatMessage) -> Vec<String>;
}

/// Which messages get replies
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Nick fragments to ignore, lowercased; matched as substrings
    pub ignore_nicks: Vec<String>,
    /// Reply to channel messages only
    pub channels_only: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            ignore_nicks: DEFAULT_IGNORES.iter().map(|s| s.to_string()).collect(),
            channels_only: true,
        }
    }
}

/// Replies to pasted URLs with a one-line summary each
pub struct UrlTitles {
    summarizer: Summarizer,
    options: DispatchOptions,
}

impl UrlTitles {
    pub fn new(summarizer: Summarizer, mut options: DispatchOptions) -> Self {
        for nick in &mut options.ignore_nicks {
            *nick = nick.to_lowercase();
        }
        Self {
            summarizer,
            options,
        }
    }

    /// Create a builder with the default collaborators
    pub fn builder() -> UrlTitlesBuilder {
        UrlTitlesBuilder::new()
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    fn is_ignored(&self, nick: &str) -> bool {
        let nick = nick.to_lowercase();
        self.options
            .ignore_nicks
            .iter()
            .any(|ignored| nick.contains(ignored.as_str()))
    }
}

#[async_trait]
impl MessageHandler for UrlTitles {
    async fn handle(&self, message: &ChatMessage) -> Vec<String> {
        let Some(nick) = message.nick.as_deref() else {
            return Vec::new();
        };
        if self.is_ignored(nick) {
            debug!(nick = %nick, "Ignoring message from ignored nick");
            return Vec::new();
        }
        if self.options.channels_only && !message.is_channel() {
            return Vec::new();
        }
        let Some(body) = message.body() else {
            return Vec::new();
        };

        let mut replies = Vec::new();
        for url in extract_urls(body) {
            info!(nick = %nick, target = %message.target, url = %url, "URL seen");
            if let Some(reply) = self.summarizer.title_for(url).await {
                replies.push(reply);
            }
        }
        replies
    }
}

/// Builder for [`UrlTitles`]
#[derive(Default)]
pub struct UrlTitlesBuilder {
    fetch_options: FetchOptions,
    dispatch_options: DispatchOptions,
    transport: Option<Arc<dyn Transport>>,
    video_lookup: Option<Arc<dyn VideoLookup>>,
    pdf_inspector: Option<Arc<dyn PdfInspector>>,
    cookie_jar: Option<Arc<Jar>>,
}

impl UrlTitlesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the User-Agent for page and video requests
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.fetch_options.user_agent = ua.into();
        self
    }

    /// Set the attempt budget per URL
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.fetch_options.max_retries = attempts;
        self
    }

    /// Replace all fetch options
    pub fn fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }

    /// Add a nick fragment to the ignore list
    pub fn ignore_nick(mut self, nick: impl Into<String>) -> Self {
        self.dispatch_options.ignore_nicks.push(nick.into());
        self
    }

    /// Replace the ignore list
    pub fn ignore_nicks<I, S>(mut self, nicks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dispatch_options.ignore_nicks = nicks.into_iter().map(Into::into).collect();
        self
    }

    /// Also answer private messages
    pub fn allow_private_messages(mut self, allow: bool) -> Self {
        self.dispatch_options.channels_only = !allow;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn video_lookup(mut self, lookup: Arc<dyn VideoLookup>) -> Self {
        self.video_lookup = Some(lookup);
        self
    }

    pub fn pdf_inspector(mut self, inspector: Arc<dyn PdfInspector>) -> Self {
        self.pdf_inspector = Some(inspector);
        self
    }

    /// Share an existing cookie jar
    pub fn cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    /// Build the handler
    ///
    /// Collaborators not set explicitly default to the reqwest transport,
    /// the YouTube watch-page lookup and the lopdf inspector, all sharing
    /// one cookie jar.
    pub fn build(self) -> Result<UrlTitles, FetchError> {
        let jar = self.cookie_jar.unwrap_or_default();

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::with_cookie_jar(
                &self.fetch_options,
                jar.clone(),
            )?),
        };
        let video: Arc<dyn VideoLookup> = match self.video_lookup {
            Some(video) => video,
            None => Arc::new(YouTubeLookup::new(&self.fetch_options.user_agent, jar)?),
        };
        let pdf = self
            .pdf_inspector
            .unwrap_or_else(|| Arc::new(LopdfInspector::new()));

        let fetcher = Fetcher::new(transport, self.fetch_options);
        Ok(UrlTitles::new(
            Summarizer::new(fetcher, video, pdf),
            self.dispatch_options,
        ))
    }
}
