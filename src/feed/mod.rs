//! Feed sources, retrieval and parsing.
//!
//! - [`sources`] - flattens the YAML feed list into ordered [`SourceSpec`]s
//! - [`fetcher`] - bounded HTTP retrieval with Nitter mirror fallback
//! - [`parser`] - RSS/Atom parsing through `feed-rs`, with one repair pass
//!   that salvages the complete items of a truncated document
//!
//! # Example
//!
//! ```ignore
//! use crate::feed::{expand_sources, parse_feed, Fetcher};
//!
//! let sources = expand_sources(&config);
//! let fetcher = Fetcher::new(config.nitter_mirrors.clone(), DEFAULT_TIMEOUT)?;
//! let fetched = fetcher.fetch(&sources[0]).await?;
//! let parsed = parse_feed(&fetched.body, 50)?;
//! ```

mod fetcher;
mod parser;
mod sources;

pub use fetcher::{FetchError, FetchedFeed, Fetcher, MirrorFailure, DEFAULT_TIMEOUT, USER_AGENT};
pub use parser::{parse_feed, repair_truncated, ParseError, ParsedFeed, RawEntry};
pub use sources::{expand_sources, mirror_rss_url, SourceSpec, TWITTER_CATEGORY};
