//! Collects RSS, Atom, Substack and Nitter feeds into a dated, deduplicated
//! CSV snapshot.
//!
//! A run reads the YAML feed list ([`config`]), expands it into ordered
//! sources and fetches each one ([`feed`]), normalizes and dedupes the
//! entries ([`harvest`]), and writes `news_raw_{date}.csv` ([`storage`]).

pub mod config;
pub mod feed;
pub mod harvest;
pub mod storage;
pub mod util;
