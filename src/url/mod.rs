//! URL handling module for Corpus-Harvest
//!
//! This module provides domain extraction, allowed-domain matching, link
//! resolution, and the scope policy that decides which URLs are harvested.

mod domain;
mod matcher;
mod policy;
mod resolve;

pub use domain::{domain_of, extract_domain};
pub use matcher::{matches_any_domain, matches_domain};
pub use policy::{PolicyDecision, ScopePolicy};
pub use resolve::{looks_like_file, resolve_link};
