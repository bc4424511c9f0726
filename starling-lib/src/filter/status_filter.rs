//! Keyword filters, applied after visibility and mutes. Each filter owns
//! regex patterns and an action per context; a hide action removes the
//! status entirely, warn actions are returned to the client as a badge.

use super::VisContext;
use crate::error::Error;
use crate::globals::GLOBALS;
use crate::model::{Account, FilterResult, Id, Status, StatusesPolicy};
use dashmap::DashMap;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    Warn,
    Hide,
}

#[derive(Debug, Clone)]
pub struct KeywordFilter {
    pub id: Id,
    pub account_id: Id,
    pub title: String,
    pub contexts: Vec<VisContext>,
    pub action: FilterAction,
    /// Regex patterns, matched case-insensitively against content and
    /// content warning.
    pub keywords: Vec<String>,
}

struct CompiledFilter {
    filter: KeywordFilter,
    regexes: Vec<Regex>,
}

/// Per-account keyword filter registry.
pub struct StatusFilters {
    filters: DashMap<Id, Vec<CompiledFilter>>,
}

impl Default for StatusFilters {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusFilters {
    pub(crate) fn new() -> StatusFilters {
        StatusFilters {
            filters: DashMap::new(),
        }
    }

    /// Register a filter. Patterns are compiled here so a bad regex is
    /// rejected at creation time, not at apply time.
    pub fn add(&self, filter: KeywordFilter) -> Result<(), Error> {
        let mut regexes = Vec::with_capacity(filter.keywords.len());
        for keyword in &filter.keywords {
            regexes.push(Regex::new(&format!("(?i){keyword}"))?);
        }
        self.filters
            .entry(filter.account_id)
            .or_default()
            .push(CompiledFilter { filter, regexes });
        Ok(())
    }

    pub fn remove(&self, account_id: Id, filter_id: Id) {
        if let Some(mut filters) = self.filters.get_mut(&account_id) {
            filters.retain(|c| c.filter.id != filter_id);
        }
    }

    /// Apply every applicable filter. Returns the warn results plus
    /// whether any filter hides the status outright.
    pub async fn apply(
        &self,
        viewer: Option<&Account>,
        status: &Status,
        ctx: VisContext,
    ) -> Result<(Vec<FilterResult>, bool), Error> {
        let mut results: Vec<FilterResult> = Vec::new();
        let mut hide = false;

        if let Some(viewer) = viewer {
            if let Some(filters) = self.filters.get(&viewer.id) {
                for compiled in filters.iter() {
                    if !compiled.filter.contexts.contains(&ctx) {
                        continue;
                    }
                    let mut matches: Vec<String> = Vec::new();
                    for regex in &compiled.regexes {
                        for text in [&status.content, &status.content_warning] {
                            if let Some(m) = regex.find(text) {
                                let hit = m.as_str().to_owned();
                                if !matches.contains(&hit) {
                                    matches.push(hit);
                                }
                            }
                        }
                    }
                    if matches.is_empty() {
                        continue;
                    }
                    match compiled.filter.action {
                        FilterAction::Hide => hide = true,
                        FilterAction::Warn => results.push(FilterResult {
                            title: compiled.filter.title.clone(),
                            keyword_matches: matches,
                        }),
                    }
                }
            }
        }

        // Domain-limit statuses policy acts as an implicit filter.
        let author = GLOBALS.store().get_account_by_id(status.account_id).await?;
        if !author.is_local() {
            if let Some(limit) = GLOBALS.domain_limits.match_domain(&author.domain).await? {
                match limit.statuses_policy {
                    StatusesPolicy::NoAction => {}
                    StatusesPolicy::FilterWarn => results.push(FilterResult {
                        title: limit
                            .content_warning
                            .clone()
                            .unwrap_or_else(|| format!("limited domain: {}", limit.domain)),
                        keyword_matches: Vec::new(),
                    }),
                    StatusesPolicy::FilterHide => hide = true,
                }
            }
        }

        Ok((results, hide))
    }
}
