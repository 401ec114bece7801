//! Fan feed entries out to the targets configured for each package.
//!
//! The watchlist is owned by the caller and passed in; there is no global
//! registry. Targets run one after another, so two targets never write the
//! same file at the same time within a run.

use std::collections::BTreeMap;

use serde::Serialize;

use bumpwatch_config::{TargetConfig, TargetKind, WatchConfig};

use crate::feed::{FeedEntry, FeedError};
use crate::targets::{Notification, NotificationTarget, NotifyError, TargetOutcome};

pub struct Dispatcher<'a> {
    config: &'a WatchConfig,
    targets: BTreeMap<TargetKind, Box<dyn NotificationTarget>>,
}

/// One target invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub package: String,
    pub version: String,
    /// `repo@branch:file`
    pub target: String,
    pub kind: TargetKind,
    #[serde(flatten)]
    pub outcome: DeliveryOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DeliveryOutcome {
    Done(TargetOutcome),
    Failed { error: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    /// Items in the feed, parseable or not.
    pub entries: usize,
    /// Items skipped because they could not be parsed.
    pub malformed: usize,
    /// Entries for packages nobody watches.
    pub ignored: usize,
    pub deliveries: Vec<Delivery>,
}

impl DispatchReport {
    pub fn failures(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|d| matches!(d.outcome, DeliveryOutcome::Failed { .. }))
            .count()
    }

    pub fn committed(&self) -> usize {
        self.count(|o| matches!(o, TargetOutcome::Committed { .. }))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, TargetOutcome::Rejected { .. }))
    }

    fn count(&self, pred: impl Fn(&TargetOutcome) -> bool) -> usize {
        self.deliveries
            .iter()
            .filter(|d| matches!(&d.outcome, DeliveryOutcome::Done(o) if pred(o)))
            .count()
    }
}

impl<'a> Dispatcher<'a> {
    pub fn new(config: &'a WatchConfig) -> Self {
        Self {
            config,
            targets: BTreeMap::new(),
        }
    }

    /// Handle every configured target of `kind` with `target`.
    pub fn register(&mut self, kind: TargetKind, target: Box<dyn NotificationTarget>) -> &mut Self {
        self.targets.insert(kind, target);
        self
    }

    pub fn dispatch(&self, entries: Vec<Result<FeedEntry, FeedError>>) -> DispatchReport {
        let mut report = DispatchReport {
            entries: entries.len(),
            ..DispatchReport::default()
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping feed item");
                    report.malformed += 1;
                    continue;
                }
            };

            let configured = self.config.targets_for(&entry.name);
            if configured.is_empty() {
                tracing::trace!(package = %entry.name, "not watched");
                report.ignored += 1;
                continue;
            }

            for target in configured {
                report.deliveries.push(self.deliver(&entry, target));
            }
        }

        report
    }

    fn deliver(&self, entry: &FeedEntry, config: &TargetConfig) -> Delivery {
        let notification = Notification {
            name: entry.name.clone(),
            version: entry.version.clone(),
            released_on: entry.released_on,
            target: config.clone(),
        };

        let result = match self.targets.get(&config.kind) {
            Some(target) => target.notify(&notification),
            None => Err(NotifyError::Unregistered(config.kind)),
        };

        let outcome = match result {
            Ok(outcome) => DeliveryOutcome::Done(outcome),
            Err(e) => {
                tracing::warn!(
                    package = %entry.name,
                    version = %entry.version,
                    target_file = %config,
                    error = %e,
                    "target failed"
                );
                DeliveryOutcome::Failed { error: e.to_string() }
            }
        };

        Delivery {
            package: entry.name.clone(),
            version: entry.version.clone(),
            target: config.to_string(),
            kind: config.kind,
            outcome,
        }
    }
}
