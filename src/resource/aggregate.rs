//! Aggregating Lister
//!
//! Lists one resource type across every resource group of the subscription.
//! The group list is fetched once, each group is queried by its own spawned
//! task, and results land in a shared [`Accumulator`]. The call returns only
//! after every task has finished.
//!
//! Failure policy: a failed group never aborts its siblings. Once all tasks
//! are done, any failure turns the result into [`ArmError::GroupsFailed`],
//! which names every failed group and still carries the records of the
//! groups that succeeded.

use super::record::ResourceRecord;
use super::scope::GroupScope;
use crate::arm::error::{ArmError, ArmResult, GroupFailure};
use crate::arm::GroupEnumerator;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
struct AccumulatorState {
    records: Vec<ResourceRecord>,
    failures: Vec<GroupFailure>,
}

/// Shared result sink for the per-group workers.
///
/// Each `append` inserts a whole batch under one lock acquisition, so batches
/// from different groups never interleave.
#[derive(Default)]
pub struct Accumulator {
    state: Mutex<AccumulatorState>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every item with `group` and append the batch
    pub async fn append(&self, group: &str, items: Vec<ResourceRecord>) {
        let tagged = items.into_iter().map(|mut item| {
            item.resource_group = Some(group.to_string());
            item
        });
        let mut state = self.state.lock().await;
        state.records.extend(tagged);
    }

    pub async fn record_failure(&self, group: &str, message: String) {
        let mut state = self.state.lock().await;
        state.failures.push(GroupFailure {
            group: group.to_string(),
            message,
        });
    }

    /// Drain the collected records and failures
    async fn take(&self) -> (Vec<ResourceRecord>, Vec<GroupFailure>) {
        let mut state = self.state.lock().await;
        let state = std::mem::take(&mut *state);
        (state.records, state.failures)
    }
}

#[derive(Clone)]
pub struct AggregatingLister {
    scope: GroupScope,
    groups: Arc<dyn GroupEnumerator>,
    timeout: Option<Duration>,
}

impl AggregatingLister {
    pub fn new(scope: GroupScope, groups: Arc<dyn GroupEnumerator>) -> Self {
        Self {
            scope,
            groups,
            timeout: None,
        }
    }

    /// Bound each group's query; a group that overruns is recorded as failed
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// `Some(group)` returns that group's listing untagged; `None` fans out
    /// over every group and tags each record with its origin.
    pub async fn list(&self, group: Option<&str>) -> ArmResult<Vec<ResourceRecord>> {
        match group {
            Some(group) => self.scope.list_group(group).await,
            None => self.list_all_groups().await,
        }
    }

    async fn list_all_groups(&self) -> ArmResult<Vec<ResourceRecord>> {
        let groups = self.groups.list_resource_groups().await?;

        let mut seen = HashSet::new();
        let names: Vec<String> = groups
            .into_iter()
            .map(|g| g.name)
            .filter(|name| seen.insert(name.clone()))
            .collect();

        tracing::debug!(
            "Listing {}/{} across {} resource groups",
            self.scope.urls().provider_namespace(),
            self.scope.urls().resource_type(),
            names.len()
        );

        let accumulator = Arc::new(Accumulator::new());

        let handles: Vec<_> = names
            .iter()
            .map(|name| {
                let scope = self.scope.clone();
                let accumulator = Arc::clone(&accumulator);
                let timeout = self.timeout;
                let group = name.clone();
                tokio::spawn(async move {
                    let result = match timeout {
                        Some(limit) => tokio::time::timeout(limit, scope.list_group(&group))
                            .await
                            .unwrap_or_else(|_| {
                                Err(ArmError::Transport {
                                    status: None,
                                    message: format!("timed out after {:?}", limit),
                                })
                            }),
                        None => scope.list_group(&group).await,
                    };

                    match result {
                        Ok(items) => accumulator.append(&group, items).await,
                        Err(e) => {
                            tracing::warn!("Listing resource group '{}' failed: {}", group, e);
                            accumulator.record_failure(&group, e.to_string()).await;
                        }
                    }
                })
            })
            .collect();

        for (name, joined) in names.iter().zip(join_all(handles).await) {
            if let Err(e) = joined {
                tracing::warn!("Worker for resource group '{}' panicked: {}", name, e);
                accumulator
                    .record_failure(name, format!("worker task failed: {}", e))
                    .await;
            }
        }

        let (records, failures) = accumulator.take().await;
        tracing::info!(
            "Aggregated {} records from {} resource groups ({} failed)",
            records.len(),
            names.len(),
            failures.len()
        );

        if failures.is_empty() {
            Ok(records)
        } else {
            Err(ArmError::GroupsFailed { failures, records })
        }
    }
}
