//! JSON export and conflict-aware import of core resources.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use futures::future::join_all;
use proxyboard_api_types::{EnvelopeKind, ResourceKind, ResourceRecord, TransferEnvelope};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::application::gateway::ResourceGateway;
use crate::domain::permissions::AccessPolicy;
use crate::domain::validation::validate_record;
use crate::domain::visibility::VisibilityFilter;
use crate::infra::http::{ApiError, RequestScope};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("import file is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("import file is missing a recognized `type`")]
    UnknownType,
    #[error("import data is invalid: {0}")]
    InvalidData(String),
    #[error("nothing to export")]
    Empty,
    #[error("`{0}` cannot be exported")]
    Unsupported(ResourceKind),
    #[error("failed to encode export: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Export of one resource kind; a single record is written as an object.
pub fn export(
    kind: ResourceKind,
    records: &[ResourceRecord],
    now: OffsetDateTime,
) -> Result<TransferEnvelope, TransferError> {
    let envelope_kind = EnvelopeKind::for_resource(kind).ok_or(TransferError::Unsupported(kind))?;
    let data = match records {
        [] => return Err(TransferError::Empty),
        [single] => single.editable_fields(),
        many => Value::Array(many.iter().map(ResourceRecord::editable_fields).collect()),
    };
    Ok(TransferEnvelope {
        kind: envelope_kind,
        exported_at: now,
        data,
    })
}

#[derive(Debug)]
pub struct BundleExport {
    pub envelope: TransferEnvelope,
    pub exported: Vec<(ResourceKind, usize)>,
    pub failed: Vec<(ResourceKind, String)>,
}

/// Every viewable core collection nested under one `bundle` envelope.
///
/// Collections are fetched concurrently; a failed fetch is reported and left
/// out of the bundle.
pub async fn export_bundle(
    gateway: &dyn ResourceGateway,
    policy: &AccessPolicy,
    scope: &RequestScope,
    now: OffsetDateTime,
) -> BundleExport {
    let kinds: Vec<ResourceKind> = ResourceKind::CORE
        .into_iter()
        .filter(|kind| policy.can_view(*kind))
        .collect();
    let settled = join_all(
        kinds
            .iter()
            .map(|kind| async move { (*kind, gateway.list(*kind, scope).await) }),
    )
    .await;

    let visibility = VisibilityFilter::new(policy);
    let mut data = Map::new();
    let mut exported = Vec::new();
    let mut failed = Vec::new();
    for (kind, outcome) in settled {
        match outcome {
            Ok(records) => {
                let records = visibility.filter(records);
                exported.push((kind, records.len()));
                data.insert(
                    kind.permission_key().to_string(),
                    Value::Array(records.iter().map(ResourceRecord::editable_fields).collect()),
                );
            }
            Err(err) => {
                warn!(resource = %kind, error = %err, "bundle export skipped resource");
                failed.push((kind, err.to_string()));
            }
        }
    }

    BundleExport {
        envelope: TransferEnvelope {
            kind: EnvelopeKind::Bundle,
            exported_at: now,
            data: Value::Object(data),
        },
        exported,
        failed,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    #[default]
    SkipExisting,
    RenameOnConflict,
    OverwriteExisting,
}

impl ConflictStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SkipExisting => "skip_existing",
            Self::RenameOnConflict => "rename_on_conflict",
            Self::OverwriteExisting => "overwrite_existing",
        }
    }
}

impl Display for ConflictStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().replace('-', "_").as_str() {
            "skip_existing" | "skip" => Ok(Self::SkipExisting),
            "rename_on_conflict" | "rename" => Ok(Self::RenameOnConflict),
            "overwrite_existing" | "overwrite" => Ok(Self::OverwriteExisting),
            other => Err(format!("unknown conflict strategy `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    pub record: ResourceRecord,
    pub selected: bool,
}

impl ImportItem {
    pub fn kind(&self) -> ResourceKind {
        self.record.kind()
    }

    pub fn label(&self) -> String {
        self.record.label()
    }
}

/// Parsed, previewable import file. Every item starts selected.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPlan {
    pub kind: EnvelopeKind,
    pub exported_at: OffsetDateTime,
    pub items: Vec<ImportItem>,
}

impl ImportPlan {
    pub fn parse(bytes: &[u8]) -> Result<Self, TransferError> {
        let raw: Value = serde_json::from_slice(bytes).map_err(TransferError::InvalidJson)?;
        let kind_is_known = raw
            .get("type")
            .cloned()
            .is_some_and(|value| serde_json::from_value::<EnvelopeKind>(value).is_ok());
        if !kind_is_known {
            return Err(TransferError::UnknownType);
        }
        let envelope: TransferEnvelope = serde_json::from_value(raw)
            .map_err(|err| TransferError::InvalidData(err.to_string()))?;

        let mut items = Vec::new();
        match envelope.kind.resource() {
            Some(kind) => collect_items(kind, envelope.data.clone(), &mut items)?,
            None => {
                let Value::Object(collections) = &envelope.data else {
                    return Err(TransferError::InvalidData(
                        "bundle data must be an object of collections".to_string(),
                    ));
                };
                for (key, collection) in collections {
                    let kind = key
                        .parse::<ResourceKind>()
                        .ok()
                        .filter(|kind| *kind != ResourceKind::Users)
                        .ok_or_else(|| {
                            TransferError::InvalidData(format!("unknown collection `{key}`"))
                        })?;
                    if !collection.is_array() {
                        return Err(TransferError::InvalidData(format!(
                            "collection `{key}` must be an array"
                        )));
                    }
                    collect_items(kind, collection.clone(), &mut items)?;
                }
            }
        }

        Ok(Self {
            kind: envelope.kind,
            exported_at: envelope.exported_at,
            items,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|item| item.selected).count()
    }

    /// Returns `false` for an out-of-range index.
    pub fn set_selected(&mut self, index: usize, selected: bool) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.selected = selected;
                true
            }
            None => false,
        }
    }

    /// Keeps only the given indices selected.
    pub fn select_only(&mut self, indices: &[usize]) {
        for (index, item) in self.items.iter_mut().enumerate() {
            item.selected = indices.contains(&index);
        }
    }

    pub fn counts(&self) -> BTreeMap<ResourceKind, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.items {
            *counts.entry(item.kind()).or_insert(0) += 1;
        }
        counts
    }
}

fn collect_items(
    kind: ResourceKind,
    data: Value,
    items: &mut Vec<ImportItem>,
) -> Result<(), TransferError> {
    let values = match data {
        Value::Array(values) => values,
        object @ Value::Object(_) => vec![object],
        _ => {
            return Err(TransferError::InvalidData(
                "`data` must be an object or an array".to_string(),
            ));
        }
    };
    for (index, value) in values.into_iter().enumerate() {
        let record = ResourceRecord::from_value(kind, value).map_err(|err| {
            TransferError::InvalidData(format!("{} item {}: {err}", kind.singular(), index + 1))
        })?;
        items.push(ImportItem {
            record,
            selected: true,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportIssue {
    pub kind: ResourceKind,
    pub label: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<ImportIssue>,
    /// Why each skipped item was skipped.
    pub skips: Vec<ImportIssue>,
    /// Set when the run stopped because its scope was cancelled.
    pub cancelled: bool,
}

impl ImportSummary {
    fn fail(&mut self, item: &ResourceRecord, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(ImportIssue {
            kind: item.kind(),
            label: item.label(),
            message: message.into(),
        });
    }

    fn skip(&mut self, item: &ResourceRecord, message: impl Into<String>) {
        self.skipped += 1;
        self.skips.push(ImportIssue {
            kind: item.kind(),
            label: item.label(),
            message: message.into(),
        });
    }
}

fn normalized(values: &[String]) -> Vec<String> {
    let mut values: Vec<String> = values.iter().map(|v| v.trim().to_lowercase()).collect();
    values.sort();
    values.dedup();
    values
}

/// The existing record `candidate` would collide with, if any.
fn find_conflict<'a>(
    existing: &'a [ResourceRecord],
    candidate: &ResourceRecord,
) -> Option<&'a ResourceRecord> {
    existing.iter().find(|current| match (current, candidate) {
        (ResourceRecord::Stream(a), ResourceRecord::Stream(b)) => a.incoming_port == b.incoming_port,
        (ResourceRecord::AccessList(a), ResourceRecord::AccessList(b)) => {
            a.name.trim().eq_ignore_ascii_case(b.name.trim())
        }
        (ResourceRecord::Certificate(a), ResourceRecord::Certificate(b)) => {
            let same_name =
                !a.nice_name.trim().is_empty() && a.nice_name.trim() == b.nice_name.trim();
            same_name || normalized(&a.domain_names) == normalized(&b.domain_names)
        }
        _ if current.kind() == candidate.kind() => {
            let theirs = normalized(current.domain_names());
            normalized(candidate.domain_names())
                .iter()
                .any(|domain| theirs.contains(domain))
        }
        _ => false,
    })
}

/// Renames `record` to a name free in `existing`. `false` for kinds without a name field.
fn rename_for_import(record: &mut ResourceRecord, existing: &[ResourceRecord]) -> bool {
    let taken = |candidate: &str| {
        existing.iter().any(|current| match current {
            ResourceRecord::AccessList(list) => list.name.trim().eq_ignore_ascii_case(candidate),
            ResourceRecord::Certificate(cert) => cert.nice_name.trim() == candidate,
            _ => false,
        })
    };
    let free_name = |base: &str| {
        let mut attempt = 1;
        loop {
            let candidate = if attempt == 1 {
                format!("{base} (imported)")
            } else {
                format!("{base} (imported {attempt})")
            };
            if !taken(&candidate) {
                return candidate;
            }
            attempt += 1;
        }
    };
    match record {
        ResourceRecord::AccessList(list) => {
            list.name = free_name(list.name.trim());
            true
        }
        ResourceRecord::Certificate(cert) => {
            let base = cert.display_name();
            cert.nice_name = free_name(base.trim());
            true
        }
        _ => false,
    }
}

/// Imports the selected items one at a time.
///
/// Existing collections are loaded once up front. Per-item failures are
/// recorded and never abort the run; only cancellation stops it early.
pub async fn run_import(
    gateway: Arc<dyn ResourceGateway>,
    plan: &ImportPlan,
    strategy: ConflictStrategy,
    scope: &RequestScope,
) -> ImportSummary {
    let selected: Vec<&ImportItem> = plan.items.iter().filter(|item| item.selected).collect();
    let mut kinds: Vec<ResourceKind> = selected.iter().map(|item| item.kind()).collect();
    kinds.sort();
    kinds.dedup();

    let loaded = join_all(kinds.iter().map(|kind| {
        let gateway = Arc::clone(&gateway);
        async move { (*kind, gateway.list(*kind, scope).await) }
    }))
    .await;
    let mut existing: BTreeMap<ResourceKind, Result<Vec<ResourceRecord>, String>> = loaded
        .into_iter()
        .map(|(kind, result)| (kind, result.map_err(|err| err.to_string())))
        .collect();

    let mut summary = ImportSummary::default();
    for item in selected {
        if scope.is_cancelled() {
            summary.cancelled = true;
            break;
        }
        let kind = item.kind();
        let mut record = item.record.clone();

        if let Err(errors) = validate_record(&record) {
            summary.fail(&record, errors.to_string());
            continue;
        }
        let current = match existing.get_mut(&kind) {
            Some(Ok(records)) => records,
            Some(Err(message)) => {
                let message = format!("could not load existing {}: {message}", kind.display_name());
                summary.fail(&record, message);
                continue;
            }
            None => continue,
        };

        let conflict = find_conflict(current, &record).map(ResourceRecord::id);
        let result = match (conflict, strategy) {
            (None, _) => gateway.create(kind, record.editable_fields(), scope).await,
            (Some(_), ConflictStrategy::SkipExisting) => {
                summary.skip(&record, "already exists");
                continue;
            }
            (Some(id), ConflictStrategy::OverwriteExisting) => {
                gateway.update(kind, id, record.editable_fields(), scope).await
            }
            (Some(_), ConflictStrategy::RenameOnConflict) => {
                if !rename_for_import(&mut record, current) {
                    summary.skip(&record, "already exists and has no name to change");
                    continue;
                }
                gateway.create(kind, record.editable_fields(), scope).await
            }
        };

        match result {
            Ok(saved) => {
                summary.success += 1;
                match current.iter_mut().find(|r| r.id() == saved.id()) {
                    Some(slot) => *slot = saved,
                    None => current.push(saved),
                }
            }
            Err(ApiError::Cancelled) => {
                summary.cancelled = true;
                break;
            }
            Err(err) => summary.fail(&record, err.to_string()),
        }
    }

    info!(
        success = summary.success,
        failed = summary.failed,
        skipped = summary.skipped,
        strategy = %strategy,
        "import finished"
    );
    summary
}
