//! Cascade execution at destroy time

use std::sync::Arc;
use std::time::Instant;

use super::registry::CascadePolicy;
use super::resolver::AssociationResolver;
use crate::errors::{AssocError, Result};
use crate::model::Record;
use crate::store::{DocumentStore, RemovalAction};
use crate::{log_op_end, log_op_error, log_op_start};

impl<S: DocumentStore + ?Sized> AssociationResolver<'_, S> {
    /// Apply every cascade policy declared on `record`'s type
    ///
    /// Descriptors are visited in declaration order. Each one with a policy
    /// other than `None` is resolved through `get`; an absent target is
    /// skipped. `Destroy` and `Delete` remove the target, preferring the
    /// store's streamed removal when it offers one. `RestrictWithException`
    /// stops at the first live target with `RecordExists`. Cascades that ran
    /// before a failure are not rolled back.
    ///
    /// # Errors
    /// * `RecordExists` - a restricted reference points at a live record
    /// * any error from resolution or from the store's removal
    pub fn destroy_associations(&self, record: &mut Record) -> Result<()> {
        let start = Instant::now();
        log_op_start!(
            "destroy_associations",
            record_type = record.type_name(),
            record_id = record.id()
        );

        let result = self.run_cascades(record);
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => {
                log_op_end!(
                    "destroy_associations",
                    duration_ms = duration_ms,
                    record_id = record.id()
                );
            }
            Err(err) => {
                log_op_error!(
                    "destroy_associations",
                    err.clone(),
                    duration_ms = duration_ms,
                    record_id = record.id()
                );
            }
        }
        result
    }

    fn run_cascades(&self, record: &mut Record) -> Result<()> {
        let record_type = Arc::clone(record.record_type());

        for descriptor in record_type.associations() {
            let policy = descriptor.cascade();
            if policy.is_none() {
                continue;
            }

            let Some(target) = self.get(record, descriptor.name())? else {
                tracing::debug!(
                    record_id = record.id(),
                    association = descriptor.name(),
                    cascade = policy.as_str(),
                    "cascade skipped, no target"
                );
                continue;
            };

            match policy {
                CascadePolicy::Destroy | CascadePolicy::Delete => {
                    if let Some(action) = policy.removal_action() {
                        self.remove_target(&target, action)?;
                    }
                }
                CascadePolicy::RestrictWithException => {
                    return Err(AssocError::RecordExists {
                        owner_type: record.type_name().to_string(),
                        association: descriptor.name().to_string(),
                        owner_id: record.id().to_string(),
                    });
                }
                CascadePolicy::RestrictWithError => {
                    // TODO: collect into a per-record error list once records carry one
                    tracing::warn!(
                        record_id = record.id(),
                        association = descriptor.name(),
                        "restrict_with_error is not enforced"
                    );
                }
                CascadePolicy::None => {}
            }
        }

        Ok(())
    }

    fn remove_target(&self, target: &Record, action: RemovalAction) -> Result<()> {
        tracing::debug!(
            target_type = target.type_name(),
            target_id = target.id(),
            action = action.as_str(),
            "cascading removal"
        );
        match self.store.try_stream_remove(target, action) {
            Some(result) => result,
            None => self.store.remove(target, action),
        }
    }
}
