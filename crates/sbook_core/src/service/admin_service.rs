//! Supervisory subject directory.

use crate::identity::{EffectiveIdentity, ResolutionError, SUPERVISORY_FIELD};
use crate::store::{paths, Document, DocumentStore};
use log::info;
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_NAME: &str = "No Name";
const DEFAULT_EMAIL: &str = "No Email";

/// One listed subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectSummary {
    pub subject_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn DocumentStore>,
}

impl AdminService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Lists every non-supervisory subject; supervisory principals only.
    pub async fn list_subjects(
        &self,
        identity: &EffectiveIdentity,
    ) -> Result<Vec<SubjectSummary>, ResolutionError> {
        if !identity.is_supervisory() {
            return Err(ResolutionError::NotSupervisory(
                identity.principal_id().to_string(),
            ));
        }

        let subjects = self
            .store
            .list_documents(&paths::subjects()?)
            .await?
            .into_iter()
            .filter(|snapshot| !flag(&snapshot.data, SUPERVISORY_FIELD))
            .map(|snapshot| SubjectSummary {
                name: text_or(&snapshot.data, "name", DEFAULT_NAME),
                email: text_or(&snapshot.data, "email", DEFAULT_EMAIL),
                subject_id: snapshot.id,
            })
            .collect::<Vec<_>>();
        info!(
            "event=subject_list module=admin status=ok subjects={}",
            subjects.len()
        );
        Ok(subjects)
    }
}

fn flag(data: &Document, field: &str) -> bool {
    data.get(field).and_then(Value::as_bool).unwrap_or(false)
}

fn text_or(data: &Document, field: &str, fallback: &str) -> String {
    data.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}
