//! Host (initiator group) operations

use crate::client::system::string_list;
use crate::client::{ArrayClient, ExecutionMode};
use crate::domain::ports::QueryParams;
use crate::error::{Error, Result};
use crate::provisioning::{record_field_list, sloprovisioning};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// One modification of a host; the array accepts a single change per call
#[derive(Debug, Clone, PartialEq)]
pub enum HostEdit {
    /// Replace the host flags
    SetFlags(Value),
    /// Remove initiators from the host
    RemoveInitiators(Vec<String>),
    /// Add initiators to the host
    AddInitiators(Vec<String>),
    /// Rename the host
    Rename(String),
}

impl HostEdit {
    /// Request body for this modification
    pub fn payload(&self) -> Value {
        let action = match self {
            HostEdit::SetFlags(flags) => json!({"setHostFlagsParam": {"hostFlags": flags}}),
            HostEdit::RemoveInitiators(list) => {
                json!({"removeInitiatorParam": {"initiator": list}})
            }
            HostEdit::AddInitiators(list) => json!({"addInitiatorParam": {"initiator": list}}),
            HostEdit::Rename(name) => json!({"renameHostParam": {"new_host_name": name}}),
        };
        json!({"editHostActionParam": action})
    }

    fn kind(&self) -> &'static str {
        match self {
            HostEdit::SetFlags(_) => "host_flags",
            HostEdit::RemoveInitiators(_) => "remove_initiators",
            HostEdit::AddInitiators(_) => "add_initiators",
            HostEdit::Rename(_) => "new_name",
        }
    }
}

/// Optional host modifications as a caller may supply them
///
/// Only one is applied. When several are set the first in this order wins:
/// `host_flags`, `remove_initiators`, `add_initiators`, `new_name`.
/// Empty values count as unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostEditRequest {
    pub host_flags: Option<Value>,
    pub remove_initiators: Option<Vec<String>>,
    pub add_initiators: Option<Vec<String>>,
    pub new_name: Option<String>,
}

impl HostEditRequest {
    /// Pick the single modification to apply
    pub fn resolve(&self) -> Result<HostEdit> {
        let mut candidates: Vec<HostEdit> = Vec::new();
        if let Some(flags) = self.host_flags.as_ref().filter(|f| !is_empty_value(f)) {
            candidates.push(HostEdit::SetFlags(flags.clone()));
        }
        if let Some(list) = self.remove_initiators.as_ref().filter(|l| !l.is_empty()) {
            candidates.push(HostEdit::RemoveInitiators(list.clone()));
        }
        if let Some(list) = self.add_initiators.as_ref().filter(|l| !l.is_empty()) {
            candidates.push(HostEdit::AddInitiators(list.clone()));
        }
        if let Some(name) = self.new_name.as_ref().filter(|n| !n.is_empty()) {
            candidates.push(HostEdit::Rename(name.clone()));
        }

        let mut candidates = candidates.into_iter();
        let chosen = candidates.next().ok_or_else(|| {
            Error::InvalidInput(
                "no host modification supplied: set one of host_flags, remove_initiators, \
                 add_initiators or new_name"
                    .into(),
            )
        })?;
        let ignored: Vec<&str> = candidates.as_slice().iter().map(HostEdit::kind).collect();
        if !ignored.is_empty() {
            warn!(
                "Only one host modification is applied per call; using {} and ignoring {}",
                chosen.kind(),
                ignored.join(", ")
            );
        }
        Ok(chosen)
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

impl ArrayClient {
    /// Details of one host, or `None` if the array returned no body
    pub async fn get_host(&self, host_id: &str) -> Result<Option<Value>> {
        let array = self.require_array("get_host")?;
        self.get_resource(&sloprovisioning(array, "host").resource_name(host_id), None)
            .await
    }

    /// Names of hosts on the array
    pub async fn get_host_list(&self, filters: Option<&QueryParams>) -> Result<Vec<String>> {
        let array = self.require_array("get_host_list")?;
        let body = self
            .get_resource(&sloprovisioning(array, "host"), filters)
            .await?;
        Ok(string_list(body.as_ref(), "hostId"))
    }

    /// Create a host from initiators
    pub async fn create_host(
        &self,
        host_name: &str,
        initiators: &[String],
        host_flags: Option<Value>,
        mode: ExecutionMode,
    ) -> Result<Option<Value>> {
        let array = self.require_array("create_host")?;
        let mut payload = json!({"hostId": host_name, "initiatorId": initiators});
        if let Some(flags) = host_flags {
            payload["hostFlags"] = flags;
        }
        self.create_resource(&sloprovisioning(array, "host"), Some(payload), mode)
            .await
    }

    /// Apply one modification to a host
    pub async fn modify_host(
        &self,
        host_id: &str,
        request: &HostEditRequest,
        mode: ExecutionMode,
    ) -> Result<Option<Value>> {
        let edit = request.resolve()?;
        let array = self.require_array("modify_host")?;
        debug!(host_id, edit = edit.kind(), "modifying host");
        self.modify_resource(
            &sloprovisioning(array, "host").resource_name(host_id),
            Some(edit.payload()),
            mode,
        )
        .await
    }

    /// Delete a host; fails if it is part of a masking view
    pub async fn delete_host(&self, host_id: &str) -> Result<()> {
        let array = self.require_array("delete_host")?;
        self.delete_resource(&sloprovisioning(array, "host").resource_name(host_id), None)
            .await
    }

    /// Masking views a host belongs to; `None` when it has none
    pub async fn get_masking_views_from_host(&self, host_id: &str) -> Result<Option<Vec<String>>> {
        let host = self.get_host(host_id).await?;
        let views = record_field_list(host.as_ref(), "host", "maskingview");
        if views.is_none() {
            debug!("No masking views found for host {}", host_id);
        }
        Ok(views)
    }

    /// Initiators of a host; `None` when it has none
    pub async fn get_initiator_ids_from_host(&self, host_id: &str) -> Result<Option<Vec<String>>> {
        let host = self.get_host(host_id).await?;
        Ok(record_field_list(host.as_ref(), "host", "initiator"))
    }
}
