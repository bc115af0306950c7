//! Storage group operations

use crate::client::system::string_list;
use crate::client::{ArrayClient, ExecutionMode};
use crate::domain::ports::QueryParams;
use crate::error::Result;
use crate::provisioning::{record_field_list, sloprovisioning};
use serde_json::Value;
use tracing::debug;

impl ArrayClient {
    /// Details of one storage group
    pub async fn get_storage_group(&self, storage_group_id: &str) -> Result<Option<Value>> {
        let array = self.require_array("get_storage_group")?;
        self.get_resource(
            &sloprovisioning(array, "storagegroup").resource_name(storage_group_id),
            None,
        )
        .await
    }

    /// Names of storage groups on the array
    pub async fn get_storage_group_list(&self, filters: Option<&QueryParams>) -> Result<Vec<String>> {
        let array = self.require_array("get_storage_group_list")?;
        let body = self
            .get_resource(&sloprovisioning(array, "storagegroup"), filters)
            .await?;
        Ok(string_list(body.as_ref(), "storageGroupId"))
    }

    /// Edit a storage group; in asynchronous mode the edit runs as a job and
    /// the updated group is returned once it completes
    pub async fn modify_storage_group(
        &self,
        storage_group_id: &str,
        payload: Value,
        mode: ExecutionMode,
    ) -> Result<Option<Value>> {
        let array = self.require_array("modify_storage_group")?;
        self.modify_resource(
            &sloprovisioning(array, "storagegroup").resource_name(storage_group_id),
            Some(payload),
            mode,
        )
        .await
    }

    /// Masking views a storage group belongs to; `None` when it has none
    pub async fn get_masking_views_from_storage_group(
        &self,
        storage_group_id: &str,
    ) -> Result<Option<Vec<String>>> {
        let group = self.get_storage_group(storage_group_id).await?;
        let views = record_field_list(group.as_ref(), "storageGroup", "maskingview")
            .filter(|views| !views.is_empty());
        if views.is_none() {
            debug!("No masking views found for storage group {}", storage_group_id);
        }
        Ok(views)
    }
}
