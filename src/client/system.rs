//! System-level queries: server version, arrays, jobs, alerts, iterators
//! and workload planning.

use crate::client::{ArrayClient, ExecutionMode};
use crate::domain::ports::QueryParams;
use crate::error::{Error, Result};
use crate::uri::ResourceArgs;
use serde_json::{json, Value};
use tracing::{debug, error, info};

/// Payload acknowledging an alert; the only edit alerts accept
const ACKNOWLEDGE_ALERT: &str = "ACKNOWLEDGE";

/// Server version string and its two-digit major version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVersion {
    /// Full version, e.g. `V9.0.1.6`
    pub version: String,
    /// Major version as used in paths, e.g. `90`
    pub major_version: String,
}

/// Major version as used in resource paths: `V8.4.0.6` becomes `84`
pub fn major_version(version: &str) -> Option<String> {
    let mut parts = version.trim().trim_start_matches(['V', 'v']).split('.');
    let major = parts.next().filter(|p| !p.is_empty())?;
    let minor = parts.next().filter(|p| !p.is_empty())?;
    if !major.chars().chain(minor.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}{}", major, &minor[..1]))
}

/// Filters for the workload-planning headroom query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadroomQuery {
    pub workload: String,
    pub srp: String,
    pub slo: String,
    pub emulation: String,
}

impl HeadroomQuery {
    pub fn new(workload: impl Into<String>) -> Self {
        Self {
            workload: workload.into(),
            srp: "SRP_1".to_string(),
            slo: "Diamond".to_string(),
            emulation: "FBA".to_string(),
        }
    }

    fn params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.insert("emulation".into(), self.emulation.clone());
        params.insert("slo".into(), self.slo.clone());
        params.insert("workloadtype".into(), self.workload.clone());
        params.insert("srp".into(), self.srp.clone());
        params
    }
}

impl ArrayClient {
    /// Query the management server version
    pub async fn get_uni_version(&self) -> Result<ServerVersion> {
        let body = self
            .get_resource(&ResourceArgs::hierarchical("system", "version"), None)
            .await?;
        let version = body
            .as_ref()
            .and_then(|b| b.get("version"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::ResourceNotFound {
                kind: "field".into(),
                name: "version".into(),
            })?
            .to_string();
        let major_version = major_version(&version).ok_or_else(|| {
            Error::InvalidInput(format!("unrecognized server version {:?}", version))
        })?;
        debug!(%version, %major_version, "server version");
        Ok(ServerVersion {
            version,
            major_version,
        })
    }

    /// Serial numbers of all arrays visible to the server
    pub async fn get_array_list(&self, filters: Option<&QueryParams>) -> Result<Vec<String>> {
        let body = self
            .get_resource(&ResourceArgs::hierarchical("system", "symmetrix"), filters)
            .await?;
        Ok(string_list(body.as_ref(), "symmetrixId"))
    }

    /// Serial numbers of arrays that support provisioning (V3 and newer)
    pub async fn get_v3_or_newer_array_list(&self) -> Result<Vec<String>> {
        let body = self
            .get_resource(
                &ResourceArgs::hierarchical("sloprovisioning", "symmetrix"),
                None,
            )
            .await?;
        Ok(string_list(body.as_ref(), "symmetrixId"))
    }

    /// Details of one array
    pub async fn get_array(&self, array_id: &str) -> Result<Option<Value>> {
        self.get_resource(
            &ResourceArgs::hierarchical("system", "symmetrix").resource_level_id(array_id),
            None,
        )
        .await
    }

    /// Ids of jobs across all arrays
    pub async fn get_all_jobs(&self, filters: Option<&QueryParams>) -> Result<Vec<String>> {
        let body = self
            .get_resource(&ResourceArgs::hierarchical("system", "job"), filters)
            .await?;
        Ok(string_list(body.as_ref(), "jobId"))
    }

    /// Jobs on the default array, or one job when `job_id` is given
    pub async fn get_array_jobs(
        &self,
        job_id: Option<&str>,
        filters: Option<&QueryParams>,
    ) -> Result<Option<Value>> {
        exclusive_lookup("job id", job_id, filters)?;
        let array = self.require_array("get_array_jobs")?;
        let mut args = ResourceArgs::legacy(array, "system", "job");
        if let Some(job_id) = job_id {
            args = args.resource_name(job_id);
        }
        self.get_resource(&args, filters).await
    }

    /// Ids of alerts across all arrays
    pub async fn get_all_alerts(&self, filters: Option<&QueryParams>) -> Result<Vec<String>> {
        let body = self
            .get_resource(&ResourceArgs::hierarchical("system", "alert"), filters)
            .await?;
        Ok(string_list(body.as_ref(), "alertId"))
    }

    /// Alerts on the default array, or one alert when `alert_id` is given
    pub async fn get_array_alerts(
        &self,
        alert_id: Option<&str>,
        filters: Option<&QueryParams>,
    ) -> Result<Option<Value>> {
        exclusive_lookup("alert id", alert_id, filters)?;
        let array = self.require_array("get_array_alerts")?;
        let mut args = ResourceArgs::legacy(array, "system", "alert");
        if let Some(alert_id) = alert_id {
            args = args.resource_name(alert_id);
        }
        self.get_resource(&args, filters).await
    }

    /// Mark an alert on the default array as acknowledged
    pub async fn acknowledge_array_alert(&self, alert_id: &str) -> Result<Option<Value>> {
        let array = self.require_array("acknowledge_array_alert")?;
        info!("Acknowledging alert {} on {}", alert_id, array);
        self.modify_resource(
            &ResourceArgs::legacy(array, "system", "alert").resource_name(alert_id),
            Some(json!({"editAlertActionParam": ACKNOWLEDGE_ALERT})),
            ExecutionMode::Synchronous,
        )
        .await
    }

    /// Delete an alert on the default array
    pub async fn delete_alert(&self, alert_id: &str) -> Result<()> {
        let array = self.require_array("delete_alert")?;
        self.delete_resource(
            &ResourceArgs::legacy(array, "system", "alert").resource_name(alert_id),
            None,
        )
        .await
    }

    /// One page of results from a server-side iterator
    pub async fn get_iterator_page_list(
        &self,
        iterator_id: &str,
        start: u64,
        end: u64,
    ) -> Result<Vec<Value>> {
        if start > end {
            return Err(Error::InvalidInput(format!(
                "iterator page start {} is after end {}",
                start, end
            )));
        }
        let mut params = QueryParams::new();
        params.insert("from".into(), start.to_string());
        params.insert("to".into(), end.to_string());

        let args = ResourceArgs::hierarchical("common", "Iterator")
            .resource_level_id(iterator_id)
            .resource_type("page");
        let body = self.get_resource(&args, Some(&params)).await?;
        Ok(body
            .as_ref()
            .and_then(|b| b.get("result"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// Workload-planning processing details for an array
    pub async fn get_wlp_information(&self, array_id: &str) -> Result<Option<Value>> {
        let body = self
            .get_resource(
                &ResourceArgs::hierarchical("wlp", "symmetrix").resource_level_id(array_id),
                None,
            )
            .await?;
        Ok(body.and_then(|mut b| b.get_mut("symmetrixDetails").map(Value::take)))
    }

    /// Remaining capacity headroom for a workload
    pub async fn get_headroom(&self, array_id: &str, query: &HeadroomQuery) -> Result<Option<Value>> {
        let args = ResourceArgs::hierarchical("wlp", "symmetrix")
            .resource_level_id(array_id)
            .resource_type("headroom");
        let body = self.get_resource(&args, Some(&query.params())).await?;
        Ok(body.and_then(|mut b| b.get_mut("headroom").map(Value::take)))
    }
}

/// A single-object lookup takes no collection filters
pub(crate) fn exclusive_lookup(
    what: &str,
    id: Option<&str>,
    filters: Option<&QueryParams>,
) -> Result<()> {
    if id.is_some() && filters.is_some() {
        error!("{} and filters are mutually exclusive options", what);
        return Err(Error::InvalidInput(format!(
            "{} and filters are mutually exclusive",
            what
        )));
    }
    Ok(())
}

/// Read a list of strings under `key`; absent means empty
pub(crate) fn string_list(body: Option<&Value>, key: &str) -> Vec<String> {
    body.and_then(|b| b.get(key))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{client, ARRAY};
    use crate::domain::ports::HttpMethod;
    use assert_matches::assert_matches;

    #[test]
    fn test_major_version() {
        assert_eq!(major_version("V8.4.0.6").as_deref(), Some("84"));
        assert_eq!(major_version("V9.0.1.6").as_deref(), Some("90"));
        assert_eq!(major_version("T9.1.0.5").as_deref(), None);
        assert_eq!(major_version("V9").as_deref(), None);
    }

    #[tokio::test]
    async fn test_get_uni_version() {
        let (client, transport, _) = client();
        transport.respond_json(
            HttpMethod::Get,
            "/90/system/version",
            200,
            &json!({"version": "V8.4.0.6"}),
        );
        let version = client.get_uni_version().await.unwrap();
        assert_eq!(version.version, "V8.4.0.6");
        assert_eq!(version.major_version, "84");
    }

    #[tokio::test]
    async fn test_get_array_lists() {
        let (client, transport, _) = client();
        let symm_list = json!({"symmetrixId": [ARRAY, "000197800124"]});
        transport.respond_json(HttpMethod::Get, "/90/system/symmetrix", 200, &symm_list);
        transport.respond_json(HttpMethod::Get, "/90/sloprovisioning/symmetrix", 200, &symm_list);

        let expected = vec![ARRAY.to_string(), "000197800124".to_string()];
        assert_eq!(client.get_array_list(None).await.unwrap(), expected);
        assert_eq!(client.get_v3_or_newer_array_list().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_get_array() {
        let (client, transport, _) = client();
        let details = json!({"symmetrixId": ARRAY, "model": "VMAX250F", "ucode": "5977.1091.1092"});
        transport.respond_json(
            HttpMethod::Get,
            &format!("/90/system/symmetrix/{}", ARRAY),
            200,
            &details,
        );
        assert_eq!(client.get_array(ARRAY).await.unwrap(), Some(details));
    }

    #[tokio::test]
    async fn test_job_listing() {
        let (client, transport, _) = client();
        transport.respond_json(
            HttpMethod::Get,
            "/90/system/job",
            200,
            &json!({"jobId": ["12345", "09999"]}),
        );
        let array_jobs = format!("/90/system/symmetrix/{}/job", ARRAY);
        transport.respond_json(HttpMethod::Get, &array_jobs, 200, &json!({"jobId": ["12345"]}));
        let one_job = json!({"jobId": "12345", "status": "SUCCEEDED", "name": "Modify Storage Group"});
        transport.respond_json(HttpMethod::Get, &format!("{}/12345", array_jobs), 200, &one_job);

        let mut filters = QueryParams::new();
        filters.insert("status".into(), "SUCCEEDED".into());
        assert_eq!(
            client.get_all_jobs(Some(&filters)).await.unwrap(),
            vec!["12345".to_string(), "09999".to_string()]
        );
        assert_eq!(transport.requests()[0].params.as_ref(), Some(&filters));

        let listed = client.get_array_jobs(None, Some(&filters)).await.unwrap();
        assert_eq!(listed, Some(json!({"jobId": ["12345"]})));
        assert_eq!(client.get_array_jobs(Some("12345"), None).await.unwrap(), Some(one_job));
    }

    #[tokio::test]
    async fn test_lookup_id_excludes_filters() {
        let (client, transport, _) = client();
        let mut filters = QueryParams::new();
        filters.insert("severity".into(), "WARNING".into());

        assert_matches!(
            client.get_array_jobs(Some("12345"), Some(&filters)).await,
            Err(Error::InvalidInput(_))
        );
        assert_matches!(
            client.get_array_alerts(Some("a-1"), Some(&filters)).await,
            Err(Error::InvalidInput(_))
        );
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_alerts() {
        let (client, transport, _) = client();
        let alert_uri = format!("/90/system/symmetrix/{}/alert/a-1", ARRAY);
        transport.respond_json(
            HttpMethod::Get,
            "/90/system/alert",
            200,
            &json!({"alertId": ["a-1", "a-2"]}),
        );
        transport.respond_json(
            HttpMethod::Get,
            &format!("/90/system/symmetrix/{}/alert", ARRAY),
            200,
            &json!({"alertId": ["a-1"]}),
        );
        transport.respond_json(HttpMethod::Put, &alert_uri, 200, &json!({"acknowledged": true}));
        transport.respond(HttpMethod::Delete, &alert_uri, 204, "");

        assert_eq!(
            client.get_all_alerts(None).await.unwrap(),
            vec!["a-1".to_string(), "a-2".to_string()]
        );
        assert_eq!(
            client.get_array_alerts(None, None).await.unwrap(),
            Some(json!({"alertId": ["a-1"]}))
        );

        client.acknowledge_array_alert("a-1").await.unwrap();
        let put = transport
            .requests()
            .into_iter()
            .find(|r| r.method == HttpMethod::Put)
            .unwrap();
        let sent: Value = serde_json::from_str(put.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, json!({"editAlertActionParam": "ACKNOWLEDGE"}));

        client.delete_alert("a-1").await.unwrap();
        assert_eq!(transport.request_count(HttpMethod::Delete, &alert_uri), 1);
    }

    #[tokio::test]
    async fn test_get_iterator_page_list() {
        let (client, transport, _) = client();
        transport.respond_json(
            HttpMethod::Get,
            "/common/Iterator/123/page",
            200,
            &json!({"result": [{}, {}]}),
        );
        let page = client.get_iterator_page_list("123", 1, 1000).await.unwrap();
        assert_eq!(page.len(), 2);

        let params = transport.requests()[0].params.clone().unwrap();
        assert_eq!(params.get("from").map(String::as_str), Some("1"));
        assert_eq!(params.get("to").map(String::as_str), Some("1000"));

        assert_matches!(
            client.get_iterator_page_list("123", 5, 1).await,
            Err(Error::InvalidInput(_))
        );
    }

    #[tokio::test]
    async fn test_wlp_queries() {
        let (client, transport, _) = client();
        let details = json!({"processingDetails": {"nextUpdate": 1038}, "spaRegistered": "true"});
        transport.respond_json(
            HttpMethod::Get,
            &format!("/90/wlp/symmetrix/{}", ARRAY),
            200,
            &json!({"symmetrixDetails": details}),
        );
        transport.respond_json(
            HttpMethod::Get,
            &format!("/90/wlp/symmetrix/{}/headroom", ARRAY),
            200,
            &json!({"headroom": [{"headroomCapacity": 20348.29}]}),
        );

        assert_eq!(client.get_wlp_information(ARRAY).await.unwrap(), Some(details));

        let headroom = client
            .get_headroom(ARRAY, &HeadroomQuery::new("DSS"))
            .await
            .unwrap();
        assert_eq!(headroom, Some(json!([{"headroomCapacity": 20348.29}])));
        let params = transport.requests()[1].params.clone().unwrap();
        assert_eq!(params.get("workloadtype").map(String::as_str), Some("DSS"));
        assert_eq!(params.get("srp").map(String::as_str), Some("SRP_1"));
    }
}
