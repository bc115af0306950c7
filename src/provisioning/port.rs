//! Director and port lookups

use crate::client::system::exclusive_lookup;
use crate::client::ArrayClient;
use crate::domain::ports::QueryParams;
use crate::error::{Error, Result};
use crate::provisioning::CATEGORY;
use crate::uri::ResourceArgs;
use serde_json::Value;
use tracing::error;

impl ArrayClient {
    /// Directors of the default array, or one director when given
    pub async fn get_director(&self, director: Option<&str>) -> Result<Option<Value>> {
        let array = self.require_array("get_director")?;
        let mut args = ResourceArgs::hierarchical(CATEGORY, "symmetrix")
            .resource_level_id(array)
            .resource_type("director");
        if let Some(director) = director {
            args = args.resource_type_id(director);
        }
        self.get_resource(&args, None).await
    }

    /// Ports of a director, or one port when `port_no` is given.
    ///
    /// Filters only apply to the port collection.
    pub async fn get_director_port(
        &self,
        director: &str,
        port_no: Option<&str>,
        filters: Option<&QueryParams>,
    ) -> Result<Option<Value>> {
        exclusive_lookup("port number", port_no, filters)?;
        let array = self.require_array("get_director_port")?;
        let mut args = ResourceArgs::hierarchical(CATEGORY, "symmetrix")
            .resource_level_id(array)
            .resource_type("director")
            .resource_type_id(director)
            .resource("port");
        if let Some(port_no) = port_no {
            args = args.resource_id(port_no);
        }
        self.get_resource(&args, filters).await
    }

    /// WWN or IQN of a physical port
    pub async fn get_port_identifier(&self, director: &str, port_no: &str) -> Result<String> {
        let info = self.get_director_port(director, Some(port_no), None).await?;
        port_identifier(info.as_ref()).ok_or_else(|| {
            error!("Cannot retrieve port information for {}:{}", director, port_no);
            Error::ResourceNotFound {
                kind: "port identifier".into(),
                name: format!("{}:{}", director, port_no),
            }
        })
    }
}

/// `symmetrixPort` may be a single object or a list of them
fn port_identifier(info: Option<&Value>) -> Option<String> {
    let port = info?.get("symmetrixPort")?;
    let port = match port.as_array() {
        Some(items) => items.first()?,
        None => port,
    };
    port.get("identifier")
        .and_then(Value::as_str)
        .map(str::to_string)
}
