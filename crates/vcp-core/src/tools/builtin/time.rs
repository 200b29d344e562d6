//! `get_time` tool

use crate::tools::base::{Tool, ToolArgs};
use crate::tools::error::ToolError;
use async_trait::async_trait;
use chrono::{Local, Utc};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Reports the current time
///
/// An optional `format` parameter takes a `strftime` pattern applied to the
/// local time.
#[derive(Debug, Default)]
pub struct GetTimeTool;

impl GetTimeTool {
    pub const NAME: &'static str = "get_time";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for GetTimeTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Returns the current date and time in UTC and in the server's local timezone"
    }

    async fn execute(&self, args: &ToolArgs, _cancel: CancellationToken) -> Result<Value, ToolError> {
        let utc = Utc::now();
        let local = utc.with_timezone(&Local);

        let mut payload = json!({
            "utc": utc.to_rfc3339(),
            "local": local.to_rfc3339(),
            "timestamp": utc.timestamp(),
        });

        if let Some(pattern) = args.get("format") {
            let items: Vec<_> = chrono::format::StrftimeItems::new(pattern).collect();
            if items.contains(&chrono::format::Item::Error) {
                return Err(ToolError::InvalidArguments(format!(
                    "invalid time format pattern: {}",
                    pattern
                )));
            }
            payload["formatted"] = Value::String(local.format_with_items(items.into_iter()).to_string());
        }

        Ok(payload)
    }
}
