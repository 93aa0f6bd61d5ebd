//! Canned reports: id resolution, chart reads, and paged table reads
use async_trait::async_trait;
use log::debug;
use serde_json::{Map, Value, json};

use crate::client::ApiClient;
use crate::error::{ExporterError, Result};
use crate::extract::{FromNode, Node, decode_data};
use crate::paginate::{PageSource, Paginator, TablePage};

pub const PROTECTION_TASKS_DETAILS: &str = "ProtectionTasksDetails";
pub const SLA_COMPLIANCE_SUMMARY: &str = "SlaComplianceSummary";
pub const OBJECT_PROTECTION_SUMMARY: &str = "ObjectProtectionSummary";

/// A canned report resolved to its server-side id
///
/// Lives for one collector invocation; the table's column order is captured
/// by the paginator from the first page it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHandle {
    pub report_id: String,
}

struct ReportSummary {
    id: Option<String>,
}

impl FromNode for ReportSummary {
    fn from_node(node: &Node<'_>) -> Self {
        Self { id: node.string("id") }
    }
}

impl ReportHandle {
    /// Look up the canned report built from `template`
    pub async fn resolve(client: &dyn ApiClient, template: &str, timeout_secs: u64) -> Result<Self> {
        let path = format!("/report?report_template={}&report_type=Canned", template);
        let body = client.get("internal", &path, timeout_secs).await?;

        let report_id = decode_data::<ReportSummary>(&body, &path)?
            .into_iter()
            .find_map(|r| r.id)
            .ok_or_else(|| ExporterError::Report(format!("no canned report for template {}", template)))?;

        debug!("Resolved report {} to {}", template, report_id);
        Ok(Self { report_id })
    }

    /// Read the first data point of every column of `chart_id`
    pub async fn chart(&self, client: &dyn ApiClient, chart_id: &str, timeout_secs: u64) -> Result<Vec<ChartColumn>> {
        let path = format!("/report/{}/chart?chart_id={}", self.report_id, chart_id);
        let body = client.get("internal", &path, timeout_secs).await?;
        ChartColumn::from_chart_body(&body, &path)
    }

    /// A paginator over this report's table
    pub fn table<'a>(
        &'a self,
        client: &'a dyn ApiClient,
        filters: Option<Value>,
        timeout_secs: u64,
    ) -> Paginator<ReportTable<'a>> {
        Paginator::new(ReportTable {
            client,
            report_id: &self.report_id,
            filters,
            timeout_secs,
        })
    }
}

/// One labelled series of a report chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartColumn {
    pub label: String,
    pub value: f64,
}

impl ChartColumn {
    /// Flatten a chart response; columns without data points are dropped
    pub fn from_chart_body(body: &Value, context: &str) -> Result<Vec<Self>> {
        let charts = body
            .as_array()
            .ok_or_else(|| ExporterError::decode(context, "expected an array of charts"))?;

        let mut columns = Vec::new();
        for chart in charts.iter().filter_map(|c| Node::from_value(c, context)) {
            for column in chart.objects("dataColumns") {
                let label = column.str_or("label", "");
                let value = column
                    .array("dataPoints")
                    .first()
                    .and_then(|p| Node::from_value(p, context))
                    .and_then(|p| p.number("value"));

                if let Some(value) = value {
                    columns.push(Self { label, value });
                }
            }
        }
        Ok(columns)
    }
}

/// Page source over a report table
pub struct ReportTable<'a> {
    client: &'a dyn ApiClient,
    report_id: &'a str,
    filters: Option<Value>,
    timeout_secs: u64,
}

impl ReportTable<'_> {
    fn request_body(&self, cursor: Option<&str>, limit: usize) -> Value {
        let mut body = Map::new();
        body.insert("limit".to_string(), json!(limit));
        if let Some(cursor) = cursor {
            body.insert("cursor".to_string(), json!(cursor));
        }
        if let Some(filters) = &self.filters {
            body.insert("requestFilters".to_string(), filters.clone());
        }
        Value::Object(body)
    }
}

#[async_trait]
impl PageSource for ReportTable<'_> {
    async fn fetch_page(&self, cursor: Option<&str>, limit: usize) -> Result<TablePage> {
        let path = format!("/report/{}/table", self.report_id);
        let body = self
            .client
            .post("internal", &path, &self.request_body(cursor, limit), self.timeout_secs)
            .await?;
        crate::extract::decode(&body, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockClient;
    use crate::paginate::{FIRST_PAGE_LIMIT, NEXT_PAGE_LIMIT};

    const LOOKUP: &str = "/report?report_template=ObjectProtectionSummary&report_type=Canned";

    #[tokio::test]
    async fn test_resolve_takes_first_report() {
        let client = MockClient::new().on_get(LOOKUP, json!({"data": [{"id": "CustomReport:::1"}, {"id": "x"}]}));
        let handle = ReportHandle::resolve(&client, OBJECT_PROTECTION_SUMMARY, 60).await.unwrap();
        assert_eq!(handle.report_id, "CustomReport:::1");
    }

    #[tokio::test]
    async fn test_resolve_without_reports_fails() {
        let client = MockClient::new().on_get(LOOKUP, json!({"data": []}));
        let err = ReportHandle::resolve(&client, OBJECT_PROTECTION_SUMMARY, 60).await.unwrap_err();
        assert!(matches!(err, ExporterError::Report(_)));
    }

    #[test]
    fn test_chart_flattening() {
        let body = json!([
            {"dataColumns": [
                {"label": "Succeeded", "dataPoints": [{"value": 120.0}, {"value": 3.0}]},
                {"label": "Failed", "dataPoints": []},
                {"label": "Canceled", "dataPoints": [{"value": 2}]}
            ]},
            "junk"
        ]);
        let columns = ChartColumn::from_chart_body(&body, "chart").unwrap();
        assert_eq!(
            columns,
            vec![
                ChartColumn { label: "Succeeded".into(), value: 120.0 },
                ChartColumn { label: "Canceled".into(), value: 2.0 },
            ]
        );

        assert!(ChartColumn::from_chart_body(&json!({"dataColumns": []}), "chart").is_err());
    }

    #[tokio::test]
    async fn test_table_request_bodies() {
        let path = "/report/R1/table";
        let client = MockClient::new()
            .on_post(path, json!({"columns": ["ObjectName"], "dataGrid": [["a"]], "hasMore": true, "cursor": "C1"}))
            .on_post(path, json!({"columns": ["ObjectName"], "dataGrid": [["b"]], "hasMore": false}));
        let handle = ReportHandle { report_id: "R1".into() };

        let filters = json!({"objectType": "Mssql"});
        let mut pager = handle.table(&client, Some(filters.clone()), 60);
        assert_eq!(pager.collect_rows().await.unwrap().len(), 2);

        let bodies: Vec<Value> = client.calls().into_iter().filter_map(|c| c.body).collect();
        assert_eq!(
            bodies,
            vec![
                json!({"limit": FIRST_PAGE_LIMIT, "requestFilters": filters}),
                json!({"limit": NEXT_PAGE_LIMIT, "cursor": "C1", "requestFilters": filters}),
            ]
        );
    }
}
