use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::tools::definition::ToolDefinition;
use crate::tools::registry::Tool;

/// Read-only lookup of dashboard chart data against static sample data.
pub struct ChartDataTool;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DailyData {
    date: String,
    sales: u64,
    orders: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartData {
    chart_id: String,
    period: String,
    data: Vec<DailyData>,
    total: u64,
    avg_daily: u64,
}

#[async_trait]
impl Tool for ChartDataTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "getChartData".to_string(),
            description: "Fetch the data behind a specific dashboard chart for sales and \
                          business-metric analysis"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "chartId": {
                        "type": "string",
                        "description": "Chart id. Available charts:\n\
                            - 'sales-current-month': daily sales for the current month\n\
                            - 'sales-previous-month': daily sales for the previous month\n\
                            - 'revenue-by-category': revenue broken down by product category\n\
                            - 'top-products': top 5 products by sales",
                        "enum": [
                            "sales-current-month",
                            "sales-previous-month",
                            "revenue-by-category",
                            "top-products"
                        ]
                    }
                },
                "required": ["chartId"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value, AppError> {
        let chart_id = arguments
            .get("chartId")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::InvalidArgument("chartId is required".to_string()))?;

        sample_chart(chart_id)
            .ok_or_else(|| AppError::InvalidArgument(format!("Chart not found: {chart_id}")))
    }
}

fn sample_chart(chart_id: &str) -> Option<Value> {
    match chart_id {
        "sales-current-month" => daily_chart(chart_id, "2026-08", CURRENT_MONTH),
        "sales-previous-month" => daily_chart(chart_id, "2026-07", PREVIOUS_MONTH),
        "revenue-by-category" => Some(json!({
            "chartId": chart_id,
            "period": "2026-08",
            "data": [
                { "category": "Electronics", "revenue": 48200 },
                { "category": "Home & Garden", "revenue": 31650 },
                { "category": "Sports", "revenue": 24900 },
                { "category": "Clothing", "revenue": 19480 },
                { "category": "Books", "revenue": 8770 }
            ],
            "total": 133000
        })),
        "top-products" => Some(json!({
            "chartId": chart_id,
            "period": "2026-08",
            "data": [
                { "product": "Wireless Headphones", "units": 312, "revenue": 24960 },
                { "product": "Smart Watch", "units": 198, "revenue": 23760 },
                { "product": "Espresso Machine", "units": 87, "revenue": 17400 },
                { "product": "Yoga Mat", "units": 451, "revenue": 11275 },
                { "product": "Desk Lamp", "units": 263, "revenue": 7890 }
            ]
        })),
        _ => None,
    }
}

const CURRENT_MONTH: &[(&str, u64, u64)] = &[
    ("2026-08-01", 4120, 58),
    ("2026-08-02", 3890, 51),
    ("2026-08-03", 4410, 63),
    ("2026-08-04", 4730, 66),
    ("2026-08-05", 4280, 60),
    ("2026-08-06", 3950, 55),
    ("2026-08-07", 5120, 71),
    ("2026-08-08", 4660, 64),
];

const PREVIOUS_MONTH: &[(&str, u64, u64)] = &[
    ("2026-07-01", 3610, 49),
    ("2026-07-02", 3820, 52),
    ("2026-07-03", 3540, 47),
    ("2026-07-04", 4050, 57),
    ("2026-07-05", 3780, 50),
    ("2026-07-06", 3990, 54),
    ("2026-07-07", 4210, 59),
    ("2026-07-08", 3870, 53),
];

fn daily_chart(chart_id: &str, period: &str, days: &[(&str, u64, u64)]) -> Option<Value> {
    let data: Vec<DailyData> = days
        .iter()
        .map(|(date, sales, orders)| DailyData {
            date: (*date).to_string(),
            sales: *sales,
            orders: *orders,
        })
        .collect();
    let total: u64 = data.iter().map(|d| d.sales).sum();
    let avg_daily = if data.is_empty() { 0 } else { total / data.len() as u64 };
    let chart = ChartData {
        chart_id: chart_id.to_string(),
        period: period.to_string(),
        data,
        total,
        avg_daily,
    };
    serde_json::to_value(chart).ok()
}
