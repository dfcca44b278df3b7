//! Sales read-view queries

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::application::state::AppState;
use crate::commands::sync_commands::parse_requested_range;
use crate::domain::sales::{LogisticBreakdown, LogisticType, SalesSummary};
use crate::domain::sync_backend::OwnerId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub logistic_filter: Option<LogisticType>,
    pub summary: SalesSummary,
    pub breakdown: Vec<LogisticBreakdown>,
}

/// Summary for a range, optionally narrowed to one logistic type.
///
/// The breakdown is always computed over the unfiltered orders.
pub async fn get_sales_summary(
    app_state: &AppState,
    from: &str,
    to: &str,
    seller_id: i64,
    logistic: Option<&str>,
) -> Result<SalesReport, String> {
    let range = parse_requested_range(app_state, from, to).await?;
    let logistic_filter = logistic.map(str::parse::<LogisticType>).transpose()?;

    let full = app_state
        .sales_view
        .get_summary(range, OwnerId(seller_id))
        .await
        .map_err(|e| e.to_string())?;
    let breakdown = full.breakdown_by_logistic();
    let summary = full.filter_by_logistic(logistic_filter);
    info!(%range, seller_id, orders = summary.orders.len(), "Sales summary served");

    Ok(SalesReport {
        logistic_filter,
        summary,
        breakdown,
    })
}
