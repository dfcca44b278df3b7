//! Sales analytics read model
//!
//! Fees, margins and taxes are computed by the backend per order. The client
//! only filters orders and re-sums their financial fields so totals always
//! match the rows being shown.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::date_range::DateRange;
use crate::domain::sync_backend::OwnerId;

/// Marketplace shipping mode of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum LogisticType {
    Fulfillment,
    CrossDocking,
    DropOff,
    XdDropOff,
    SelfService,
    #[default]
    #[serde(other)]
    NotSpecified,
}

impl LogisticType {
    pub const ALL: [Self; 6] = [
        Self::Fulfillment,
        Self::CrossDocking,
        Self::DropOff,
        Self::XdDropOff,
        Self::SelfService,
        Self::NotSpecified,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fulfillment => "fulfillment",
            Self::CrossDocking => "cross_docking",
            Self::DropOff => "drop_off",
            Self::XdDropOff => "xd_drop_off",
            Self::SelfService => "self_service",
            Self::NotSpecified => "not_specified",
        }
    }
}

impl fmt::Display for LogisticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogisticType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown logistic type {s:?}, expected one of {}", known.join(", "))
            })
    }
}

/// One order as computed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleOrder {
    #[ts(type = "number")]
    pub order_id: i64,
    #[ts(type = "string")]
    pub date_created: DateTime<Utc>,
    #[serde(default)]
    pub logistic_type: LogisticType,
    pub units: u32,
    pub gross_amount: f64,
    pub sale_fee: f64,
    pub shipping_cost: f64,
    #[serde(default)]
    pub tax_amount: f64,
    pub net_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesTotals {
    pub order_count: u32,
    pub units: u32,
    pub gross_amount: f64,
    pub sale_fee: f64,
    pub shipping_cost: f64,
    pub tax_amount: f64,
    pub net_amount: f64,
    pub margin_percent: f64,
}

impl SalesTotals {
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a SaleOrder>) -> Self {
        let mut totals = orders.into_iter().fold(Self::default(), |mut acc, order| {
            acc.order_count += 1;
            acc.units += order.units;
            acc.gross_amount += order.gross_amount;
            acc.sale_fee += order.sale_fee;
            acc.shipping_cost += order.shipping_cost;
            acc.tax_amount += order.tax_amount;
            acc.net_amount += order.net_amount;
            acc
        });

        totals.gross_amount = round2(totals.gross_amount);
        totals.sale_fee = round2(totals.sale_fee);
        totals.shipping_cost = round2(totals.shipping_cost);
        totals.tax_amount = round2(totals.tax_amount);
        totals.net_amount = round2(totals.net_amount);
        totals.margin_percent = if totals.gross_amount.abs() < f64::EPSILON {
            0.0
        } else {
            round2(totals.net_amount / totals.gross_amount * 100.0)
        };
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LogisticBreakdown {
    pub logistic_type: LogisticType,
    pub totals: SalesTotals,
}

/// Aggregated sales for one seller over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesSummary {
    pub range: DateRange,
    #[ts(type = "number")]
    pub owner_id: OwnerId,
    pub orders: Vec<SaleOrder>,
    pub totals: SalesTotals,
}

impl SalesSummary {
    pub fn new(range: DateRange, owner_id: OwnerId, orders: Vec<SaleOrder>) -> Self {
        let totals = SalesTotals::from_orders(&orders);
        Self { range, owner_id, orders, totals }
    }

    /// Keep only orders of `logistic` (all when `None`) and re-sum totals
    /// from the retained rows.
    #[must_use]
    pub fn filter_by_logistic(&self, logistic: Option<LogisticType>) -> Self {
        let orders: Vec<SaleOrder> = match logistic {
            Some(wanted) => self
                .orders
                .iter()
                .filter(|o| o.logistic_type == wanted)
                .cloned()
                .collect(),
            None => self.orders.clone(),
        };
        Self::new(self.range, self.owner_id, orders)
    }

    /// Totals per logistic type, largest net amount first
    pub fn breakdown_by_logistic(&self) -> Vec<LogisticBreakdown> {
        let mut groups: HashMap<LogisticType, Vec<&SaleOrder>> = HashMap::new();
        for order in &self.orders {
            groups.entry(order.logistic_type).or_default().push(order);
        }

        let mut breakdown: Vec<LogisticBreakdown> = groups
            .into_iter()
            .map(|(logistic_type, orders)| LogisticBreakdown {
                logistic_type,
                totals: SalesTotals::from_orders(orders),
            })
            .collect();
        breakdown.sort_by(|a, b| {
            b.totals
                .net_amount
                .total_cmp(&a.totals.net_amount)
                .then(a.logistic_type.cmp(&b.logistic_type))
        });
        breakdown
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn order(id: i64, logistic: LogisticType, gross: f64, fee: f64, ship: f64) -> SaleOrder {
        SaleOrder {
            order_id: id,
            date_created: "2025-01-02T10:00:00Z".parse().unwrap(),
            logistic_type: logistic,
            units: 1,
            gross_amount: gross,
            sale_fee: fee,
            shipping_cost: ship,
            tax_amount: 0.0,
            net_amount: gross - fee - ship,
        }
    }

    fn summary() -> SalesSummary {
        SalesSummary::new(
            DateRange::parse("2025-01-01", "2025-01-05").unwrap(),
            OwnerId(7),
            vec![
                order(1, LogisticType::Fulfillment, 100.0, 13.0, 0.0),
                order(2, LogisticType::CrossDocking, 50.0, 6.5, 10.0),
                order(3, LogisticType::Fulfillment, 200.1, 26.01, 0.0),
                order(4, LogisticType::SelfService, 30.0, 3.9, 5.0),
            ],
        )
    }

    #[test]
    fn test_totals_are_summed_and_rounded() {
        let s = summary();
        assert_eq!(s.totals.order_count, 4);
        assert_eq!(s.totals.units, 4);
        assert_eq!(s.totals.gross_amount, 380.1);
        assert_eq!(s.totals.sale_fee, 49.41);
        assert_eq!(s.totals.shipping_cost, 15.0);
        assert_eq!(s.totals.net_amount, 315.69);
        assert_eq!(s.totals.margin_percent, 83.05);
    }

    #[test]
    fn test_filter_recomputes_totals_from_retained_orders() {
        let filtered = summary().filter_by_logistic(Some(LogisticType::Fulfillment));
        assert_eq!(filtered.orders.len(), 2);
        assert_eq!(filtered.totals.order_count, 2);
        assert_eq!(filtered.totals.gross_amount, 300.1);
        assert_eq!(filtered.totals.shipping_cost, 0.0);
    }

    #[test]
    fn test_filter_none_keeps_everything() {
        let s = summary();
        assert_eq!(s.filter_by_logistic(None), s);
    }

    #[test]
    fn test_filter_with_no_matches_yields_zero_totals() {
        let filtered = summary().filter_by_logistic(Some(LogisticType::DropOff));
        assert!(filtered.orders.is_empty());
        assert_eq!(filtered.totals, SalesTotals::default());
    }

    #[test]
    fn test_breakdown_sorted_by_net() {
        let breakdown = summary().breakdown_by_logistic();
        let kinds: Vec<_> = breakdown.iter().map(|b| b.logistic_type).collect();
        assert_eq!(
            kinds,
            vec![LogisticType::Fulfillment, LogisticType::CrossDocking, LogisticType::SelfService]
        );
    }

    #[rstest]
    #[case("fulfillment", LogisticType::Fulfillment)]
    #[case("cross-docking", LogisticType::CrossDocking)]
    #[case(" XD_DROP_OFF ", LogisticType::XdDropOff)]
    #[case("self_service", LogisticType::SelfService)]
    fn test_logistic_type_from_str(#[case] raw: &str, #[case] expected: LogisticType) {
        assert_eq!(raw.parse::<LogisticType>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_logistic_type_deserializes_as_not_specified() {
        let t: LogisticType = serde_json::from_str(r#""turbo""#).unwrap();
        assert_eq!(t, LogisticType::NotSpecified);
        assert!("turbo".parse::<LogisticType>().is_err());
    }
}
