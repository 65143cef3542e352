//! JSON shapes of the HTTP surface.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{OrderRecord, WithdrawalRecord};

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub number: String,
    pub status: &'static str,
    /// Omitted while zero, i.e. until the order is PROCESSED.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Decimal>,
    pub uploaded_at: String,
}

impl From<&OrderRecord> for OrderView {
    fn from(order: &OrderRecord) -> Self {
        Self {
            number: order.order_number.to_string(),
            status: order.status.as_str(),
            accrual: (!order.accrual.is_zero()).then_some(order.accrual),
            uploaded_at: rfc3339(order.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WithdrawalView {
    pub order: String,
    pub sum: Decimal,
    pub processed_at: String,
}

impl From<&WithdrawalRecord> for WithdrawalView {
    fn from(withdrawal: &WithdrawalRecord) -> Self {
        Self {
            order: withdrawal.order_number.to_string(),
            sum: withdrawal.amount,
            processed_at: rfc3339(withdrawal.processed_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    pub sum: Decimal,
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use crate::ledger::OrderStatus;

    use super::*;

    fn order(status: OrderStatus, accrual: Decimal) -> OrderRecord {
        OrderRecord {
            user_id: "user-1".into(),
            order_number: 12345678903,
            status,
            accrual,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn zero_accrual_is_omitted() {
        let view = OrderView::from(&order(OrderStatus::New, Decimal::ZERO));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["number"], "12345678903");
        assert_eq!(json["status"], "NEW");
        assert!(json.get("accrual").is_none());
        assert_eq!(json["uploaded_at"], "2024-03-01T12:00:00Z");
    }

    #[test]
    fn processed_order_carries_its_accrual() {
        let view = OrderView::from(&order(OrderStatus::Processed, dec!(500.5)));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "PROCESSED");
        assert_eq!(json["accrual"], 500.5);
    }

    #[test]
    fn withdraw_request_parses_sum_as_decimal() {
        let request: WithdrawRequest =
            serde_json::from_str(r#"{"order":"4561261212345467","sum":100}"#).unwrap();
        assert_eq!(request.order, "4561261212345467");
        assert_eq!(request.sum, dec!(100));
    }
}
