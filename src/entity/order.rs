//! Order record and status enums.

use crate::entity::FromRow;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use may_postgres::Row;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order lifecycle status, stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, StoreError> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            "REFUNDED" => Ok(OrderStatus::Refunded),
            other => Err(StoreError::InvalidArgument(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// Payment status, stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Authorized,
    Paid,
    PartiallyRefunded,
    Refunded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Authorized => "AUTHORIZED",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::PartiallyRefunded => "PARTIALLY_REFUNDED",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, StoreError> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "AUTHORIZED" => Ok(PaymentStatus::Authorized),
            "PAID" => Ok(PaymentStatus::Paid),
            "PARTIALLY_REFUNDED" => Ok(PaymentStatus::PartiallyRefunded),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            "FAILED" => Ok(PaymentStatus::Failed),
            other => Err(StoreError::InvalidArgument(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

/// An order header.
///
/// Status transitions go through the repository's status setter, which
/// captures the prior `status` into `previous_status` atomically; the
/// general update path never touches `status`.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub company_id: Option<Uuid>,
    pub status: OrderStatus,
    pub previous_status: Option<OrderStatus>,
    pub payment_status: PaymentStatus,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub refunded_amount: Decimal,
    pub currency: String,
    pub order_date: DateTime<Utc>,
    pub shipping_address_id: Option<Uuid>,
    pub billing_address_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Order {
    fn from_row(row: &Row) -> Result<Self, StoreError> {
        let status: String = row.try_get("status")?;
        let previous_status: Option<String> = row.try_get("previous_status")?;
        let payment_status: String = row.try_get("payment_status")?;
        Ok(Order {
            id: row.try_get("id")?,
            order_number: row.try_get("order_number")?,
            customer_id: row.try_get("customer_id")?,
            company_id: row.try_get("company_id")?,
            status: OrderStatus::parse(&status)?,
            previous_status: previous_status
                .as_deref()
                .map(OrderStatus::parse)
                .transpose()?,
            payment_status: PaymentStatus::parse(&payment_status)?,
            subtotal: row.try_get("subtotal")?,
            tax_amount: row.try_get("tax_amount")?,
            shipping_amount: row.try_get("shipping_amount")?,
            discount_amount: row.try_get("discount_amount")?,
            total_amount: row.try_get("total_amount")?,
            paid_amount: row.try_get("paid_amount")?,
            refunded_amount: row.try_get("refunded_amount")?,
            currency: row.try_get("currency")?,
            order_date: row.try_get("order_date")?,
            shipping_address_id: row.try_get("shipping_address_id")?,
            billing_address_id: row.try_get("billing_address_id")?,
            notes: row.try_get("notes")?,
            created_by: row.try_get("created_by")?,
            updated_by: row.try_get("updated_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            assert_eq!(OrderStatus::parse(s.as_str()).unwrap(), s);
        }
        assert!(OrderStatus::parse("SIDEWAYS").is_err());
    }

    #[test]
    fn test_payment_status_round_trip() {
        assert_eq!(
            PaymentStatus::parse("PARTIALLY_REFUNDED").unwrap(),
            PaymentStatus::PartiallyRefunded
        );
        assert!(PaymentStatus::parse("paid").is_err());
    }
}
