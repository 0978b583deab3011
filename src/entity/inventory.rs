//! Inventory rows and inventory transactions.

use crate::entity::FromRow;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use may_postgres::Row;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-(product, warehouse) stock row. The pair is unique in the table.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity_on_hand: i32,
    pub quantity_reserved: i32,
    pub reorder_level: i32,
    pub min_stock: Option<i32>,
    pub max_stock: Option<i32>,
    pub average_cost: Option<Decimal>,
    pub last_count_date: Option<DateTime<Utc>>,
    pub last_counted_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

impl InventoryRow {
    /// `quantity_on_hand - quantity_reserved`; every reserve keeps this
    /// non-negative.
    pub fn available(&self) -> i32 {
        self.quantity_on_hand - self.quantity_reserved
    }
}

impl FromRow for InventoryRow {
    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(InventoryRow {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            warehouse_id: row.try_get("warehouse_id")?,
            quantity_on_hand: row.try_get("quantity_on_hand")?,
            quantity_reserved: row.try_get("quantity_reserved")?,
            reorder_level: row.try_get("reorder_level")?,
            min_stock: row.try_get("min_stock")?,
            max_stock: row.try_get("max_stock")?,
            average_cost: row.try_get("average_cost")?,
            last_count_date: row.try_get("last_count_date")?,
            last_counted_by: row.try_get("last_counted_by")?,
            updated_at: row.try_get("updated_at")?,
            updated_by: row.try_get("updated_by")?,
        })
    }
}

/// Inventory transaction type, stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Purchase,
    Sale,
    TransferOut,
    TransferIn,
    Consumption,
    Adjustment,
    Return,
    CycleCount,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Purchase => "PURCHASE",
            TransactionType::Sale => "SALE",
            TransactionType::TransferOut => "TRANSFER_OUT",
            TransactionType::TransferIn => "TRANSFER_IN",
            TransactionType::Consumption => "CONSUMPTION",
            TransactionType::Adjustment => "ADJUSTMENT",
            TransactionType::Return => "RETURN",
            TransactionType::CycleCount => "CYCLE_COUNT",
        }
    }

    pub fn parse(s: &str) -> Result<Self, StoreError> {
        match s {
            "PURCHASE" => Ok(TransactionType::Purchase),
            "SALE" => Ok(TransactionType::Sale),
            "TRANSFER_OUT" => Ok(TransactionType::TransferOut),
            "TRANSFER_IN" => Ok(TransactionType::TransferIn),
            "CONSUMPTION" => Ok(TransactionType::Consumption),
            "ADJUSTMENT" => Ok(TransactionType::Adjustment),
            "RETURN" => Ok(TransactionType::Return),
            "CYCLE_COUNT" => Ok(TransactionType::CycleCount),
            other => Err(StoreError::InvalidArgument(format!(
                "unknown transaction type: {other}"
            ))),
        }
    }
}

/// An append-mostly inventory movement. After creation only approval,
/// rejection and corrective cost fields change.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryTransaction {
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub transaction_type: TransactionType,
    /// Signed: inbound positive, outbound negative.
    pub quantity: i32,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub reason: Option<String>,
    pub unit_cost: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub batch_number: Option<String>,
    pub serial_number: Option<String>,
    pub from_warehouse_id: Option<Uuid>,
    pub to_warehouse_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
}

impl InventoryTransaction {
    /// Pending iff never approved.
    pub fn is_pending(&self) -> bool {
        self.approved_at.is_none()
    }
}

impl FromRow for InventoryTransaction {
    fn from_row(row: &Row) -> Result<Self, StoreError> {
        let transaction_type: String = row.try_get("transaction_type")?;
        Ok(InventoryTransaction {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            warehouse_id: row.try_get("warehouse_id")?,
            transaction_type: TransactionType::parse(&transaction_type)?,
            quantity: row.try_get("quantity")?,
            reference_type: row.try_get("reference_type")?,
            reference_id: row.try_get("reference_id")?,
            reason: row.try_get("reason")?,
            unit_cost: row.try_get("unit_cost")?,
            total_cost: row.try_get("total_cost")?,
            batch_number: row.try_get("batch_number")?,
            serial_number: row.try_get("serial_number")?,
            from_warehouse_id: row.try_get("from_warehouse_id")?,
            to_warehouse_id: row.try_get("to_warehouse_id")?,
            created_at: row.try_get("created_at")?,
            created_by: row.try_get("created_by")?,
            approved_at: row.try_get("approved_at")?,
            approved_by: row.try_get("approved_by")?,
        })
    }
}

/// Input record for appending an inventory transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct NewInventoryTransaction {
    pub id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: i32,
    #[serde(default)]
    pub reference_type: Option<String>,
    #[serde(default)]
    pub reference_id: Option<Uuid>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub unit_cost: Option<Decimal>,
    #[serde(default)]
    pub total_cost: Option<Decimal>,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub from_warehouse_id: Option<Uuid>,
    #[serde(default)]
    pub to_warehouse_id: Option<Uuid>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_round_trip() {
        for t in [
            TransactionType::Purchase,
            TransactionType::Sale,
            TransactionType::TransferOut,
            TransactionType::TransferIn,
            TransactionType::Consumption,
            TransactionType::Adjustment,
            TransactionType::Return,
            TransactionType::CycleCount,
        ] {
            assert_eq!(TransactionType::parse(t.as_str()).unwrap(), t);
        }
        assert!(TransactionType::parse("GIFT").is_err());
    }
}
