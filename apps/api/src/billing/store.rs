//! Invoice persistence behind a swappable trait.
//!
//! Carried in `AppState` as `Arc<dyn InvoiceStore>`. Postgres in production,
//! an in-process map when no database is configured and in tests.
//!
//! Both stores keep the entered fee lines and hand invoices back re-priced
//! through the amount engine; a stored total is never trusted on the way out.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::billing::amounts::{price_invoice, PricedFee, PricedInvoice};
use crate::errors::AppError;
use crate::models::invoice::{Invoice, InvoiceFeeRow, InvoiceRow, InvoiceStatus};

/// A persisted invoice with its identity and timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct StoredInvoice {
    pub id: Uuid,
    #[serde(flatten)]
    pub invoice: PricedInvoice,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// All invoices, newest first.
    async fn list(&self) -> Result<Vec<StoredInvoice>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<StoredInvoice>, AppError>;

    async fn create(&self, invoice: PricedInvoice) -> Result<StoredInvoice, AppError>;

    /// Replaces every field and the whole fee set. `None` if `id` is unknown.
    async fn update(&self, id: Uuid, invoice: PricedInvoice) -> Result<Option<StoredInvoice>, AppError>;

    /// `false` if `id` is unknown.
    async fn update_status(&self, id: Uuid, status: InvoiceStatus) -> Result<bool, AppError>;

    /// `false` if `id` is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

fn reprice(id: Uuid, invoice: Invoice) -> Result<PricedInvoice, AppError> {
    price_invoice(invoice).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("stored invoice {id} no longer validates: {e}"))
    })
}

// ────────────────────────────────────────────────────────────────────────────
// PgInvoiceStore
// ────────────────────────────────────────────────────────────────────────────

const INVOICE_COLUMNS: &str = "id, invoice_number, client_name, client_email, client_address, \
     patent_number, patent_title, currency, issue_date, due_date, status, notes, total_amount, \
     created_at, updated_at";

const FEE_COLUMNS: &str =
    "id, invoice_id, position, description, fee_type, quantity, unit_price, amount, created_at";

pub struct PgInvoiceStore {
    pool: PgPool,
}

impl PgInvoiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fees_for(&self, invoice_id: Uuid) -> Result<Vec<InvoiceFeeRow>, AppError> {
        let rows = sqlx::query_as::<_, InvoiceFeeRow>(&format!(
            "SELECT {FEE_COLUMNS} FROM invoice_fees WHERE invoice_id = $1 ORDER BY position"
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    fn assemble(row: InvoiceRow, fees: Vec<InvoiceFeeRow>) -> Result<StoredInvoice, AppError> {
        let id = row.id;
        let created_at = row.created_at;
        let updated_at = row.updated_at;
        let invoice = reprice(id, row.into_invoice(fees)?)?;
        Ok(StoredInvoice {
            id,
            invoice,
            created_at,
            updated_at,
        })
    }
}

async fn insert_fees(
    tx: &mut Transaction<'_, Postgres>,
    invoice_id: Uuid,
    fees: &[PricedFee],
) -> Result<(), sqlx::Error> {
    for (position, fee) in fees.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO invoice_fees
                (id, invoice_id, position, description, fee_type, quantity, unit_price, amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(invoice_id)
        .bind(position as i32)
        .bind(&fee.description)
        .bind(fee.fee_type.as_str())
        .bind(fee.quantity)
        .bind(fee.unit_price)
        .bind(fee.amount)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl InvoiceStore for PgInvoiceStore {
    async fn list(&self) -> Result<Vec<StoredInvoice>, AppError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let fee_rows = sqlx::query_as::<_, InvoiceFeeRow>(&format!(
            "SELECT {FEE_COLUMNS} FROM invoice_fees WHERE invoice_id = ANY($1) \
             ORDER BY invoice_id, position"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut fees_by_invoice: HashMap<Uuid, Vec<InvoiceFeeRow>> = HashMap::new();
        for fee in fee_rows {
            fees_by_invoice.entry(fee.invoice_id).or_default().push(fee);
        }

        debug!("Loaded {} invoices", rows.len());
        rows.into_iter()
            .map(|row| {
                let fees = fees_by_invoice.remove(&row.id).unwrap_or_default();
                Self::assemble(row, fees)
            })
            .collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredInvoice>, AppError> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let fees = self.fees_for(id).await?;
                Self::assemble(row, fees).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn create(&self, invoice: PricedInvoice) -> Result<StoredInvoice, AppError> {
        let id = Uuid::new_v4();
        let d = invoice.details();
        let mut tx = self.pool.begin().await?;

        let (created_at, updated_at): (DateTime<Utc>, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO invoices
                (id, invoice_number, client_name, client_email, client_address,
                 patent_number, patent_title, currency, issue_date, due_date, status, notes,
                 total_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&d.invoice_number)
        .bind(&d.client.name)
        .bind(&d.client.email)
        .bind(&d.client.address)
        .bind(&d.patent.number)
        .bind(&d.patent.title)
        .bind(d.currency.code())
        .bind(d.issue_date)
        .bind(d.due_date)
        .bind(d.status.as_str())
        .bind(&d.notes)
        .bind(invoice.total_amount())
        .fetch_one(&mut *tx)
        .await?;

        insert_fees(&mut tx, id, invoice.fees()).await?;
        tx.commit().await?;

        info!("Invoice {id} ({}) stored with {} fees", d.invoice_number, invoice.fees().len());
        Ok(StoredInvoice {
            id,
            invoice,
            created_at,
            updated_at,
        })
    }

    async fn update(&self, id: Uuid, invoice: PricedInvoice) -> Result<Option<StoredInvoice>, AppError> {
        let d = invoice.details();
        let mut tx = self.pool.begin().await?;

        let timestamps: Option<(DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            r#"
            UPDATE invoices SET
                invoice_number = $2, client_name = $3, client_email = $4, client_address = $5,
                patent_number = $6, patent_title = $7, currency = $8, issue_date = $9,
                due_date = $10, status = $11, notes = $12, total_amount = $13,
                updated_at = NOW()
            WHERE id = $1
            RETURNING created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&d.invoice_number)
        .bind(&d.client.name)
        .bind(&d.client.email)
        .bind(&d.client.address)
        .bind(&d.patent.number)
        .bind(&d.patent.title)
        .bind(d.currency.code())
        .bind(d.issue_date)
        .bind(d.due_date)
        .bind(d.status.as_str())
        .bind(&d.notes)
        .bind(invoice.total_amount())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((created_at, updated_at)) = timestamps else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM invoice_fees WHERE invoice_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_fees(&mut tx, id, invoice.fees()).await?;
        tx.commit().await?;

        info!("Invoice {id} updated");
        Ok(Some(StoredInvoice {
            id,
            invoice,
            created_at,
            updated_at,
        }))
    }

    async fn update_status(&self, id: Uuid, status: InvoiceStatus) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE invoices SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryInvoiceStore
// ────────────────────────────────────────────────────────────────────────────

struct MemoryRecord {
    invoice: Invoice,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Insertion counter; breaks `created_at` ties when listing.
    seq: u64,
}

#[derive(Default)]
struct MemoryState {
    records: HashMap<Uuid, MemoryRecord>,
    next_seq: u64,
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryInvoiceStore {
    state: RwLock<MemoryState>,
}

impl MemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn stored(id: Uuid, record: &MemoryRecord) -> Result<StoredInvoice, AppError> {
        Ok(StoredInvoice {
            id,
            invoice: reprice(id, record.invoice.clone())?,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

#[async_trait]
impl InvoiceStore for MemoryInvoiceStore {
    async fn list(&self) -> Result<Vec<StoredInvoice>, AppError> {
        let state = self.state.read().await;
        let mut records: Vec<(&Uuid, &MemoryRecord)> = state.records.iter().collect();
        records.sort_by(|a, b| {
            b.1.created_at
                .cmp(&a.1.created_at)
                .then(b.1.seq.cmp(&a.1.seq))
        });
        records
            .into_iter()
            .map(|(id, record)| Self::stored(*id, record))
            .collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredInvoice>, AppError> {
        let state = self.state.read().await;
        state
            .records
            .get(&id)
            .map(|record| Self::stored(id, record))
            .transpose()
    }

    async fn create(&self, invoice: PricedInvoice) -> Result<StoredInvoice, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut state = self.state.write().await;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.records.insert(
            id,
            MemoryRecord {
                invoice: invoice.to_invoice(),
                created_at: now,
                updated_at: now,
                seq,
            },
        );
        debug!("Invoice {id} held in memory");
        Ok(StoredInvoice {
            id,
            invoice,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(&self, id: Uuid, invoice: PricedInvoice) -> Result<Option<StoredInvoice>, AppError> {
        let mut state = self.state.write().await;
        let Some(record) = state.records.get_mut(&id) else {
            return Ok(None);
        };
        record.invoice = invoice.to_invoice();
        record.updated_at = Utc::now();
        Ok(Some(StoredInvoice {
            id,
            invoice,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }))
    }

    async fn update_status(&self, id: Uuid, status: InvoiceStatus) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        match state.records.get_mut(&id) {
            Some(record) => {
                record.invoice.details.status = status;
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        Ok(state.records.remove(&id).is_some())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::currency::Currency;
    use crate::models::invoice::{Client, FeeLine, FeeType, InvoiceDetails, Patent};
    use chrono::NaiveDate;

    fn priced(number: &str, prices: &[&str]) -> PricedInvoice {
        price_invoice(Invoice {
            details: InvoiceDetails {
                invoice_number: number.to_string(),
                client: Client {
                    name: "Acme".to_string(),
                    email: "ip@acme.test".to_string(),
                    address: "1 Main St".to_string(),
                },
                patent: Patent {
                    number: "US 1".to_string(),
                    title: "Widget".to_string(),
                },
                currency: Currency::Usd,
                issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                due_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                status: InvoiceStatus::Draft,
                notes: None,
            },
            fees: prices
                .iter()
                .enumerate()
                .map(|(i, p)| FeeLine {
                    description: format!("line {i}"),
                    fee_type: FeeType::Filing,
                    quantity: "1".parse().unwrap(),
                    unit_price: p.parse().unwrap(),
                })
                .collect(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_memory_create_then_get() {
        let store = MemoryInvoiceStore::new();
        let created = store.create(priced("INV-1", &["10", "5.5"])).await.unwrap();
        let fetched = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.invoice, created.invoice);
        assert_eq!(fetched.invoice.total_amount().to_string(), "15.50");
        assert_eq!(fetched.invoice.fees()[1].description, "line 1");
    }

    #[tokio::test]
    async fn test_memory_list_newest_first() {
        let store = MemoryInvoiceStore::new();
        store.create(priced("INV-1", &["1"])).await.unwrap();
        store.create(priced("INV-2", &["1"])).await.unwrap();
        store.create(priced("INV-3", &["1"])).await.unwrap();
        let numbers: Vec<String> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|s| s.invoice.invoice_number().to_string())
            .collect();
        assert_eq!(numbers, vec!["INV-3", "INV-2", "INV-1"]);
    }

    #[tokio::test]
    async fn test_memory_update_replaces_fee_set() {
        let store = MemoryInvoiceStore::new();
        let created = store.create(priced("INV-1", &["10", "20"])).await.unwrap();
        let updated = store
            .update(created.id, priced("INV-1b", &["7"]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.created_at, created.created_at);
        let fetched = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.invoice.fees().len(), 1);
        assert_eq!(fetched.invoice.invoice_number(), "INV-1b");
        assert_eq!(fetched.invoice.total_amount().to_string(), "7.00");
    }

    #[tokio::test]
    async fn test_memory_status_and_delete() {
        let store = MemoryInvoiceStore::new();
        let created = store.create(priced("INV-1", &["1"])).await.unwrap();
        assert!(store.update_status(created.id, InvoiceStatus::Paid).await.unwrap());
        let fetched = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.invoice.details().status, InvoiceStatus::Paid);

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        assert!(store.get(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_unknown_ids() {
        let store = MemoryInvoiceStore::new();
        let id = Uuid::new_v4();
        assert!(store.update(id, priced("X", &[])).await.unwrap().is_none());
        assert!(!store.update_status(id, InvoiceStatus::Sent).await.unwrap());
    }
}
