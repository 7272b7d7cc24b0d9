//! redb-backed record store.
//!
//! One redb table per [`TableName`], keyed by the `u64` primary key, holding
//! postcard-encoded records. Every table is created when the store opens so
//! read transactions never meet a missing table.

use crate::error::{CoreError, Result};
use crate::model::Record;
use crate::schema::TableName;
use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, ReadableTableMetadata,
    TableDefinition, WriteTransaction,
};
use std::path::Path;

type RowTable = TableDefinition<'static, u64, &'static [u8]>;

const fn definition(table: TableName) -> RowTable {
    TableDefinition::new(table.as_str())
}

// =============================================================================
// RECORDSOURCE TRAIT
// =============================================================================

/// Typed record reads, available on snapshots and inside write transactions.
///
/// Domain operations take `&impl RecordSource` so the same lookup code runs
/// against a consistent snapshot or against the transaction about to write.
pub trait RecordSource {
    /// Look a record up by primary key.
    fn get<R: Record>(&self, id: u64) -> Result<Option<R>>;

    /// Every record of a table, in primary-key order.
    fn list<R: Record>(&self) -> Result<Vec<R>>;

    /// Like [`RecordSource::get`], but a missing row is [`CoreError::NotFound`].
    fn require<R: Record>(&self, id: u64) -> Result<R> {
        self.get(id)?.ok_or(CoreError::NotFound {
            entity: R::ENTITY,
            id,
        })
    }
}

fn read_one<R: Record>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> Result<Option<R>> {
    match table.get(id)? {
        Some(guard) => Ok(Some(postcard::from_bytes(guard.value())?)),
        None => Ok(None),
    }
}

fn read_all<R: Record>(table: &impl ReadableTable<u64, &'static [u8]>) -> Result<Vec<R>> {
    let mut records = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        records.push(postcard::from_bytes(value.value())?);
    }
    Ok(records)
}

// =============================================================================
// STORE
// =============================================================================

/// Handle to the database. Cheap to share behind an `Arc`.
pub struct Store {
    db: Database,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Open or create the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path.as_ref())?;
        let store = Self { db };
        store.ensure_tables()?;
        Ok(store)
    }

    /// A throwaway in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db };
        store.ensure_tables()?;
        Ok(store)
    }

    fn ensure_tables(&self) -> Result<()> {
        let txn = self.db.begin_write()?;
        for table in TableName::IMPORT_ORDER {
            txn.open_table(definition(table))?;
        }
        txn.commit()?;
        Ok(())
    }

    /// A consistent read-only view across all tables.
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            txn: self.db.begin_read()?,
        })
    }

    /// Row count of one table.
    pub fn count(&self, table: TableName) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let rows = txn.open_table(definition(table))?;
        Ok(rows.len()?)
    }

    /// Run `work` in one write transaction.
    ///
    /// Commits when `work` returns `Ok`; on `Err` nothing it wrote persists.
    pub fn write<T>(&self, work: impl FnOnce(&StoreTxn) -> Result<T>) -> Result<T> {
        let txn = StoreTxn {
            txn: self.db.begin_write()?,
        };
        match work(&txn) {
            Ok(value) => {
                txn.txn.commit()?;
                Ok(value)
            }
            Err(err) => {
                // an abort failure is secondary; report the cause
                let _ = txn.txn.abort();
                Err(err)
            }
        }
    }
}

impl RecordSource for Store {
    fn get<R: Record>(&self, id: u64) -> Result<Option<R>> {
        self.snapshot()?.get(id)
    }

    fn list<R: Record>(&self) -> Result<Vec<R>> {
        self.snapshot()?.list()
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Read transaction over the whole store.
pub struct Snapshot {
    txn: ReadTransaction,
}

impl RecordSource for Snapshot {
    fn get<R: Record>(&self, id: u64) -> Result<Option<R>> {
        let table = self.txn.open_table(definition(R::TABLE))?;
        read_one(&table, id)
    }

    fn list<R: Record>(&self) -> Result<Vec<R>> {
        let table = self.txn.open_table(definition(R::TABLE))?;
        read_all(&table)
    }
}

// =============================================================================
// WRITE TRANSACTION
// =============================================================================

/// Write transaction handed to [`Store::write`].
///
/// Every write checks the record's foreign keys against the rows visible in
/// this transaction, including rows it has written itself.
pub struct StoreTxn {
    txn: WriteTransaction,
}

impl StoreTxn {
    /// Whether `table` holds a row with primary key `id`.
    pub fn exists(&self, table: TableName, id: u64) -> Result<bool> {
        let rows = self.txn.open_table(definition(table))?;
        let found = rows.get(id)?.is_some();
        Ok(found)
    }

    /// Insert a new row; an existing primary key is [`CoreError::DuplicateKey`].
    pub fn insert<R: Record>(&self, record: &R) -> Result<()> {
        if self.exists(R::TABLE, record.id())? {
            return Err(CoreError::DuplicateKey {
                table: R::TABLE,
                column: R::TABLE.primary_key(),
                id: record.id(),
            });
        }
        self.check_references(record)?;
        self.put(record)
    }

    /// Insert or fully replace a row. Returns `true` when a row was replaced.
    pub fn upsert<R: Record>(&self, record: &R) -> Result<bool> {
        self.check_references(record)?;
        let replaced = self.exists(R::TABLE, record.id())?;
        self.put(record)?;
        Ok(replaced)
    }

    /// Read-modify-write one row.
    pub fn update<R: Record>(
        &self,
        id: u64,
        change: impl FnOnce(&mut R) -> Result<()>,
    ) -> Result<R> {
        let mut record: R = self.require(id)?;
        change(&mut record)?;
        self.check_references(&record)?;
        self.put(&record)?;
        Ok(record)
    }

    /// The next free primary key: one past the largest in use, from 1.
    pub fn next_id(&self, table: TableName) -> Result<u64> {
        let rows = self.txn.open_table(definition(table))?;
        let last = rows.last()?;
        let next = last
            .map(|(key, _)| key.value().saturating_add(1))
            .unwrap_or(1);
        Ok(next)
    }

    /// Empty `table` and every table that references it, transitively.
    ///
    /// Returns the number of rows removed per table, in cascade order.
    pub fn truncate_cascade(&self, table: TableName) -> Result<Vec<(TableName, u64)>> {
        table
            .cascade()
            .into_iter()
            .map(|t| self.clear(t).map(|removed| (t, removed)))
            .collect()
    }

    fn clear(&self, table: TableName) -> Result<u64> {
        let mut rows = self.txn.open_table(definition(table))?;
        let keys = rows
            .iter()?
            .map(|entry| entry.map(|(key, _)| key.value()))
            .collect::<std::result::Result<Vec<u64>, redb::StorageError>>()?;
        for key in &keys {
            rows.remove(*key)?;
        }
        Ok(keys.len() as u64)
    }

    fn check_references<R: Record>(&self, record: &R) -> Result<()> {
        for reference in record.references() {
            if !self.exists(reference.table, reference.id)? {
                return Err(CoreError::ForeignKey {
                    table: R::TABLE,
                    column: reference.column,
                    value: reference.id,
                    parent: reference.table,
                });
            }
        }
        Ok(())
    }

    fn put<R: Record>(&self, record: &R) -> Result<()> {
        let bytes = postcard::to_allocvec(record)?;
        let mut rows = self.txn.open_table(definition(R::TABLE))?;
        rows.insert(record.id(), bytes.as_slice())?;
        Ok(())
    }
}

impl RecordSource for StoreTxn {
    fn get<R: Record>(&self, id: u64) -> Result<Option<R>> {
        let table = self.txn.open_table(definition(R::TABLE))?;
        read_one(&table, id)
    }

    fn list<R: Record>(&self) -> Result<Vec<R>> {
        let table = self.txn.open_table(definition(R::TABLE))?;
        read_all(&table)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::model::{Garage, Location, Money, Product, Stock};

    fn garage(id: u64, name: &str) -> Garage {
        Garage {
            garage_id: id,
            name: name.to_string(),
            address: None,
            phone: None,
            email: None,
        }
    }

    fn product(id: u64) -> Product {
        Product {
            product_id: id,
            name: format!("Part {id}"),
            description: None,
            price: Money::from_pence(1000),
            discount_price: None,
            on_offer: false,
            reorder_level: 5,
        }
    }

    fn stock(id: u64, product_id: u64, garage_id: u64) -> Stock {
        Stock {
            stock_id: id,
            product_id,
            location: Location::garage(garage_id),
            quantity: 3,
        }
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let store = Store::in_memory().unwrap();
        store.write(|txn| txn.insert(&garage(1, "North"))).unwrap();

        let loaded: Option<Garage> = store.get(1).unwrap();
        assert_eq!(loaded, Some(garage(1, "North")));
        assert_eq!(store.count(TableName::Garages).unwrap(), 1);
    }

    #[test]
    fn insert_rejects_duplicate_keys() {
        let store = Store::in_memory().unwrap();
        store.write(|txn| txn.insert(&garage(1, "North"))).unwrap();

        let err = store
            .write(|txn| txn.insert(&garage(1, "Again")))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey { id: 1, .. }));
    }

    #[test]
    fn upsert_replaces_whole_row() {
        let store = Store::in_memory().unwrap();
        let replaced = store.write(|txn| txn.upsert(&garage(1, "North"))).unwrap();
        assert!(!replaced);
        let replaced = store.write(|txn| txn.upsert(&garage(1, "Renamed"))).unwrap();
        assert!(replaced);

        let loaded: Garage = store.require(1).unwrap();
        assert_eq!(loaded.name, "Renamed");
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let store = Store::in_memory().unwrap();
        store.write(|txn| txn.insert(&product(1))).unwrap();

        let err = store.write(|txn| txn.insert(&stock(1, 1, 9))).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ForeignKey {
                table: TableName::Stocks,
                column: "location_id",
                value: 9,
                parent: TableName::Garages,
            }
        ));
    }

    #[test]
    fn failed_work_rolls_back_everything() {
        let store = Store::in_memory().unwrap();
        let result: Result<()> = store.write(|txn| {
            txn.insert(&garage(1, "North"))?;
            txn.insert(&garage(2, "South"))?;
            Err(CoreError::validation("boom"))
        });
        assert!(result.is_err());
        assert_eq!(store.count(TableName::Garages).unwrap(), 0);
    }

    #[test]
    fn rows_written_earlier_in_the_transaction_satisfy_references() {
        let store = Store::in_memory().unwrap();
        store
            .write(|txn| {
                txn.insert(&garage(1, "North"))?;
                txn.insert(&product(1))?;
                txn.insert(&stock(1, 1, 1))
            })
            .unwrap();
        assert_eq!(store.count(TableName::Stocks).unwrap(), 1);
    }

    #[test]
    fn next_id_follows_largest_key() {
        let store = Store::in_memory().unwrap();
        let first = store.write(|txn| txn.next_id(TableName::Garages)).unwrap();
        assert_eq!(first, 1);

        store.write(|txn| txn.insert(&garage(41, "Far"))).unwrap();
        let next = store.write(|txn| txn.next_id(TableName::Garages)).unwrap();
        assert_eq!(next, 42);
    }

    #[test]
    fn truncate_cascades_to_dependents() {
        let store = Store::in_memory().unwrap();
        store
            .write(|txn| {
                txn.insert(&garage(1, "North"))?;
                txn.insert(&product(1))?;
                txn.insert(&product(2))?;
                txn.insert(&stock(1, 1, 1))
            })
            .unwrap();

        let removed = store
            .write(|txn| txn.truncate_cascade(TableName::Products))
            .unwrap();
        assert_eq!(removed[0], (TableName::Products, 2));
        assert!(removed.contains(&(TableName::Stocks, 1)));

        assert_eq!(store.count(TableName::Products).unwrap(), 0);
        assert_eq!(store.count(TableName::Stocks).unwrap(), 0);
        assert_eq!(store.count(TableName::Garages).unwrap(), 1);
    }

    #[test]
    fn update_applies_change() {
        let store = Store::in_memory().unwrap();
        store.write(|txn| txn.insert(&garage(1, "North"))).unwrap();

        let updated = store
            .write(|txn| {
                txn.update::<Garage>(1, |g| {
                    g.phone = Some("01632 960000".to_string());
                    Ok(())
                })
            })
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("01632 960000"));

        let missing = store.write(|txn| txn.update::<Garage>(5, |_| Ok(())));
        assert!(matches!(missing, Err(CoreError::NotFound { id: 5, .. })));
    }

    #[test]
    fn list_is_in_key_order() {
        let store = Store::in_memory().unwrap();
        store
            .write(|txn| {
                txn.insert(&garage(3, "C"))?;
                txn.insert(&garage(1, "A"))?;
                txn.insert(&garage(2, "B"))
            })
            .unwrap();
        let names: Vec<String> = store
            .list::<Garage>()
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parts.redb");
        {
            let store = Store::open(&path).unwrap();
            store.write(|txn| txn.insert(&garage(1, "North"))).unwrap();
        }
        let reopened = Store::open(&path).unwrap();
        let loaded: Option<Garage> = reopened.get(1).unwrap();
        assert!(loaded.is_some());
    }
}
