//! Customers, garages and warehouses.

use crate::error::{CoreError, Result};
use crate::model::{Customer, Garage, Location, LocationType, Warehouse};
use crate::schema::TableName;
use crate::storage::{RecordSource, Store};
use serde::Deserialize;

/// A customer to register at a garage counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewCustomer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Register a customer. Name and email are required.
pub fn create_customer(store: &Store, new: &NewCustomer) -> Result<Customer> {
    let name = new.name.trim();
    let email = new.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(CoreError::validation("Name and email are required"));
    }

    store.write(|txn| {
        let customer = Customer {
            customer_id: txn.next_id(TableName::Customers)?,
            name: name.to_string(),
            address: non_blank(new.address.as_deref()),
            phone: non_blank(new.phone.as_deref()),
            email: Some(email.to_string()),
        };
        txn.insert(&customer)?;
        Ok(customer)
    })
}

pub fn list_customers(source: &impl RecordSource) -> Result<Vec<Customer>> {
    let mut customers: Vec<Customer> = source.list()?;
    customers.sort_by(|a, b| a.name.cmp(&b.name).then(a.customer_id.cmp(&b.customer_id)));
    Ok(customers)
}

pub fn list_garages(source: &impl RecordSource) -> Result<Vec<Garage>> {
    let mut garages: Vec<Garage> = source.list()?;
    garages.sort_by(|a, b| a.name.cmp(&b.name).then(a.garage_id.cmp(&b.garage_id)));
    Ok(garages)
}

pub fn list_warehouses(source: &impl RecordSource) -> Result<Vec<Warehouse>> {
    let mut warehouses: Vec<Warehouse> = source.list()?;
    warehouses.sort_by(|a, b| a.name.cmp(&b.name).then(a.warehouse_id.cmp(&b.warehouse_id)));
    Ok(warehouses)
}

/// Display name of a garage or warehouse, `None` if it no longer exists.
pub fn location_name(source: &impl RecordSource, location: Location) -> Result<Option<String>> {
    Ok(match location.kind {
        LocationType::Garage => source.get::<Garage>(location.id)?.map(|g| g.name),
        LocationType::Warehouse => source.get::<Warehouse>(location.id)?.map(|w| w.name),
    })
}

/// Fails with [`CoreError::NotFound`] unless the location exists.
pub fn require_location(source: &impl RecordSource, location: Location) -> Result<String> {
    location_name(source, location)?.ok_or(CoreError::NotFound {
        entity: location.kind.as_str(),
        id: location.id,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::testing::seeded_store;

    #[test]
    fn create_customer_assigns_next_id() {
        let store = seeded_store();
        let customer = create_customer(
            &store,
            &NewCustomer {
                name: "  Zed Autos ".to_string(),
                email: "zed@example.com".to_string(),
                phone: Some(String::new()),
                address: Some("3 Quay St".to_string()),
            },
        )
        .unwrap();

        assert_eq!(customer.customer_id, 3);
        assert_eq!(customer.name, "Zed Autos");
        assert_eq!(customer.phone, None);
        assert_eq!(customer.address.as_deref(), Some("3 Quay St"));
        assert_eq!(store.count(TableName::Customers).unwrap(), 3);
    }

    #[test]
    fn create_customer_requires_name_and_email() {
        let store = seeded_store();
        let err = create_customer(
            &store,
            &NewCustomer {
                name: "Nobody".to_string(),
                ..NewCustomer::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Name and email are required");
    }

    #[test]
    fn lists_are_sorted_by_name() {
        let store = seeded_store();
        let customers: Vec<String> = list_customers(&store)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(customers, vec!["Acme Motors", "Jane Doe"]);

        let garages: Vec<String> = list_garages(&store)
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(garages, vec!["Northside Garage", "Southside Garage"]);
        assert_eq!(list_warehouses(&store).unwrap().len(), 1);
    }

    #[test]
    fn location_names_resolve_by_kind() {
        let store = seeded_store();
        assert_eq!(
            location_name(&store, Location::warehouse(1)).unwrap().as_deref(),
            Some("Central Depot")
        );
        assert_eq!(location_name(&store, Location::warehouse(2)).unwrap(), None);
        let err = require_location(&store, Location::garage(9)).unwrap_err();
        assert_eq!(err.to_string(), "garage 9 not found");
    }
}
