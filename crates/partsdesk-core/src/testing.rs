//! Seed data shared by the unit tests.
//!
//! Two garages, one warehouse, three products, one user per role. Every
//! password is `password123`.

#![allow(clippy::unwrap_used)]

use crate::import::{ImportOptions, import_files};
use crate::storage::Store;
use std::collections::BTreeMap;

pub(crate) const PASSWORD: &str = "password123";

pub(crate) const ROLES: &str = r#"role_id,name,permissions
1,local_staff,"[""record_sales"",""view_stock"",""place_orders""]"
2,warehouse_staff,"[""view_stock"",""update_prices"",""fulfil_orders""]"
3,manager,"[]"
"#;

pub(crate) const GARAGES: &str = "garage_id,name,address,phone,email
1,Northside Garage,1 High St,01632 960001,north@example.com
2,Southside Garage,2 Low Rd,01632 960002,south@example.com
";

pub(crate) const WAREHOUSES: &str = "warehouse_id,name,address,phone,email
1,Central Depot,Unit 4 Ring Rd,01632 960100,depot@example.com
";

pub(crate) const PRODUCTS: &str = "product_id,name,description,price,discount_price,on_offer,reorder_level
1,Brake pads,Front axle set,24.99,19.99,true,5
2,Oil filter,,8.50,,false,10
3,Spark plug,Iridium,3.25,,false,20
";

pub(crate) const USERS: &str = "user_id,username,password_hash,email,location_id,location_type,role_id
1,alice,ef92b778bafe771e89245b89ecbc08a44a4e166c06659911881f383d4473e94f,alice@example.com,1,garage,1
2,bob,ef92b778bafe771e89245b89ecbc08a44a4e166c06659911881f383d4473e94f,bob@example.com,1,warehouse,2
3,carol,ef92b778bafe771e89245b89ecbc08a44a4e166c06659911881f383d4473e94f,carol@example.com,,,3
";

pub(crate) const CUSTOMERS: &str = "customer_id,name,address,phone,email
1,Acme Motors,9 Mill Lane,01632 960200,fleet@acme.example
2,Jane Doe,,,jane@example.com
";

pub(crate) const STOCKS: &str = "stock_id,product_id,location_id,location_type,quantity
1,1,1,garage,3
2,2,1,garage,12
3,1,1,warehouse,100
4,2,1,warehouse,40
5,3,1,warehouse,15
";

pub(crate) const SALES: &str = "sale_id,garage_id,customer_id,total_amount,sale_date,status
1,1,1,58.48,2024-03-01 10:00:00,completed
2,2,2,8.50,2024-03-02 11:30:00,completed
";

pub(crate) const SALE_ITEMS: &str = "sale_item_id,sale_id,product_id,quantity,price,discount
1,1,1,2,24.99,0
2,1,2,1,8.50,0
3,2,2,1,8.50,0
";

pub(crate) const PAYMENTS: &str = "payment_id,sale_id,amount,payment_method,payment_date
1,1,58.48,card,2024-03-01 10:05:00
";

pub(crate) const ORDERS: &str = "order_id,from_id,from_type,to_id,to_type,status,is_emergency,order_date
1,1,garage,1,warehouse,pending,false,2024-03-03 09:00:00
2,2,garage,1,warehouse,shipped,true,2024-03-04 09:00:00
";

pub(crate) const ORDER_ITEMS: &str = "order_item_id,order_id,product_id,quantity,price
1,1,2,10,8.50
2,2,1,4,19.99
";

/// Every seed file keyed by table name.
pub(crate) fn seed_files() -> BTreeMap<String, String> {
    [
        ("roles", ROLES),
        ("garages", GARAGES),
        ("warehouses", WAREHOUSES),
        ("products", PRODUCTS),
        ("users", USERS),
        ("customers", CUSTOMERS),
        ("stocks", STOCKS),
        ("sales", SALES),
        ("sale_items", SALE_ITEMS),
        ("payments", PAYMENTS),
        ("orders", ORDERS),
        ("order_items", ORDER_ITEMS),
    ]
    .into_iter()
    .map(|(table, content)| (table.to_string(), content.to_string()))
    .collect()
}

/// An in-memory store loaded with every seed file.
pub(crate) fn seeded_store() -> Store {
    let store = Store::in_memory().unwrap();
    let summary = import_files(&store, &seed_files(), ImportOptions::default());
    assert!(summary.success, "seed import failed: {:?}", summary.results);
    store
}
