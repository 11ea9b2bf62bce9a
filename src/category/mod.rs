//! Categories for grouping transactions.

mod db;
mod domain;
mod endpoints;

pub use db::{
    create_category, create_category_table, delete_category, get_all_categories, get_category,
    update_category,
};
pub use domain::{Category, CategoryForm, CategoryId, CategoryName, UNCATEGORIZED};
pub use endpoints::{
    create_category_endpoint, delete_category_endpoint, list_categories_endpoint,
    update_category_endpoint,
};
