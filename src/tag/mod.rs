//! User-defined tags for labelling expenses, recurring expenses and mileage
//! logs.

mod db;
mod domain;
mod endpoints;

pub use db::{
    create_tag, create_tag_table, delete_tag, get_all_tags, get_tag, resolve_tag_names, update_tag,
};
pub use domain::{Tag, TagId, TagName};
pub use endpoints::{
    TagBody, create_tag_endpoint, delete_tag_endpoint, get_tags, update_tag_endpoint,
};
