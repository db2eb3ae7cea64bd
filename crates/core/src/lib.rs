//! Vapeshop Core - Shared domain library.
//!
//! This crate provides the types used across all Vapeshop components:
//! - `storefront` - Public catalog site with ordering via WhatsApp
//! - `admin` - Back-office for catalog, orders and payments
//! - `cli` - Catalog import/export tooling
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Persistence lives in `vapeshop-firebase`.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for keys, emails, phones and statuses
//! - [`catalog`] - The section → brand → line → product tree and its mutations
//! - [`user`] - User profiles, orders and service requests
//! - [`search`] - Case-insensitive substring search over the catalog
//! - [`whatsapp`] - Hand-off message and `wa.me` link construction

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod search;
pub mod types;
pub mod user;
pub mod whatsapp;

pub use catalog::{
    Brand, BrandDetails, Catalog, CatalogError, EntityKind, Line, LineDetails, Product, Section,
};
pub use types::*;
pub use user::{NewOrder, NewServiceRequest, Order, OrderItem, ServiceRequest, UserProfile};
