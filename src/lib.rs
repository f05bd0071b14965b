#![deny(missing_docs)]
//! Dataframe-style access to a single set of a namespace/set/bin key-value
//! store.
//!
//! A [`SetFrame`] lists the set's columns from server metadata, builds a row
//! index by scanning the set's primary keys through a scoped on-disk
//! buffer, and fetches the first rows of that index with one batched get.
//! Everything is blocking; the store itself is reached through the
//! [`store::Connector`] and [`store::StoreClient`] traits.

mod error;
mod frame;
mod logging;

pub use crate::{
    conn::{ConnectionManager, ConnectivityError},
    error::FrameError,
    fetch::{Row, Rows},
    frame::SetFrame,
    index::RowIndex,
    key::RowKey,
    option::{CollectionRef, FrameOptions, HeadPolicy, DEFAULT_HEAD_ROWS},
};

pub mod conn;
pub mod fetch;
pub mod index;
pub mod info;
pub mod key;
pub mod mem;
pub mod store;

/// Frame configuration.
pub mod option;
