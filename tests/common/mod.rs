//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::path::Path;

use setframe::{
    mem::{MemoryConnector, MemoryStore},
    store::Record,
    FrameOptions, SetFrame,
};

pub const NAMESPACE: &str = "test";
pub const SET: &str = "iris";
pub const SPECIES: [&str; 3] = ["setosa", "versicolor", "virginica"];

/// Store holding `rows` iris-like records keyed `1..=rows`.
pub fn iris_store(rows: i64) -> MemoryStore {
    let store = MemoryStore::new();
    store.create_namespace(NAMESPACE);
    for id in 1..=rows {
        store.put(NAMESPACE, SET, iris_record(id));
    }
    store
}

pub fn iris_record(id: i64) -> Record {
    Record::with_key(id)
        .bin("id", id)
        .bin("Sepal Length", 4.3 + id.rem_euclid(30) as f64 / 10.0)
        .bin("Sepal Width", 2.0 + id.rem_euclid(20) as f64 / 10.0)
        .bin("Species", SPECIES[id.rem_euclid(3) as usize])
}

/// Integer-keyed frame over the iris set whose key buffers live in `dir`.
pub fn iris_frame(store: &MemoryStore, dir: &Path) -> SetFrame<MemoryConnector> {
    SetFrame::new(
        MemoryConnector::new(store.clone()),
        FrameOptions::new(NAMESPACE, SET, "id").buffer_dir(dir),
    )
}

/// Files left behind in a buffer directory.
pub fn leftover_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .expect("buffer dir should be readable")
        .count()
}
