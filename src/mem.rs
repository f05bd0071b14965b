//! In-process store speaking the same info text formats as a server.
//!
//! [`MemoryStore`] is a cheaply cloneable handle to shared state; every
//! [`MemoryClient`] created through a [`MemoryConnector`] sees the same data.
//! The store can inject faults (refused connects, dropped connections, scans
//! that fail midway) and records the scans and batched gets it served.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::store::{
    BatchReply, Connector, InfoReply, InfoResponse, KeyTuple, Record, ScanRequest, ScanVisitor,
    StoreClient, StoreError, UserKey, Value,
};

const DEFAULT_NODE: &str = "mem-node";
const BIN_NAME_QUOTA: usize = 32768;
/// Server result codes used for injected or structural failures.
const RESULT_FAIL_UNKNOWN: i32 = 1;
const RESULT_NAMESPACE_NOT_FOUND: i32 = 20;

#[derive(Debug, Clone)]
struct Entry {
    key: Option<UserKey>,
    send_key: bool,
    bins: Vec<(String, Value)>,
}

impl Entry {
    fn to_record(&self, projection: &[String]) -> Record {
        let bins = if projection.is_empty() {
            self.bins.clone()
        } else {
            self.bins
                .iter()
                .filter(|(name, _)| projection.contains(name))
                .cloned()
                .collect()
        };
        Record {
            key: if self.send_key { self.key.clone() } else { None },
            bins,
        }
    }
}

#[derive(Debug, Default)]
struct SetData {
    name: String,
    entries: Vec<Entry>,
}

#[derive(Debug, Default)]
struct Namespace {
    name: String,
    sets: Vec<SetData>,
}

impl Namespace {
    fn set(&self, name: &str) -> Option<&SetData> {
        self.sets.iter().find(|set| set.name == name)
    }

    fn set_mut(&mut self, name: &str) -> &mut SetData {
        let pos = match self.sets.iter().position(|set| set.name == name) {
            Some(pos) => pos,
            None => {
                self.sets.push(SetData {
                    name: name.to_string(),
                    entries: Vec::new(),
                });
                self.sets.len() - 1
            }
        };
        &mut self.sets[pos]
    }

    /// Bin names across every set, in first-seen order.
    fn bin_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for set in &self.sets {
            for entry in &set.entries {
                for (name, _) in &entry.bins {
                    if !names.contains(&name.as_str()) {
                        names.push(name);
                    }
                }
            }
        }
        names
    }
}

#[derive(Debug, Default)]
struct State {
    namespaces: Vec<Namespace>,
    epoch: u64,
    refuse_connections: bool,
    connects: u64,
    fail_scan_after: Option<usize>,
    reverse_scans: bool,
    info_overrides: Vec<(String, InfoResponse)>,
    scans: Vec<ScanRequest>,
    batches: Vec<Vec<KeyTuple>>,
}

impl State {
    fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }

    fn namespace_mut(&mut self, name: &str) -> &mut Namespace {
        let pos = match self.namespaces.iter().position(|ns| ns.name == name) {
            Some(pos) => pos,
            None => {
                self.namespaces.push(Namespace {
                    name: name.to_string(),
                    sets: Vec::new(),
                });
                self.namespaces.len() - 1
            }
        };
        &mut self.namespaces[pos]
    }

    fn upsert(&mut self, namespace: &str, set_name: &str, entry: Entry) {
        let set = self.namespace_mut(namespace).set_mut(set_name);
        let existing = entry.key.as_ref().and_then(|key| {
            set.entries
                .iter()
                .position(|other| other.key.as_ref() == Some(key))
        });
        match existing {
            Some(pos) => set.entries[pos] = entry,
            None => set.entries.push(entry),
        }
    }

    fn info_payload(&self, command: &str) -> Option<String> {
        if command == "namespaces" {
            let names: Vec<&str> = self.namespaces.iter().map(|ns| ns.name.as_str()).collect();
            return Some(names.join(";"));
        }
        if let Some(ns) = command.strip_prefix("sets/") {
            let Some(namespace) = self.namespace(ns) else {
                return Some(String::new());
            };
            let records: Vec<String> = namespace
                .sets
                .iter()
                .map(|set| {
                    format!(
                        "ns={}:set_name={}:objects={}",
                        namespace.name,
                        set.name,
                        set.entries.len()
                    )
                })
                .collect();
            return Some(records.join(";"));
        }
        if let Some(ns) = command.strip_prefix("bins/") {
            let Some(namespace) = self.namespace(ns) else {
                return Some(String::new());
            };
            let names = namespace.bin_names();
            let mut entries = vec![
                format!("bin_names={}", names.len()),
                format!("bin_names_quota={BIN_NAME_QUOTA}"),
            ];
            entries.extend(names.into_iter().map(str::to_string));
            return Some(entries.join(","));
        }
        None
    }
}

/// Shared in-memory collection map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Declare a namespace without writing to it.
    pub fn create_namespace(&self, namespace: &str) {
        self.write().namespace_mut(namespace);
    }

    /// Insert or replace a record. The key is stored and sent back on scans;
    /// a record without a key can be scanned but never fetched.
    pub fn put(&self, namespace: &str, set_name: &str, record: Record) {
        let entry = Entry {
            key: record.key,
            send_key: true,
            bins: record.bins,
        };
        self.write().upsert(namespace, set_name, entry);
    }

    /// Insert or replace a record addressed by `key` whose key is not stored,
    /// so scans deliver it without one.
    pub fn put_unsent_key(
        &self,
        namespace: &str,
        set_name: &str,
        key: impl Into<UserKey>,
        record: Record,
    ) {
        let entry = Entry {
            key: Some(key.into()),
            send_key: false,
            bins: record.bins,
        };
        self.write().upsert(namespace, set_name, entry);
    }

    /// Remove the record addressed by `key`. Returns whether it existed.
    pub fn remove(&self, namespace: &str, set_name: &str, key: &UserKey) -> bool {
        let mut state = self.write();
        let set = state.namespace_mut(namespace).set_mut(set_name);
        let before = set.entries.len();
        set.entries.retain(|entry| entry.key.as_ref() != Some(key));
        set.entries.len() != before
    }

    /// Number of records in a set.
    pub fn len(&self, namespace: &str, set_name: &str) -> usize {
        self.read()
            .namespace(namespace)
            .and_then(|ns| ns.set(set_name))
            .map_or(0, |set| set.entries.len())
    }

    /// Whether a set holds no records.
    pub fn is_empty(&self, namespace: &str, set_name: &str) -> bool {
        self.len(namespace, set_name) == 0
    }

    /// Invalidate every client created so far.
    pub fn drop_connections(&self) {
        self.write().epoch += 1;
    }

    /// Make subsequent connects fail (or succeed again).
    pub fn refuse_connections(&self, refuse: bool) {
        self.write().refuse_connections = refuse;
    }

    /// Fail every following scan with a server error after `records`
    /// records were delivered.
    pub fn fail_scan_after(&self, records: usize) {
        self.write().fail_scan_after = Some(records);
    }

    /// Deliver scan results last-written first.
    pub fn reverse_scans(&self, reverse: bool) {
        self.write().reverse_scans = reverse;
    }

    /// Answer `command` with `response` instead of the computed reply.
    pub fn override_info(&self, command: &str, response: InfoResponse) {
        let mut state = self.write();
        state.info_overrides.retain(|(cmd, _)| cmd != command);
        state.info_overrides.push((command.to_string(), response));
    }

    /// Remove injected faults and info overrides.
    pub fn clear_faults(&self) {
        let mut state = self.write();
        state.refuse_connections = false;
        state.fail_scan_after = None;
        state.info_overrides.clear();
    }

    /// Successful connects so far.
    pub fn connect_count(&self) -> u64 {
        self.read().connects
    }

    /// Scans served so far, oldest first.
    pub fn scan_log(&self) -> Vec<ScanRequest> {
        self.read().scans.clone()
    }

    /// Key lists of the batched gets served so far, oldest first.
    pub fn batch_log(&self) -> Vec<Vec<KeyTuple>> {
        self.read().batches.clone()
    }
}

/// Connection configuration for a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    store: MemoryStore,
    node: String,
}

impl MemoryConnector {
    /// Connector for `store`.
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            node: DEFAULT_NODE.to_string(),
        }
    }

    /// Endpoint identifier reported in info replies.
    pub fn node(self, node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            ..self
        }
    }

    /// The store clients connect to.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

impl Connector for MemoryConnector {
    type Client = MemoryClient;

    fn connect(&self) -> Result<MemoryClient, StoreError> {
        let mut state = self.store.write();
        if state.refuse_connections {
            return Err(StoreError::Connect(format!(
                "{} refused the connection",
                self.node
            )));
        }
        state.connects += 1;
        Ok(MemoryClient {
            store: self.store.clone(),
            node: self.node.clone(),
            epoch: state.epoch,
            open: true,
        })
    }
}

/// Client bound to a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryClient {
    store: MemoryStore,
    node: String,
    epoch: u64,
    open: bool,
}

impl MemoryClient {
    fn check_connected(&self) -> Result<(), StoreError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(StoreError::NotConnected)
        }
    }
}

impl StoreClient for MemoryClient {
    fn is_connected(&self) -> bool {
        self.open && self.store.read().epoch == self.epoch
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn info(&mut self, command: &str) -> Result<InfoResponse, StoreError> {
        self.check_connected()?;
        let state = self.store.read();
        if let Some((_, response)) = state.info_overrides.iter().find(|(cmd, _)| cmd == command) {
            return Ok(response.clone());
        }
        let reply = match state.info_payload(command) {
            Some(payload) => InfoReply::ok(payload),
            None => InfoReply {
                status: Some(format!("unrecognized command {command:?}")),
                payload: None,
            },
        };
        Ok(vec![(self.node.clone(), reply)])
    }

    fn scan(
        &mut self,
        request: &ScanRequest,
        visit: &mut ScanVisitor<'_>,
    ) -> Result<(), StoreError> {
        self.check_connected()?;
        // Snapshot the set so visitors may touch the store.
        let (records, fail_after) = {
            let mut state = self.store.write();
            state.scans.push(request.clone());
            let Some(namespace) = state.namespace(&request.namespace) else {
                return Err(StoreError::Server {
                    code: RESULT_NAMESPACE_NOT_FOUND,
                    message: format!("namespace {} not found", request.namespace),
                });
            };
            let mut records: Vec<Record> = namespace
                .set(&request.set_name)
                .map(|set| {
                    set.entries
                        .iter()
                        .map(|entry| entry.to_record(&request.bins))
                        .collect()
                })
                .unwrap_or_default();
            if state.reverse_scans {
                records.reverse();
            }
            (records, state.fail_scan_after)
        };

        for (delivered, record) in records.into_iter().enumerate() {
            if fail_after == Some(delivered) {
                return Err(StoreError::Server {
                    code: RESULT_FAIL_UNKNOWN,
                    message: format!("scan interrupted after {delivered} records"),
                });
            }
            visit(record)?;
        }
        Ok(())
    }

    fn get_many(&mut self, keys: &[KeyTuple]) -> Result<BatchReply, StoreError> {
        self.check_connected()?;
        let mut state = self.store.write();
        state.batches.push(keys.to_vec());
        let reply = keys
            .iter()
            .map(|tuple| {
                let record = state
                    .namespace(&tuple.namespace)
                    .and_then(|ns| ns.set(&tuple.set_name))
                    .and_then(|set| {
                        set.entries
                            .iter()
                            .find(|entry| entry.key.as_ref() == Some(&tuple.key))
                    })
                    .map(|entry| entry.to_record(&[]));
                (tuple.clone(), record)
            })
            .collect();
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info;

    fn iris() -> MemoryStore {
        let store = MemoryStore::new();
        for id in 1..=3i64 {
            store.put(
                "test",
                "iris",
                Record::with_key(id)
                    .bin("Sepal Length", 5.0 + id as f64)
                    .bin("Species", "setosa"),
            );
        }
        store.put("test", "flights", Record::with_key("AA100").bin("carrier", "AA"));
        store.create_namespace("bar");
        store
    }

    #[test]
    fn info_replies_use_server_formats() {
        let store = iris();
        let mut client = MemoryConnector::new(store).connect().expect("connect");

        let reply = client.info("namespaces").expect("info");
        assert_eq!(reply, vec![("mem-node".to_string(), InfoReply::ok("test;bar"))]);

        let sets = client.info("sets/test").expect("info");
        assert_eq!(
            sets[0].1.payload.as_deref(),
            Some("ns=test:set_name=iris:objects=3;ns=test:set_name=flights:objects=1")
        );

        let bins = client.info("bins/test").expect("info");
        assert_eq!(
            bins[0].1.payload.as_deref(),
            Some("bin_names=3,bin_names_quota=32768,Sepal Length,Species,carrier")
        );

        let unknown = client.info("statistics").expect("info");
        assert!(unknown[0].1.status.is_some());
    }

    #[test]
    fn info_round_trips_through_parsers() {
        let mut client = MemoryConnector::new(iris()).connect().expect("connect");
        assert_eq!(
            info::list_namespaces(&mut client).expect("namespaces"),
            vec!["test", "bar"]
        );
        assert_eq!(
            info::list_sets(&mut client, "test").expect("sets"),
            vec!["iris", "flights"]
        );
        assert!(info::list_sets(&mut client, "bar").expect("sets").is_empty());
        assert_eq!(
            info::list_bins(&mut client, "test").expect("bins"),
            vec!["Sepal Length", "Species", "carrier"]
        );
    }

    #[test]
    fn put_replaces_by_key() {
        let store = iris();
        store.put("test", "iris", Record::with_key(2i64).bin("Species", "virginica"));
        assert_eq!(store.len("test", "iris"), 3);
        assert!(store.remove("test", "iris", &UserKey::Int(2)));
        assert!(!store.remove("test", "iris", &UserKey::Int(2)));
        assert_eq!(store.len("test", "iris"), 2);
        assert!(store.is_empty("test", "nothing"));
    }

    #[test]
    fn scan_projects_and_respects_order() {
        let store = iris();
        let mut client = MemoryConnector::new(store.clone()).connect().expect("connect");
        let request = ScanRequest::new("test", "iris").select(["Species"]);

        let mut seen = Vec::new();
        client
            .scan(&request, &mut |record: Record| {
                seen.push(record);
                Ok(())
            })
            .expect("scan");
        let keys: Vec<Option<UserKey>> = seen.iter().map(|r| r.key.clone()).collect();
        assert_eq!(
            keys,
            vec![
                Some(UserKey::Int(1)),
                Some(UserKey::Int(2)),
                Some(UserKey::Int(3))
            ]
        );
        assert!(seen.iter().all(|r| r.bins.len() == 1 && r.get("Species").is_some()));

        store.reverse_scans(true);
        let mut reversed = Vec::new();
        client
            .scan(&request, &mut |record: Record| {
                reversed.push(record.key);
                Ok(())
            })
            .expect("scan");
        assert_eq!(reversed.first(), Some(&Some(UserKey::Int(3))));
        assert_eq!(store.scan_log().len(), 2);
    }

    #[test]
    fn scan_of_unknown_namespace_fails() {
        let mut client = MemoryConnector::new(iris()).connect().expect("connect");
        let err = client
            .scan(&ScanRequest::new("nope", "iris"), &mut |_: Record| Ok(()))
            .expect_err("unknown namespace");
        assert!(matches!(
            err,
            StoreError::Server {
                code: RESULT_NAMESPACE_NOT_FOUND,
                ..
            }
        ));
    }

    #[test]
    fn visitor_error_stops_scan() {
        let mut client = MemoryConnector::new(iris()).connect().expect("connect");
        let mut visited = 0;
        let err = client
            .scan(&ScanRequest::new("test", "iris"), &mut |_: Record| {
                visited += 1;
                Err(StoreError::Aborted("enough".to_string()))
            })
            .expect_err("aborted");
        assert!(matches!(err, StoreError::Aborted(_)));
        assert_eq!(visited, 1);
    }

    #[test]
    fn get_many_reports_missing_keys_as_none() {
        let store = iris();
        store.put_unsent_key("test", "iris", 9i64, Record::default().bin("Species", "hidden"));
        let mut client = MemoryConnector::new(store.clone()).connect().expect("connect");
        let keys = vec![
            KeyTuple::new("test", "iris", 1i64),
            KeyTuple::new("test", "iris", 404i64),
            KeyTuple::new("test", "iris", 9i64),
        ];
        let reply = client.get_many(&keys).expect("get_many");
        assert_eq!(reply.len(), 3);
        assert_eq!(
            reply[0].1.as_ref().and_then(|r| r.get("Species")),
            Some(&Value::from("setosa"))
        );
        assert!(reply[1].1.is_none());
        let hidden = reply[2].1.as_ref().expect("stored without key");
        assert_eq!(hidden.key, None);
        assert_eq!(store.batch_log(), vec![keys]);
    }

    #[test]
    fn clients_observe_dropped_connections() {
        let store = iris();
        let connector = MemoryConnector::new(store.clone()).node("node-1");
        let mut client = connector.connect().expect("connect");
        assert!(client.is_connected());

        store.drop_connections();
        assert!(!client.is_connected());
        assert!(matches!(
            client.info("namespaces"),
            Err(StoreError::NotConnected)
        ));

        let mut fresh = connector.connect().expect("reconnect");
        assert_eq!(fresh.info("namespaces").expect("info")[0].0, "node-1");
        fresh.close();
        assert!(!fresh.is_connected());
    }

    #[test]
    fn overrides_and_faults_can_be_cleared() {
        let store = iris();
        store.override_info("namespaces", Vec::new());
        store.refuse_connections(true);
        let connector = MemoryConnector::new(store.clone());
        assert!(matches!(connector.connect(), Err(StoreError::Connect(_))));

        store.clear_faults();
        let mut client = connector.connect().expect("connect");
        assert_eq!(client.info("namespaces").expect("info").len(), 1);
        assert_eq!(connector.store().connect_count(), 1);
    }
}
