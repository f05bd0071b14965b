//! Namespace, set and bin discovery over the store's info protocol.
//!
//! Each query sends one text command and reads the payload of the first
//! endpoint that answered. Payload parsing lives in the `parse_*` functions
//! so it can be checked without a client. No query retries.

mod error;

pub use error::ProtocolError;

use crate::store::{InfoResponse, StoreClient};

const NAMESPACES_COMMAND: &str = "namespaces";
const SET_NAME_FIELD: &str = "set_name=";
/// Leading entries of a `bins/<ns>` reply that are counters, not bin names.
const BIN_COUNTER_ENTRIES: usize = 2;

/// Set names parsed from a `sets/<ns>` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetListing {
    /// Set names in record order.
    pub names: Vec<String>,
    /// Records that carried no `set_name` field.
    pub skipped: usize,
}

/// List the namespaces defined on the server.
pub fn list_namespaces<C>(client: &mut C) -> Result<Vec<String>, ProtocolError>
where
    C: StoreClient + ?Sized,
{
    let payload = query(client, NAMESPACES_COMMAND)?;
    Ok(parse_namespaces(&payload))
}

/// List the sets of `namespace`, skipping records without a set name.
pub fn list_sets<C>(client: &mut C, namespace: &str) -> Result<Vec<String>, ProtocolError>
where
    C: StoreClient + ?Sized,
{
    list_sets_detailed(client, namespace).map(|listing| listing.names)
}

/// Like [`list_sets`], also reporting how many records were skipped.
pub fn list_sets_detailed<C>(
    client: &mut C,
    namespace: &str,
) -> Result<SetListing, ProtocolError>
where
    C: StoreClient + ?Sized,
{
    let payload = query(client, &format!("sets/{namespace}"))?;
    Ok(parse_sets_detailed(&payload))
}

/// List the bin names of `namespace` in server order.
pub fn list_bins<C>(client: &mut C, namespace: &str) -> Result<Vec<String>, ProtocolError>
where
    C: StoreClient + ?Sized,
{
    let payload = query(client, &format!("bins/{namespace}"))?;
    Ok(parse_bins(&payload))
}

/// Parse a `;`-separated namespace list. Empty segments are dropped.
pub fn parse_namespaces(payload: &str) -> Vec<String> {
    payload
        .trim_end()
        .split(';')
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a `sets/<ns>` payload into set names.
pub fn parse_sets(payload: &str) -> Vec<String> {
    parse_sets_detailed(payload).names
}

/// Parse a `sets/<ns>` payload: `;`-separated records of `:`-separated
/// `key=value` fields.
pub fn parse_sets_detailed(payload: &str) -> SetListing {
    let mut listing = SetListing::default();
    for record in payload.trim_end().split(';') {
        if record.is_empty() {
            continue;
        }
        let name = record
            .split(':')
            .find_map(|field| field.strip_prefix(SET_NAME_FIELD));
        match name {
            Some(name) => listing.names.push(name.to_string()),
            None => listing.skipped += 1,
        }
    }
    listing
}

/// Parse a `bins/<ns>` payload, dropping the leading counter entries.
pub fn parse_bins(payload: &str) -> Vec<String> {
    payload
        .trim_end()
        .split(',')
        .skip(BIN_COUNTER_ENTRIES)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn query<C>(client: &mut C, command: &str) -> Result<String, ProtocolError>
where
    C: StoreClient + ?Sized,
{
    let response = client.info(command).map_err(|source| ProtocolError::Store {
        command: command.to_string(),
        source,
    })?;
    first_payload(command, response)
}

/// Payload of the first endpoint in `response`.
pub(crate) fn first_payload(
    command: &str,
    response: InfoResponse,
) -> Result<String, ProtocolError> {
    let Some((endpoint, reply)) = response.into_iter().next() else {
        return Err(ProtocolError::EmptyResponse {
            command: command.to_string(),
        });
    };
    if let Some(status) = reply.status {
        return Err(ProtocolError::EndpointStatus {
            command: command.to_string(),
            endpoint,
            status,
        });
    }
    reply.payload.ok_or_else(|| ProtocolError::MissingPayload {
        command: command.to_string(),
        endpoint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InfoReply;

    #[test]
    fn namespaces_split_on_semicolons() {
        assert_eq!(parse_namespaces("a;b;c"), vec!["a", "b", "c"]);
        assert_eq!(parse_namespaces("test;bar\n"), vec!["test", "bar"]);
        assert!(parse_namespaces("").is_empty());
        assert!(parse_namespaces("\n").is_empty());
    }

    #[test]
    fn sets_extract_set_name_in_record_order() {
        let payload = "ns=test:set_name=stan:objects=4;\
                       ns=test:objects=1;\
                       set_name=kyle:ns=test;\
                       ns=test:set_name=cartman\n";
        let listing = parse_sets_detailed(payload);
        assert_eq!(listing.names, vec!["stan", "kyle", "cartman"]);
        assert_eq!(listing.skipped, 1);
        assert_eq!(parse_sets(payload), listing.names);
    }

    #[test]
    fn sets_skip_every_record_without_a_name() {
        let listing = parse_sets_detailed("objects=1;objects=2;set=x");
        assert!(listing.names.is_empty());
        assert_eq!(listing.skipped, 3);
        assert_eq!(parse_sets_detailed(""), SetListing::default());
    }

    #[test]
    fn bins_drop_counter_entries() {
        assert_eq!(
            parse_bins("x,y,Sepal Length,Sepal Width"),
            vec!["Sepal Length", "Sepal Width"]
        );
        assert_eq!(
            parse_bins("bin_names=2,bin_names_quota=32768,id,name\n"),
            vec!["id", "name"]
        );
        assert_eq!(
            parse_bins("bin_names=2,bin_names_quota=32768,id,,name,"),
            vec!["id", "name"]
        );
        assert!(parse_bins("bin_names=0,bin_names_quota=32768").is_empty());
        assert!(parse_bins("").is_empty());
    }

    #[test]
    fn first_payload_reads_first_endpoint() {
        let response = vec![
            ("node-a".to_string(), InfoReply::ok("a;b")),
            ("node-b".to_string(), InfoReply::ok("c")),
        ];
        assert_eq!(
            first_payload("namespaces", response).expect("payload"),
            "a;b"
        );
    }

    #[test]
    fn first_payload_rejects_unexpected_shapes() {
        assert!(matches!(
            first_payload("namespaces", Vec::new()),
            Err(ProtocolError::EmptyResponse { .. })
        ));

        let missing = vec![(
            "node-a".to_string(),
            InfoReply {
                status: None,
                payload: None,
            },
        )];
        match first_payload("namespaces", missing) {
            Err(ProtocolError::MissingPayload { endpoint, command }) => {
                assert_eq!(endpoint, "node-a");
                assert_eq!(command, "namespaces");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let rejected = vec![(
            "node-a".to_string(),
            InfoReply {
                status: Some("not authorized".to_string()),
                payload: None,
            },
        )];
        assert!(matches!(
            first_payload("namespaces", rejected),
            Err(ProtocolError::EndpointStatus { .. })
        ));
    }
}
