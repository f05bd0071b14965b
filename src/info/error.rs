use crate::store::StoreError;

/// Malformed or unexpected info-protocol response.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// No endpoint answered the command.
    #[error("empty response to info command {command:?}")]
    EmptyResponse {
        /// The info command sent.
        command: String,
    },
    /// The answering endpoint sent no payload.
    #[error("endpoint {endpoint} sent no payload for info command {command:?}")]
    MissingPayload {
        /// The info command sent.
        command: String,
        /// Endpoint whose reply was read.
        endpoint: String,
    },
    /// The answering endpoint reported an error status.
    #[error("endpoint {endpoint} rejected info command {command:?}: {status}")]
    EndpointStatus {
        /// The info command sent.
        command: String,
        /// Endpoint whose reply was read.
        endpoint: String,
        /// Status text reported by the endpoint.
        status: String,
    },
    /// The info call itself failed.
    #[error("info command {command:?} failed: {source}")]
    Store {
        /// The info command sent.
        command: String,
        /// Underlying client error.
        #[source]
        source: StoreError,
    },
}
