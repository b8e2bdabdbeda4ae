// swhub-api: async client for the web management interface of ELECOM-class switches

pub mod catalog;
pub mod disconnect;
pub mod error;
pub mod handshake;
pub mod recovery;
pub mod result;
pub mod transport;

pub use catalog::{Category, Command, PORT_TRAFFIC_KEY, PORTS};
pub use disconnect::{DisconnectOutcome, DisconnectPolicy};
pub use error::Error;
pub use handshake::SwitchClient;
pub use recovery::{AttemptOutcome, Device, RecoveringClient, RetryPolicy};
pub use result::{AUTH_FAILED_MARKER, FetchRequest, FetchResult, PARSE_ERROR_MARKER, Payload};
pub use transport::{Credentials, Pacing, TransportConfig};
