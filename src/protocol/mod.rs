//! Device side of the console: transports, the session and its reader,
//! line classification and the Marauder command vocabulary.

pub mod classify;
pub mod commands;
pub mod daemon;
pub mod session;
pub mod transport;
pub mod tty;

pub use classify::{classify_line, ClassifiedEvent, Classifier, MarauderClassifier};
pub use session::{
    ConnectError, SendError, SendOutcome, Session, SessionEvent, SessionOptions, SessionStatus,
};
pub use transport::{Connector, LineTransport, ReadError};
