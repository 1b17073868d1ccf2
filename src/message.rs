//! Messages sent from the server to clients.

use crossbeam::channel::{self, Receiver, Sender};
use kite_core::ViewId;
use serde_json::{Map, Value};

/// Builds a message code from four ASCII characters.
pub const fn four_cc(code: &[u8; 4]) -> u32 {
    (code[0] as u32) << 24 | (code[1] as u32) << 16 | (code[2] as u32) << 8 | code[3] as u32
}

pub const WINDOW_ACTIVATED: u32 = four_cc(b"WACT");
pub const WINDOW_MOVED: u32 = four_cc(b"WMOV");
pub const WINDOW_RESIZED: u32 = four_cc(b"WRSZ");
pub const WORKSPACES_CHANGED: u32 = four_cc(b"WWSC");
pub const WORKSPACE_ACTIVATED: u32 = four_cc(b"WWSA");
pub const VIEW_MOVED: u32 = four_cc(b"VMOV");
pub const VIEW_RESIZED: u32 = four_cc(b"VRSZ");
pub const QUIT_REQUESTED: u32 = four_cc(b"QUIT");

/// A message: a code plus an opaque key/value payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    pub what: u32,
    pub data: Map<String, Value>,
}

impl Message {
    pub fn new(what: u32) -> Message {
        Message {
            what,
            data: Map::new(),
        }
    }

    /// Adds a field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Message {
        self.data.insert(key.to_owned(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// Who on the client side should handle a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    /// The client window object itself.
    Window,
    View(ViewId),
    /// Whatever the client considers its preferred handler (usually the focus view).
    PreferredHandler,
}

/// A message together with its target.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub target: MessageTarget,
    pub message: Message,
}

/// The server’s end of a client’s event channel.
#[derive(Debug, Clone)]
pub struct ClientPort(Sender<Envelope>);

impl ClientPort {
    pub(crate) fn post(&self, envelope: Envelope) -> bool {
        self.0.send(envelope).is_ok()
    }
}

/// Creates a client port and the receiver the client reads from.
pub fn client_port() -> (ClientPort, Receiver<Envelope>) {
    let (sender, receiver) = channel::unbounded();
    (ClientPort(sender), receiver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_cc() {
        assert_eq!(four_cc(b"QUIT"), 0x51554954);
    }

    #[test]
    fn test_port_reports_gone_client() {
        let (port, receiver) = client_port();
        assert!(port.post(Envelope {
            target: MessageTarget::Window,
            message: Message::new(QUIT_REQUESTED).with("reason", "test"),
        }));
        let envelope = receiver.try_recv().unwrap();
        assert_eq!(envelope.message.get("reason"), Some(&Value::from("test")));
        drop(receiver);
        assert!(!port.post(Envelope {
            target: MessageTarget::Window,
            message: Message::new(QUIT_REQUESTED),
        }));
    }
}
