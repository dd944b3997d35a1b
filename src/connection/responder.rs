use crate::protocol::{RtmpCommand, CODE_CONNECT_CLOSED, LEVEL_ERROR};
use crate::AmfValue;
use std::collections::HashMap;
use std::sync::Mutex;

type Callback = Box<dyn FnOnce(RtmpCommand) + Send>;

/// Callbacks for one outstanding RPC, consumed exactly once by the
/// matching `_result` or `_error`
pub struct Responder {
    on_result: Callback,
    on_error: Option<Callback>,
}

impl Responder {
    pub fn new(on_result: impl FnOnce(RtmpCommand) + Send + 'static) -> Self {
        Responder {
            on_result: Box::new(on_result),
            on_error: None,
        }
    }

    pub fn with_error(
        on_result: impl FnOnce(RtmpCommand) + Send + 'static,
        on_error: impl FnOnce(RtmpCommand) + Send + 'static,
    ) -> Self {
        Responder {
            on_result: Box::new(on_result),
            on_error: Some(Box::new(on_error)),
        }
    }

    pub fn result(self, command: RtmpCommand) {
        (self.on_result)(command);
    }

    pub fn error(self, command: RtmpCommand) {
        match self.on_error {
            Some(on_error) => on_error(command),
            // A responder without an error arm still observes failure
            None => (self.on_result)(command),
        }
    }
}

/// Outstanding RPC table keyed by transaction id
#[derive(Default)]
pub struct ResponderMap {
    inner: Mutex<HashMap<u32, Responder>>,
}

impl ResponderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, transaction_id: u32, responder: Responder) {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(transaction_id, responder);
        }
    }

    pub fn take(&self, transaction_id: u32) -> Option<Responder> {
        self.inner.lock().ok()?.remove(&transaction_id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fail every outstanding responder, used at teardown
    pub fn fail_all(&self, description: &str) {
        let drained: Vec<Responder> = match self.inner.lock() {
            Ok(mut map) => map.drain().map(|(_, responder)| responder).collect(),
            Err(_) => return,
        };
        for responder in drained {
            let mut command = RtmpCommand::error(
                0.0,
                AmfValue::object(vec![
                    ("level".to_string(), AmfValue::from(LEVEL_ERROR)),
                    ("code".to_string(), AmfValue::from(CODE_CONNECT_CLOSED)),
                    ("description".to_string(), AmfValue::from(description)),
                ]),
            );
            command.transaction_id = 0.0;
            responder.error(command);
        }
    }
}
