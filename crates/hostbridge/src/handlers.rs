//! Host callback capabilities and their adapters onto the pump.

use std::sync::Arc;

use hostbridge_core::{Header, Log, Message};
use hostbridge_sub::EventHandler;

/// Receives new chain heads.
pub trait NewHeadHandler: Send + Sync + 'static {
    fn on_new_head(&self, header: Header);
    fn on_error(&self, failure: String);
}

/// Receives logs matching a filter query.
pub trait FilterLogsHandler: Send + Sync + 'static {
    fn on_filter_logs(&self, log: Log);
    fn on_error(&self, failure: String);
}

/// Receives whisper envelopes matching a criteria.
pub trait NewMessageHandler: Send + Sync + 'static {
    fn on_new_message(&self, message: Message);
    fn on_error(&self, failure: String);
}

macro_rules! handler_adapter {
    ($adapter:ident, $handler:ident, $event:ty, $method:ident) => {
        pub(crate) struct $adapter(pub(crate) Arc<dyn $handler>);

        impl EventHandler<$event> for $adapter {
            fn on_event(&self, event: $event) {
                self.0.$method(event);
            }

            fn on_error(&self, message: String) {
                self.0.on_error(message);
            }
        }
    };
}

handler_adapter!(NewHeads, NewHeadHandler, Header, on_new_head);
handler_adapter!(FilterLogs, FilterLogsHandler, Log, on_filter_logs);
handler_adapter!(NewMessages, NewMessageHandler, Message, on_new_message);
