//! Built-in backends for running the relay standalone.

use relay_core::backend::{InboundReceiver, OutboundSender};
use relay_core::{Outbound, SessionMessage};

/// Messages starting with this are broadcast instead of echoed.
pub const BROADCAST_COMMAND: &str = "/broadcast ";

/// Decide what the echo backend sends back for one inbound message.
pub fn echo_reply(message: SessionMessage) -> Outbound {
    match message.text.strip_prefix(BROADCAST_COMMAND) {
        Some(text) => Outbound::Broadcast {
            text: text.to_string(),
        },
        None => Outbound::Deliver(SessionMessage {
            text: format!("ECHO: {}", message.text),
            session_id: message.session_id,
        }),
    }
}

/// Answer every inbound message until either channel closes.
pub async fn run_echo(mut inbound: InboundReceiver, outbound: OutboundSender) {
    while let Some(message) = inbound.recv().await {
        if outbound.send(echo_reply(message)).is_err() {
            log::warn!("Outbound channel closed, stopping echo backend");
            break;
        }
    }
}

/// Consume and drop every inbound message.
pub async fn run_discard(mut inbound: InboundReceiver) {
    while let Some(message) = inbound.recv().await {
        log::debug!(
            "Discarding {} bytes from frontend session {}",
            message.text.len(),
            message.session_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::backend::outbound_channel;
    use relay_core::ChannelBackend;
    use relay_core::Backend;

    #[test]
    fn plain_text_is_echoed_to_sender() {
        let reply = echo_reply(SessionMessage::new("A", "ping"));
        assert_eq!(reply, Outbound::Deliver(SessionMessage::new("A", "ECHO: ping")));
    }

    #[test]
    fn broadcast_command_fans_out() {
        let reply = echo_reply(SessionMessage::new("A", "/broadcast hello all"));
        assert_eq!(
            reply,
            Outbound::Broadcast {
                text: "hello all".to_string()
            }
        );
    }

    #[test]
    fn bare_command_without_space_is_echoed() {
        let reply = echo_reply(SessionMessage::new("A", "/broadcast"));
        assert_eq!(reply, Outbound::Deliver(SessionMessage::new("A", "ECHO: /broadcast")));
    }

    #[tokio::test]
    async fn run_echo_answers_until_inbound_closes() {
        let (backend, inbound) = ChannelBackend::new();
        let (outbound, mut outbound_rx) = outbound_channel();

        backend.forward(SessionMessage::new("A", "one"));
        backend.forward(SessionMessage::new("B", "/broadcast two"));
        drop(backend);

        run_echo(inbound, outbound).await;

        assert_eq!(
            outbound_rx.recv().await.unwrap(),
            Outbound::Deliver(SessionMessage::new("A", "ECHO: one"))
        );
        assert_eq!(
            outbound_rx.recv().await.unwrap(),
            Outbound::Broadcast {
                text: "two".to_string()
            }
        );
        assert!(outbound_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn run_echo_stops_when_outbound_closes() {
        let (backend, inbound) = ChannelBackend::new();
        let (outbound, outbound_rx) = outbound_channel();
        drop(outbound_rx);

        backend.forward(SessionMessage::new("A", "one"));
        // Returns even though the inbound side is still open.
        run_echo(inbound, outbound).await;
    }
}
