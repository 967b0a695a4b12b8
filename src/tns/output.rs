//! Typed output channel relaying tns output to any number of subscribers

use tokio::sync::broadcast;

/// One line of tns output
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "category", content = "output", rename_all = "snake_case")]
pub enum OutputEvent {
    /// A stdout line
    Log(String),
    /// A stderr line
    Error(String),
}

impl OutputEvent {
    pub fn text(&self) -> &str {
        match self {
            OutputEvent::Log(text) | OutputEvent::Error(text) => text,
        }
    }
}

/// Publish/subscribe channel owned by a project
///
/// Every subscriber sees events in the order they were published.
/// Publishing with no subscribers is not an error; the event is dropped.
#[derive(Debug, Clone)]
pub struct OutputChannel {
    tx: broadcast::Sender<OutputEvent>,
}

impl OutputChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutputEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: OutputEvent) {
        let _ = self.tx.send(event);
    }

    pub fn log(&self, line: impl Into<String>) {
        self.publish(OutputEvent::Log(line.into()));
    }

    pub fn error(&self, line: impl Into<String>) {
        self.publish(OutputEvent::Error(line.into()));
    }
}

impl Default for OutputChannel {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_events_in_order() {
        let channel = OutputChannel::new(16);
        let mut first = channel.subscribe();
        let mut second = channel.subscribe();

        channel.log("building");
        channel.error("warning: slow");
        channel.log("done");

        for rx in [&mut first, &mut second] {
            assert_eq!(rx.recv().await.unwrap(), OutputEvent::Log("building".into()));
            assert_eq!(
                rx.recv().await.unwrap(),
                OutputEvent::Error("warning: slow".into())
            );
            assert_eq!(rx.recv().await.unwrap().text(), "done");
        }
    }

    #[tokio::test]
    async fn test_subscription_closes_with_channel() {
        let channel = OutputChannel::new(4);
        let mut rx = channel.subscribe();
        channel.log("last");
        drop(channel);

        assert_eq!(rx.recv().await.unwrap().text(), "last");
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let channel = OutputChannel::new(4);
        channel.log("nobody listening");
        let mut late = channel.subscribe();
        assert!(matches!(
            late.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(OutputEvent::Error("boom".into())).unwrap();
        assert_eq!(json["category"], "error");
        assert_eq!(json["output"], "boom");
    }
}
