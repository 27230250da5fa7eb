//! Wires the echo provider, consumer, and observer talents into one
//! running [`talent_client::Client`] over a single in-process adapter,
//! then drives a discovery probe and one message through the chain.
//!
//! `cargo run -p echo-talent-demo --bin echo_demo`

use echo_talent_demo::{build_echo_consumer, build_echo_observer, build_echo_provider};
use std::sync::Arc;
use std::time::Duration;
use talent_adapter_local::LocalAdapter;
use talent_client::ClientBuilder;
use talent_gateway::{Adapter, Gateway, PublishOptions, SubscribeOptions};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let adapter = Arc::new(LocalAdapter::new("local", true));
    let gateway = Gateway::empty();
    gateway.register(adapter.clone()).await;

    let client = ClientBuilder::new(gateway)
        .register_function_talent(build_echo_provider())
        .register_talent(build_echo_consumer())
        .register_talent(build_echo_observer())
        .start()
        .await
        .expect("client failed to start");

    let discover_return_topic = "demo/discover/return";
    adapter
        .subscribe(
            discover_return_topic,
            Arc::new(|_topic: &str, message: &str, _adapter_id: &str| {
                tracing::info!(schema = message, "discovery reply");
            }),
            &SubscribeOptions::default(),
        )
        .await
        .expect("subscribe failed");

    let discover_frame = serde_json::json!({
        "msgType": 2,
        "version": "2.0.0",
        "returnTopic": discover_return_topic,
    })
    .to_string();
    adapter.publish("iotea/configManager/talents/discover", &discover_frame, &PublishOptions::new()).await.expect("publish failed");

    tokio::time::sleep(Duration::from_millis(50)).await;

    let message_frame = serde_json::json!({
        "msgType": 1,
        "subject": "demo-subject",
        "feature": "echo_consumer.messageString",
        "value": "hello from the demo",
        "type": "default",
        "whenMs": 0,
    })
    .to_string();
    adapter.publish("iotea/talent/echo_consumer/events", &message_frame, &PublishOptions::new()).await.expect("publish failed");

    tokio::time::sleep(Duration::from_millis(200)).await;

    client.stop().await.expect("client failed to stop");
}
