use finance_chat_orchestrator::{
    agent::ChatOrchestrator,
    data::InMemoryDataStore,
    llm::MockChatClient,
    models::MessageKind,
    session::ChatSession,
    tools::MockToolClient,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Scripted demo conversation against the mock clients.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("Finance Chat Orchestrator demo starting");

    let store = Arc::new(InMemoryDataStore::new());
    let orchestrator = ChatOrchestrator::new(
        Arc::new(MockChatClient::default()),
        Arc::new(MockToolClient),
        store.clone(),
    );

    let mut session = ChatSession::new(Uuid::new_v4());

    let script = [
        "Create a monthly budget of ₹5000 for food",
        "Remind me to pay 499 for Netflix every month",
        "buy wireless earbuds on amazon",
        "how should I plan my savings?",
    ];

    println!("\n=== DEMO CONVERSATION ===");
    for line in script {
        println!("\n> {}", line);
        let reply = orchestrator.handle_message(&mut session, line).await;
        println!("  [{:?}] {}", reply.kind, reply.text);

        // Confirm every staged action right away, then poke the
        // idempotence guard with a second confirm.
        if reply.kind == MessageKind::PendingAction {
            let action_id = reply
                .pending_action
                .as_ref()
                .map(|a| a.id.clone())
                .unwrap_or_default();

            let confirmed = orchestrator.confirm(&mut session, &action_id).await;
            println!("  confirm → [{:?}] {}", confirmed.kind, confirmed.text);

            let again = orchestrator.confirm(&mut session, &action_id).await;
            println!("  confirm again → [{:?}] {}", again.kind, again.text);
        }
    }

    println!("\n=== SESSION SUMMARY ===");
    println!("Messages: {}", session.message_count());
    println!(
        "Budgets created: {}",
        store.budgets_for(session.user_id).await.len()
    );
    println!(
        "Scheduled payments created: {}",
        store.payments_for(session.user_id).await.len()
    );

    Ok(())
}
