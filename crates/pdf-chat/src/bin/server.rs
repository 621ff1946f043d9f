//! PDF chat server binary
//!
//! Run with: cargo run -p pdf-chat --bin pdf-chat-server
//! Set PDF_CHAT_CONFIG to a TOML file to override the defaults.

use pdf_chat::{config::RagConfig, server::ChatServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_chat=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                  Chat with your PDFs 📄                   ║
║          English & Persian document Q&A over RAG          ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let config = RagConfig::load(None)?;

    tracing::info!("Configuration loaded");
    for language in config.languages.languages() {
        if let Ok(profile) = config.languages.get(language) {
            tracing::info!("  - {} embeddings: {}", language, profile.embedding_model);
        }
    }
    tracing::info!("  - Embedding service: {}", config.embeddings.base_url);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!(
        "  - Chunk size: {} (overlap {})",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Vector store: {}", config.vector_db.storage_path.display());

    // Create and start server
    let server = ChatServer::new(config)?;

    println!("\nServer starting...");
    println!("  UI: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/sessions                 - Start a session");
    println!("  PUT  /api/sessions/:id/language    - Choose a language");
    println!("  POST /api/sessions/:id/documents   - Upload and process PDFs");
    println!("  POST /api/sessions/:id/chat        - Ask questions");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
