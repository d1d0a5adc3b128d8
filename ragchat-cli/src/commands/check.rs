//! `ragchat check`: ping both model endpoints.

use anyhow::{Context, Result};
use ragchat_model::{GenerationConfig, GenerationRequest, Generator, PromptMessage, TimeoutGenerator};
use ragchat_retrieval::EmbeddingProvider;

use crate::cli::CheckArgs;

pub async fn run(args: CheckArgs) -> Result<()> {
    let embedder = args.embedding.build().context("embedding endpoint is not configured")?;
    let generator = args.generation.build().context("chat model endpoint is not configured")?;
    let generator = TimeoutGenerator::new(generator, args.generation.call_timeout()?);

    let vector = embedder.embed("ping").await.context("embedding endpoint check failed")?;
    println!("embedding ({}): ok, {} dimensions", embedder.name(), vector.len());

    let request = GenerationRequest::new(vec![PromptMessage::user("ping")])
        .with_config(GenerationConfig { max_output_tokens: Some(8), ..Default::default() });
    generator.generate(request).await.context("chat model check failed")?;
    println!("chat model ({}): ok", generator.name());
    Ok(())
}
