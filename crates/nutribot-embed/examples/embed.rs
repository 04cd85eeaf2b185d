use std::path::Path;

use nutribot_embed::get_default_embedder;

fn main() -> anyhow::Result<()> {
    let embedder = get_default_embedder(Path::new("models/multi-qa-MiniLM-L6-cos-v1"), 256)?;
    let texts = vec!["calories in an apple".to_string(), "good protein sources".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("B={} dim={}", embs.len(), embedder.dim());
    Ok(())
}
