//! Basic video generation example.
//!
//! Run with: `cargo run --example generate_video`
//!
//! Requires `GOOGLE_API_KEY` environment variable.

use std::time::Duration;
use veo_node::{EnvCredentialStore, InputItem, VeoNode};

#[tokio::main]
async fn main() -> veo_node::Result<()> {
    let node = VeoNode::builder()
        .timeout(Duration::from_secs(600))
        .build();

    let items = vec![InputItem::with_prompt(
        "Ocean waves crashing on a rocky shore at sunset",
    )];

    println!("Generating video (this may take a few minutes)...");
    let records = node.execute(&items, &EnvCredentialStore, None).await?;

    match records[0].video() {
        Some(video) => {
            let path = video.save_in(".", "output.mp4")?;
            println!("Generated video: {} ({} bytes)", path.display(), video.file_size);
        }
        None => println!("No video returned: {}", records[0].json),
    }

    Ok(())
}
