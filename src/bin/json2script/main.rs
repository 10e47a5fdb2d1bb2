//! CLI tool to convert a structured script record (JSON) to the Automerge
//! binary document format.
//!
//! Usage:
//!   json2script --input script.json [--output script.kyakuhon] [--text script.txt] [--validate] [--stats]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use kyakuhon::{deserialize, render_text, ScriptManager, ScriptRecord};

#[derive(Parser, Debug)]
#[command(
    name = "json2script",
    about = "Convert a structured script record to Automerge binary format",
    version
)]
struct Args {
    /// Input JSON file path (structured script record)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file path (defaults to input path with .kyakuhon extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the plain-text export to this path
    #[arg(long)]
    text: Option<PathBuf>,

    /// Validate output by hydrating back to structs
    #[arg(long, default_value = "false")]
    validate: bool,

    /// Print statistics about the conversion
    #[arg(long, default_value = "false")]
    stats: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Validate input exists
    let input_path = &args.input;
    if !input_path.exists() {
        anyhow::bail!("Input file does not exist: {}", input_path.display());
    }

    // 2. Read JSON file
    let json_content = std::fs::read_to_string(input_path).context("Failed to read input file")?;

    // 3. Parse JSON to the record shape
    let record: ScriptRecord =
        serde_json::from_str(&json_content).context("Failed to parse JSON")?;

    let num_scenes = record.scenes.len();
    let num_blocks: usize = record.scenes.iter().map(|s| s.content.len()).sum();

    // 4. Rebuild the document model
    let root = deserialize(&record);

    // 5. Create the Automerge document
    let mut manager =
        ScriptManager::from_state(root).context("Failed to build Automerge document state")?;

    // 6. Save to binary
    let binary = manager.save();

    // 7. Determine output path
    let output_path = args.output.unwrap_or_else(|| {
        let mut path = input_path.clone();
        path.set_extension("kyakuhon");
        path
    });

    // 8. Write output
    std::fs::write(&output_path, &binary).context("Failed to write output file")?;

    // 9. Optional plain-text export
    if let Some(text_path) = &args.text {
        let state = manager.get_state().context("Failed to hydrate for export")?;
        std::fs::write(text_path, render_text(&state)).context("Failed to write text export")?;
    }

    // 10. Optional validation
    if args.validate {
        let mut loaded =
            ScriptManager::from_bytes(&binary).context("Failed to load binary for validation")?;
        let hydrated = loaded
            .get_state()
            .context("Failed to hydrate for validation")?;

        if hydrated.len() != num_scenes {
            anyhow::bail!(
                "Validation failed: scene count mismatch (expected {}, got {})",
                num_scenes,
                hydrated.len()
            );
        }
        let hydrated_blocks: usize = hydrated
            .scenes_in_order()
            .map(|(_, scene)| scene.content.len())
            .sum();
        if hydrated_blocks != num_blocks {
            anyhow::bail!(
                "Validation failed: block count mismatch (expected {}, got {})",
                num_blocks,
                hydrated_blocks
            );
        }

        println!("✓ Validation passed!");
    }

    // 11. Optional stats
    if args.stats {
        println!();
        println!("Conversion statistics:");
        println!("  Input JSON:    {:>10} bytes", json_content.len());
        println!("  Output binary: {:>10} bytes", binary.len());
        println!(
            "  Compression:   {:>10.2}x",
            json_content.len() as f64 / binary.len() as f64
        );
        println!();
        println!("  Scenes: {}", num_scenes);
        println!("  Blocks: {}", num_blocks);
    }

    println!();
    println!(
        "Successfully converted {} → {}",
        input_path.display(),
        output_path.display()
    );

    Ok(())
}
