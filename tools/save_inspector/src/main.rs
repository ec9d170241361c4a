use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use islet_persist::local::LocalFileBackend;
use islet_persist::versioning::effective_version;
use islet_persist::{LoadResponse, SaveDocument, CURRENT_SAVE_VERSION};
use islet_shared::block::BlockKind;

fn main() {
    let mut dump_json = false;
    let mut path = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => dump_json = true,
            _ if path.is_none() => path = Some(arg),
            other => {
                eprintln!("unexpected argument: {other}");
                std::process::exit(2);
            }
        }
    }
    let Some(path) = path else {
        eprintln!("Usage: save_inspector [--json] <path/to/save.isav|save.json>");
        std::process::exit(2);
    };

    if let Err(err) = run(Path::new(&path), dump_json) {
        eprintln!("save_inspector error: {err}");
        std::process::exit(1);
    }
}

fn run(path: &Path, dump_json: bool) -> Result<(), String> {
    let bytes = fs::read(path).map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let framed = bytes.starts_with(&LocalFileBackend::MAGIC);
    let response = if framed {
        LocalFileBackend::decode(&bytes)
    } else {
        LoadResponse::from_json(&bytes)
    }
    .map_err(|err| format!("failed to decode {}: {err}", path.display()))?;

    println!("Save: {}", path.display());
    println!("Format: {}", if framed { "ISAV file" } else { "raw JSON" });

    let doc = match response {
        LoadResponse::FirstTime => {
            println!("No save document (first-time player)");
            return Ok(());
        }
        LoadResponse::Document(doc) => doc,
    };

    if dump_json {
        let pretty = serde_json::to_string_pretty(&doc).map_err(|err| err.to_string())?;
        println!("{pretty}");
        return Ok(());
    }

    summarize(&doc);
    Ok(())
}

fn summarize(doc: &SaveDocument) {
    let version = effective_version(doc);
    println!(
        "Version: {version}{}",
        if version < CURRENT_SAVE_VERSION {
            format!(" (legacy; current is {CURRENT_SAVE_VERSION})")
        } else {
            String::new()
        }
    );
    match doc.world_seed {
        Some(seed) => println!("World seed: {seed}"),
        None => println!("World seed: missing"),
    }
    println!(
        "Inventory: wood {}, stone {} (selected {})",
        doc.inventory.wood, doc.inventory.stone, doc.selected_item
    );
    println!(
        "Player: [{}, {}, {}] yaw {:.2}",
        doc.player_position.x, doc.player_position.y, doc.player_position.z, doc.player_rotation
    );
    println!(
        "Layout: {} terrain, {} tree origins, {} stones",
        doc.terrain.len(),
        doc.trees.len(),
        doc.stones.len()
    );
    println!("Destroyed resources: {}", doc.destroyed_resources.len());

    let mut built: BTreeMap<String, usize> = BTreeMap::new();
    let mut unknown = 0usize;
    for block in &doc.built_blocks {
        match block.kind.parse::<BlockKind>() {
            Ok(kind) => *built.entry(kind.to_string()).or_default() += 1,
            Err(_) => unknown += 1,
        }
    }
    println!("Built blocks: {}", doc.built_blocks.len());
    for (kind, count) in &built {
        println!("  {kind}: {count}");
    }
    if unknown > 0 {
        println!("  unknown kinds (skipped on load): {unknown}");
    }
}
