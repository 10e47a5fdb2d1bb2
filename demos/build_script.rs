//! Builds a small screenplay through the session command surface, then
//! round-trips it through the structured record and prints the exports.
//!
//! Run with: cargo run --release --example build_script

use kyakuhon::{Anchor, ContentBlock, EditingSession};

fn main() {
    let mut session = EditingSession::new();
    let first = session.active_scene().unwrap().to_string();

    session.edit_location(&first, "Office").unwrap();
    session.edit_time_setting(&first, "Night").unwrap();
    session
        .insert_block(&Anchor::None, ContentBlock::togaki("He enters."))
        .unwrap();
    session
        .insert_block(&Anchor::None, ContentBlock::serifu("Mika", "Hello"))
        .unwrap();
    session
        .insert_block(&Anchor::None, ContentBlock::time_progress())
        .unwrap();

    let second = session.add_scene().unwrap();
    session.edit_location(&second, "Street").unwrap();
    session
        .insert_block(&Anchor::None, ContentBlock::serifu("A", "Who goes there?"))
        .unwrap();

    println!("=== Sidebar ===");
    for row in session.sidebar().unwrap() {
        println!(
            "{} {} {}",
            row.number,
            row.location,
            if row.active { "(active)" } else { "" }
        );
    }

    println!("\n=== Structured record ===");
    let record = session.serialize().unwrap();
    println!("{}", record.to_json().unwrap());

    println!("\n=== Text export ===");
    println!("{}", session.render_text().unwrap());

    let bytes = session.save();
    println!("Binary document: {} bytes", bytes.len());

    // Undo all edits on the second scene back to the first snapshot.
    let mut undone = 0;
    while session.undo().unwrap() {
        undone += 1;
    }
    println!("Undid {} snapshots", undone);
}
