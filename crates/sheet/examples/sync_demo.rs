//! Fetch, edit, update and merge a sheet held by the in-memory backend
//!
//! Run with: cargo run --example sync_demo -p sheetlink-sheet

use sheetlink_sheet::{
    ChangeSet, FetchRequest, Formatting, MemoryBackend, SheetBackend, SheetLocator,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut backend = MemoryBackend::new();
    backend.add_spreadsheet("1abc", "Staff");
    let gid = backend.put_sheet(
        "1abc",
        "People",
        vec![
            vec!["Id", "Name", "Team"],
            vec!["1", "Ann", "core"],
            vec!["2", "Bob", "core"],
            vec!["3", "Cid", "web"],
        ],
    )?;

    let request = FetchRequest::with_head_and_key(SheetLocator::gid("1abc", gid), "Id")
        .require_headers(["Name", "Team"]);
    let mut sheet = backend.fetch(&request)?;
    println!("Fetched {} rows from {}", sheet.row_count(), sheet.title());

    if let Some(id) = sheet.row_by_key("2").map(|r| r.id()) {
        sheet.set_value(id, 2, "web")?;
    }
    if let Some(id) = sheet.row_by_key("3").map(|r| r.id()) {
        sheet.delete_row(id)?;
    }

    let changes = ChangeSet::from_sheet(&sheet);
    println!(
        "Pending: {} updated ranges, {} deleted ranges",
        changes.updates.len(),
        changes.deletions.len()
    );

    backend.update(&sheet)?;
    sheet.merge(&backend.fetch(&request)?)?;

    println!("{}", sheet.to_json_string(Formatting::Indented)?);
    Ok(())
}
