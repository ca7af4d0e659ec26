use laneboard_core::board::BoardSnapshot;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  "));

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  "));
    }
}

/// One table per lane, in display order, items by position.
pub fn print_board(snapshot: &BoardSnapshot) {
    for (i, lane) in snapshot.lanes.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let count = snapshot.lane_items(&lane.id).count();
        println!("{} [{}] ({count})", lane.name, lane.category);
        let rows: Vec<Vec<String>> = snapshot
            .lane_items(&lane.id)
            .map(|item| {
                vec![
                    item.position.to_string(),
                    item.id.clone(),
                    item.key.clone(),
                    item.title.clone(),
                    item.assignee_id.clone().unwrap_or_else(|| "-".into()),
                ]
            })
            .collect();
        if rows.is_empty() {
            println!("  (empty)");
        } else {
            print_table(&["POS", "ID", "KEY", "TITLE", "ASSIGNEE"], rows);
        }
    }
}
