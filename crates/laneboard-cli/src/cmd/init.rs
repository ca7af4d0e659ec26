use anyhow::Context;
use laneboard_core::board::{Board, Lane};
use laneboard_core::config::Config;
use laneboard_core::paths;
use laneboard_core::store::{BoardStore, NewItem};
use laneboard_core::types::LaneCategory;
use std::path::Path;

use crate::output::print_json;

pub const DEMO_BOARD: &str = "demo";

/// Create `.laneboard/`, write a default config if none exists, open the
/// board database and optionally seed a demo board. Safe to run twice.
pub fn run(root: &Path, seed: bool, json: bool) -> anyhow::Result<()> {
    std::fs::create_dir_all(root.join(paths::LANEBOARD_DIR))
        .context("failed to create .laneboard directory")?;

    let config_path = paths::config_path(root);
    let config = if config_path.exists() {
        Config::load(root).context("failed to load existing config")?
    } else {
        let config = Config::default();
        config.save(root).context("failed to write config")?;
        config
    };

    let db_path = config.db_path(root);
    let store = BoardStore::open(&db_path).context("failed to open board database")?;

    let seeded = seed && store.list_boards()?.iter().all(|b| b.id != DEMO_BOARD);
    if seeded {
        seed_demo(&store).context("failed to seed demo board")?;
    }

    if json {
        print_json(&serde_json::json!({
            "root": root,
            "config": config_path,
            "database": db_path,
            "seeded": seeded,
        }))?;
    } else {
        println!("Initialized laneboard in {}", root.display());
        if seeded {
            println!("Seeded board '{DEMO_BOARD}'. Try: laneboard board show {DEMO_BOARD}");
        }
    }
    Ok(())
}

fn seed_demo(store: &BoardStore) -> laneboard_core::Result<()> {
    store.create_board(&Board::new(DEMO_BOARD, "Demo board"))?;
    let lanes = [
        ("todo", "To Do", LaneCategory::NotStarted),
        ("doing", "In Progress", LaneCategory::InProgress),
        ("done", "Done", LaneCategory::Done),
    ];
    for (i, (id, name, category)) in lanes.into_iter().enumerate() {
        store.put_lane(DEMO_BOARD, &Lane::new(id, name, i as u32, category))?;
    }
    let items = [
        ("todo", "DEMO-1", "Sketch the lane layout", Some("alice")),
        ("todo", "DEMO-2", "Wire up drag handles", Some("bob")),
        ("todo", "DEMO-3", "Write the release notes", None),
        ("doing", "DEMO-4", "Persist lane order", Some("alice")),
    ];
    for (n, (lane, key, title, assignee)) in items.into_iter().enumerate() {
        let mut item = NewItem::new(lane, key, title).with_id(format!("item-{}", n + 1));
        if let Some(user) = assignee {
            item = item.assigned_to(user);
        }
        store.create_item(DEMO_BOARD, item)?;
    }
    Ok(())
}
