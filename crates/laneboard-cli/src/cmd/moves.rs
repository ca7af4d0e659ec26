use anyhow::Context;
use clap::Args;
use laneboard_client::{submit_move, BoardApi, BoardSession, HttpBoardClient, NoticeLevel};
use laneboard_core::mutator::DragTarget;

use super::RemoteArgs;
use crate::output::print_json;

#[derive(Args, Debug)]
pub struct MoveArgs {
    pub board: String,

    /// Item to move
    pub item: String,

    /// Drop onto a lane
    #[arg(long, conflicts_with = "over")]
    pub lane: Option<String>,

    /// Drop onto another item, taking its slot
    #[arg(long, conflicts_with = "lane")]
    pub over: Option<String>,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

/// Replay one drag against a running server: fetch, rearrange locally,
/// submit the resulting lane order, and revert if the server refuses.
pub fn run(args: MoveArgs, json: bool) -> anyhow::Result<()> {
    let MoveArgs {
        board,
        item,
        lane,
        over,
        remote,
    } = args;
    let target = match (lane, over) {
        (Some(lane), _) => DragTarget::Lane(lane),
        (None, Some(item)) => DragTarget::Item(item),
        (None, None) => anyhow::bail!("one of --lane or --over is required"),
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let api = HttpBoardClient::new(remote.url, remote.user)?;
        let snapshot = api
            .fetch_snapshot(&board)
            .await
            .with_context(|| format!("failed to fetch board '{board}'"))?;
        match &target {
            DragTarget::Lane(lane) if snapshot.lane(lane).is_none() => {
                anyhow::bail!("lane '{lane}' is not on board '{board}'")
            }
            DragTarget::Item(over) if snapshot.item(over).is_none() => {
                anyhow::bail!("item '{over}' is not on board '{board}'")
            }
            _ => {}
        }
        let session = BoardSession::new(board.clone(), snapshot);

        if !session.drag_start(&item) {
            anyhow::bail!("item '{item}' is not on board '{board}'");
        }
        session.drag_over(Some(&target));
        let Some(intent) = session.drag_end(Some(&target)) else {
            if json {
                print_json(&serde_json::json!({ "moved": false }))?;
            } else {
                println!("Item '{item}' is already there; nothing to submit.");
            }
            return Ok(());
        };

        let mut notices = session.subscribe_notices();
        let result = submit_move(&api, &session, &intent).await;
        while let Ok(notice) = notices.try_recv() {
            match (notice.level, notice.description) {
                (NoticeLevel::Error, Some(desc)) => eprintln!("{}: {desc}", notice.title),
                _ => eprintln!("{}", notice.title),
            }
        }
        let outcome = result?;

        if json {
            print_json(&outcome)?;
        } else {
            println!(
                "Moved {} to {} at position {} ({} record(s) written)",
                outcome.item.key,
                outcome.destination_lane_id,
                outcome.item.position,
                outcome.items_written
            );
            println!("Lane order: {}", outcome.destination_order.join(", "));
        }
        Ok(())
    })
}
