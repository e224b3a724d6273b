//! Table listings for rooms and trends.

use comfy_table::{presets::UTF8_FULL, Table};

use tattle_core::repository::room::RoomRepository;
use tattle_core::repository::trend::TrendRepository;

use crate::state::AppState;

/// `tattle rooms` - list the chat rooms.
pub async fn rooms(state: &AppState, json: bool) -> anyhow::Result<()> {
    let rooms = state.rooms.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rooms)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["Name", "Topic", "Active", "Id"]);
    for room in &rooms {
        table.add_row([
            room.name.clone(),
            room.topic.clone().unwrap_or_default(),
            if room.is_active { "yes" } else { "no" }.to_string(),
            room.id.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// `tattle trends` - show the trending-tags leaderboard.
pub async fn trends(state: &AppState, json: bool) -> anyhow::Result<()> {
    let trends = state.trends.top(10).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&trends)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["Tag", "Count", "Stories"]);
    for trend in &trends {
        table.add_row([
            trend.tag.clone(),
            trend.count.to_string(),
            trend.related_story_ids.len().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
