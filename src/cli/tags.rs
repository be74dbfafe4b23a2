use std::collections::HashMap;

use anyhow::Result;
use clap::Subcommand;

use crate::{
    storage::{
        entities::{Session, TagColors},
        state_store::{StateStore, TAG_COLORS_KEY},
    },
    tracker::Tracker,
};

use super::{
    load_tracker,
    output::{colors_enabled, paint_tag, parse_hex_color},
    range::validation_error,
};

#[derive(Debug, Subcommand)]
pub enum TagsCommand {
    #[command(about = "List used tags with their colors")]
    List {},
    #[command(about = "Assign a #rrggbb color to a tag. Without a color the tag goes back to the default palette")]
    Color { tag: String, color: Option<String> },
}

pub async fn process_tags(store: &impl StateStore, command: TagsCommand) -> Result<()> {
    let mut colors: TagColors = store.load(TAG_COLORS_KEY).await;
    match command {
        TagsCommand::List {} => {
            let tracker = load_tracker(store).await;
            let enabled = colors_enabled();
            for (tag, count) in tag_usage(&tracker) {
                let color = colors.get(&tag).unwrap_or("-").to_string();
                println!("{}\t{color}\t{count}", paint_tag(&colors, &tag, enabled));
            }
            Ok(())
        }
        TagsCommand::Color { tag, color } => {
            match color {
                Some(color) => {
                    if parse_hex_color(&color).is_none() {
                        return Err(validation_error(format!(
                            "{color} isn't a color, expected #rrggbb"
                        )));
                    }
                    colors.set(&tag, color.to_lowercase());
                }
                None => {
                    colors.remove(&tag);
                }
            }
            store.save(TAG_COLORS_KEY, &colors).await
        }
    }
}

/// Every tag in use with the number of sessions carrying it, in order of first use.
fn tag_usage(tracker: &Tracker) -> Vec<(String, usize)> {
    let mut usage: Vec<(String, usize)> = vec![];
    let mut index: HashMap<&str, usize> = HashMap::new();
    let running = tracker.running().map(|v| v.tags.as_slice());
    let tag_lists = tracker
        .sessions()
        .iter()
        .map(|v: &Session| v.tags.as_slice())
        .chain(running);
    for tag in tag_lists.flatten() {
        match index.get(tag.as_str()) {
            Some(&position) => usage[position].1 += 1,
            None => {
                index.insert(tag, usage.len());
                usage.push((tag.clone(), 1));
            }
        }
    }
    usage
}
