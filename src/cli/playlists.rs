use tabled::{Table, settings::Style};

use crate::{
    cli::{authorized_session, spinner},
    config::Settings,
    error, info,
    types::PlaylistTableRow,
    warning,
};

pub async fn playlists(settings: Settings, limit: u32, offset: u32, all: bool) {
    let (session, _server) = authorized_session(settings).await;
    let library = session.playlists();

    let pb = spinner("Fetching playlists...");
    if let Err(e) = library.fetch_playlists(limit, offset, true).await {
        pb.finish_and_clear();
        error!("Failed to fetch playlists: {}", e);
    }

    if all {
        loop {
            match library.fetch_more_playlists().await {
                Ok(Some(_)) => {
                    let fetched = library.playlists().map(|p| p.items.len()).unwrap_or(0);
                    pb.set_message(format!("Fetching playlists... {fetched}"));
                }
                Ok(None) => break,
                Err(e) => {
                    warning!("Failed to fetch more playlists: {}", e);
                    break;
                }
            }
        }
    }
    pb.finish_and_clear();

    let Some(page) = library.playlists() else {
        return;
    };

    if page.items.is_empty() {
        info!("No playlists found");
        return;
    }

    let rows: Vec<PlaylistTableRow> = page.items.iter().map(PlaylistTableRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    match page.total {
        Some(total) => info!("Showing {} of {} playlists", page.items.len(), total),
        None => info!("Showing {} playlists", page.items.len()),
    }
    if library.has_more() {
        info!("More playlists available, use --all to fetch every page");
    }
}
