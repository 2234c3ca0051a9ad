use tabled::{Table, settings::Style};

use crate::{
    cli::{authorized_session, spinner},
    config::Settings,
    error, info,
    types::{SearchResults, SearchType},
};

pub async fn search(settings: Settings, query: String, types: Vec<SearchType>, limit: u32) {
    let (session, _server) = authorized_session(settings).await;
    let search = session.search();

    let pb = spinner("Searching...");
    let response = search.search(&query, &types, limit).await;
    pb.finish_and_clear();

    let Some(response) = response else {
        match search.error() {
            Some(message) => error!("{}", message),
            None => info!("Nothing to search for"),
        }
        return;
    };

    let results: SearchResults = match serde_json::from_value(response) {
        Ok(results) => results,
        Err(e) => error!("Unexpected search payload: {}", e),
    };

    let rows = results.rows();
    if rows.is_empty() {
        info!("No results for \"{}\"", query);
        return;
    }

    let count = rows.len();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    info!("{} results for \"{}\"", count, query);
}
