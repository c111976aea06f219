//! `mapsync search`: autocomplete a query and optionally locate a result.

use mapsync::config::ConfigFile;
use mapsync::platform::SearchSuggestion;
use mapsync::Coordinate;
use serde::Serialize;

use super::common::{build_runtime, start_logging, GlobalOptions, RunningSession};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct Located {
    title: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    query: String,
    suggestions: Vec<SearchSuggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected: Option<Located>,
}

/// Run the search command. `select` is 1-based.
pub fn run(
    options: &GlobalOptions,
    query: &str,
    select: Option<usize>,
    json: bool,
) -> Result<(), CliError> {
    if select == Some(0) {
        return Err(CliError::InvalidArgument(
            "--select counts from 1".to_string(),
        ));
    }

    let config = options.load_config()?;
    let _logging = start_logging(&config)?;

    let runtime = build_runtime()?;
    let output = runtime.block_on(search(&config, query, select))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if output.suggestions.is_empty() {
        println!("No suggestions for '{}'", query);
    }
    for (i, suggestion) in output.suggestions.iter().enumerate() {
        if suggestion.subtitle.is_empty() {
            println!("{:>3}. {}", i + 1, suggestion.title);
        } else {
            println!("{:>3}. {} ({})", i + 1, suggestion.title, suggestion.subtitle);
        }
    }
    if let Some(located) = output.selected {
        println!();
        println!(
            "{} -> {}",
            located.title,
            Coordinate::new(located.latitude, located.longitude)
        );
    }
    Ok(())
}

async fn search(
    config: &ConfigFile,
    query: &str,
    select: Option<usize>,
) -> Result<SearchOutput, CliError> {
    let session = RunningSession::spawn(config, config.map.default_location);

    let result: Result<SearchOutput, CliError> = async {
        let handle = &session.handle;
        handle.update_search_query(query)?;
        handle.sync().await?;
        let snapshot = session
            .wait_for_map("autocomplete", |map| !map.searching)
            .await?;
        if let Some(error) = snapshot.last_error {
            return Err(CliError::from(error));
        }

        let mut output = SearchOutput {
            query: query.to_string(),
            suggestions: snapshot.suggestions,
            selected: None,
        };

        let Some(position) = select else {
            return Ok(output);
        };
        let suggestion = output.suggestions.get(position - 1).cloned().ok_or_else(|| {
            CliError::InvalidArgument(format!(
                "--select {} but only {} suggestion(s) found",
                position,
                output.suggestions.len()
            ))
        })?;

        handle.select_suggestion(suggestion.clone())?;
        handle.sync().await?;
        let snapshot = session
            .wait_for_map("forward lookup", |map| !map.resolving)
            .await?;
        if let Some(error) = snapshot.last_error {
            return Err(CliError::from(error));
        }
        if let Some(point) = snapshot.selected_point {
            output.selected = Some(Located {
                title: suggestion.title,
                latitude: point.latitude,
                longitude: point.longitude,
            });
        }
        Ok(output)
    }
    .await;

    session.stop().await;
    result
}
