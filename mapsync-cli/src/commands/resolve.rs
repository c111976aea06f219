//! `mapsync resolve`: reverse-geocode one coordinate.

use mapsync::config::ConfigFile;
use mapsync::map::MapSnapshot;
use mapsync::Coordinate;
use serde::Serialize;

use super::common::{build_runtime, parse_coordinate, start_logging, GlobalOptions, RunningSession};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ResolveOutput<'a> {
    latitude: f64,
    longitude: f64,
    address: &'a str,
}

/// Run the resolve command.
pub fn run(options: &GlobalOptions, lat: f64, lon: f64, json: bool) -> Result<(), CliError> {
    let coordinate = parse_coordinate(lat, lon)?;
    let config = options.load_config()?;
    let _logging = start_logging(&config)?;

    let runtime = build_runtime()?;
    let snapshot = runtime.block_on(resolve(&config, coordinate))?;

    if let Some(error) = snapshot.last_error {
        return Err(error.into());
    }

    let address = snapshot.address.text();
    if json {
        let output = ResolveOutput {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            address,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", address);
    }
    Ok(())
}

async fn resolve(config: &ConfigFile, coordinate: Coordinate) -> Result<MapSnapshot, CliError> {
    let session = RunningSession::spawn(config, config.map.default_location);

    let result: Result<MapSnapshot, CliError> = async {
        session.handle.resolve_address_for_point(coordinate)?;
        session.handle.sync().await?;
        session
            .wait_for_map("reverse geocoding", |map| !map.resolving)
            .await
    }
    .await;

    session.stop().await;
    result
}
